use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use tracing::warn;
use traffic_model::handler::{HandlerError, LoadedModel, handle};

use crate::Backend;

/// Shared server state.
#[derive(Clone)]
pub struct ServingState {
    pub model: Option<Arc<Mutex<LoadedModel<Backend>>>>,
}

pub fn router(state: ServingState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/invocations", post(invocations))
        .with_state(state)
}

/// 200 once the model is loaded.
async fn ping(State(state): State<ServingState>) -> StatusCode {
    if state.model.is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn invocations(
    State(state): State<ServingState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, (StatusCode, String)> {
    let model = state.model.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "model is not loaded".to_string(),
    ))?;

    let content_type = header_value(&headers, header::CONTENT_TYPE);
    let accept = header_value(&headers, header::ACCEPT);

    let model = model.lock().map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "model lock poisoned".to_string(),
        )
    })?;

    match handle(&model, &body, content_type, accept) {
        Ok(response) => {
            Ok(([(header::CONTENT_TYPE, response.content_type)], response.body).into_response())
        }
        Err(e) => {
            warn!("Rejected invocation: {e}");
            Err((status_for(&e), e.to_string()))
        }
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

const fn status_for(error: &HandlerError) -> StatusCode {
    match error {
        HandlerError::UnsupportedContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        HandlerError::UnsupportedAccept(_) => StatusCode::NOT_ACCEPTABLE,
        HandlerError::EmptyRequest | HandlerError::NotUtf8 | HandlerError::InvalidRow { .. } => {
            StatusCode::BAD_REQUEST
        }
        HandlerError::Model(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
