//! Errors returned by platform calls.

use serde::Deserialize;
use thiserror::Error;

/// A failed control-plane or runtime call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform answered with an error document.
    #[error("{code}: {message}")]
    Service {
        code: String,
        message: String,
        status: u16,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode {operation} request: {source}")]
    Encode {
        operation: String,
        source: serde_json::Error,
    },

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: String,
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    kind: Option<String>,

    #[serde(alias = "Message", default)]
    message: Option<String>,
}

impl ApiError {
    /// Builds a service error from a code and message.
    pub fn service(code: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Service {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// Builds a service error from a non-success response body.
    ///
    /// The code is taken from `__type`, dropping any `namespace#` prefix.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
        let (kind, message) = parsed
            .map(|b| (b.kind, b.message))
            .unwrap_or_default();

        let code = kind
            .as_deref()
            .map(|k| k.rsplit('#').next().unwrap_or(k).to_string())
            .unwrap_or_else(|| format!("Http{status}"));
        let message = message.unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());

        Self::Service {
            code,
            message,
            status,
        }
    }

    /// Platform error code, if the platform answered.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True when the named resource does not exist.
    ///
    /// Describe calls report a missing resource either as `ResourceNotFound`
    /// or as a `ValidationException` saying it could not be found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Service { code, message, .. } => {
                code == "ResourceNotFound"
                    || (code == "ValidationException" && message.contains("Could not find"))
            }
            _ => false,
        }
    }
}
