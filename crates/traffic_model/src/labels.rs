//! Display names of the traffic classes the classifier predicts.

/// Class names indexed by class id.
pub const CLASS_LABELS: [&str; 15] = [
    "BENIGN",
    "Bot",
    "DDoS",
    "DoS GoldenEye",
    "DoS Hulk",
    "DoS Slowhttptest",
    "DoS slowloris",
    "FTP-Patator",
    "Heartbleed",
    "Infiltration",
    "PortScan",
    "SSH-Patator",
    "Web Attack - Brute Force",
    "Web Attack - Sql Injection",
    "Web Attack - XSS",
];

/// Number of classes.
pub const CLASS_COUNT: usize = CLASS_LABELS.len();

/// Name of class `id`, if it exists.
#[must_use]
pub fn label_name(id: u32) -> Option<&'static str> {
    CLASS_LABELS.get(usize::try_from(id).ok()?).copied()
}
