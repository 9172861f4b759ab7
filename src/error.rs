use thiserror::Error;

/// Every failure the dashboard can observe. The `Display` text is what ends
/// up in `AggregationResult::failures` and `LatencyView::error`.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to fetch {url}: {cause}")]
    Transport { url: String, cause: String },

    #[error("Failed to fetch {url}: server responded with status {reason}")]
    Status { url: String, reason: String },

    #[error("Failed to parse response from {url}: {cause}")]
    Decode { url: String, cause: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),

    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),

    #[error("Failed to bind dashboard to {addr}: {cause}")]
    Bind { addr: String, cause: std::io::Error },

    #[error("Dashboard server error: {0}")]
    Server(std::io::Error),
}

impl DashboardError {
    /// Text for a non-success status: canonical reason if known, code otherwise.
    pub fn status_reason(status: reqwest::StatusCode) -> String {
        match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        }
    }
}
