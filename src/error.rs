use thiserror::Error;

/// Any failed exchange with the directory service.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned status {status}")]
    Status { path: String, status: u16 },
    #[error("malformed payload from {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid service url for {path}: {message}")]
    InvalidUrl { path: String, message: String },
}
