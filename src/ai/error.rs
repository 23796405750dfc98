use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("request to classification service failed: {0}")]
    Transport(reqwest::Error),
    #[error("classification service returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed classification response: {0}")]
    Malformed(String),
    #[error("no JSON array found in classification text")]
    MissingArray,
    #[error("failed to decode classification array: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClassifyError {
    fn from(err: reqwest::Error) -> Self {
        // the URL may carry request details that must not reach the logs
        ClassifyError::Transport(err.without_url())
    }
}
