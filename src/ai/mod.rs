mod client;
mod error;
pub mod inference;

use async_trait::async_trait;

pub use client::GeminiClient;
pub use error::ClassifyError;

use crate::domain::ClassificationResult;

/// One entry of a classification batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchItem<'a> {
    pub identity: &'a str,
    pub content: &'a str,
}

/// External scoring service. Results come back in submission order; the
/// returned vector may be shorter than `items`.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        credential: &str,
        items: &[BatchItem<'_>],
    ) -> Result<Vec<ClassificationResult>, ClassifyError>;
}
