use async_trait::async_trait;
use reqwest::Client;

use crate::{config::GeminiConfig, domain::ClassificationResult};

use super::{
    inference::{build_prompt, build_request, interpret_response},
    BatchItem, ClassifyError, Classifier,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Classifier for GeminiClient {
    async fn classify(
        &self,
        credential: &str,
        items: &[BatchItem<'_>],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        let request = build_request(&build_prompt(items)?);
        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, credential)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(
            target: "classifier",
            status = status.as_u16(),
            bytes = body.len(),
            "classification response received"
        );
        interpret_response(status.as_u16(), &body)
    }
}
