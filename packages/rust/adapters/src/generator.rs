//! Content generation adapter.
//!
//! Generation happens in two stages per item: an analysis pass that surveys
//! the subject, then a writing pass that produces the final content from the
//! analysis. The service can reject a subject whose search results do not
//! match the expected intent; that rejection is final and never retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use contentforge_linking::LinkPlan;
use contentforge_shared::ContentScope;

/// Which generation pass a request drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Analysis,
    Writing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Writing => "writing",
        }
    }
}

/// One generation call for one item.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub stage: Stage,
    pub subject: String,
    pub image_url: Option<String>,
    pub locale: String,
    pub scope: ContentScope,
    /// Link assignments the writing pass should weave into the content.
    pub link_context: Option<LinkPlan>,
    /// Analysis output from the first stage, present for writing requests.
    pub analysis: Option<String>,
}

/// Why a generation call failed.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The service judged the subject off-topic. Never retried.
    #[error("semantic mismatch: {reason}")]
    Mismatch { reason: String },

    /// Provider or transport failure. Retryable.
    #[error("transient generation failure: {0}")]
    Transient(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Output of one generation call.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Stage payload: the analysis text, or the final body HTML.
    pub content: String,
    /// Title produced by the writing stage, when the scope asks for one.
    pub title: Option<String>,
    pub cost: f64,
    pub tokens_in: u64,
    pub tokens_out: u64,
}

/// A content generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError>;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WireResponse {
    content: Option<String>,
    title: Option<String>,
    /// Set when the service rejects the subject as off-topic.
    mismatch: Option<String>,
    #[serde(default)]
    cost: f64,
    #[serde(default)]
    tokens_in: u64,
    #[serde(default)]
    tokens_out: u64,
}

/// [`Generator`] backed by the generation service's HTTP API.
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl HttpGenerator {
    pub fn new(endpoint: Url, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    #[tracing::instrument(skip_all, fields(stage = request.stage.as_str(), subject = %request.subject))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        let body = serde_json::json!({
            "model": self.model,
            "stage": request.stage,
            "subject": request.subject,
            "image_url": request.image_url,
            "locale": request.locale,
            "scope": request.scope,
            "link_context": request.link_context,
            "analysis": request.analysis,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Transient(format!(
                "generation service returned {status}: {text}"
            )));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transient(format!("malformed response: {e}")))?;

        if let Some(reason) = wire.mismatch {
            return Err(GenerationError::Mismatch { reason });
        }

        let content = wire
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| GenerationError::Transient("empty generation response".into()))?;

        tracing::debug!(
            cost = wire.cost,
            tokens_in = wire.tokens_in,
            tokens_out = wire.tokens_out,
            "generation call complete"
        );

        Ok(GenerationOutput {
            content,
            title: wire.title,
            cost: wire.cost,
            tokens_in: wire.tokens_in,
            tokens_out: wire.tokens_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(stage: Stage) -> GenerationRequest {
        GenerationRequest {
            stage,
            subject: "cuban link chain".into(),
            image_url: None,
            locale: "en".into(),
            scope: ContentScope::TitleAndDescription,
            link_context: None,
            analysis: (stage == Stage::Writing).then(|| "analysis notes".to_string()),
        }
    }

    fn generator(server: &MockServer) -> HttpGenerator {
        let endpoint = Url::parse(&format!("{}/v1/generate", server.uri())).unwrap();
        HttpGenerator::new(endpoint, "test-key", "sonar")
    }

    #[tokio::test]
    async fn successful_writing_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/generate"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "stage": "writing",
                "subject": "cuban link chain",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": "<p>Full article body.</p>",
                "title": "Cuban Link Chains Explained",
                "cost": 0.012,
                "tokens_in": 1500,
                "tokens_out": 900,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = generator(&server)
            .generate(&request(Stage::Writing))
            .await
            .expect("generation should succeed");

        assert_eq!(output.content, "<p>Full article body.</p>");
        assert_eq!(output.title.as_deref(), Some("Cuban Link Chains Explained"));
        assert!((output.cost - 0.012).abs() < 1e-9);
        assert_eq!(output.tokens_out, 900);
    }

    #[tokio::test]
    async fn mismatch_is_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mismatch": "results are about barbecue grills, not jewelry",
            })))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&request(Stage::Analysis))
            .await
            .expect_err("mismatch should fail");

        assert!(!err.is_retryable());
        assert!(err.to_string().contains("barbecue"));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&request(Stage::Analysis))
            .await
            .expect_err("500 should fail");

        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn empty_content_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": "   ",
            })))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&request(Stage::Writing))
            .await
            .expect_err("blank content should fail");

        assert!(err.is_retryable());
    }
}
