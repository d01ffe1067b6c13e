//! Storefront publication adapter.
//!
//! Publishes generated content to the storefront admin API. Publication
//! outcomes are total: an "already exists" rejection from the platform is a
//! distinct success-like outcome, not an error the caller has to sniff out
//! of a message string.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use contentforge_shared::PublishMode;

/// One piece of content to publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub title: String,
    pub body_html: String,
    /// URL slug; the platform derives one from the title when absent.
    pub handle: Option<String>,
    pub tags: Vec<String>,
    pub summary_html: Option<String>,
    pub mode: PublishMode,
    /// Future visibility instant, for [`PublishMode::Scheduled`].
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Result of a publication call. Total: no error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The resource was created.
    Created { resource_id: String },
    /// The platform already holds an equivalent resource (duplicate handle).
    AlreadySatisfied,
    /// The call failed; the message is recorded against the item.
    Failed { message: String },
}

impl PublishOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A storefront publication backend.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one piece of content.
    async fn publish(&self, request: &PublishRequest) -> PublishOutcome;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// [`Publisher`] backed by the storefront admin REST API.
pub struct StorefrontClient {
    client: reqwest::Client,
    base: Url,
    token: String,
}

impl StorefrontClient {
    /// Build a client for `https://{shop_domain}/admin/api/{api_version}/`.
    pub fn new(
        shop_domain: &str,
        api_version: &str,
        token: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let base = Url::parse(&format!("https://{shop_domain}/admin/api/{api_version}/"))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            token: token.into(),
        })
    }

    /// For tests: point the client at an arbitrary base URL.
    pub fn with_base(base: Url, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
            token: token.into(),
        }
    }

    fn article_body(request: &PublishRequest) -> serde_json::Value {
        let published = matches!(request.mode, PublishMode::Active);
        let mut article = serde_json::json!({
            "title": request.title,
            "body_html": request.body_html,
            "tags": request.tags.join(", "),
            "published": published,
        });
        if let Some(handle) = &request.handle {
            article["handle"] = serde_json::json!(handle);
        }
        if let Some(summary) = &request.summary_html {
            article["summary_html"] = serde_json::json!(summary);
        }
        if request.mode == PublishMode::Scheduled {
            if let Some(at) = request.scheduled_at {
                article["published_at"] = serde_json::json!(at.to_rfc3339());
            }
        }
        serde_json::json!({ "article": article })
    }

    async fn handle_response(response: reqwest::Response) -> PublishOutcome {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            let id = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["article"]["id"].as_u64().map(|id| id.to_string()));
            return match id {
                Some(resource_id) => PublishOutcome::Created { resource_id },
                None => PublishOutcome::Failed {
                    message: "response missing article id".into(),
                },
            };
        }

        // The platform rejects duplicate handles with a 422; that content is
        // already live, so it counts as satisfied rather than failed.
        if status.as_u16() == 422 {
            let lowered = text.to_lowercase();
            if lowered.contains("taken") || lowered.contains("already exists") {
                return PublishOutcome::AlreadySatisfied;
            }
        }

        PublishOutcome::Failed {
            message: format!("platform returned {status}: {text}"),
        }
    }
}

#[async_trait]
impl Publisher for StorefrontClient {
    #[tracing::instrument(skip_all, fields(title = %request.title, mode = ?request.mode))]
    async fn publish(&self, request: &PublishRequest) -> PublishOutcome {
        let url = match self.base.join("articles.json") {
            Ok(url) => url,
            Err(e) => {
                return PublishOutcome::Failed {
                    message: format!("invalid publish URL: {e}"),
                };
            }
        };

        let result = self
            .client
            .post(url)
            .header("X-Access-Token", &self.token)
            .json(&Self::article_body(request))
            .send()
            .await;

        match result {
            Ok(response) => Self::handle_response(response).await,
            Err(e) => PublishOutcome::Failed {
                message: format!("publish request failed: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PublishRequest {
        PublishRequest {
            title: "Cuban Link Chains Explained".into(),
            body_html: "<p>Body.</p>".into(),
            handle: Some("cuban-link-chains".into()),
            tags: vec!["chains".into(), "gold".into()],
            summary_html: Some("<p>Summary.</p>".into()),
            mode: PublishMode::Draft,
            scheduled_at: None,
        }
    }

    fn client(server: &MockServer) -> StorefrontClient {
        let base = Url::parse(&format!("{}/admin/api/2025-01/", server.uri())).unwrap();
        StorefrontClient::with_base(base, "test-token")
    }

    #[tokio::test]
    async fn created_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2025-01/articles.json"))
            .and(header("X-Access-Token", "test-token"))
            .and(body_partial_json(serde_json::json!({
                "article": {
                    "title": "Cuban Link Chains Explained",
                    "published": false,
                    "handle": "cuban-link-chains",
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "article": { "id": 88421 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client(&server).publish(&request()).await;
        assert_eq!(
            outcome,
            PublishOutcome::Created {
                resource_id: "88421".into()
            }
        );
    }

    #[tokio::test]
    async fn duplicate_handle_is_already_satisfied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "errors": { "handle": ["has already been taken"] }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server).publish(&request()).await;
        assert_eq!(outcome, PublishOutcome::AlreadySatisfied);
    }

    #[tokio::test]
    async fn other_422_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "errors": { "body_html": ["can't be blank"] }
            })))
            .mount(&server)
            .await;

        let outcome = client(&server).publish(&request()).await;
        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn server_error_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = client(&server).publish(&request()).await;
        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn scheduled_mode_sends_publish_instant() {
        use chrono::TimeZone;

        let server = MockServer::start().await;
        let at = Utc.with_ymd_and_hms(2025, 3, 12, 9, 30, 0).unwrap();
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "article": {
                    "published": false,
                    "published_at": at.to_rfc3339(),
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "article": { "id": 7 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = request();
        req.mode = PublishMode::Scheduled;
        req.scheduled_at = Some(at);

        let outcome = client(&server).publish(&req).await;
        assert!(matches!(outcome, PublishOutcome::Created { .. }));
    }
}
