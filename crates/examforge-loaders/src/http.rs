//! Loader for test resources served over HTTP.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tracing::instrument;

use examforge_core::error::LoadError;
use examforge_core::model::QuestionSet;
use examforge_core::parser::parse_question_set_json;
use examforge_core::traits::QuestionSetLoader;

use crate::filesystem::is_plain_id;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches `GET {base_url}/tests/{id}.json`.
pub struct HttpLoader {
    base_url: String,
    default_duration_secs: u64,
    client: reqwest::Client,
}

impl HttpLoader {
    pub fn new(base_url: &str, default_duration_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_duration_secs,
            client,
        })
    }

    fn resource_url(&self, test_id: &str) -> String {
        format!("{}/tests/{}.json", self.base_url, test_id)
    }
}

#[async_trait]
impl QuestionSetLoader for HttpLoader {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn load(&self, test_id: &str) -> Result<QuestionSet, LoadError> {
        if !is_plain_id(test_id) {
            return Err(LoadError::NotFound(test_id.to_string()));
        }

        let response = self
            .client
            .get(self.resource_url(test_id))
            .send()
            .await
            .map_err(|e| LoadError::transport(test_id, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LoadError::NotFound(test_id.to_string()));
        }
        if !status.is_success() {
            return Err(LoadError::transport(test_id, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LoadError::transport(test_id, e))?;

        parse_question_set_json(&body, test_id, self.default_duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn loads_object_resource() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "durationMinutes": 20,
            "questions": [
                {"question": "Largest planet?", "options": ["Mars", "Jupiter"], "correctIndex": 1}
            ]
        });

        Mock::given(method("GET"))
            .and(path("/tests/planets.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let loader = HttpLoader::new(&server.uri(), 600).unwrap();
        let set = loader.load("planets").await.unwrap();
        assert_eq!(set.duration_secs, 1200);
        assert_eq!(set.questions[0].correct_index, 1);
    }

    #[tokio::test]
    async fn loads_bare_array_with_default_duration() {
        let server = MockServer::start().await;

        let body = serde_json::json!([
            {"question": "2 + 2?", "options": ["3", "4"], "correctIndex": 1}
        ]);

        Mock::given(method("GET"))
            .and(path("/tests/quick.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let loader = HttpLoader::new(&format!("{}/", server.uri()), 600).unwrap();
        let set = loader.load("quick").await.unwrap();
        assert_eq!(set.duration_secs, 600);
    }

    #[tokio::test]
    async fn not_found_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tests/missing.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = HttpLoader::new(&server.uri(), 600).unwrap();
        let err = loader.load("missing").await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[tokio::test]
    async fn server_error_is_transport() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tests/flaky.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let loader = HttpLoader::new(&server.uri(), 600).unwrap();
        let err = loader.load("flaky").await.unwrap_err();
        assert!(matches!(err, LoadError::Transport { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/tests/broken.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let loader = HttpLoader::new(&server.uri(), 600).unwrap();
        assert!(matches!(
            loader.load("broken").await,
            Err(LoadError::Parse { .. })
        ));
    }
}
