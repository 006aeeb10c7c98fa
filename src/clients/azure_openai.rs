mod models;

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::{ClassificationRequest, ClassificationService};
use crate::config::Credentials;

use models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, truncate_error_message};

/// Azure OpenAI の chat completions を叩く分類クライアント。
#[derive(Debug, Clone)]
pub struct AzureOpenAiClient {
    client: Client,
    completions_url: Url,
    api_key: String,
}

impl AzureOpenAiClient {
    /// 認証情報からクライアントを作る。
    ///
    /// # Errors
    /// エンドポイントがURLとして不正な場合、またはHTTPクライアントの構築に失敗した場合。
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("failed to build azure-openai client")?;

        let mut endpoint = credentials.endpoint.clone();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let base_url = Url::parse(&endpoint).context("invalid azure-openai endpoint URL")?;
        let mut completions_url = base_url
            .join(&format!(
                "openai/deployments/{}/chat/completions",
                credentials.deployment
            ))
            .context("failed to build chat completions URL")?;
        completions_url
            .query_pairs_mut()
            .append_pair("api-version", &credentials.api_version);

        Ok(Self {
            client,
            completions_url,
            api_key: credentials.api_key.clone(),
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(base_url: impl Into<String>) -> Self {
        Self::new(&Credentials {
            endpoint: base_url.into(),
            api_key: "test-key".to_string(),
            deployment: "gpt-test".to_string(),
            api_version: "2025-04-01-preview".to_string(),
        })
        .expect("test client should build")
    }
}

#[async_trait]
impl ClassificationService for AzureOpenAiClient {
    async fn classify(&self, request: &ClassificationRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            prompt_chars = request.prompt.len(),
            timeout_secs = request.timeout.as_secs_f64(),
            "sending classification request to azure-openai"
        );

        let response = self
            .client
            .post(self.completions_url.clone())
            .header("api-key", &self.api_key)
            .json(&body)
            .timeout(request.timeout)
            .send()
            .await
            .context("classification request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let truncated_body = truncate_error_message(&body);
            return Err(anyhow!(
                "chat completions endpoint returned error status {status}: {truncated_body}"
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .context("failed to deserialize chat completions response")?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completions response contained no choices"))?;

        if let Some(reason) = choice.finish_reason.as_deref() {
            debug!(finish_reason = reason, "classification completion finished");
        }

        choice
            .message
            .content
            .map(|content| content.trim().to_string())
            .ok_or_else(|| anyhow!("chat completions response had empty message content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> ClassificationRequest {
        ClassificationRequest {
            system_prompt: "system".to_string(),
            prompt: "Recipe Title: \"Tacos\"".to_string(),
            temperature: 0.1,
            max_tokens: 500,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn classify_returns_trimmed_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-test/chat/completions"))
            .and(query_param("api-version", "2025-04-01-preview"))
            .and(header("api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({"temperature": 0.1, "max_tokens": 500})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "  {\"primary_category\": \"Beef\"}\n"},
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::new_for_test(server.uri());
        let text = client.classify(&request()).await.expect("classify succeeds");

        assert_eq!(text, "{\"primary_category\": \"Beef\"}");
    }

    #[tokio::test]
    async fn classify_truncates_large_error_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("x".repeat(10_000)))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::new_for_test(server.uri());
        let error = client.classify(&request()).await.expect_err("should fail");
        let message = error.to_string();

        assert!(message.contains("429"));
        assert!(message.contains("truncated"));
        assert!(message.len() < 1000);
    }

    #[tokio::test]
    async fn classify_fails_without_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::new_for_test(server.uri());
        let error = client.classify(&request()).await.expect_err("should fail");

        assert!(error.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn classify_times_out_with_reqwest_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = AzureOpenAiClient::new_for_test(server.uri());
        let mut short = request();
        short.timeout = Duration::from_millis(50);

        let error = client.classify(&short).await.expect_err("should time out");

        assert_eq!(
            crate::util::error::classify_service_error(&error),
            crate::domain::categorization::FailureKind::TimedOut
        );
    }
}
