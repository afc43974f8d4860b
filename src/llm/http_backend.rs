use super::CompletionModel;
use crate::config::CompletionConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct CompleteRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CompleteResponse {
    Completion { completion: String },
    Text { text: String },
    Choices { choices: Vec<Choice> },
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl CompleteResponse {
    fn into_text(self) -> Result<String> {
        match self {
            CompleteResponse::Completion { completion } => Ok(completion),
            CompleteResponse::Text { text } => Ok(text),
            CompleteResponse::Choices { mut choices } => {
                if choices.is_empty() {
                    return Err(Error::Completion(
                        "Completion backend returned no choices".to_string(),
                    ));
                }
                Ok(choices.remove(0).message.content)
            }
        }
    }
}

/// HTTP completion backend
pub struct HttpCompletionModel {
    client: Client,
    base_url: Url,
    model: String,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    retries: usize,
}

impl HttpCompletionModel {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            retries: 2,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid completion backend URL: {}", e)))
    }

    async fn send_with_retry(&self, request: reqwest::RequestBuilder) -> Result<CompleteResponse> {
        let mut last_err: Option<Error> = None;
        for attempt in 0..=self.retries {
            let req = request
                .try_clone()
                .ok_or_else(|| Error::Completion("Failed to clone backend request".to_string()))?;
            match req.send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(ok) => return Ok(ok.json::<CompleteResponse>().await?),
                    Err(e) => last_err = Some(Error::Completion(e.to_string())),
                },
                Err(e) => last_err = Some(Error::Completion(e.to_string())),
            }

            if attempt < self.retries {
                tokio::time::sleep(Duration::from_millis(200 * (attempt + 1) as u64)).await;
            }
        }

        Err(last_err
            .unwrap_or_else(|| Error::Completion("Completion backend request failed".to_string())))
    }
}

#[async_trait]
impl CompletionModel for HttpCompletionModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint("/v1/chat/completions")?;
        let request = CompleteRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
        };
        let parsed = self
            .send_with_retry(self.client.post(url).json(&request))
            .await?;
        parsed.into_text()
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> CompletionConfig {
        CompletionConfig {
            url: url.to_string(),
            model: "test-model".to_string(),
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 4000,
        }
    }

    #[tokio::test]
    async fn test_complete_parses_openai_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "hello back"}}]
            })))
            .mount(&server)
            .await;

        let model = HttpCompletionModel::new(&test_config(&server.uri())).unwrap();
        let text = model.complete("hello").await.unwrap();
        assert_eq!(text, "hello back");
    }

    #[tokio::test]
    async fn test_complete_sends_sampling_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "temperature": 0.1,
                "top_p": 0.9,
                "max_tokens": 4000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "text": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = HttpCompletionModel::new(&test_config(&server.uri())).unwrap();
        assert_eq!(model.complete("hi").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_complete_propagates_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let model = HttpCompletionModel::new(&test_config(&server.uri())).unwrap();
        let result = model.complete("hi").await;
        assert!(matches!(result, Err(Error::Completion(_))));
    }
}
