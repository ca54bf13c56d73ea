//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::error::{NarrativeError, NarrativeResult};
use crate::service::{CompletionRequest, NarrativeService, ReplyFormat};

/// Talks to any `/chat/completions` endpoint that speaks the OpenAI wire
/// format.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsClient {
    /// Build a client. Returns `None` when the config carries no API key or
    /// the HTTP client cannot be set up with the configured timeout.
    pub fn new(config: &ServiceConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }
        Self::from_http(config, Client::builder().timeout(config.timeout).build())
    }

    fn from_http(config: &ServiceConfig, http: reqwest::Result<Client>) -> Option<Self> {
        let client = match http {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "cannot build HTTP client, running offline");
                return None;
            }
        };
        Some(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }

    /// The full endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NarrativeService for ChatCompletionsClient {
    async fn complete(&self, request: CompletionRequest) -> NarrativeResult<String> {
        let body = build_request(&self.model, &request);
        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;
        parse_response(&text)
    }
}

fn build_request(model: &str, request: &CompletionRequest) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: Some(request.system_prompt.clone()),
            },
            ChatMessage {
                role: "user".to_string(),
                content: Some(request.user_prompt.clone()),
            },
        ],
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        response_format: match request.format {
            ReplyFormat::JsonObject => Some(ResponseFormat {
                r#type: "json_object".to_string(),
            }),
            ReplyFormat::Text => None,
        },
    }
}

fn parse_response(body: &str) -> NarrativeResult<String> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| NarrativeError::Schema(e.to_string()))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| NarrativeError::Schema("no choices in completion response".to_string()))?;
    Ok(content.trim().to_string())
}

// -- Wire types --

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(format: ReplyFormat) -> CompletionRequest {
        CompletionRequest {
            system_prompt: "sys".into(),
            user_prompt: "user".into(),
            temperature: 0.2,
            max_tokens: 15,
            format,
        }
    }

    #[test]
    fn unconfigured_client_is_none() {
        assert!(ChatCompletionsClient::new(&ServiceConfig::default()).is_none());
    }

    #[test]
    fn failed_http_setup_disables_client() {
        let config = ServiceConfig::default().with_api_key("sk-x");
        let err = Client::new().get("not a url").build().unwrap_err();
        assert!(ChatCompletionsClient::from_http(&config, Err(err)).is_none());
        assert!(ChatCompletionsClient::from_http(&config, Ok(Client::new())).is_some());
    }

    #[test]
    fn endpoint_appends_path() {
        let config = ServiceConfig::default()
            .with_api_key("sk-x")
            .with_base_url("http://localhost:8080/v1/");
        let client = ChatCompletionsClient::new(&config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
        assert!(!format!("{client:?}").contains("sk-x"));
    }

    #[test]
    fn json_mode_sets_response_format() {
        let body = serde_json::to_value(build_request("m", &request(ReplyFormat::JsonObject))).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");

        let body = serde_json::to_value(build_request("m", &request(ReplyFormat::Text))).unwrap();
        assert!(body.get("response_format").is_none());
        assert_eq!(body["max_tokens"], 15);
    }

    #[test]
    fn parses_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  门后有声音。 "}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "门后有声音。");
    }

    #[test]
    fn empty_choices_is_schema_error() {
        let err = parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, NarrativeError::Schema(_)));
        let err = parse_response("<html>").unwrap_err();
        assert!(matches!(err, NarrativeError::Schema(_)));
    }
}
