//! HTTP client for an OpenAI-compatible chat-completions endpoint.
//!
//! One synchronous request per call, bounded by a client-level timeout; no
//! retries. Connect failures and timeouts map to distinct error variants so
//! the caller can tell the user "the AI service is unavailable" rather than
//! a generic failure.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::StructuringError;
use crate::config::Settings;

/// Image detail level requested from the vision model.
const VISION_DETAIL: &str = "high";

/// Token ceiling for vision responses (tables over many pages get long).
const VISION_MAX_TOKENS: u32 = 4000;

/// Seam between the pipeline and the language model provider.
pub trait ChatClient: Send + Sync {
    /// Plain text completion: system prompt + user prompt → model output.
    fn complete(&self, system: &str, user: &str) -> Result<String, StructuringError>;

    /// Vision completion: one prompt plus inline base64 data URIs, all
    /// images in a single request.
    fn complete_with_images(
        &self,
        prompt: &str,
        image_data_uris: &[String],
    ) -> Result<String, StructuringError>;
}

/// Production client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    chat_model: String,
    vision_model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        chat_model: &str,
        vision_model: &str,
        timeout_secs: u64,
    ) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            chat_model: chat_model.to_string(),
            vision_model: vision_model.to_string(),
            client,
            timeout_secs,
        }
    }

    /// Build from settings; `None` when no API key is configured.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        settings.openai_api_key.as_deref().map(|key| {
            Self::new(
                &settings.openai_base_url,
                key,
                &settings.chat_model,
                &settings.vision_model,
                settings.llm_timeout_secs,
            )
        })
    }

    fn post_chat(&self, body: &ChatRequest<'_>) -> Result<String, StructuringError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    StructuringError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    StructuringError::Timeout(self.timeout_secs)
                } else {
                    StructuringError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StructuringError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| StructuringError::ResponseParsing(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(StructuringError::EmptyResponse);
        }

        Ok(content)
    }
}

impl ChatClient for OpenAiClient {
    fn complete(&self, system: &str, user: &str) -> Result<String, StructuringError> {
        let _span = tracing::info_span!("chat_complete", model = %self.chat_model).entered();
        let start = std::time::Instant::now();

        let body = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(system),
                },
                Message {
                    role: "user",
                    content: MessageContent::Text(user),
                },
            ],
            temperature: 0.2,
            max_tokens: None,
        };

        let output = self.post_chat(&body)?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            output_length = output.len(),
            "Chat completion done"
        );

        Ok(output)
    }

    fn complete_with_images(
        &self,
        prompt: &str,
        image_data_uris: &[String],
    ) -> Result<String, StructuringError> {
        let _span = tracing::info_span!(
            "vision_complete",
            model = %self.vision_model,
            images = image_data_uris.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let mut parts = vec![ContentPart::Text { text: prompt }];
        for uri in image_data_uris {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: uri,
                    detail: VISION_DETAIL,
                },
            });
        }

        let body = ChatRequest {
            model: &self.vision_model,
            messages: vec![Message {
                role: "user",
                content: MessageContent::Parts(parts),
            }],
            temperature: 0.1,
            max_tokens: Some(VISION_MAX_TOKENS),
        };

        let output = self.post_chat(&body)?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            output_length = output.len(),
            "Vision completion done"
        );

        Ok(output)
    }
}

// ── Wire types ──────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentPart<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
    detail: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

// ── Mock for testing ──────────────────────────────────────

/// Mock chat client — returns a configured response and records calls.
pub struct MockChatClient {
    response: Result<String, String>,
    calls: AtomicUsize,
    last_user_prompt: Mutex<Option<String>>,
}

impl MockChatClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            calls: AtomicUsize::new(0),
            last_user_prompt: Mutex::new(None),
        }
    }

    /// A client whose every call fails with an API error carrying `body`.
    pub fn failing(body: &str) -> Self {
        Self {
            response: Err(body.to_string()),
            calls: AtomicUsize::new(0),
            last_user_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_user_prompt(&self) -> Option<String> {
        self.last_user_prompt.lock().unwrap().clone()
    }

    fn record(&self, prompt: &str) -> Result<String, StructuringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_user_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(body) => Err(StructuringError::Api {
                status: 503,
                body: body.clone(),
            }),
        }
    }
}

impl ChatClient for MockChatClient {
    fn complete(&self, _system: &str, user: &str) -> Result<String, StructuringError> {
        self.record(user)
    }

    fn complete_with_images(
        &self,
        prompt: &str,
        _image_data_uris: &[String],
    ) -> Result<String, StructuringError> {
        self.record(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_configured_response() {
        let client = MockChatClient::new("<table></table>");
        let result = client.complete("system", "user").unwrap();
        assert_eq!(result, "<table></table>");
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.last_user_prompt().as_deref(), Some("user"));
    }

    #[test]
    fn mock_failing_returns_api_error() {
        let client = MockChatClient::failing("quota exceeded");
        let err = client.complete("s", "u").unwrap_err();
        assert!(matches!(err, StructuringError::Api { status: 503, .. }));
    }

    #[test]
    fn openai_client_trims_trailing_slash() {
        let client = OpenAiClient::new("https://api.openai.com/v1/", "sk-test", "gpt-4o", "gpt-4o", 60);
        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn from_settings_requires_api_key() {
        let mut settings = Settings {
            database_path: "/tmp/x.db".into(),
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".into(),
            chat_model: "gpt-4o".into(),
            vision_model: "gpt-4o".into(),
            tessdata_dir: None,
            raster_dpi: 300,
            llm_timeout_secs: 120,
        };
        assert!(OpenAiClient::from_settings(&settings).is_none());

        settings.openai_api_key = Some("sk-test".into());
        assert!(OpenAiClient::from_settings(&settings).is_some());
    }

    #[test]
    fn vision_request_serializes_content_parts() {
        let parts = vec![
            ContentPart::Text { text: "describe" },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,iVBORw0KGgo=",
                    detail: "high",
                },
            },
        ];
        let body = ChatRequest {
            model: "gpt-4o",
            messages: vec![Message {
                role: "user",
                content: MessageContent::Parts(parts),
            }],
            temperature: 0.1,
            max_tokens: Some(4000),
        };

        let json = serde_json::to_value(&body).unwrap();
        let content = &json["messages"][0]["content"];
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(
            content[1]["image_url"]["url"],
            "data:image/png;base64,iVBORw0KGgo="
        );
        assert_eq!(json["max_tokens"], 4000);
    }

    #[test]
    fn text_request_omits_max_tokens() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: vec![Message {
                role: "system",
                content: MessageContent::Text("s"),
            }],
            temperature: 0.2,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("max_tokens").is_none());
        assert_eq!(json["messages"][0]["content"], "s");
    }
}
