pub mod prompts;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::LlmSettings;

pub const SQL_SYNTHESIS_TEMPERATURE: f32 = 0.1;
pub const SQL_SYNTHESIS_MAX_TOKENS: u32 = 500;
pub const EXPLANATION_TEMPERATURE: f32 = 0.7;

/// The language-model call failed or produced an unusable completion.
#[derive(Debug, Clone)]
pub struct SynthesisError {
    message: String,
}

impl SynthesisError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SynthesisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SynthesisError {}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Seam to the chat-completion collaborator. Production uses
/// [`OpenAiChatClient`]; tests substitute fixed-output stubs.
pub trait CompletionClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completion client for OpenAI-compatible endpoints. Constructed once
/// at the composition root and injected wherever a [`CompletionClient`] is
/// needed; holds no mutable state.
pub struct OpenAiChatClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(settings: &LlmSettings) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .build()
            .map_err(|error| anyhow::anyhow!("failed to build HTTP client: {error}"))?;
        info!(model = %settings.model, base_url = %settings.base_url, "language model client ready");
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }
}

impl CompletionClient for OpenAiChatClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(model = %self.model, temperature = request.temperature, "requesting completion");
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|error| {
                SynthesisError::new(format!("language model request failed: {error}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            let detail = detail.trim();
            return Err(SynthesisError::new(if detail.is_empty() {
                format!("language model request rejected with status {status}")
            } else {
                format!("language model request rejected with status {status}: {detail}")
            }));
        }

        let parsed: ChatCompletionResponse = response.json().map_err(|error| {
            SynthesisError::new(format!("failed to decode completion response: {error}"))
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| SynthesisError::new("language model returned an empty completion"))
    }
}

/// Turns one natural-language question into exactly one candidate SQL
/// statement. One completion per question; no retry, no fallback model, no
/// caching of prompt/SQL pairs.
pub struct SqlSynthesizer<'a> {
    client: &'a dyn CompletionClient,
}

impl<'a> SqlSynthesizer<'a> {
    #[must_use]
    pub fn new(client: &'a dyn CompletionClient) -> Self {
        Self { client }
    }

    pub fn synthesize(&self, question: &str) -> Result<String, SynthesisError> {
        let request = CompletionRequest {
            system_prompt: prompts::sql_generation_system_prompt(),
            user_prompt: prompts::nl_query_prompt(question),
            temperature: SQL_SYNTHESIS_TEMPERATURE,
            max_tokens: SQL_SYNTHESIS_MAX_TOKENS,
        };
        let completion = self.client.complete(&request)?;

        let sql = prompts::extract_sql(&completion);
        if sql.is_empty() {
            return Err(SynthesisError::new(
                "language model completion contained no SQL statement",
            ));
        }
        debug!(sql = %sql, "synthesized SQL");
        Ok(sql)
    }

    pub fn explain(&self, question: &str, rows: &[Value]) -> Result<String, SynthesisError> {
        let request = CompletionRequest {
            system_prompt: prompts::sql_generation_system_prompt(),
            user_prompt: prompts::data_explanation_prompt(question, rows),
            temperature: EXPLANATION_TEMPERATURE,
            max_tokens: SQL_SYNTHESIS_MAX_TOKENS,
        };
        let explanation = self.client.complete(&request)?;
        Ok(explanation.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CompletionClient, CompletionRequest, SQL_SYNTHESIS_MAX_TOKENS, SQL_SYNTHESIS_TEMPERATURE,
        SqlSynthesizer, SynthesisError,
    };

    struct FixedClient(&'static str);

    impl CompletionClient for FixedClient {
        fn complete(&self, _request: &CompletionRequest) -> Result<String, SynthesisError> {
            Ok(self.0.to_string())
        }
    }

    struct RecordingClient(std::cell::RefCell<Vec<CompletionRequest>>);

    impl CompletionClient for RecordingClient {
        fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
            self.0.borrow_mut().push(request.clone());
            Ok("SELECT 1".to_string())
        }
    }

    #[test]
    fn synthesizer_strips_markdown_decoration() {
        let client = FixedClient("```sql\nSELECT region FROM sales;\n```");
        let synthesizer = SqlSynthesizer::new(&client);
        let sql = synthesizer
            .synthesize("sales regions")
            .expect("synthesis should succeed");
        assert_eq!(sql, "SELECT region FROM sales;");
    }

    #[test]
    fn synthesizer_rejects_prose_only_completions() {
        let client = FixedClient("I cannot answer that with the available tables.");
        let synthesizer = SqlSynthesizer::new(&client);
        let error = synthesizer
            .synthesize("what color is the sky")
            .expect_err("prose completion must fail synthesis");
        assert!(error.message().contains("no SQL statement"));
    }

    #[test]
    fn synthesis_uses_low_temperature_and_bounded_output() {
        let client = RecordingClient(std::cell::RefCell::new(Vec::new()));
        let synthesizer = SqlSynthesizer::new(&client);
        synthesizer
            .synthesize("count sales")
            .expect("synthesis should succeed");

        let requests = client.0.borrow();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!((request.temperature - SQL_SYNTHESIS_TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, SQL_SYNTHESIS_MAX_TOKENS);
        assert!(request.user_prompt.contains("count sales"));
        assert!(request.system_prompt.contains("vehicles"));
    }
}
