//! Chat-completion client for structured query extraction

use std::time::Duration;

use serde_json::{json, Value};

use crate::config::LlmConfig;
use crate::error::ClassificationError;

/// A chat model that answers a system + user prompt pair with text.
pub trait ChatModel: Send + Sync {
    fn complete(&self, system: &str, user: &str) -> Result<String, ClassificationError>;
}

/// OpenAI-compatible chat completion client
pub struct OpenAiChatModel {
    agent: ureq::Agent,
    api_key: String,
    api_url: String,
    model: String,
    temperature: f64,
}

impl OpenAiChatModel {
    /// Build a client from configuration. Returns `None` without a usable key.
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        let api_key = config.usable_api_key()?.to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build();

        Some(Self {
            agent,
            api_key,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatModel for OpenAiChatModel {
    fn complete(&self, system: &str, user: &str) -> Result<String, ClassificationError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": self.temperature
        });

        let response: Value = self
            .agent
            .post(&format!("{}/chat/completions", self.api_url))
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(body)
            .map_err(|e| ClassificationError::Http(e.to_string()))?
            .into_json()
            .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .filter(|content| !content.trim().is_empty())
            .map(String::from)
            .ok_or(ClassificationError::EmptyResponse)
    }
}

/// Strip a Markdown code fence wrapped around a JSON reply, if present.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
