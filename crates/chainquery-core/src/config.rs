//! Configuration for the query pipeline
//!
//! Read once at startup. A missing model key selects the deterministic
//! path for the lifetime of the process.

use serde::Deserialize;

use crate::error::ChainQueryResult;

const PLACEHOLDER_KEYS: [&str; 2] = ["your_openai_api_key_here", "changeme"];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainQueryConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Language model configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API key; absent means no model calls
    #[serde(default = "default_llm_api_key")]
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: default_llm_api_key(),
            api_url: default_llm_api_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_seconds: default_llm_timeout(),
        }
    }
}

impl LlmConfig {
    /// The API key, if it is set to something other than a placeholder
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(k))
    }
}

fn default_llm_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok()
}

fn default_llm_api_url() -> String {
    std::env::var("OPENAI_API_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f64 {
    0.1
}

fn default_llm_timeout() -> u64 {
    30
}

/// Network name resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of a name resolution service; absent disables network lookup
    #[serde(default = "default_resolver_api_url")]
    pub api_url: Option<String>,
    #[serde(default = "default_resolver_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "default_resolver_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            api_url: default_resolver_api_url(),
            api_key: default_resolver_api_key(),
            timeout_seconds: default_resolver_timeout(),
        }
    }
}

impl ResolverConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

fn default_resolver_api_url() -> Option<String> {
    std::env::var("ENS_RESOLVER_URL").ok()
}

fn default_resolver_api_key() -> Option<String> {
    std::env::var("ALCHEMY_API_KEY").ok()
}

fn default_resolver_timeout() -> u64 {
    10
}

impl ChainQueryConfig {
    /// Load configuration from file and environment
    pub fn load() -> ChainQueryResult<Self> {
        let settings = config::Config::builder()
            .set_default("llm.api_url", default_llm_api_url())?
            .set_default("llm.model", default_model())?
            .set_default("llm.temperature", default_temperature())?
            .set_default("llm.timeout_seconds", default_llm_timeout() as i64)?
            .set_default("resolver.timeout_seconds", default_resolver_timeout() as i64)?
            // Load from file if present
            .add_source(config::File::with_name("chainquery").required(false))
            // Override with environment variables (CHAINQUERY__LLM__MODEL, etc.)
            .add_source(
                config::Environment::with_prefix("CHAINQUERY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Configuration with no model and no network resolver
    pub fn offline() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                ..LlmConfig::default()
            },
            resolver: ResolverConfig {
                api_url: None,
                api_key: None,
                timeout_seconds: default_resolver_timeout(),
            },
        }
    }
}
