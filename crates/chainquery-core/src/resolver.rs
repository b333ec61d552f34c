//! Network name resolution
//!
//! Best-effort lookup for aliases missing from the built-in registry.

use std::time::Duration;

use serde_json::Value;

use crate::config::ResolverConfig;
use crate::error::ResolveError;
use crate::patterns::is_valid_address;

/// Resolves a human-readable name to an address over the network.
pub trait NameResolver: Send + Sync {
    fn resolve(&self, name: &str) -> Result<String, ResolveError>;
}

/// HTTP resolver: `GET {api_url}/{name}` answering `{"address": "0x..."}`
pub struct HttpNameResolver {
    agent: ureq::Agent,
    api_url: String,
    api_key: Option<String>,
}

impl HttpNameResolver {
    /// Returns `None` when no resolver URL is configured
    pub fn from_config(config: &ResolverConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let api_url = config.api_url.as_deref()?.trim().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build();

        Some(Self {
            agent,
            api_url,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }
}

impl NameResolver for HttpNameResolver {
    fn resolve(&self, name: &str) -> Result<String, ResolveError> {
        let url = format!("{}/{}", self.api_url, name.to_lowercase());
        let mut request = self.agent.get(&url);
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let body: Value = match request.call() {
            Ok(response) => response
                .into_json()
                .map_err(|e| ResolveError::Http(e.to_string()))?,
            Err(ureq::Error::Status(404, _)) => return Err(ResolveError::NotFound(name.to_string())),
            Err(e) => return Err(ResolveError::Http(e.to_string())),
        };

        let address = body["address"]
            .as_str()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;

        if is_valid_address(address) {
            Ok(address.to_string())
        } else {
            Err(ResolveError::InvalidAddress(address.to_string()))
        }
    }
}
