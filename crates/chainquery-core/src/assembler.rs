//! Query assembly
//!
//! Picks one of the four endpoint templates for a question and fills in
//! its parameters. With a model configured the extractor's understanding
//! drives the choice; otherwise, or when the model path fails for a given
//! question, a self-contained keyword classifier does.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use crate::config::ChainQueryConfig;
use crate::extractor::{ExtractionMode, Extractor};
use crate::llm::OpenAiChatModel;
use crate::models::*;
use crate::patterns::{contains_any, ADDRESS_PATTERN, ENS_PATTERN};
use crate::registry::{AliasRegistry, TokenRegistry};
use crate::resolver::HttpNameResolver;

const CHAIN: &str = "eth";
const HISTORY_LIMIT: u64 = 10;
const FROM_DATE: &str = "2024-01-01";
const TO_DATE: &str = "2024-01-02";

const ADDR_OR_ENS: &str = r"(?:0x[a-fA-F0-9]{39,42}|[a-zA-Z0-9-]+\.eth)";

/// Secondary classification table, tried in order once keywords miss
static CATEGORY_PATTERNS: LazyLock<Vec<(Category, Regex)>> = LazyLock::new(|| {
    let table = [
        (
            Category::Balance,
            format!(r"balance.*{a}|{a}.*balance", a = ADDR_OR_ENS),
        ),
        (
            Category::Transactions,
            format!(
                r"transaction.*{a}|{a}.*transaction|history.*{a}",
                a = ADDR_OR_ENS
            ),
        ),
        (
            Category::ContractInteractions,
            format!(r"interact.*{a}|{a}.*interact", a = ADDR_OR_ENS),
        ),
        (Category::TokenVolume, r"volume.*token.*(\w+)|token.*volume".to_string()),
    ];

    table
        .into_iter()
        .map(|(category, pattern)| {
            let regex = Regex::new(&format!("(?i){}", pattern)).expect("Invalid regex");
            (category, regex)
        })
        .collect()
});

/// Turns questions into request descriptors
pub struct QueryAssembler {
    extractor: Extractor,
    aliases: Arc<AliasRegistry>,
    tokens: Arc<TokenRegistry>,
}

impl QueryAssembler {
    pub fn new(extractor: Extractor, aliases: Arc<AliasRegistry>, tokens: Arc<TokenRegistry>) -> Self {
        Self {
            extractor,
            aliases,
            tokens,
        }
    }

    /// Deterministic assembler over the built-in registries
    pub fn offline() -> Self {
        let aliases = Arc::new(AliasRegistry::builtin());
        let extractor = Extractor::new(ExtractionMode::Fallback, aliases.clone());
        Self::new(extractor, aliases, Arc::new(TokenRegistry::builtin()))
    }

    /// Build the pipeline from configuration. The mode is fixed here for
    /// the lifetime of the assembler.
    pub fn from_config(config: &ChainQueryConfig) -> Self {
        let aliases = Arc::new(AliasRegistry::builtin());

        let mode = match OpenAiChatModel::from_config(&config.llm) {
            Some(model) => {
                tracing::info!(model = %model.model(), "Model-assisted query understanding enabled");
                ExtractionMode::Ai(Arc::new(model))
            }
            None => {
                tracing::info!("No model API key configured, using pattern matching");
                ExtractionMode::Fallback
            }
        };

        let mut extractor = Extractor::new(mode, aliases.clone());
        if let Some(resolver) = HttpNameResolver::from_config(&config.resolver) {
            tracing::info!("Network alias resolution enabled");
            extractor = extractor.with_resolver(Arc::new(resolver));
        }

        Self::new(extractor, aliases, Arc::new(TokenRegistry::builtin()))
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn is_ai_enabled(&self) -> bool {
        self.extractor.is_ai_enabled()
    }

    /// Build the request descriptor for a question.
    ///
    /// Returns `None` when no category fits, or when the question names no
    /// address. A token volume question may name a known ticker instead.
    pub fn build_query(&self, text: &str) -> Option<RequestDescriptor> {
        if text.trim().is_empty() {
            return None;
        }

        let ticker = self.extract_token_symbol(text).is_some();
        let (category, address, has_token) = if self.is_ai_enabled() {
            match self.extractor.classify_with_model(text) {
                Ok(understanding) => {
                    let category = self.category_from_understanding(&understanding, text);
                    (
                        Some(category),
                        understanding.first_address().map(String::from),
                        understanding.has_token() || ticker,
                    )
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Model classification failed, falling back to pattern matching");
                    (self.classify_prompt(text), self.extract_address(text), ticker)
                }
            }
        } else {
            (self.classify_prompt(text), self.extract_address(text), ticker)
        };

        let Some(category) = category else {
            tracing::debug!("No category matched");
            return None;
        };
        let token_subject = category.accepts_token_subject() && has_token;
        if address.is_none() && !token_subject {
            tracing::debug!(category = ?category, "No address or token found");
            return None;
        }

        tracing::debug!(category = ?category, "Query classified");
        Some(self.populate(category, address.as_deref().unwrap_or_default(), text))
    }

    /// Category from a model understanding. Requested transaction history
    /// overrides the intent mapping.
    fn category_from_understanding(&self, understanding: &QueryUnderstanding, text: &str) -> Category {
        if understanding.has_metric("transactions") || understanding.has_metric("history") {
            return Category::Transactions;
        }
        understanding
            .intent
            .category()
            .unwrap_or_else(|| guess_category(text))
    }

    /// Keyword classification in priority order, then the pattern table
    pub fn classify_prompt(&self, text: &str) -> Option<Category> {
        let lower = text.to_lowercase();

        if lower.contains("balance") {
            return Some(Category::Balance);
        }
        if contains_any(&lower, &["transaction", "history", "tx"]) {
            return Some(Category::Transactions);
        }
        if contains_any(&lower, &["interact", "contract", "call"]) {
            return Some(Category::ContractInteractions);
        }
        if contains_any(&lower, &["volume", "transfer"]) {
            return Some(Category::TokenVolume);
        }

        CATEGORY_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(category, _)| *category)
    }

    /// First hex address in the text, else the first `.eth` name if the
    /// registry knows it. No network lookup.
    pub fn extract_address(&self, text: &str) -> Option<String> {
        if let Some(m) = ADDRESS_PATTERN.find(text) {
            return Some(m.as_str().to_string());
        }

        let name = ENS_PATTERN.captures(text)?.get(1)?.as_str();
        self.aliases.lookup(name).map(String::from)
    }

    pub fn extract_token_symbol(&self, text: &str) -> Option<&str> {
        self.tokens.find_symbol(text)
    }

    /// Contract address for a ticker; empty when the ticker is unknown
    pub fn token_address(&self, symbol: &str) -> String {
        self.tokens.address_of(symbol)
    }

    fn populate(&self, category: Category, address: &str, text: &str) -> RequestDescriptor {
        let mut params: BTreeMap<String, Value> = BTreeMap::new();
        params.insert("chain".to_string(), Value::from(CHAIN));

        match category {
            Category::Balance => {
                params.insert("address".to_string(), Value::from(address));
            }
            Category::Transactions => {
                params.insert("address".to_string(), Value::from(address));
                params.insert("limit".to_string(), Value::from(HISTORY_LIMIT));
            }
            Category::ContractInteractions => {
                params.insert("address".to_string(), Value::from(address));
                params.insert("from_date".to_string(), Value::from(FROM_DATE));
            }
            Category::TokenVolume => {
                let contract = self
                    .extract_token_symbol(text)
                    .map(|symbol| self.token_address(symbol))
                    .unwrap_or_default();
                if contract.is_empty() {
                    tracing::warn!("Token volume query without a known token, contract address left empty");
                }
                params.insert("contract_address".to_string(), Value::from(contract));
                params.insert("from_date".to_string(), Value::from(FROM_DATE));
                params.insert("to_date".to_string(), Value::from(TO_DATE));
            }
        }

        RequestDescriptor {
            endpoint: category.endpoint(),
            method: Method::Get,
            params,
        }
    }
}

/// Category guess for intents with no direct mapping
fn guess_category(text: &str) -> Category {
    let lower = text.to_lowercase();
    if contains_any(&lower, &["balance", "wallet"]) {
        Category::Balance
    } else if contains_any(&lower, &["transaction", "history"]) {
        Category::Transactions
    } else if contains_any(&lower, &["interact", "contract"]) {
        Category::ContractInteractions
    } else if contains_any(&lower, &["volume", "token"]) {
        Category::TokenVolume
    } else {
        Category::Balance
    }
}
