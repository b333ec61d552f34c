//! Entity and intent extraction
//!
//! Turns raw question text into a [`QueryUnderstanding`]. Local pattern
//! matching always runs and is the load-bearing path; the language model,
//! when configured, only enriches it. Any model failure downgrades that
//! single question to the local result.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::ClassificationError;
use crate::llm::{strip_code_fence, ChatModel};
use crate::models::*;
use crate::patterns::{contains_any, find_addresses, find_aliases};
use crate::registry::AliasRegistry;
use crate::resolver::NameResolver;

const DIRECT_ADDRESS_CONFIDENCE: f64 = 0.95;
const RESOLVED_ALIAS_CONFIDENCE: f64 = 0.9;
const UNRESOLVED_ALIAS_CONFIDENCE: f64 = 0.5;

const SYSTEM_PROMPT: &str = "You are an expert blockchain data analyst. Analyze the user's natural language query and extract:

1. Intent classification (wallet_analysis, token_analytics, contract_intelligence, defi_operations, cross_chain_analysis)
2. Entities (addresses, tokens, protocols, timeframes, metrics)
3. Query complexity (simple, medium, complex)
4. Whether cross-API data correlation is needed

Return only a structured JSON response with your analysis.";

/// How questions are understood, chosen once at construction.
#[derive(Clone)]
pub enum ExtractionMode {
    /// Model-backed extraction layered over local matching
    Ai(Arc<dyn ChatModel>),
    /// Local pattern matching only
    Fallback,
}

impl std::fmt::Debug for ExtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ai(_) => f.write_str("Ai"),
            Self::Fallback => f.write_str("Fallback"),
        }
    }
}

// =============================================================================
// Model reply
// =============================================================================

#[derive(Debug, Deserialize)]
struct ModelAnalysis {
    intent: String,
    #[serde(default)]
    entities: Vec<ModelEntity>,
    #[serde(default)]
    timeframe: Option<String>,
    #[serde(default)]
    metrics: Vec<String>,
    #[serde(default)]
    complexity: Option<String>,
    #[serde(default)]
    requires_correlation: bool,
}

#[derive(Debug, Deserialize)]
struct ModelEntity {
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    value: String,
    #[serde(default = "default_model_confidence")]
    confidence: f64,
}

fn default_model_confidence() -> f64 {
    0.5
}

// =============================================================================
// Extractor
// =============================================================================

pub struct Extractor {
    mode: ExtractionMode,
    aliases: Arc<AliasRegistry>,
    resolver: Option<Arc<dyn NameResolver>>,
}

impl Extractor {
    pub fn new(mode: ExtractionMode, aliases: Arc<AliasRegistry>) -> Self {
        Self {
            mode,
            aliases,
            resolver: None,
        }
    }

    /// Enable network lookup for aliases missing from the registry
    pub fn with_resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn is_ai_enabled(&self) -> bool {
        matches!(self.mode, ExtractionMode::Ai(_))
    }

    /// Understand a question. Never fails: model problems fall back to
    /// local matching for this question.
    pub fn understand(&self, text: &str) -> QueryUnderstanding {
        match self.classify_with_model(text) {
            Ok(understanding) => understanding,
            Err(ClassificationError::ModelUnavailable) => self.understand_locally(text),
            Err(e) => {
                tracing::warn!(error = %e, "Model extraction failed, using pattern matching");
                self.understand_locally(text)
            }
        }
    }

    /// Model-backed understanding. Model entities come first, followed by
    /// every locally extracted entity.
    pub fn classify_with_model(&self, text: &str) -> Result<QueryUnderstanding, ClassificationError> {
        let ExtractionMode::Ai(model) = &self.mode else {
            return Err(ClassificationError::ModelUnavailable);
        };

        let reply = model.complete(SYSTEM_PROMPT, &user_prompt(text))?;
        let analysis: ModelAnalysis = serde_json::from_str(strip_code_fence(&reply))
            .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

        let intent = Intent::from_label(&analysis.intent)
            .ok_or_else(|| ClassificationError::UnsupportedIntent(analysis.intent.clone()))?;

        let mut entities: Vec<ExtractedEntity> = analysis
            .entities
            .into_iter()
            .filter_map(|e| {
                let kind = EntityKind::from_label(&e.kind)?;
                ExtractedEntity::new(kind, e.value.trim(), e.confidence)
            })
            .collect();
        entities.extend(self.extract_entities(text));

        let understanding = QueryUnderstanding {
            intent,
            entities,
            timeframe: analysis
                .timeframe
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("null")),
            metrics: analysis
                .metrics
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            complexity: analysis
                .complexity
                .as_deref()
                .map(Complexity::from_label)
                .unwrap_or_default(),
            requires_correlation: analysis.requires_correlation,
        };

        tracing::debug!(
            intent = ?understanding.intent,
            entities = understanding.entities.len(),
            "Model extraction succeeded"
        );

        Ok(understanding)
    }

    /// Deterministic understanding from keywords and patterns only
    pub fn understand_locally(&self, text: &str) -> QueryUnderstanding {
        QueryUnderstanding {
            intent: keyword_intent(text),
            entities: self.extract_entities(text),
            timeframe: None,
            metrics: BTreeSet::new(),
            complexity: Complexity::Simple,
            requires_correlation: false,
        }
    }

    /// Hex addresses first, then alias candidates, each in order of appearance
    pub fn extract_entities(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut entities: Vec<ExtractedEntity> = find_addresses(text)
            .filter_map(|a| ExtractedEntity::new(EntityKind::Address, a, DIRECT_ADDRESS_CONFIDENCE))
            .collect();

        for alias in find_aliases(text) {
            let resolved = self
                .resolve_alias(alias)
                .and_then(|a| ExtractedEntity::new(EntityKind::Address, a, RESOLVED_ALIAS_CONFIDENCE));
            match resolved {
                Some(address) => {
                    entities.push(address);
                    entities.push(ExtractedEntity::alias(alias, RESOLVED_ALIAS_CONFIDENCE));
                }
                None => entities.push(ExtractedEntity::alias(alias, UNRESOLVED_ALIAS_CONFIDENCE)),
            }
        }

        entities
    }

    /// Registry first, then the network resolver if one is configured
    pub fn resolve_alias(&self, name: &str) -> Option<String> {
        if let Some(address) = self.aliases.lookup(name) {
            return Some(address.to_string());
        }

        let resolver = self.resolver.as_ref()?;
        match resolver.resolve(name) {
            Ok(address) => Some(address),
            Err(e) => {
                tracing::warn!(alias = %name, error = %e, "Alias resolution failed");
                None
            }
        }
    }
}

fn user_prompt(text: &str) -> String {
    format!(
        r#"Analyze this blockchain query: "{}"

Consider these aspects:
- What type of blockchain data is being requested?
- What specific entities (addresses, tokens, protocols) are mentioned?
- What timeframe is specified or implied?
- What metrics or calculations are needed?
- Does this require data from multiple sources?

Provide your analysis in this JSON format:
{{
    "intent": "wallet_analysis|token_analytics|contract_intelligence|defi_operations|cross_chain_analysis",
    "entities": [
        {{"type": "address|token|protocol|timeframe|metric", "value": "extracted_value", "confidence": 0.0}}
    ],
    "timeframe": "extracted_timeframe_or_null",
    "metrics": ["list", "of", "requested", "metrics"],
    "complexity": "simple|medium|complex",
    "requires_correlation": false
}}"#,
        text
    )
}

/// Ordered keyword test used when the model is unavailable
pub fn keyword_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();
    if contains_any(&lower, &["balance", "wallet", "holdings"]) {
        Intent::WalletAnalysis
    } else if contains_any(&lower, &["token", "price", "volume"]) {
        Intent::TokenAnalytics
    } else if contains_any(&lower, &["defi", "liquidity", "yield", "apy"]) {
        Intent::DefiOperations
    } else {
        Intent::WalletAnalysis
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ResolveError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) const VITALIK: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    /// Chat model returning a canned reply
    pub(crate) struct StubModel {
        reply: Result<String, String>,
        pub calls: AtomicUsize,
    }

    impl StubModel {
        pub(crate) fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ChatModel for StubModel {
        fn complete(&self, _system: &str, _user: &str) -> Result<String, ClassificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map_err(ClassificationError::Http)
        }
    }

    struct StubResolver;

    impl NameResolver for StubResolver {
        fn resolve(&self, name: &str) -> Result<String, ResolveError> {
            match name {
                "nick.eth" => Ok("0xb8c2C29ee19D8307cb7255e1Cd9CbDE883A267d5".to_string()),
                "broken.eth" => Ok("not-an-address".to_string()),
                _ => Err(ResolveError::Http("connection refused".to_string())),
            }
        }
    }

    fn fallback() -> Extractor {
        Extractor::new(ExtractionMode::Fallback, Arc::new(AliasRegistry::builtin()))
    }

    fn with_model(model: StubModel) -> Extractor {
        Extractor::new(ExtractionMode::Ai(Arc::new(model)), Arc::new(AliasRegistry::builtin()))
    }

    #[test]
    fn test_extract_hex_address() {
        let entities = fallback().extract_entities("balance of 0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b?");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].kind, EntityKind::Address);
        assert_eq!(entities[0].value, "0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b");
        assert_eq!(entities[0].confidence, DIRECT_ADDRESS_CONFIDENCE);
    }

    #[test]
    fn test_known_alias_yields_address_then_alias() {
        let entities = fallback().extract_entities("What does Vitalik.eth hold?");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].kind, EntityKind::Address);
        assert_eq!(entities[0].value, VITALIK);
        assert_eq!(entities[1].kind, EntityKind::Alias);
        assert_eq!(entities[1].value, "Vitalik.eth");
    }

    #[test]
    fn test_unknown_alias_never_becomes_address() {
        let entities = fallback().extract_entities("holdings of someone.crypto");
        assert_eq!(entities, vec![ExtractedEntity::alias("someone.crypto", 0.5)]);
    }

    #[test]
    fn test_resolver_used_after_registry() {
        let extractor = fallback().with_resolver(Arc::new(StubResolver));

        assert_eq!(extractor.resolve_alias("vitalik.eth").as_deref(), Some(VITALIK));
        assert_eq!(
            extractor.resolve_alias("nick.eth").as_deref(),
            Some("0xb8c2C29ee19D8307cb7255e1Cd9CbDE883A267d5")
        );
        assert_eq!(extractor.resolve_alias("offline.eth"), None);

        // Resolver answers that are not addresses stay unresolved
        let entities = extractor.extract_entities("wallet broken.eth");
        assert_eq!(entities, vec![ExtractedEntity::alias("broken.eth", 0.5)]);
    }

    #[test]
    fn test_keyword_intent_order() {
        assert_eq!(keyword_intent("wallet token price"), Intent::WalletAnalysis);
        assert_eq!(keyword_intent("PEPE price today"), Intent::TokenAnalytics);
        assert_eq!(keyword_intent("best APY for stables"), Intent::DefiOperations);
        assert_eq!(keyword_intent("who deployed this?"), Intent::WalletAnalysis);
    }

    #[test]
    fn test_local_understanding_defaults() {
        let understanding = fallback().understand("liquidity of vitalik.eth");
        assert_eq!(understanding.intent, Intent::DefiOperations);
        assert_eq!(understanding.complexity, Complexity::Simple);
        assert!(understanding.timeframe.is_none());
        assert!(understanding.metrics.is_empty());
        assert!(!understanding.requires_correlation);
        assert_eq!(understanding.first_address(), Some(VITALIK));
    }

    #[test]
    fn test_model_entities_precede_local_ones() {
        let extractor = with_model(StubModel::replying(
            r#"```json
            {
                "intent": "token_analytics",
                "entities": [
                    {"type": "token", "value": "PEPE", "confidence": 0.8},
                    {"type": "protocol", "value": "uniswap", "confidence": 0.7},
                    {"type": "address", "value": "0xnope", "confidence": 0.9}
                ],
                "timeframe": "24h",
                "metrics": ["Volume"],
                "complexity": "medium",
                "requires_correlation": true
            }
            ```"#,
        ));

        let understanding = extractor
            .classify_with_model("PEPE volume for vitalik.eth in 24h")
            .unwrap();

        assert_eq!(understanding.intent, Intent::TokenAnalytics);
        let kinds: Vec<EntityKind> = understanding.entities.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntityKind::TokenSymbol, EntityKind::Address, EntityKind::Alias]
        );
        assert_eq!(understanding.timeframe.as_deref(), Some("24h"));
        assert!(understanding.has_metric("volume"));
        assert_eq!(understanding.complexity, Complexity::Medium);
        assert!(understanding.requires_correlation);
    }

    #[test]
    fn test_model_null_timeframe_and_missing_fields() {
        let extractor = with_model(StubModel::replying(
            r#"{"intent": "wallet_analysis", "timeframe": "null"}"#,
        ));
        let understanding = extractor.classify_with_model("anything").unwrap();
        assert!(understanding.timeframe.is_none());
        assert!(understanding.entities.is_empty());
        assert_eq!(understanding.complexity, Complexity::Simple);
    }

    #[test]
    fn test_model_failures_are_classified() {
        let err = with_model(StubModel::replying("I think it's about wallets"))
            .classify_with_model("x")
            .unwrap_err();
        assert!(matches!(err, ClassificationError::MalformedResponse(_)));

        let err = with_model(StubModel::replying(r#"{"intent": "nft_minting"}"#))
            .classify_with_model("x")
            .unwrap_err();
        assert!(matches!(err, ClassificationError::UnsupportedIntent(ref i) if i == "nft_minting"));

        let err = with_model(StubModel::failing("timeout"))
            .classify_with_model("x")
            .unwrap_err();
        assert!(matches!(err, ClassificationError::Http(_)));

        let err = fallback().classify_with_model("x").unwrap_err();
        assert!(matches!(err, ClassificationError::ModelUnavailable));
    }

    #[test]
    fn test_understand_degrades_on_model_failure() {
        let extractor = with_model(StubModel::failing("401 Unauthorized"));
        let understanding = extractor.understand("token volume of vitalik.eth");

        assert_eq!(understanding, fallback().understand_locally("token volume of vitalik.eth"));
        assert_eq!(understanding.intent, Intent::TokenAnalytics);
    }

    #[test]
    fn test_every_call_reaches_the_model() {
        let model = Arc::new(StubModel::replying(r#"{"intent": "wallet_analysis"}"#));
        let extractor = Extractor::new(
            ExtractionMode::Ai(model.clone()),
            Arc::new(AliasRegistry::builtin()),
        );

        extractor.understand("same question");
        extractor.understand("same question");
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }
}
