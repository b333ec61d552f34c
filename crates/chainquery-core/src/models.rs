//! Data model for query understanding
//!
//! These types carry a question from raw text to the request descriptor
//! handed to the API executor. Everything here is constructed once per
//! query and never mutated afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patterns::is_valid_address;

// =============================================================================
// Entities
// =============================================================================

/// Kind of an entity found in a question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Address,
    Alias,
    TokenSymbol,
    Timeframe,
    Metric,
}

impl EntityKind {
    /// Normalize an entity type label as emitted by the language model.
    ///
    /// Labels outside the taxonomy (e.g. "protocol") yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "address" => Some(Self::Address),
            "alias" | "ens" | "ens_name" => Some(Self::Alias),
            "token" | "token_symbol" => Some(Self::TokenSymbol),
            "timeframe" => Some(Self::Timeframe),
            "metric" => Some(Self::Metric),
            _ => None,
        }
    }
}

/// A typed value extracted from a question
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtractedEntity {
    pub kind: EntityKind,

    /// Raw value. For `Address` entities this is always a 0x-prefixed
    /// run of 39 to 42 hex characters.
    pub value: String,

    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl ExtractedEntity {
    /// Build an entity, clamping confidence into [0, 1].
    ///
    /// Returns `None` for an `Address` whose value is not a well-formed
    /// hex address.
    pub fn new(kind: EntityKind, value: impl Into<String>, confidence: f64) -> Option<Self> {
        let value = value.into();
        if kind == EntityKind::Address && !is_valid_address(&value) {
            return None;
        }
        Some(Self {
            kind,
            value,
            confidence: normalize_confidence(confidence),
        })
    }

    pub fn alias(value: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind: EntityKind::Alias,
            value: value.into(),
            confidence: normalize_confidence(confidence),
        }
    }
}

fn normalize_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

// =============================================================================
// Understanding
// =============================================================================

/// Coarse category of information the user is asking for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    WalletAnalysis,
    TokenAnalytics,
    ContractIntelligence,
    DefiOperations,
    CrossChainAnalysis,
}

impl Intent {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "wallet_analysis" => Some(Self::WalletAnalysis),
            "token_analytics" => Some(Self::TokenAnalytics),
            "contract_intelligence" => Some(Self::ContractIntelligence),
            "defi_operations" => Some(Self::DefiOperations),
            "cross_chain_analysis" => Some(Self::CrossChainAnalysis),
            _ => None,
        }
    }

    /// Category selected for this intent, if any.
    pub fn category(self) -> Option<Category> {
        match self {
            Self::WalletAnalysis => Some(Category::Balance),
            Self::TokenAnalytics => Some(Category::TokenVolume),
            Self::ContractIntelligence => Some(Category::ContractInteractions),
            Self::DefiOperations | Self::CrossChainAnalysis => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    #[default]
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "complex" => Self::Complex,
            "medium" => Self::Medium,
            _ => Self::Simple,
        }
    }
}

/// Structured understanding of a single question
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryUnderstanding {
    pub intent: Intent,

    /// Entities in discovery order
    pub entities: Vec<ExtractedEntity>,

    pub timeframe: Option<String>,

    /// Requested metrics (e.g. "transactions", "volume")
    pub metrics: BTreeSet<String>,

    pub complexity: Complexity,

    /// Whether answering needs data from more than one source
    pub requires_correlation: bool,
}

impl QueryUnderstanding {
    /// First address entity in discovery order
    pub fn first_address(&self) -> Option<&str> {
        self.entities
            .iter()
            .find(|e| e.kind == EntityKind::Address)
            .map(|e| e.value.as_str())
    }

    pub fn has_metric(&self, metric: &str) -> bool {
        self.metrics.contains(metric)
    }

    pub fn has_token(&self) -> bool {
        self.entities.iter().any(|e| e.kind == EntityKind::TokenSymbol)
    }
}

// =============================================================================
// Request Descriptor
// =============================================================================

/// Internal label used to pick an endpoint template
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Balance,
    Transactions,
    ContractInteractions,
    TokenVolume,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Balance,
        Category::Transactions,
        Category::ContractInteractions,
        Category::TokenVolume,
    ];

    pub fn endpoint(self) -> Endpoint {
        match self {
            Self::Balance => Endpoint::WalletBalance,
            Self::Transactions => Endpoint::WalletHistory,
            Self::ContractInteractions => Endpoint::ContractLogs,
            Self::TokenVolume => Endpoint::TokenTransfers,
        }
    }

    /// Whether a token ticker can stand in for an address as the subject
    /// of the question
    pub fn accepts_token_subject(self) -> bool {
        matches!(self, Self::TokenVolume)
    }
}

/// Downstream API endpoint identifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    WalletBalance,
    WalletHistory,
    ContractLogs,
    TokenTransfers,
}

impl Endpoint {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WalletBalance => "wallet_balance",
            Self::WalletHistory => "wallet_history",
            Self::ContractLogs => "contract_logs",
            Self::TokenTransfers => "token_transfers",
        }
    }

    /// Parameter keys every request to this endpoint carries
    pub fn param_keys(self) -> &'static [&'static str] {
        match self {
            Self::WalletBalance => &["chain", "address"],
            Self::WalletHistory => &["chain", "address", "limit"],
            Self::ContractLogs => &["chain", "address", "from_date"],
            Self::TokenTransfers => &["chain", "contract_address", "from_date", "to_date"],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    #[serde(rename = "GET")]
    Get,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
        }
    }
}

/// A fully parameterized downstream API call.
///
/// This is the only object handed to the API executor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestDescriptor {
    pub endpoint: Endpoint,
    pub method: Method,
    pub params: BTreeMap<String, Value>,
}

impl RequestDescriptor {
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Whether `params` holds exactly the endpoint's template keys
    pub fn matches_template(&self) -> bool {
        let expected = self.endpoint.param_keys();
        self.params.len() == expected.len() && expected.iter().all(|k| self.params.contains_key(*k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_labels() {
        assert_eq!(EntityKind::from_label("address"), Some(EntityKind::Address));
        assert_eq!(EntityKind::from_label("ens_name"), Some(EntityKind::Alias));
        assert_eq!(EntityKind::from_label("Token"), Some(EntityKind::TokenSymbol));
        assert_eq!(EntityKind::from_label("protocol"), None);
    }

    #[test]
    fn test_address_entity_rejects_malformed_value() {
        assert!(ExtractedEntity::new(EntityKind::Address, "0x1234", 0.9).is_none());
        assert!(ExtractedEntity::new(EntityKind::Address, "vitalik.eth", 0.9).is_none());

        let entity = ExtractedEntity::new(
            EntityKind::Address,
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            1.7,
        )
        .unwrap();
        assert_eq!(entity.confidence, 1.0);
    }

    #[test]
    fn test_confidence_nan_becomes_zero() {
        let alias = ExtractedEntity::alias("vitalik.eth", f64::NAN);
        assert_eq!(alias.confidence, 0.0);
        assert_eq!(ExtractedEntity::alias("vitalik.eth", -0.3).confidence, 0.0);

        let metric = ExtractedEntity::new(EntityKind::Metric, "volume", f64::NAN).unwrap();
        assert_eq!(metric.confidence, 0.0);
    }

    #[test]
    fn test_intent_category_mapping() {
        assert_eq!(Intent::WalletAnalysis.category(), Some(Category::Balance));
        assert_eq!(Intent::TokenAnalytics.category(), Some(Category::TokenVolume));
        assert_eq!(
            Intent::ContractIntelligence.category(),
            Some(Category::ContractInteractions)
        );
        assert_eq!(Intent::DefiOperations.category(), None);
        assert_eq!(Intent::from_label("nft_minting"), None);
        assert!(Category::TokenVolume.accepts_token_subject());
        assert!(!Category::Balance.accepts_token_subject());
    }

    #[test]
    fn test_descriptor_serializes_wire_names() {
        let mut params = BTreeMap::new();
        params.insert("chain".to_string(), Value::from("eth"));
        params.insert(
            "address".to_string(),
            Value::from("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"),
        );
        let descriptor = RequestDescriptor {
            endpoint: Endpoint::WalletBalance,
            method: Method::Get,
            params,
        };

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["endpoint"], "wallet_balance");
        assert_eq!(json["method"], "GET");
        assert!(descriptor.matches_template());
    }
}
