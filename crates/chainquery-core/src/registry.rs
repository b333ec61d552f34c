//! Read-only lookup tables for names and tokens
//!
//! Both registries are plain values built once and shared behind an `Arc`.
//! Keys are stored lowercase so lookups are case-insensitive.

use std::collections::HashMap;

/// Human-readable names with known addresses
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    entries: HashMap<String, String>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the well-known ENS names
    pub fn builtin() -> Self {
        Self::new()
            .with_entry("vitalik.eth", "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")
            .with_entry("ethereum.eth", "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359")
            .with_entry("buterin.eth", "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")
    }

    pub fn with_entry(mut self, name: &str, address: &str) -> Self {
        self.entries.insert(name.to_lowercase(), address.to_string());
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Token tickers and their contract addresses, plus the ordered vocabulary
/// scanned for in questions.
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    addresses: HashMap<String, String>,
    vocabulary: Vec<String>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        Self::new()
            .with_vocabulary(&["PEPE", "USDC", "USDT", "WETH", "DAI"])
            .with_token("PEPE", "0x6982508145454Ce325dDbE47a25d4ec3d2311933")
            .with_token("USDC", "0xA0b86a33E6441b8C4505B4afDcA7FBf074497C23")
            .with_token("USDT", "0xdAC17F958D2ee523a2206206994597C13D831ec7")
            .with_token("WETH", "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2")
            .with_token("UNI", "0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984")
    }

    pub fn with_token(mut self, symbol: &str, address: &str) -> Self {
        self.addresses.insert(symbol.to_uppercase(), address.to_string());
        self
    }

    /// Replace the scan vocabulary. Order decides which ticker wins when a
    /// question mentions several.
    pub fn with_vocabulary(mut self, symbols: &[&str]) -> Self {
        self.vocabulary = symbols.iter().map(|s| s.to_uppercase()).collect();
        self
    }

    /// First vocabulary ticker occurring anywhere in `text`, ignoring case
    pub fn find_symbol(&self, text: &str) -> Option<&str> {
        let upper = text.to_uppercase();
        self.vocabulary
            .iter()
            .find(|symbol| upper.contains(symbol.as_str()))
            .map(String::as_str)
    }

    /// Contract address for a ticker, or an empty string when unknown
    pub fn address_of(&self, symbol: &str) -> String {
        self.addresses
            .get(&symbol.to_uppercase())
            .cloned()
            .unwrap_or_default()
    }
}
