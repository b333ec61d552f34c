//! Shared text patterns
//!
//! Hex addresses are matched with 39 to 42 hex characters after the `0x`
//! prefix rather than exactly 40. Questions pasted from chat or explorers
//! often lose or gain a nibble and existing callers rely on them still
//! being picked up.

use std::sync::LazyLock;

use regex::Regex;

/// Recognized alias suffixes
pub const ALIAS_SUFFIXES: [&str; 5] = ["eth", "xyz", "crypto", "nft", "dao"];

pub(crate) static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0x[a-fA-F0-9]{39,42}").expect("Invalid regex"));

static VALID_ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{39,42}$").expect("Invalid regex"));

pub(crate) static ALIAS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b([a-z0-9-]+\.(?:{}))\b", ALIAS_SUFFIXES.join("|")))
        .expect("Invalid regex")
});

pub(crate) static ENS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([a-z0-9-]+\.eth)\b").expect("Invalid regex"));

/// Whether `value` is, in full, a 0x-prefixed hex address
pub fn is_valid_address(value: &str) -> bool {
    VALID_ADDRESS_PATTERN.is_match(value)
}

/// Every address-like run in `text`, in order of appearance
pub fn find_addresses(text: &str) -> impl Iterator<Item = &str> {
    ADDRESS_PATTERN.find_iter(text).map(|m| m.as_str())
}

/// Every alias candidate in `text`, in order of appearance
pub fn find_aliases(text: &str) -> impl Iterator<Item = &str> {
    ALIAS_PATTERN
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// Whether `haystack` contains any of `words`. Callers lowercase first.
pub(crate) fn contains_any(haystack: &str, words: &[&str]) -> bool {
    words.iter().any(|w| haystack.contains(w))
}
