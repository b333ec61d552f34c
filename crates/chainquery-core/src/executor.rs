//! Contract with the component that runs request descriptors
//!
//! The executor owns the HTTP call, authentication and retries against the
//! data provider. This crate only defines what it receives and returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::RequestDescriptor;

/// Runs a request descriptor against a blockchain data provider
pub trait ApiExecutor {
    fn execute(&self, request: &RequestDescriptor) -> ExecutionEnvelope;
}

/// Uniform result of an executed request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionEnvelope {
    pub success: bool,

    /// Raw provider response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Human-readable rendering of `data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Extra detail for `error`, e.g. the provider's response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExecutionEnvelope {
    pub fn ok(data: Value, formatted: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            formatted: Some(formatted.into()),
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::QueryAssembler;
    use crate::models::Endpoint;
    use serde_json::json;

    /// Answers balance requests from a fixed table
    struct FixtureExecutor;

    impl ApiExecutor for FixtureExecutor {
        fn execute(&self, request: &RequestDescriptor) -> ExecutionEnvelope {
            match request.endpoint {
                Endpoint::WalletBalance => {
                    let address = request.param_str("address").unwrap_or_default();
                    ExecutionEnvelope::ok(
                        json!({"address": address, "balance": "1500000000000000000"}),
                        "ETH Balance: 1.500000 ETH",
                    )
                }
                other => ExecutionEnvelope::failure(
                    format!("Unsupported endpoint: {}", other),
                    None,
                ),
            }
        }
    }

    #[test]
    fn test_descriptor_flows_into_executor() {
        let assembler = QueryAssembler::offline();
        let request = assembler
            .build_query("balance of vitalik.eth")
            .unwrap();

        let envelope = FixtureExecutor.execute(&request);
        assert!(envelope.success);
        assert_eq!(
            envelope.data.unwrap()["address"],
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
        );
    }

    #[test]
    fn test_failure_envelope_skips_absent_fields() {
        let request = QueryAssembler::offline()
            .build_query("volume of PEPE")
            .unwrap();
        let envelope = FixtureExecutor.execute(&request);

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Unsupported endpoint: token_transfers");
        assert!(json.get("data").is_none());
        assert!(json.get("message").is_none());
    }
}
