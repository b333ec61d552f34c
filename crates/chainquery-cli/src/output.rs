//! Text and JSON rendering of request descriptors

use chainquery_core::RequestDescriptor;
use serde_json::Value;

pub const SAMPLE_PROMPTS: [&str; 5] = [
    "What's the current balance of wallet 0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b?",
    "List the last 10 transactions for address 0x742d35Cc6634C0532925a3b8D4C9db96C4b4d8b",
    "Which addresses interacted with contract 0x6982508145454Ce325dDbE47a25d4ec3d2311933 in the past 24 hours?",
    "What's the 24-hour transfer volume of token PEPE?",
    "What's the balance of vitalik.eth?",
];

pub const NO_MATCH: &str = "Could not understand the question";

/// Render the outcome of one question
pub fn render(
    question: &str,
    descriptor: Option<&RequestDescriptor>,
    json: bool,
) -> serde_json::Result<String> {
    let Some(descriptor) = descriptor else {
        return Ok(if json {
            serde_json::json!({ "question": question, "request": null, "error": NO_MATCH }).to_string()
        } else {
            format!("Question: {}\n{}", question, NO_MATCH)
        });
    };

    if json {
        return serde_json::to_string_pretty(descriptor);
    }

    let params: Vec<String> = descriptor
        .params
        .iter()
        .map(|(key, value)| match value {
            Value::String(s) => format!("{}={}", key, s),
            other => format!("{}={}", key, other),
        })
        .collect();

    Ok(format!(
        "Question: {}\nAPI Call: {} {}\nParameters: {}",
        question,
        descriptor.method,
        descriptor.endpoint,
        params.join(" ")
    ))
}
