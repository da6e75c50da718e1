//! Prompt construction

use serde_json::{json, Value};

/// System persona
pub const SYSTEM_PROMPT: &str = "You are ALETHEIA, a high-fidelity intelligence terminal designed for \
Zero-to-One founders. You reject bubbly optimism. You provide cold, hard, contrarian analysis \
based on real-world data. Be concise, technical, and ruthless.";

const RESULT_SCHEMA: &str = r#"{
  "consensus": {
    "theme": "string",
    "points": ["string", "string", "string"],
    "marketSaturation": number
  },
  "skeptic": {
    "fallacies": ["string"],
    "stagnationPoint": "string",
    "mimeticTraps": ["string"]
  },
  "synthesis": {
    "secret": "string",
    "verticalStrategy": "string",
    "opportunityScore": number
  }
}"#;

/// User prompt for `query`
#[must_use]
pub fn user_prompt(query: &str) -> String {
    format!(
        "Perform a dialectical analysis on the market/topic: \"{query}\".\n\n\
         Step 1 (Consensus): What does everyone believe? What is the herd doing?\n\
         Step 2 (Skeptic): Attack Step 1. Find the stagnation, the lies, and the mimicry.\n\
         Step 3 (Synthesis): Find the \"Zero to One\" opportunity. The Secret.\n\n\
         Return the result in strict JSON format according to this schema:\n\
         {RESULT_SCHEMA}\n\n\
         IMPORTANT: You must return the result as specific, valid JSON only. \
         Do not use markdown blocks. Do not explain. Just the JSON text."
    )
}

/// Chat completions request body
#[must_use]
pub fn build_request_body(model: &str, query: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": user_prompt(query) },
        ],
    })
}
