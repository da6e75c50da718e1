//! Result normalization
//!
//! Turns an untrusted, possibly partial provider payload into an
//! [`AnalysisResult`]. This is the only place that looks at raw payload
//! shape; everything downstream works with the normalized value.
//!
//! Policy:
//! - Missing or non-object sections become empty defaults
//! - Text fields accept strings, numbers and booleans; anything else is empty
//! - Lists accept arrays (or a bare string), dropping empty items; no padding
//! - Scores clamp into `[0, 100]`; a non-integer value in `(0, 1]` is a
//!   proportion and is scaled by 100 before rounding

use crate::types::{
    AnalysisResult, ConsensusSection, Score, SkepticSection, SourceCitation, SynthesisSection,
};
use serde_json::{Map, Value};

/// Normalize a raw provider payload
///
/// Total: never fails and never panics, whatever the input shape.
#[must_use]
pub fn normalize(raw: &Value) -> AnalysisResult {
    let consensus = section(raw, "consensus");
    let skeptic = section(raw, "skeptic");
    let synthesis = section(raw, "synthesis");

    AnalysisResult {
        consensus: ConsensusSection {
            theme: text(field(consensus, "theme")),
            points: text_list(field(consensus, "points")),
            market_saturation: score(field(consensus, "marketSaturation")),
        },
        skeptic: SkepticSection {
            fallacies: text_list(field(skeptic, "fallacies")),
            stagnation_point: text(field(skeptic, "stagnationPoint")),
            mimetic_traps: text_list(field(skeptic, "mimeticTraps")),
        },
        synthesis: SynthesisSection {
            secret: text(field(synthesis, "secret")),
            vertical_strategy: text(field(synthesis, "verticalStrategy")),
            opportunity_score: score(field(synthesis, "opportunityScore")),
        },
        sources: sources(raw.get("sources")),
    }
}

/// Normalize a single score value
///
/// Exposed for callers that only need the percentage rule.
#[must_use]
pub fn score(value: Option<&Value>) -> Score {
    let Some((number, integral)) = value.and_then(read_number) else {
        return Score::MIN;
    };
    if number.is_nan() {
        return Score::MIN;
    }

    let scaled = if !integral && number > 0.0 && number <= 1.0 {
        number * 100.0
    } else {
        number
    };

    // Values are clamped before the cast, infinities included
    #[allow(clippy::cast_possible_truncation)]
    let whole = scaled.round().clamp(0.0, 100.0) as i64;
    Score::saturating(whole)
}

fn section<'a>(raw: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    raw.get(key).and_then(Value::as_object)
}

fn field<'a>(section: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Value> {
    section.and_then(|map| map.get(key))
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text(Some(item)))
            .filter(|item| !item.is_empty())
            .collect(),
        Some(Value::String(_)) => {
            let single = text(value);
            if single.is_empty() {
                Vec::new()
            } else {
                vec![single]
            }
        }
        _ => Vec::new(),
    }
}

fn sources(value: Option<&Value>) -> Vec<SourceCitation> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| SourceCitation {
            title: text(item.get("title")),
            uri: text(item.get("uri")),
        })
        .filter(|source| !source.uri.is_empty())
        .collect()
}

/// Read a number and whether it was written as an integer
fn read_number(value: &Value) -> Option<(f64, bool)> {
    match value {
        Value::Number(n) => {
            let integral = n.is_i64() || n.is_u64();
            n.as_f64().map(|f| (f, integral))
        }
        Value::String(s) => {
            let s = s.trim();
            // "42%" is a whole percentage, never a proportion
            if let Some(stripped) = s.strip_suffix('%') {
                return stripped.trim().parse::<f64>().ok().map(|f| (f, true));
            }
            if let Ok(i) = s.parse::<i64>() {
                #[allow(clippy::cast_precision_loss)]
                return Some((i as f64, true));
            }
            s.parse::<f64>().ok().map(|f| (f, false))
        }
        _ => None,
    }
}
