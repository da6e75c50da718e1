//! Viewer-facing narration text
//!
//! Every line the engine writes to the log stream is built here.

/// Consensus lines scheduled while the provider call is in flight
pub const SCAN_NARRATION: [&str; 2] = [
    "Scanning global knowledge graph for dominant narratives...",
    "Identifying high-frequency mimetic patterns...",
];

/// Skeptic engagement line
pub const SKEPTIC_ENGAGED: &str = "Engaging adversarial neural nets...";

/// Synthesizer lines
pub const SYNTHESIS_NARRATION: [&str; 2] = [
    "Resolving dialectic conflict...",
    "Calculating vertical monopoly potential...",
];

/// Completion line
pub const COMPLETED: &str = "Dossier generated. Authorization granted.";

const THEME_FALLBACK: &str = "Data unavailable";
const STAGNATION_FALLBACK: &str = "Unknown";

/// Run start line
#[must_use]
pub fn initiation(query: &str) -> String {
    format!("Initiating dialectic sequence for target: \"{query}\"")
}

/// Consensus theme line
#[must_use]
pub fn theme(theme: &str) -> String {
    format!("Consensus identified: \"{}\"", or_fallback(theme, THEME_FALLBACK))
}

/// Market saturation line
#[must_use]
pub fn saturation(percent: u8) -> String {
    format!("Market Saturation detected at {percent}%")
}

/// Fallacy line
#[must_use]
pub fn fallacy(fallacy: &str) -> String {
    format!("Logical Fallacy detected: {fallacy}")
}

/// Stagnation line
#[must_use]
pub fn stagnation(point: &str) -> String {
    format!(
        "CRITICAL: Stagnation point found at \"{}\"",
        or_fallback(point, STAGNATION_FALLBACK)
    )
}

/// Terminal failure line
#[must_use]
pub fn failure(kind: &str) -> String {
    format!("CRITICAL ERROR: Connection severed or data malformed. ({kind})")
}

fn or_fallback<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallbacks_apply_to_empty_values() {
        assert_eq!(theme(""), "Consensus identified: \"Data unavailable\"");
        assert_eq!(stagnation(""), "CRITICAL: Stagnation point found at \"Unknown\"");
        assert_eq!(theme("SaaS"), "Consensus identified: \"SaaS\"");
    }

    #[test]
    fn failure_names_kind() {
        assert!(failure("timed out").ends_with("(timed out)"));
        assert!(failure("x").starts_with("CRITICAL ERROR"));
    }
}
