//! Plain-text rendering for terminal output

use aletheia_core::{AnalysisResult, LogEntry, APP_NAME, APP_VERSION};
use std::fmt::Write;

/// Sources shown in a dossier
pub const DOSSIER_SOURCES: usize = 3;

/// One log line: `HH:MM:SS.mmm AGENT message`
#[must_use]
pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "{} {} {}",
        entry.timestamp().format("%H:%M:%S%.3f"),
        entry.agent().display_name(),
        entry.message()
    )
}

/// Render a completed result as a dossier
#[must_use]
pub fn render_dossier(query: &str, result: &AnalysisResult) -> String {
    let mut out = String::new();
    let consensus = &result.consensus;
    let skeptic = &result.skeptic;
    let synthesis = &result.synthesis;

    // Writing to a String cannot fail
    let _ = writeln!(out, "== {APP_NAME} {APP_VERSION} :: DOSSIER ==");
    let _ = writeln!(out, "TARGET: {query}");
    let _ = writeln!(out);

    let _ = writeln!(out, "[I] THE CONSENSUS");
    let _ = writeln!(out, "  Theme: {}", consensus.theme);
    for point in &consensus.points {
        let _ = writeln!(out, "  - {point}");
    }
    let _ = writeln!(out, "  Market saturation: {}%", consensus.market_saturation);
    let _ = writeln!(out);

    let _ = writeln!(out, "[II] THE SKEPTIC");
    for fallacy in &skeptic.fallacies {
        let _ = writeln!(out, "  x {fallacy}");
    }
    let _ = writeln!(out, "  Stagnation point: {}", skeptic.stagnation_point);
    for trap in &skeptic.mimetic_traps {
        let _ = writeln!(out, "  ! {trap}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "[III] THE SYNTHESIS");
    let _ = writeln!(out, "  Secret: {}", synthesis.secret);
    let _ = writeln!(out, "  Vertical strategy: {}", synthesis.vertical_strategy);
    let _ = writeln!(out, "  Opportunity score: {}/100", synthesis.opportunity_score);

    let sources = result.top_sources(DOSSIER_SOURCES);
    if !sources.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "SOURCES");
        for source in sources {
            let title = if source.title.is_empty() {
                source.uri.as_str()
            } else {
                source.title.as_str()
            };
            let _ = writeln!(out, "  {title} <{}>", source.uri);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use aletheia_core::{normalize, Agent};
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn entry_line_format() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap()
            + chrono::Duration::milliseconds(42);
        let entry = LogEntry::at(Agent::Skeptic, "Engaging adversarial neural nets...", ts);
        assert_eq!(
            format_entry(&entry),
            "13:04:05.042 AGENT B [ADVERSARIAL] Engaging adversarial neural nets..."
        );
    }

    #[test]
    fn dossier_lists_sections_and_caps_sources() {
        let result = normalize(&json!({
            "consensus": { "theme": "Fintech", "points": ["p1"], "marketSaturation": 0.5 },
            "skeptic": { "fallacies": ["f1"], "stagnationPoint": "s", "mimeticTraps": ["t1"] },
            "synthesis": { "secret": "x", "verticalStrategy": "y", "opportunityScore": 64 },
            "sources": [
                { "title": "A", "uri": "https://a" },
                { "title": "", "uri": "https://b" },
                { "title": "C", "uri": "https://c" },
                { "title": "D", "uri": "https://d" }
            ]
        }));
        let text = render_dossier("fintech", &result);

        assert!(text.contains("TARGET: fintech"));
        assert!(text.contains("Market saturation: 50%"));
        assert!(text.contains("  x f1"));
        assert!(text.contains("Opportunity score: 64/100"));
        assert!(text.contains("  https://b <https://b>"));
        assert!(text.contains("https://c"));
        assert!(!text.contains("https://d"));
    }

    #[test]
    fn dossier_without_sources_has_no_source_block() {
        let text = render_dossier("q", &AnalysisResult::default());
        assert!(!text.contains("SOURCES"));
    }
}
