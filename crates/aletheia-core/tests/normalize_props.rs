//! Property tests for result normalization.
//!
//! The normalizer is the single point where a variably-shaped provider
//! payload becomes a contract-safe value, so its guarantees are checked
//! against arbitrary JSON rather than hand-picked examples.

use aletheia_core::normalize;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        (0.0f64..=1.0).prop_map(Value::from),
        "[ a-zA-Z0-9.%-]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-zA-Z]{1,16}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Payloads shaped like the real schema, with arbitrary leaves.
fn arb_payload() -> impl Strategy<Value = Value> {
    (arb_json(), arb_json(), arb_json(), arb_json(), arb_json(), arb_json()).prop_map(
        |(theme, points, saturation, fallacies, stagnation, score)| {
            json!({
                "consensus": { "theme": theme, "points": points, "marketSaturation": saturation },
                "skeptic": { "fallacies": fallacies, "stagnationPoint": stagnation, "mimeticTraps": [] },
                "synthesis": { "secret": "s", "verticalStrategy": "v", "opportunityScore": score },
            })
        },
    )
}

proptest! {
    #[test]
    fn normalize_is_idempotent(raw in prop_oneof![arb_json(), arb_payload()]) {
        let once = normalize(&raw);
        let reparsed = serde_json::to_value(&once).expect("result serializes");
        let twice = normalize(&reparsed);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn scores_stay_in_range(raw in prop_oneof![arb_json(), arb_payload()]) {
        let result = normalize(&raw);
        prop_assert!(result.consensus.market_saturation.value() <= 100);
        prop_assert!(result.synthesis.opportunity_score.value() <= 100);
    }

    #[test]
    fn proportions_scale_to_whole_percent(p in 0.001f64..=1.0) {
        let result = normalize(&json!({ "synthesis": { "opportunityScore": p } }));
        let expected = (p * 100.0).round() as u8;
        prop_assert_eq!(result.synthesis.opportunity_score.value(), expected);
    }

    #[test]
    fn whole_values_clamp(v in any::<i32>()) {
        let result = normalize(&json!({ "consensus": { "marketSaturation": v } }));
        let expected = v.clamp(0, 100) as u8;
        prop_assert_eq!(result.consensus.market_saturation.value(), expected);
    }

    #[test]
    fn list_items_are_never_empty(raw in arb_payload()) {
        let result = normalize(&raw);
        prop_assert!(result.consensus.points.iter().all(|p| !p.is_empty()));
        prop_assert!(result.skeptic.fallacies.iter().all(|f| !f.is_empty()));
    }
}

#[test]
fn documented_score_examples() {
    let score = |v: Value| {
        normalize(&json!({ "synthesis": { "opportunityScore": v } }))
            .synthesis
            .opportunity_score
            .value()
    };
    assert_eq!(score(json!(0.42)), 42);
    assert_eq!(score(json!(73)), 73);
    assert_eq!(score(json!(-5)), 0);
    assert_eq!(score(json!(150)), 100);
}
