use aletheia_core::{Phase, StateError};
use aletheia_kernel::state_machine::{allowed_transitions, path_to_idle, validate_transition};
use proptest::prelude::*;

fn any_phase() -> impl Strategy<Value = Phase> {
    prop::sample::select(Phase::ALL.to_vec())
}

#[test]
fn test_forward_pipeline() {
    assert!(validate_transition(Phase::Idle, Phase::Scanning).is_ok());
    assert!(validate_transition(Phase::Scanning, Phase::SkepticReview).is_ok());
    assert!(validate_transition(Phase::SkepticReview, Phase::Synthesizing).is_ok());
    assert!(validate_transition(Phase::Synthesizing, Phase::Complete).is_ok());
    assert!(validate_transition(Phase::Complete, Phase::Idle).is_ok());
}

#[test]
fn test_failure_edges() {
    for phase in [Phase::Scanning, Phase::SkepticReview, Phase::Synthesizing] {
        assert!(validate_transition(phase, Phase::Idle).is_ok());
    }
}

#[test]
fn test_illegal_edges() {
    // No skipping ahead
    assert!(validate_transition(Phase::Idle, Phase::Complete).is_err());
    assert!(validate_transition(Phase::Scanning, Phase::Synthesizing).is_err());
    // No going back except to Idle
    assert!(validate_transition(Phase::Synthesizing, Phase::Scanning).is_err());
    assert!(validate_transition(Phase::Complete, Phase::Scanning).is_err());
    // No self loops
    assert!(validate_transition(Phase::Idle, Phase::Idle).is_err());

    let err = validate_transition(Phase::Idle, Phase::Complete).unwrap_err();
    assert_eq!(
        err,
        StateError::IllegalTransition {
            from: Phase::Idle,
            to: Phase::Complete
        }
    );
    assert_eq!(err.to_string(), "illegal phase transition IDLE -> COMPLETE");
}

#[test]
fn test_path_to_idle() {
    assert!(path_to_idle(Phase::Idle).is_empty());
    for phase in Phase::ALL.into_iter().filter(|p| *p != Phase::Idle) {
        let path = path_to_idle(phase);
        assert_eq!(path, vec![Phase::Idle]);
        assert!(validate_transition(phase, path[0]).is_ok());
    }
}

proptest! {
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_phase(), to in any_phase()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        if res.is_ok() {
            prop_assert!(allowed.contains(&to));
        } else {
            prop_assert!(!allowed.contains(&to));
        }
    }

    #[test]
    fn prop_every_phase_reaches_idle(from in any_phase()) {
        let mut current = from;
        for next in path_to_idle(from) {
            prop_assert!(validate_transition(current, next).is_ok());
            current = next;
        }
        prop_assert_eq!(current, Phase::Idle);
    }
}
