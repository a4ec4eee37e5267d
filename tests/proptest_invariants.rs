
use proptest::prelude::*;
use strategies::{
    arb_condition, arb_guarded_condition, arb_trigger, arb_wire_trigger, evaluate_condition,
    evaluate_trigger, memory_states,
};
use trigger_compiler::parse::parse;
use trigger_compiler::serial::serialize;
use trigger_compiler::{compile, CompileOptions};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Invariant 1: Round-trip
//
// Writing a trigger as text and reading it back yields the same trigger,
// whatever roles, sizes and hit counts it holds.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn round_trip_any_rows(trigger in arb_wire_trigger()) {
        let text = serialize(&trigger);
        let parsed = parse(&text);
        prop_assert!(parsed.is_ok(), "failed to parse {text:?}: {parsed:?}");
        prop_assert_eq!(parsed.unwrap(), trigger, "round trip changed {}", text);
    }

    #[test]
    fn round_trip_optimized(trigger in arb_trigger()) {
        let optimized = trigger.optimized();
        let text = serialize(&optimized);
        prop_assert_eq!(parse(&text).unwrap(), optimized);
    }

    #[test]
    fn display_matches_serialize(trigger in arb_wire_trigger()) {
        prop_assert_eq!(trigger.to_string(), serialize(&trigger));
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Idempotence
//
// The optimizer stops at a fixpoint: optimizing its own output changes
// nothing.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn optimize_is_idempotent(trigger in arb_trigger()) {
        init_logging();
        let once = trigger.optimized();
        let twice = once.clone().optimized();
        prop_assert_eq!(&twice, &once, "second run rewrote {}", serialize(&once));
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Meaning is preserved
//
// For every memory state over three cells, the optimized trigger fires
// exactly when the input trigger does, and a compiled condition fires exactly
// when the condition itself holds. Compiled conditions cover memory-to-memory
// arithmetic, `once` chains and whole-trigger `never`/`unless` guards.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn optimize_preserves_meaning(trigger in arb_trigger()) {
        init_logging();
        let optimized = trigger.clone().optimized();
        for memory in memory_states() {
            prop_assert_eq!(
                evaluate_trigger(&optimized, &memory),
                evaluate_trigger(&trigger, &memory),
                "{} optimized to {} differs on {:?}",
                serialize(&trigger),
                serialize(&optimized),
                memory
            );
        }
    }

    #[test]
    fn compile_preserves_meaning(condition in arb_condition(3)) {
        init_logging();
        let options = CompileOptions::default().with_allow_trivial(true);
        let trigger = compile(&condition, &options).unwrap();
        for memory in memory_states() {
            prop_assert_eq!(
                evaluate_trigger(&trigger, &memory),
                evaluate_condition(&condition, &memory),
                "{:?} compiled to {} differs on {:?}",
                condition,
                serialize(&trigger),
                memory
            );
        }
    }

    #[test]
    fn unoptimized_compile_preserves_meaning(condition in arb_condition(2)) {
        let options = CompileOptions::default()
            .with_allow_trivial(true)
            .with_optimize(false);
        let trigger = compile(&condition, &options).unwrap();
        for memory in memory_states() {
            prop_assert_eq!(
                evaluate_trigger(&trigger, &memory),
                evaluate_condition(&condition, &memory)
            );
        }
    }

    #[test]
    fn guarded_compile_preserves_meaning(condition in arb_guarded_condition()) {
        init_logging();
        let options = CompileOptions::default().with_allow_trivial(true);
        let trigger = compile(&condition, &options).unwrap();
        for memory in memory_states() {
            prop_assert_eq!(
                evaluate_trigger(&trigger, &memory),
                evaluate_condition(&condition, &memory),
                "{:?} compiled to {} differs on {:?}",
                condition,
                serialize(&trigger),
                memory
            );
        }
    }

    #[test]
    fn unoptimized_guarded_compile_preserves_meaning(condition in arb_guarded_condition()) {
        let options = CompileOptions::default()
            .with_allow_trivial(true)
            .with_optimize(false);
        let trigger = compile(&condition, &options).unwrap();
        for memory in memory_states() {
            prop_assert_eq!(
                evaluate_trigger(&trigger, &memory),
                evaluate_condition(&condition, &memory),
                "{:?} lowered to {} differs on {:?}",
                condition,
                serialize(&trigger),
                memory
            );
        }
    }
}
