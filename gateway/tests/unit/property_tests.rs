//! Property-based tests for the policy and normalizer invariants.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use serde_json::{Map, Value};

use netgate::domain::policy::{DISALLOWED_MODIFIERS, validate};
use netgate::domain::{DeviceValue, OperationClass, normalize};

// ============================================================================
// Strategies
// ============================================================================

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        "[a-zA-Z0-9 _:-]{0,12}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

// ============================================================================
// normalize() property tests
// ============================================================================

proptest! {
    /// JSON-safe input passes through unchanged.
    #[test]
    fn prop_json_safe_input_is_unchanged(value in json_value()) {
        let normalized = normalize(&DeviceValue::from(value.clone()));
        prop_assert_eq!(normalized, value);
    }

    /// Normalizing twice gives the same result as normalizing once.
    #[test]
    fn prop_normalize_is_idempotent(value in json_value()) {
        let once = normalize(&DeviceValue::Set(vec![DeviceValue::from(value)]));
        let twice = normalize(&DeviceValue::from(once.clone()));
        prop_assert_eq!(once, twice);
    }

    /// Set output does not depend on input order.
    #[test]
    fn prop_set_order_is_stable(
        items in prop::collection::vec(any::<i64>(), 0..12),
        rotate in 0usize..12,
    ) {
        let forward: Vec<DeviceValue> = items.iter().copied().map(DeviceValue::Int).collect();
        let mut rotated = forward.clone();
        if !rotated.is_empty() {
            let by = rotate % rotated.len();
            rotated.rotate_left(by);
        }
        prop_assert_eq!(
            normalize(&DeviceValue::Set(forward)),
            normalize(&DeviceValue::Set(rotated))
        );
    }
}

#[test]
fn deep_nesting_degrades_instead_of_overflowing() {
    let mut value = DeviceValue::text("leaf");
    for _ in 0..1_000 {
        value = DeviceValue::Seq(vec![value]);
    }
    let normalized = normalize(&value);
    let mut depth = 0;
    let mut cursor = &normalized;
    while let Value::Array(items) = cursor {
        depth += 1;
        cursor = &items[0];
    }
    assert!(depth <= 130, "depth {depth}");
    assert!(cursor.is_string());
}

// ============================================================================
// validate() property tests
// ============================================================================

proptest! {
    /// Any `show` command carrying a disallowed token is rejected.
    #[test]
    fn prop_show_with_modifier_rejected(
        prefix in "[a-z]{1,10}( [a-z0-9]{1,8}){0,3}",
        index in 0usize..DISALLOWED_MODIFIERS.len(),
    ) {
        let command = format!("show {prefix} {} x", DISALLOWED_MODIFIERS[index]);
        prop_assert!(validate(OperationClass::Show, &command).is_err(), "accepted: {command}");
    }

    /// Commands that do not start with the class verb are rejected.
    #[test]
    fn prop_wrong_verb_rejected(command in "[a-o][a-z]{0,10}( [a-z0-9.]{1,8}){0,3}") {
        prop_assert!(validate(OperationClass::Show, &command).is_err());
        prop_assert!(validate(OperationClass::Ping, &command).is_err());
    }

    /// Any configuration block mentioning `erase` is rejected.
    #[test]
    fn prop_config_with_erase_rejected(
        before in "[a-z \n]{0,30}",
        after in "[a-z \n]{0,30}",
    ) {
        let block = format!("{before}ErAsE{after}");
        prop_assert!(validate(OperationClass::Config, &block).is_err());
    }

    /// Linux commands and diagnostics are never rejected.
    #[test]
    fn prop_unvalidated_classes_accept_anything(command in "\\PC{0,60}") {
        prop_assert!(validate(OperationClass::LinuxRaw, &command).is_ok());
        prop_assert!(validate(OperationClass::LearnConfig, &command).is_ok());
        prop_assert!(validate(OperationClass::LearnLogging, &command).is_ok());
    }
}
