//! Property tests for payload validation
//!
//! Tests validator invariants for:
//! - Boundaries: maxLength counts characters, inclusive limit
//! - Counters: retries/retryInterval accept exactly the non-negative values
//! - Dynamic enumeration: requestedMessage follows the live registry
//! - Ordering: violations are deterministic and in declaration order
//! - Shape: a payload that is not an object has exactly one root violation

use ocpp_core::ocpp16::{self, actions, GetDiagnosticsConfirmation, GetDiagnosticsRequest};
use ocpp_core::ocpp16::{Catalog, TriggerMessageRequest};
use ocpp_core::{validate, CatalogConfig, Profile};
use proptest::prelude::*;
use serde_json::{json, Value};

const LOCATION: &str = "ftp://diag.example.com/upload";

fn catalog() -> Catalog {
    ocpp16::bootstrap(&CatalogConfig::default()).unwrap()
}

// ============================================================================
// Strategies
// ============================================================================

fn file_name() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9._ äöü-]{0,300}"
}

fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z:/. ]{0,20}".prop_map(Value::from),
        Just(Value::from("2026-01-20T12:00:00Z")),
        Just(Value::from(LOCATION)),
    ]
}

fn requested_message() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(actions::BOOT_NOTIFICATION.to_string()),
        Just(actions::HEARTBEAT.to_string()),
        Just(actions::METER_VALUES.to_string()),
        Just(actions::GET_DIAGNOSTICS.to_string()),
        Just(actions::TRIGGER_MESSAGE.to_string()),
        "[A-Z][a-zA-Z]{0,20}",
    ]
}

// ============================================================================
// Boundary Property Tests
// ============================================================================

proptest! {
    /// fileName is valid exactly when it has at most 255 characters
    #[test]
    fn file_name_length_boundary(name in file_name()) {
        let catalog = catalog();
        let schema = catalog
            .registry
            .lookup(actions::GET_DIAGNOSTICS)
            .unwrap()
            .confirmation_schema();

        let confirmation = GetDiagnosticsConfirmation::with_file_name(name.clone());
        let result = validate(&confirmation, schema, &catalog.registry);

        if name.chars().count() <= 255 {
            prop_assert!(result.is_ok());
        } else {
            let errors = result.unwrap_err();
            prop_assert_eq!(errors.len(), 1);
            prop_assert_eq!(errors.violations()[0].rule.as_str(), "maxLength");
        }
    }

    /// Retry counters accept zero and positives, reject negatives
    #[test]
    fn retries_must_be_non_negative(retries in any::<i32>(), interval in any::<i32>()) {
        let catalog = catalog();
        let schema = catalog.registry.lookup(actions::GET_DIAGNOSTICS).unwrap().request_schema();

        let request = GetDiagnosticsRequest::new(LOCATION).with_retries(retries, interval);
        let fields: Vec<String> = match validate(&request, schema, &catalog.registry) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.violations().iter().map(|v| v.field.clone()).collect(),
        };

        let mut expected = Vec::new();
        if retries < 0 {
            expected.push("retries".to_string());
        }
        if interval < 0 {
            expected.push("retryInterval".to_string());
        }
        prop_assert_eq!(fields, expected);
    }
}

// ============================================================================
// Dynamic Enumeration Property Tests
// ============================================================================

proptest! {
    /// requestedMessage is legal exactly when it names a registered triggerable action
    #[test]
    fn trigger_follows_registry(name in requested_message(), with_firmware in any::<bool>()) {
        let mut config = CatalogConfig::default();
        if !with_firmware {
            config = config.without_profile(Profile::FirmwareManagement);
        }
        let catalog = ocpp16::bootstrap(&config).unwrap();
        let schema = catalog.registry.lookup(actions::TRIGGER_MESSAGE).unwrap().request_schema();

        let request = TriggerMessageRequest::new(name.as_str());
        let valid = validate(&request, schema, &catalog.registry).is_ok();

        prop_assert_eq!(valid, catalog.registry.triggerable_actions().contains(&name));
    }
}

// ============================================================================
// Ordering Property Tests
// ============================================================================

proptest! {
    /// Same payload, same violations, in schema declaration order
    #[test]
    fn violations_are_deterministic(
        location in json_scalar(),
        retries in json_scalar(),
        retry_interval in json_scalar(),
        start_time in json_scalar(),
        end_time in json_scalar(),
    ) {
        let catalog = catalog();
        let schema = catalog.registry.lookup(actions::GET_DIAGNOSTICS).unwrap().request_schema();
        let payload = json!({
            "location": location,
            "retries": retries,
            "retryInterval": retry_interval,
            "startTime": start_time,
            "endTime": end_time,
        });

        let first = validate(&payload, schema, &catalog.registry);
        let second = validate(&payload, schema, &catalog.registry);
        prop_assert_eq!(&first, &second);

        if let Err(errors) = first {
            let positions: Vec<usize> = errors
                .violations()
                .iter()
                .map(|v| {
                    schema
                        .describe_fields()
                        .iter()
                        .position(|f| f.name() == v.field)
                        .unwrap()
                })
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

// ============================================================================
// Shape Property Tests
// ============================================================================

proptest! {
    /// Scalars and arrays are never read as payloads, for any feature or direction
    #[test]
    fn non_object_root_is_one_type_violation(
        scalar in json_scalar(),
        wrap in any::<bool>(),
    ) {
        let catalog = catalog();
        let payload = if wrap { Value::Array(vec![scalar]) } else { scalar };

        for descriptor in catalog.registry.iter() {
            for schema in [descriptor.request_schema(), descriptor.confirmation_schema()] {
                let errors = validate(&payload, schema, &catalog.registry).unwrap_err();
                prop_assert_eq!(errors.len(), 1);
                prop_assert_eq!(errors.violations()[0].field.as_str(), "");
                prop_assert_eq!(errors.violations()[0].rule.as_str(), "type");
            }
        }
    }
}
