//! Property tests for the feature registry
//!
//! Tests registry invariants for:
//! - Lookup: every registered action resolves to its own descriptor
//! - Unknown actions: anything else is reported, never guessed
//! - Registration: a duplicate leaves the registry untouched
//! - Enumeration: triggerable actions are a subset of registered actions

use std::collections::BTreeSet;

use ocpp_core::ocpp16::{self, actions, BootNotification, Heartbeat, TriggerMessage};
use ocpp_core::{CatalogConfig, CoreError, FeatureDescriptor, Initiator, Profile};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn profile_set() -> impl Strategy<Value = BTreeSet<Profile>> {
    proptest::sample::subsequence(Profile::ALL.to_vec(), 0..=Profile::ALL.len())
        .prop_map(|profiles| profiles.into_iter().collect())
}

fn action_like() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z]{0,30}"
}

// ============================================================================
// Lookup Property Tests
// ============================================================================

proptest! {
    /// Every registered action looks up to a descriptor with that name
    #[test]
    fn lookup_returns_registered_descriptor(profiles in profile_set()) {
        let config = CatalogConfig::default().only(profiles.clone());
        let catalog = ocpp16::bootstrap(&config).unwrap();

        for name in catalog.registry.all_action_names() {
            let descriptor = catalog.registry.lookup(&name).unwrap();
            prop_assert_eq!(descriptor.action_name(), name.as_str());
            prop_assert!(profiles.contains(&descriptor.profile()));
        }
    }

    /// Names that were never registered are reported as unknown
    #[test]
    fn lookup_unknown_action(name in action_like()) {
        let catalog = ocpp16::bootstrap(&CatalogConfig::default()).unwrap();
        prop_assume!(!catalog.registry.contains(&name));

        prop_assert_eq!(
            catalog.registry.lookup(&name).unwrap_err(),
            CoreError::UnknownAction(name.clone())
        );
    }

    /// Enumerations partition consistently for any profile selection
    #[test]
    fn enumerations_are_consistent(profiles in profile_set()) {
        let config = CatalogConfig::default().only(profiles);
        let registry = ocpp16::bootstrap(&config).unwrap().registry;

        let all = registry.all_action_names();
        let by_cp = registry.action_names_initiated_by(Initiator::ChargePoint);
        let by_cs = registry.action_names_initiated_by(Initiator::CentralSystem);

        prop_assert_eq!(all.len(), registry.len());
        prop_assert!(by_cp.is_disjoint(&by_cs));
        prop_assert_eq!(by_cp.union(&by_cs).cloned().collect::<BTreeSet<_>>(), all.clone());
        prop_assert!(registry.triggerable_actions().is_subset(&by_cp));

        let per_profile: usize = Profile::ALL
            .iter()
            .map(|p| registry.action_names_in_profile(*p).len())
            .sum();
        prop_assert_eq!(per_profile, all.len());
    }
}

// ============================================================================
// Registration Property Tests
// ============================================================================

proptest! {
    /// A rejected duplicate does not change the registry
    #[test]
    fn duplicate_registration_is_atomic(profiles in profile_set()) {
        let config = CatalogConfig::default().only(profiles);
        let mut catalog = ocpp16::bootstrap(&config).unwrap();
        let before = catalog.registry.all_action_names();

        for descriptor in [
            FeatureDescriptor::of::<BootNotification>(&catalog.rules).unwrap(),
            FeatureDescriptor::of::<Heartbeat>(&catalog.rules).unwrap(),
            FeatureDescriptor::of::<TriggerMessage>(&catalog.rules).unwrap(),
        ] {
            let name = descriptor.action_name().to_string();
            let already = catalog.registry.contains(&name);
            let result = catalog.registry.register(descriptor);

            if already {
                prop_assert_eq!(result, Err(CoreError::DuplicateAction(name)));
            } else {
                prop_assert!(result.is_ok());
            }
        }

        let after = catalog.registry.all_action_names();
        prop_assert!(before.is_subset(&after));
        prop_assert!(after.contains(actions::HEARTBEAT));
        prop_assert!(after.contains(actions::TRIGGER_MESSAGE));
    }
}
