//! Feature registry
//!
//! Maps action names to feature descriptors. The registry is populated by a
//! single initialization sequence (see [`crate::ocpp16::bootstrap`]) and is
//! read-only afterwards, so any number of threads may look features up and
//! validate against it without locking.
//!
//! [`SharedRegistry`] covers the case where features are added after steady
//! state has begun. Because `oneOfDynamic` rules consult the registry at
//! validation time, swapping in a changed registry can turn a payload that
//! used to validate (e.g. a `TriggerMessage` naming a now-removed
//! notification) into an invalid one, and the other way round.

use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::feature::{FeatureDescriptor, Initiator, Profile};

/// Catalog of known features, keyed by action name
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: BTreeMap<String, Arc<FeatureDescriptor>>,
}

impl FeatureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature. The registry is left untouched if the action is taken.
    pub fn register(&mut self, descriptor: FeatureDescriptor) -> Result<(), CoreError> {
        match self.features.entry(descriptor.action_name().to_string()) {
            Entry::Occupied(entry) => Err(CoreError::DuplicateAction(entry.key().clone())),
            Entry::Vacant(entry) => {
                info!(
                    "Registered feature {} ({}, {:?})",
                    descriptor.action_name(),
                    descriptor.profile(),
                    descriptor.initiator()
                );
                entry.insert(Arc::new(descriptor));
                Ok(())
            }
        }
    }

    /// Remove a feature, returning its descriptor
    ///
    /// Only meant for tests and plugin unloading; the normal lifecycle never
    /// removes features.
    pub fn unregister(&mut self, action: &str) -> Option<Arc<FeatureDescriptor>> {
        let removed = self.features.remove(action);
        if removed.is_some() {
            info!("Unregistered feature {}", action);
        }
        removed
    }

    /// Find the descriptor for an action
    pub fn lookup(&self, action: &str) -> Result<&FeatureDescriptor, CoreError> {
        match self.features.get(action) {
            Some(descriptor) => Ok(descriptor.as_ref()),
            None => {
                debug!("Lookup of unknown action {}", action);
                Err(CoreError::UnknownAction(action.to_string()))
            }
        }
    }

    /// Shared handle to a descriptor, for callers that outlive the borrow
    pub fn get_shared(&self, action: &str) -> Option<Arc<FeatureDescriptor>> {
        self.features.get(action).cloned()
    }

    pub fn contains(&self, action: &str) -> bool {
        self.features.contains_key(action)
    }

    /// Snapshot of every registered action name
    pub fn all_action_names(&self) -> BTreeSet<String> {
        self.features.keys().cloned().collect()
    }

    /// Actions whose request is sent by the given side
    pub fn action_names_initiated_by(&self, initiator: Initiator) -> BTreeSet<String> {
        self.names_where(|d| d.initiator() == initiator)
    }

    /// Actions belonging to a feature profile
    pub fn action_names_in_profile(&self, profile: Profile) -> BTreeSet<String> {
        self.names_where(|d| d.profile() == profile)
    }

    /// Charge-point notifications that TriggerMessage may request
    pub fn triggerable_actions(&self) -> BTreeSet<String> {
        self.names_where(|d| d.is_triggerable() && d.initiator() == Initiator::ChargePoint)
    }

    fn names_where(&self, predicate: impl Fn(&FeatureDescriptor) -> bool) -> BTreeSet<String> {
        self.features
            .iter()
            .filter(|(_, descriptor)| predicate(descriptor))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Descriptors in action name order
    pub fn iter(&self) -> impl Iterator<Item = &FeatureDescriptor> {
        self.features.values().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Registry that can be re-populated after steady state
///
/// Readers take a cheap [`Arc`] snapshot and validate against it without
/// holding the lock. Writers build a modified copy and swap it in only if
/// every change succeeded.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    current: RwLock<Arc<FeatureRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: FeatureRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    /// Current registry contents
    pub fn snapshot(&self) -> Arc<FeatureRegistry> {
        self.current.read().clone()
    }

    /// Apply a batch of changes atomically
    ///
    /// Payloads validated against an earlier snapshot are not re-checked;
    /// enumeration rules that depend on registry contents may judge the same
    /// payload differently after this call.
    pub fn update<F>(&self, change: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut FeatureRegistry) -> Result<(), CoreError>,
    {
        let mut current = self.current.write();
        let mut next = FeatureRegistry::clone(&current);
        change(&mut next)?;
        info!(
            "Registry updated: {} -> {} features",
            current.len(),
            next.len()
        );
        *current = Arc::new(next);
        Ok(())
    }
}
