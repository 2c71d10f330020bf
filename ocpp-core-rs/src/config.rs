//! Configuration for catalog bootstrap
//!
//! Selects which OCPP 1.6 feature profiles get registered.

use std::collections::BTreeSet;

use crate::feature::Profile;

/// Catalog bootstrap configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Feature profiles to register
    pub profiles: BTreeSet<Profile>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            profiles: Profile::ALL.into_iter().collect(),
        }
    }
}

impl CatalogConfig {
    /// Config with every supported profile
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given profiles
    pub fn only(mut self, profiles: impl IntoIterator<Item = Profile>) -> Self {
        self.profiles = profiles.into_iter().collect();
        self
    }

    /// Add a profile
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.insert(profile);
        self
    }

    /// Drop a profile
    pub fn without_profile(mut self, profile: Profile) -> Self {
        self.profiles.remove(&profile);
        self
    }

    pub fn includes(&self, profile: Profile) -> bool {
        self.profiles.contains(&profile)
    }
}
