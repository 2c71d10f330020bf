//! OCPP 1.6 feature catalog
//!
//! Message definitions for the features this crate knows, grouped by feature
//! profile:
//! - `core_profile`: BootNotification, Heartbeat, StatusNotification, MeterValues
//! - `firmware`: GetDiagnostics, DiagnosticsStatusNotification, FirmwareStatusNotification
//! - `remote_trigger`: TriggerMessage
//!
//! [`bootstrap`] is the one initialization entry point: it builds the rule
//! catalog, binds every schema and registers the features of the configured
//! profiles, returning an owned [`Catalog`] that is read-only from then on.

use std::collections::BTreeSet;

use tracing::info;

use crate::config::CatalogConfig;
use crate::error::CoreError;
use crate::feature::{Feature, FeatureDescriptor};
use crate::registry::FeatureRegistry;
use crate::rules::{Resolver, Rule, RuleCatalog};

/// Closed string enumeration with its wire names
///
/// Generates the enum with serde renames, `NAMES` (the legal value set used
/// by `oneOf` rules) and a conversion into a text field value.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl<'a> From<$name> for $crate::schema::FieldValue<'a> {
            fn from(value: $name) -> Self {
                $crate::schema::FieldValue::Text(value.as_str())
            }
        }
    };
}

mod core_profile;
mod firmware;
mod remote_trigger;

pub use core_profile::*;
pub use firmware::*;
pub use remote_trigger::*;

/// Action names of the OCPP 1.6 features defined here
pub mod actions {
    pub const BOOT_NOTIFICATION: &str = "BootNotification";
    pub const DIAGNOSTICS_STATUS_NOTIFICATION: &str = "DiagnosticsStatusNotification";
    pub const FIRMWARE_STATUS_NOTIFICATION: &str = "FirmwareStatusNotification";
    pub const GET_DIAGNOSTICS: &str = "GetDiagnostics";
    pub const HEARTBEAT: &str = "Heartbeat";
    pub const METER_VALUES: &str = "MeterValues";
    pub const STATUS_NOTIFICATION: &str = "StatusNotification";
    pub const TRIGGER_MESSAGE: &str = "TriggerMessage";
}

/// Names of the OCPP 1.6 enumeration rules
pub mod rule_names {
    pub const CHARGE_POINT_ERROR_CODE: &str = "chargePointErrorCode";
    pub const CHARGE_POINT_STATUS: &str = "chargePointStatus";
    pub const DIAGNOSTICS_STATUS: &str = "diagnosticsStatus";
    pub const FIRMWARE_STATUS: &str = "firmwareStatus";
    pub const MEASURAND: &str = "measurand";
    pub const MESSAGE_TRIGGER: &str = "messageTrigger";
    pub const METER_LOCATION: &str = "meterLocation";
    pub const PHASE: &str = "phase";
    pub const READING_CONTEXT: &str = "readingContext";
    pub const REGISTRATION_STATUS: &str = "registrationStatus";
    pub const TRIGGER_MESSAGE_STATUS: &str = "triggerMessageStatus";
    pub const UNIT_OF_MEASURE: &str = "unitOfMeasure";
    pub const VALUE_FORMAT: &str = "valueFormat";
}

/// Legal values of `TriggerMessageRequest.requestedMessage`, read from the live registry
pub const MESSAGE_TRIGGERS: Resolver = Resolver::new("triggerable messages", message_triggers);

fn message_triggers(registry: &FeatureRegistry) -> BTreeSet<String> {
    registry.triggerable_actions()
}

/// Populated rule catalog and feature registry
#[derive(Debug, Clone)]
pub struct Catalog {
    pub rules: RuleCatalog,
    pub registry: FeatureRegistry,
}

/// Builtin rules plus the OCPP 1.6 enumerations
pub fn rule_catalog() -> Result<RuleCatalog, CoreError> {
    let mut rules = RuleCatalog::with_builtins();

    rules.register(rule_names::TRIGGER_MESSAGE_STATUS, Rule::one_of(TriggerMessageStatus::NAMES))?;
    rules.register(rule_names::MESSAGE_TRIGGER, Rule::one_of_dynamic(MESSAGE_TRIGGERS))?;
    rules.register(rule_names::REGISTRATION_STATUS, Rule::one_of(RegistrationStatus::NAMES))?;
    rules.register(rule_names::CHARGE_POINT_STATUS, Rule::one_of(ChargePointStatus::NAMES))?;
    rules.register(rule_names::CHARGE_POINT_ERROR_CODE, Rule::one_of(ChargePointErrorCode::NAMES))?;
    rules.register(rule_names::DIAGNOSTICS_STATUS, Rule::one_of(DiagnosticsStatus::NAMES))?;
    rules.register(rule_names::FIRMWARE_STATUS, Rule::one_of(FirmwareStatus::NAMES))?;
    rules.register(rule_names::READING_CONTEXT, Rule::one_of(ReadingContext::NAMES))?;
    rules.register(rule_names::VALUE_FORMAT, Rule::one_of(ValueFormat::NAMES))?;
    rules.register(rule_names::MEASURAND, Rule::one_of(Measurand::NAMES))?;
    rules.register(rule_names::PHASE, Rule::one_of(Phase::NAMES))?;
    rules.register(rule_names::METER_LOCATION, Rule::one_of(Location::NAMES))?;
    rules.register(rule_names::UNIT_OF_MEASURE, Rule::one_of(UnitOfMeasure::NAMES))?;

    Ok(rules)
}

/// Build the catalog for the configured profiles
///
/// Any error here is an initialization error and should abort startup.
pub fn bootstrap(config: &CatalogConfig) -> Result<Catalog, CoreError> {
    let rules = rule_catalog()?;
    let mut registry = FeatureRegistry::new();

    register::<BootNotification>(&mut registry, &rules, config)?;
    register::<Heartbeat>(&mut registry, &rules, config)?;
    register::<StatusNotification>(&mut registry, &rules, config)?;
    register::<MeterValues>(&mut registry, &rules, config)?;
    register::<GetDiagnostics>(&mut registry, &rules, config)?;
    register::<DiagnosticsStatusNotification>(&mut registry, &rules, config)?;
    register::<FirmwareStatusNotification>(&mut registry, &rules, config)?;
    register::<TriggerMessage>(&mut registry, &rules, config)?;

    info!(
        "OCPP 1.6 catalog ready: {} features, {} rules (profiles: {:?})",
        registry.len(),
        rules.len(),
        config.profiles
    );

    Ok(Catalog { rules, registry })
}

fn register<F: Feature>(
    registry: &mut FeatureRegistry,
    rules: &RuleCatalog,
    config: &CatalogConfig,
) -> Result<(), CoreError> {
    if !config.includes(F::profile()) {
        return Ok(());
    }
    registry.register(FeatureDescriptor::of::<F>(rules)?)
}
