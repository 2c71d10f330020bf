//! Feature descriptors
//!
//! A feature is one remote operation: an action name bound to exactly one
//! request payload and one confirmation payload. Typed features implement
//! [`Feature`]; the registry stores the type-erased [`FeatureDescriptor`],
//! which carries the bound schemas plus decode factories for both payload
//! types so inbound messages can be dispatched without knowing the feature
//! at compile time.

use std::any::{Any, TypeId};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::rules::RuleCatalog;
use crate::schema::{Payload, PayloadSchema, SchemaSpec};

/// Side of the connection that sends the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Initiator {
    ChargePoint,
    CentralSystem,
}

/// OCPP 1.6 feature profile a feature belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Profile {
    Core,
    FirmwareManagement,
    RemoteTrigger,
}

impl Profile {
    pub const ALL: [Profile; 3] = [Profile::Core, Profile::FirmwareManagement, Profile::RemoteTrigger];

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Core => "Core",
            Profile::FirmwareManagement => "FirmwareManagement",
            Profile::RemoteTrigger => "RemoteTrigger",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown profile: {}", s))
    }
}

/// Payload decoded through a descriptor, without static knowledge of its type
pub trait AnyPayload: Payload + fmt::Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Payload + fmt::Debug + Send + Sync + 'static> AnyPayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn AnyPayload {
    /// Downcast to the concrete payload type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Type token and decode factory for one payload type
#[derive(Clone, Copy)]
pub struct PayloadType {
    name: &'static str,
    id: TypeId,
    decode: fn(Value) -> Result<Box<dyn AnyPayload>, serde_json::Error>,
}

impl PayloadType {
    pub fn of<T>() -> Self
    where
        T: Payload + DeserializeOwned + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<T>(),
            id: TypeId::of::<T>(),
            decode: decode_boxed::<T>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Decode a raw JSON payload into the typed value
    pub fn decode(&self, value: Value) -> Result<Box<dyn AnyPayload>, serde_json::Error> {
        (self.decode)(value)
    }
}

impl fmt::Debug for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PayloadType").field(&self.name).finish()
    }
}

fn decode_boxed<T>(value: Value) -> Result<Box<dyn AnyPayload>, serde_json::Error>
where
    T: Payload + DeserializeOwned + fmt::Debug + Send + Sync + 'static,
{
    Ok(Box::new(serde_json::from_value::<T>(value)?))
}

/// A typed request/confirmation pair bound to an action name
pub trait Feature: 'static {
    const ACTION: &'static str;

    type Request: Payload + Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static;
    type Confirmation: Payload + Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static;

    fn initiator() -> Initiator;

    fn profile() -> Profile;

    /// Whether the other side may ask for this message through TriggerMessage
    fn triggerable() -> bool {
        false
    }

    fn request_schema() -> SchemaSpec;

    fn confirmation_schema() -> SchemaSpec;
}

/// Immutable, type-erased description of one feature
#[derive(Debug, Clone)]
pub struct FeatureDescriptor {
    action: String,
    initiator: Initiator,
    profile: Profile,
    triggerable: bool,
    request: PayloadSchema,
    confirmation: PayloadSchema,
    request_type: PayloadType,
    confirmation_type: PayloadType,
}

impl FeatureDescriptor {
    /// Build the descriptor of a typed feature, binding both schemas
    pub fn of<F: Feature>(rules: &RuleCatalog) -> Result<Self, CoreError> {
        Ok(Self {
            action: F::ACTION.to_string(),
            initiator: F::initiator(),
            profile: F::profile(),
            triggerable: F::triggerable(),
            request: F::request_schema().bind(rules)?,
            confirmation: F::confirmation_schema().bind(rules)?,
            request_type: PayloadType::of::<F::Request>(),
            confirmation_type: PayloadType::of::<F::Confirmation>(),
        })
    }

    pub fn action_name(&self) -> &str {
        &self.action
    }

    pub fn request_schema(&self) -> &PayloadSchema {
        &self.request
    }

    pub fn confirmation_schema(&self) -> &PayloadSchema {
        &self.confirmation
    }

    pub fn initiator(&self) -> Initiator {
        self.initiator
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn is_triggerable(&self) -> bool {
        self.triggerable
    }

    pub fn request_type(&self) -> &PayloadType {
        &self.request_type
    }

    pub fn confirmation_type(&self) -> &PayloadType {
        &self.confirmation_type
    }
}
