//! Remote Trigger profile
//!
//! TriggerMessage (CS -> CP) asks the charge point to send one of its own
//! notifications now. Which notifications may be requested is not a fixed
//! list: `requestedMessage` is checked against the triggerable features in
//! the registry at validation time.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{actions, rule_names};
use crate::feature::{Feature, Initiator, Profile};
use crate::schema::{FieldSpec, FieldValue, Payload, SchemaSpec};

wire_enum! {
    /// Status reported in TriggerMessageConfirmation
    pub enum TriggerMessageStatus {
        Accepted => "Accepted",
        Rejected => "Rejected",
        NotImplemented => "NotImplemented",
    }
}

/// Action name of the notification requested in a TriggerMessage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageTrigger(String);

impl MessageTrigger {
    pub fn new(action: impl Into<String>) -> Self {
        Self(action.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageTrigger {
    fn from(action: &str) -> Self {
        Self::new(action)
    }
}

impl fmt::Display for MessageTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// TriggerMessage request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerMessageRequest {
    pub requested_message: MessageTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector_id: Option<i32>,
}

impl TriggerMessageRequest {
    pub fn new(requested_message: impl Into<MessageTrigger>) -> Self {
        Self {
            requested_message: requested_message.into(),
            connector_id: None,
        }
    }

    pub fn for_connector(mut self, connector_id: i32) -> Self {
        self.connector_id = Some(connector_id);
        self
    }
}

impl Payload for TriggerMessageRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "requestedMessage" => FieldValue::Text(self.requested_message.as_str()),
            "connectorId" => self.connector_id.into(),
            _ => FieldValue::Absent,
        }
    }
}

/// TriggerMessage confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerMessageConfirmation {
    pub status: TriggerMessageStatus,
}

impl TriggerMessageConfirmation {
    pub fn new(status: TriggerMessageStatus) -> Self {
        Self { status }
    }
}

impl Payload for TriggerMessageConfirmation {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "status" => self.status.into(),
            _ => FieldValue::Absent,
        }
    }
}

pub struct TriggerMessage;

impl Feature for TriggerMessage {
    const ACTION: &'static str = actions::TRIGGER_MESSAGE;
    type Request = TriggerMessageRequest;
    type Confirmation = TriggerMessageConfirmation;

    fn initiator() -> Initiator {
        Initiator::CentralSystem
    }

    fn profile() -> Profile {
        Profile::RemoteTrigger
    }

    fn request_schema() -> SchemaSpec {
        SchemaSpec::new("TriggerMessageRequest")
            .field(
                FieldSpec::text("requestedMessage")
                    .rule("required")
                    .rule(rule_names::MESSAGE_TRIGGER),
            )
            .field(FieldSpec::integer("connectorId").optional().rule("positive"))
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("TriggerMessageConfirmation").field(
            FieldSpec::text("status")
                .rule("required")
                .rule(rule_names::TRIGGER_MESSAGE_STATUS),
        )
    }
}
