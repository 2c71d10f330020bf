//! Firmware Management profile
//!
//! GetDiagnostics (CS -> CP) asks the charge point to upload its diagnostics
//! to `location`. The charge point answers with the name of the file it will
//! upload, or no name at all when it has nothing to send, and then reports
//! upload progress through DiagnosticsStatusNotification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{actions, rule_names};
use crate::feature::{Feature, Initiator, Profile};
use crate::rules::Rule;
use crate::schema::{FieldSpec, FieldValue, Payload, SchemaSpec};

// ============================================================================
// Enumerations
// ============================================================================

wire_enum! {
    /// Upload status reported in DiagnosticsStatusNotification
    pub enum DiagnosticsStatus {
        Idle => "Idle",
        Uploaded => "Uploaded",
        UploadFailed => "UploadFailed",
        Uploading => "Uploading",
    }
}

wire_enum! {
    /// Firmware update status reported in FirmwareStatusNotification
    pub enum FirmwareStatus {
        Downloaded => "Downloaded",
        DownloadFailed => "DownloadFailed",
        Downloading => "Downloading",
        Idle => "Idle",
        InstallationFailed => "InstallationFailed",
        Installing => "Installing",
        Installed => "Installed",
    }
}

// ============================================================================
// GetDiagnostics (CS -> CP)
// ============================================================================

/// GetDiagnostics request
///
/// `retries` and `retry_interval` are optional: `None` leaves the retry policy
/// to the charge point, while `Some(0)` explicitly asks for no retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDiagnosticsRequest {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_interval: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl GetDiagnosticsRequest {
    /// Request with only the required upload location
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            retries: None,
            retry_interval: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn with_retries(mut self, retries: i32, retry_interval: i32) -> Self {
        self.retries = Some(retries);
        self.retry_interval = Some(retry_interval);
        self
    }

    pub fn with_window(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start_time = Some(start);
        self.end_time = Some(end);
        self
    }
}

impl Payload for GetDiagnosticsRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "location" => FieldValue::from(&self.location),
            "retries" => self.retries.into(),
            "retryInterval" => self.retry_interval.into(),
            "startTime" => self.start_time.into(),
            "endTime" => self.end_time.into(),
            _ => FieldValue::Absent,
        }
    }
}

/// GetDiagnostics confirmation; no file name means no diagnostics available
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDiagnosticsConfirmation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl GetDiagnosticsConfirmation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
        }
    }
}

impl Payload for GetDiagnosticsConfirmation {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "fileName" => self.file_name.as_ref().into(),
            _ => FieldValue::Absent,
        }
    }
}

pub struct GetDiagnostics;

impl Feature for GetDiagnostics {
    const ACTION: &'static str = actions::GET_DIAGNOSTICS;
    type Request = GetDiagnosticsRequest;
    type Confirmation = GetDiagnosticsConfirmation;

    fn initiator() -> Initiator {
        Initiator::CentralSystem
    }

    fn profile() -> Profile {
        Profile::FirmwareManagement
    }

    fn request_schema() -> SchemaSpec {
        SchemaSpec::new("GetDiagnosticsRequest")
            .field(FieldSpec::text("location").rule("required").rule("uri"))
            .field(FieldSpec::integer("retries").optional().rule("nonNegative"))
            .field(FieldSpec::integer("retryInterval").optional().rule("nonNegative"))
            .field(FieldSpec::timestamp("startTime").optional())
            .field(FieldSpec::timestamp("endTime").optional())
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("GetDiagnosticsConfirmation")
            .field(FieldSpec::text("fileName").optional().check(Rule::max_length(255)))
    }
}

// ============================================================================
// DiagnosticsStatusNotification (CP -> CS)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsStatusNotificationRequest {
    pub status: DiagnosticsStatus,
}

impl DiagnosticsStatusNotificationRequest {
    pub fn new(status: DiagnosticsStatus) -> Self {
        Self { status }
    }
}

impl Payload for DiagnosticsStatusNotificationRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "status" => self.status.into(),
            _ => FieldValue::Absent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsStatusNotificationConfirmation {}

impl Payload for DiagnosticsStatusNotificationConfirmation {
    fn field(&self, _name: &str) -> FieldValue<'_> {
        FieldValue::Absent
    }
}

pub struct DiagnosticsStatusNotification;

impl Feature for DiagnosticsStatusNotification {
    const ACTION: &'static str = actions::DIAGNOSTICS_STATUS_NOTIFICATION;
    type Request = DiagnosticsStatusNotificationRequest;
    type Confirmation = DiagnosticsStatusNotificationConfirmation;

    fn initiator() -> Initiator {
        Initiator::ChargePoint
    }

    fn profile() -> Profile {
        Profile::FirmwareManagement
    }

    fn triggerable() -> bool {
        true
    }

    fn request_schema() -> SchemaSpec {
        SchemaSpec::new("DiagnosticsStatusNotificationRequest")
            .field(FieldSpec::text("status").rule("required").rule(rule_names::DIAGNOSTICS_STATUS))
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("DiagnosticsStatusNotificationConfirmation")
    }
}

// ============================================================================
// FirmwareStatusNotification (CP -> CS)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareStatusNotificationRequest {
    pub status: FirmwareStatus,
}

impl FirmwareStatusNotificationRequest {
    pub fn new(status: FirmwareStatus) -> Self {
        Self { status }
    }
}

impl Payload for FirmwareStatusNotificationRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "status" => self.status.into(),
            _ => FieldValue::Absent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmwareStatusNotificationConfirmation {}

impl Payload for FirmwareStatusNotificationConfirmation {
    fn field(&self, _name: &str) -> FieldValue<'_> {
        FieldValue::Absent
    }
}

pub struct FirmwareStatusNotification;

impl Feature for FirmwareStatusNotification {
    const ACTION: &'static str = actions::FIRMWARE_STATUS_NOTIFICATION;
    type Request = FirmwareStatusNotificationRequest;
    type Confirmation = FirmwareStatusNotificationConfirmation;

    fn initiator() -> Initiator {
        Initiator::ChargePoint
    }

    fn profile() -> Profile {
        Profile::FirmwareManagement
    }

    fn triggerable() -> bool {
        true
    }

    fn request_schema() -> SchemaSpec {
        SchemaSpec::new("FirmwareStatusNotificationRequest")
            .field(FieldSpec::text("status").rule("required").rule(rule_names::FIRMWARE_STATUS))
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("FirmwareStatusNotificationConfirmation")
    }
}
