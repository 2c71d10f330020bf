//! Core profile
//!
//! The charge-point initiated notifications of the Core profile. All of them
//! can be requested by the central system through TriggerMessage.

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
    /// Registration status for BootNotification
    pub enum RegistrationStatus {
        Accepted => "Accepted",
        Pending => "Pending",
        Rejected => "Rejected",
    }
}

wire_enum! {
    /// Connector status reported in StatusNotification
    pub enum ChargePointStatus {
        Available => "Available",
        Preparing => "Preparing",
        Charging => "Charging",
        SuspendedEvse => "SuspendedEVSE",
        SuspendedEv => "SuspendedEV",
        Finishing => "Finishing",
        Reserved => "Reserved",
        Unavailable => "Unavailable",
        Faulted => "Faulted",
    }
}

wire_enum! {
    /// Error code reported in StatusNotification
    pub enum ChargePointErrorCode {
        ConnectorLockFailure => "ConnectorLockFailure",
        EvCommunicationError => "EVCommunicationError",
        GroundFailure => "GroundFailure",
        HighTemperature => "HighTemperature",
        InternalError => "InternalError",
        LocalListConflict => "LocalListConflict",
        NoError => "NoError",
        OtherError => "OtherError",
        OverCurrentFailure => "OverCurrentFailure",
        PowerMeterFailure => "PowerMeterFailure",
        PowerSwitchFailure => "PowerSwitchFailure",
        ReaderFailure => "ReaderFailure",
        ResetFailure => "ResetFailure",
        UnderVoltage => "UnderVoltage",
        OverVoltage => "OverVoltage",
        WeakSignal => "WeakSignal",
    }
}

wire_enum! {
    /// Reading context for sampled values
    pub enum ReadingContext {
        InterruptionBegin => "Interruption.Begin",
        InterruptionEnd => "Interruption.End",
        Other => "Other",
        SampleClock => "Sample.Clock",
        SamplePeriodic => "Sample.Periodic",
        TransactionBegin => "Transaction.Begin",
        TransactionEnd => "Transaction.End",
        Trigger => "Trigger",
    }
}

wire_enum! {
    /// Encoding of a sampled value
    pub enum ValueFormat {
        Raw => "Raw",
        SignedData => "SignedData",
    }
}

wire_enum! {
    /// Measurand types for meter values
    pub enum Measurand {
        CurrentExport => "Current.Export",
        CurrentImport => "Current.Import",
        CurrentOffered => "Current.Offered",
        EnergyActiveExportRegister => "Energy.Active.Export.Register",
        EnergyActiveImportRegister => "Energy.Active.Import.Register",
        EnergyReactiveExportRegister => "Energy.Reactive.Export.Register",
        EnergyReactiveImportRegister => "Energy.Reactive.Import.Register",
        EnergyActiveExportInterval => "Energy.Active.Export.Interval",
        EnergyActiveImportInterval => "Energy.Active.Import.Interval",
        EnergyReactiveExportInterval => "Energy.Reactive.Export.Interval",
        EnergyReactiveImportInterval => "Energy.Reactive.Import.Interval",
        Frequency => "Frequency",
        PowerActiveExport => "Power.Active.Export",
        PowerActiveImport => "Power.Active.Import",
        PowerFactor => "Power.Factor",
        PowerOffered => "Power.Offered",
        PowerReactiveExport => "Power.Reactive.Export",
        PowerReactiveImport => "Power.Reactive.Import",
        Rpm => "RPM",
        SoC => "SoC",
        Temperature => "Temperature",
        Voltage => "Voltage",
    }
}

wire_enum! {
    /// Phase a sampled value was measured on
    pub enum Phase {
        L1 => "L1",
        L2 => "L2",
        L3 => "L3",
        N => "N",
        L1N => "L1-N",
        L2N => "L2-N",
        L3N => "L3-N",
        L1L2 => "L1-L2",
        L2L3 => "L2-L3",
        L3L1 => "L3-L1",
    }
}

wire_enum! {
    /// Where a sampled value was measured
    pub enum Location {
        Body => "Body",
        Cable => "Cable",
        Ev => "EV",
        Inlet => "Inlet",
        Outlet => "Outlet",
    }
}

wire_enum! {
    /// Unit of measure for sampled values
    pub enum UnitOfMeasure {
        Wh => "Wh",
        KWh => "kWh",
        Varh => "varh",
        Kvarh => "kvarh",
        W => "W",
        KW => "kW",
        Va => "VA",
        KVa => "kVA",
        Var => "var",
        Kvar => "kvar",
        A => "A",
        V => "V",
        K => "K",
        Celsius => "Celsius",
        Fahrenheit => "Fahrenheit",
        Percent => "Percent",
    }
}

// ============================================================================
// BootNotification (CP -> CS)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationRequest {
    pub charge_point_vendor: String,
    pub charge_point_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_point_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge_box_serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iccid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imsi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter_serial_number: Option<String>,
}

impl BootNotificationRequest {
    pub fn new(vendor: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            charge_point_vendor: vendor.into(),
            charge_point_model: model.into(),
            charge_point_serial_number: None,
            charge_box_serial_number: None,
            firmware_version: None,
            iccid: None,
            imsi: None,
            meter_type: None,
            meter_serial_number: None,
        }
    }
}

impl Payload for BootNotificationRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "chargePointVendor" => FieldValue::from(&self.charge_point_vendor),
            "chargePointModel" => FieldValue::from(&self.charge_point_model),
            "chargePointSerialNumber" => self.charge_point_serial_number.as_ref().into(),
            "chargeBoxSerialNumber" => self.charge_box_serial_number.as_ref().into(),
            "firmwareVersion" => self.firmware_version.as_ref().into(),
            "iccid" => self.iccid.as_ref().into(),
            "imsi" => self.imsi.as_ref().into(),
            "meterType" => self.meter_type.as_ref().into(),
            "meterSerialNumber" => self.meter_serial_number.as_ref().into(),
            _ => FieldValue::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootNotificationConfirmation {
    pub current_time: DateTime<Utc>,
    pub interval: i32,
    pub status: RegistrationStatus,
}

impl BootNotificationConfirmation {
    pub fn new(current_time: DateTime<Utc>, interval: i32, status: RegistrationStatus) -> Self {
        Self {
            current_time,
            interval,
            status,
        }
    }
}

impl Payload for BootNotificationConfirmation {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "currentTime" => self.current_time.into(),
            "interval" => self.interval.into(),
            "status" => self.status.into(),
            _ => FieldValue::Absent,
        }
    }
}

pub struct BootNotification;

impl Feature for BootNotification {
    const ACTION: &'static str = actions::BOOT_NOTIFICATION;
    type Request = BootNotificationRequest;
    type Confirmation = BootNotificationConfirmation;

    fn initiator() -> Initiator {
        Initiator::ChargePoint
    }

    fn profile() -> Profile {
        Profile::Core
    }

    fn triggerable() -> bool {
        true
    }

    fn request_schema() -> SchemaSpec {
        SchemaSpec::new("BootNotificationRequest")
            .field(ci_string("chargePointVendor", 20).rule("required"))
            .field(ci_string("chargePointModel", 20).rule("required"))
            .field(ci_string("chargePointSerialNumber", 25).optional())
            .field(ci_string("chargeBoxSerialNumber", 25).optional())
            .field(ci_string("firmwareVersion", 50).optional())
            .field(ci_string("iccid", 20).optional())
            .field(ci_string("imsi", 20).optional())
            .field(ci_string("meterType", 25).optional())
            .field(ci_string("meterSerialNumber", 25).optional())
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("BootNotificationConfirmation")
            .field(FieldSpec::timestamp("currentTime").rule("required"))
            .field(FieldSpec::integer("interval").rule("required").rule("nonNegative"))
            .field(
                FieldSpec::text("status")
                    .rule("required")
                    .rule(rule_names::REGISTRATION_STATUS),
            )
    }
}

/// OCPP CiStringN: printable ASCII, at most `max` characters
fn ci_string(name: &str, max: usize) -> FieldSpec {
    FieldSpec::text(name).check(Rule::max_length(max)).rule("printable")
}

// ============================================================================
// Heartbeat (CP -> CS)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatRequest {}

impl Payload for HeartbeatRequest {
    fn field(&self, _name: &str) -> FieldValue<'_> {
        FieldValue::Absent
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatConfirmation {
    pub current_time: DateTime<Utc>,
}

impl HeartbeatConfirmation {
    pub fn new(current_time: DateTime<Utc>) -> Self {
        Self { current_time }
    }
}

impl Payload for HeartbeatConfirmation {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "currentTime" => self.current_time.into(),
            _ => FieldValue::Absent,
        }
    }
}

pub struct Heartbeat;

impl Feature for Heartbeat {
    const ACTION: &'static str = actions::HEARTBEAT;
    type Request = HeartbeatRequest;
    type Confirmation = HeartbeatConfirmation;

    fn initiator() -> Initiator {
        Initiator::ChargePoint
    }

    fn profile() -> Profile {
        Profile::Core
    }

    fn triggerable() -> bool {
        true
    }

    fn request_schema() -> SchemaSpec {
        SchemaSpec::new("HeartbeatRequest")
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("HeartbeatConfirmation")
            .field(FieldSpec::timestamp("currentTime").rule("required"))
    }
}

// ============================================================================
// StatusNotification (CP -> CS)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotificationRequest {
    pub connector_id: i32,
    pub error_code: ChargePointErrorCode,
    pub status: ChargePointStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_error_code: Option<String>,
}

impl StatusNotificationRequest {
    pub fn new(connector_id: i32, error_code: ChargePointErrorCode, status: ChargePointStatus) -> Self {
        Self {
            connector_id,
            error_code,
            status,
            info: None,
            timestamp: None,
            vendor_id: None,
            vendor_error_code: None,
        }
    }
}

impl Payload for StatusNotificationRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "connectorId" => self.connector_id.into(),
            "errorCode" => self.error_code.into(),
            "status" => self.status.into(),
            "info" => self.info.as_ref().into(),
            "timestamp" => self.timestamp.into(),
            "vendorId" => self.vendor_id.as_ref().into(),
            "vendorErrorCode" => self.vendor_error_code.as_ref().into(),
            _ => FieldValue::Absent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusNotificationConfirmation {}

impl Payload for StatusNotificationConfirmation {
    fn field(&self, _name: &str) -> FieldValue<'_> {
        FieldValue::Absent
    }
}

pub struct StatusNotification;

impl Feature for StatusNotification {
    const ACTION: &'static str = actions::STATUS_NOTIFICATION;
    type Request = StatusNotificationRequest;
    type Confirmation = StatusNotificationConfirmation;

    fn initiator() -> Initiator {
        Initiator::ChargePoint
    }

    fn profile() -> Profile {
        Profile::Core
    }

    fn triggerable() -> bool {
        true
    }

    fn request_schema() -> SchemaSpec {
        SchemaSpec::new("StatusNotificationRequest")
            .field(FieldSpec::integer("connectorId").rule("required").rule("nonNegative"))
            .field(
                FieldSpec::text("errorCode")
                    .rule("required")
                    .rule(rule_names::CHARGE_POINT_ERROR_CODE),
            )
            .field(
                FieldSpec::text("status")
                    .rule("required")
                    .rule(rule_names::CHARGE_POINT_STATUS),
            )
            .field(ci_string("info", 50).optional())
            .field(FieldSpec::timestamp("timestamp").optional())
            .field(ci_string("vendorId", 255).optional())
            .field(ci_string("vendorErrorCode", 50).optional())
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("StatusNotificationConfirmation")
    }
}

// ============================================================================
// MeterValues (CP -> CS)
// ============================================================================

/// Single measured value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampledValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ReadingContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurand: Option<Measurand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitOfMeasure>,
}

impl SampledValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            context: None,
            format: None,
            measurand: None,
            phase: None,
            location: None,
            unit: None,
        }
    }

    pub fn with_measurand(mut self, measurand: Measurand, unit: UnitOfMeasure) -> Self {
        self.measurand = Some(measurand);
        self.unit = Some(unit);
        self
    }
}

impl Payload for SampledValue {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "value" => FieldValue::from(&self.value),
            "context" => self.context.into(),
            "format" => self.format.into(),
            "measurand" => self.measurand.into(),
            "phase" => self.phase.into(),
            "location" => self.location.into(),
            "unit" => self.unit.into(),
            _ => FieldValue::Absent,
        }
    }
}

/// Samples taken at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValue {
    pub timestamp: DateTime<Utc>,
    pub sampled_value: Vec<SampledValue>,
}

impl Payload for MeterValue {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "timestamp" => self.timestamp.into(),
            "sampledValue" => FieldValue::list(&self.sampled_value),
            _ => FieldValue::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterValuesRequest {
    pub connector_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<i32>,
    pub meter_value: Vec<MeterValue>,
}

impl Payload for MeterValuesRequest {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "connectorId" => self.connector_id.into(),
            "transactionId" => self.transaction_id.into(),
            "meterValue" => FieldValue::list(&self.meter_value),
            _ => FieldValue::Absent,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeterValuesConfirmation {}

impl Payload for MeterValuesConfirmation {
    fn field(&self, _name: &str) -> FieldValue<'_> {
        FieldValue::Absent
    }
}

pub struct MeterValues;

impl Feature for MeterValues {
    const ACTION: &'static str = actions::METER_VALUES;
    type Request = MeterValuesRequest;
    type Confirmation = MeterValuesConfirmation;

    fn initiator() -> Initiator {
        Initiator::ChargePoint
    }

    fn profile() -> Profile {
        Profile::Core
    }

    fn triggerable() -> bool {
        true
    }

    fn request_schema() -> SchemaSpec {
        let sampled_value = SchemaSpec::new("SampledValue")
            .field(FieldSpec::text("value").rule("required"))
            .field(FieldSpec::text("context").optional().rule(rule_names::READING_CONTEXT))
            .field(FieldSpec::text("format").optional().rule(rule_names::VALUE_FORMAT))
            .field(FieldSpec::text("measurand").optional().rule(rule_names::MEASURAND))
            .field(FieldSpec::text("phase").optional().rule(rule_names::PHASE))
            .field(FieldSpec::text("location").optional().rule(rule_names::METER_LOCATION))
            .field(FieldSpec::text("unit").optional().rule(rule_names::UNIT_OF_MEASURE));

        let meter_value = SchemaSpec::new("MeterValue")
            .field(FieldSpec::timestamp("timestamp").rule("required"))
            .field(
                FieldSpec::list("sampledValue", sampled_value)
                    .rule("required")
                    .check(Rule::min_items(1)),
            );

        SchemaSpec::new("MeterValuesRequest")
            .field(FieldSpec::integer("connectorId").rule("required").rule("nonNegative"))
            .field(FieldSpec::integer("transactionId").optional())
            .field(
                FieldSpec::list("meterValue", meter_value)
                    .rule("required")
                    .check(Rule::min_items(1)),
            )
    }

    fn confirmation_schema() -> SchemaSpec {
        SchemaSpec::new("MeterValuesConfirmation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::ocpp16::{bootstrap, Catalog};
    use crate::validator::validate;
    use chrono::TimeZone;
    use serde_json::json;

    fn catalog() -> Catalog {
        bootstrap(&CatalogConfig::default()).unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_boot_notification_limits() {
        let catalog = catalog();
        let schema = catalog.registry.lookup(actions::BOOT_NOTIFICATION).unwrap().request_schema();

        let ok = BootNotificationRequest::new("Elektrokombinacija", "EK3");
        assert!(validate(&ok, schema, &catalog.registry).is_ok());

        let mut long = BootNotificationRequest::new("Elektrokombinacija-Vendor", "EK3");
        long.firmware_version = Some("0.1.0\n".to_string());
        let errors = validate(&long, schema, &catalog.registry).unwrap_err();
        let fields: Vec<_> = errors.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["chargePointVendor", "firmwareVersion"]);
    }

    #[test]
    fn test_boot_notification_confirmation() {
        let catalog = catalog();
        let schema = catalog
            .registry
            .lookup(actions::BOOT_NOTIFICATION)
            .unwrap()
            .confirmation_schema();

        let typed = BootNotificationConfirmation::new(noon(), 300, RegistrationStatus::Accepted);
        assert!(validate(&typed, schema, &catalog.registry).is_ok());

        let raw = json!({"currentTime": "2026-01-20T12:00:00Z", "interval": -1, "status": "Maybe"});
        let errors = validate(&raw, schema, &catalog.registry).unwrap_err();
        let rules: Vec<_> = errors.violations().iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["nonNegative", "registrationStatus"]);
    }

    #[test]
    fn test_heartbeat() {
        let catalog = catalog();
        let descriptor = catalog.registry.lookup(actions::HEARTBEAT).unwrap();

        assert!(validate(&HeartbeatRequest::default(), descriptor.request_schema(), &catalog.registry).is_ok());
        assert!(validate(
            &HeartbeatConfirmation::new(noon()),
            descriptor.confirmation_schema(),
            &catalog.registry
        )
        .is_ok());

        let errors = validate(&json!({}), descriptor.confirmation_schema(), &catalog.registry).unwrap_err();
        assert_eq!(errors.violations()[0].field, "currentTime");
    }

    #[test]
    fn test_status_notification() {
        let catalog = catalog();
        let schema = catalog
            .registry
            .lookup(actions::STATUS_NOTIFICATION)
            .unwrap()
            .request_schema();

        let typed = StatusNotificationRequest::new(0, ChargePointErrorCode::NoError, ChargePointStatus::Available);
        assert!(validate(&typed, schema, &catalog.registry).is_ok());
        assert_eq!(
            serde_json::to_value(&typed).unwrap(),
            json!({"connectorId": 0, "errorCode": "NoError", "status": "Available"})
        );

        let raw = json!({"connectorId": 1, "errorCode": "Meltdown", "status": "SuspendedEVSE"});
        let errors = validate(&raw, schema, &catalog.registry).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.violations()[0].rule, "chargePointErrorCode");
    }

    #[test]
    fn test_meter_values_nested() {
        let catalog = catalog();
        let schema = catalog.registry.lookup(actions::METER_VALUES).unwrap().request_schema();

        let typed = MeterValuesRequest {
            connector_id: 1,
            transaction_id: Some(42),
            meter_value: vec![MeterValue {
                timestamp: noon(),
                sampled_value: vec![SampledValue::new("1234.5")
                    .with_measurand(Measurand::EnergyActiveImportRegister, UnitOfMeasure::KWh)],
            }],
        };
        assert!(validate(&typed, schema, &catalog.registry).is_ok());

        let raw = json!({
            "connectorId": 1,
            "meterValue": [
                {"timestamp": "2026-01-20T12:00:00Z", "sampledValue": []},
                {"timestamp": "2026-01-20T12:01:00Z", "sampledValue": [{"value": "1", "unit": "parsecs"}]}
            ]
        });
        let errors = validate(&raw, schema, &catalog.registry).unwrap_err();
        let found: Vec<_> = errors
            .violations()
            .iter()
            .map(|v| (v.field.as_str(), v.rule.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("meterValue[0].sampledValue", "minItems"),
                ("meterValue[1].sampledValue[0].unit", "unitOfMeasure"),
            ]
        );
    }

    #[test]
    fn test_meter_values_requires_samples() {
        let catalog = catalog();
        let schema = catalog.registry.lookup(actions::METER_VALUES).unwrap().request_schema();

        let errors = validate(&json!({"connectorId": 1}), schema, &catalog.registry).unwrap_err();
        assert_eq!(errors.violations()[0].field, "meterValue");
        assert_eq!(errors.violations()[0].rule, "required");
    }
}
