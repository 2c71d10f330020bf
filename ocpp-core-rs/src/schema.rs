//! Payload schemas
//!
//! A schema is declared once per message direction as a [`SchemaSpec`] that
//! names its rules, then bound against a [`RuleCatalog`] into an immutable
//! [`PayloadSchema`]. Binding is where unknown rule names and rules attached to
//! the wrong field kind are caught, so a bound schema is always checkable.
//!
//! Payload values expose their fields through the [`Payload`] trait. Typed
//! message structs implement it by hand; raw JSON objects implement it through
//! `serde_json::Value`, which lets inbound payloads be validated before they
//! are decoded into their typed form.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::rules::{Rule, RuleCatalog};

// ============================================================================
// Field values
// ============================================================================

/// Borrowed view of one field of a payload
#[derive(Clone)]
pub enum FieldValue<'a> {
    /// Field not present (`None`, missing key or JSON `null`)
    Absent,
    Text(&'a str),
    Integer(i64),
    Decimal(f64),
    Timestamp(DateTime<Utc>),
    Bool(bool),
    Object(&'a dyn Payload),
    List(Vec<FieldValue<'a>>),
}

impl<'a> FieldValue<'a> {
    /// Nested payload
    pub fn object<T: Payload>(value: &'a T) -> Self {
        FieldValue::Object(value)
    }

    /// List of nested payloads
    pub fn list<T: Payload>(items: &'a [T]) -> Self {
        FieldValue::List(items.iter().map(|item| FieldValue::Object(item)).collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Human-readable shape, used in type violations
    pub fn shape(&self) -> &'static str {
        match self {
            FieldValue::Absent => "nothing",
            FieldValue::Text(_) => "text",
            FieldValue::Integer(_) => "integer",
            FieldValue::Decimal(_) => "decimal",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Bool(_) => "boolean",
            FieldValue::Object(_) => "object",
            FieldValue::List(_) => "list",
        }
    }
}

impl fmt::Debug for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => write!(f, "Absent"),
            FieldValue::Text(s) => write!(f, "Text({:?})", s),
            FieldValue::Integer(i) => write!(f, "Integer({})", i),
            FieldValue::Decimal(d) => write!(f, "Decimal({})", d),
            FieldValue::Timestamp(t) => write!(f, "Timestamp({})", t.to_rfc3339()),
            FieldValue::Bool(b) => write!(f, "Bool({})", b),
            FieldValue::Object(_) => write!(f, "Object(..)"),
            FieldValue::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(value: &'a str) -> Self {
        FieldValue::Text(value)
    }
}

impl<'a> From<&'a String> for FieldValue<'a> {
    fn from(value: &'a String) -> Self {
        FieldValue::Text(value.as_str())
    }
}

impl<'a> From<i32> for FieldValue<'a> {
    fn from(value: i32) -> Self {
        FieldValue::Integer(i64::from(value))
    }
}

impl<'a> From<i64> for FieldValue<'a> {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl<'a> From<f64> for FieldValue<'a> {
    fn from(value: f64) -> Self {
        FieldValue::Decimal(value)
    }
}

impl<'a> From<DateTime<Utc>> for FieldValue<'a> {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<'a, T: Into<FieldValue<'a>>> From<Option<T>> for FieldValue<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Absent, Into::into)
    }
}

/// Field access for anything the validator can check
pub trait Payload {
    /// Value of the field with the given wire name
    fn field(&self, name: &str) -> FieldValue<'_>;

    /// Shape of the payload itself; anything but `"object"` has no fields
    fn shape(&self) -> &'static str {
        "object"
    }
}

impl Payload for Map<String, Value> {
    fn field(&self, name: &str) -> FieldValue<'_> {
        self.get(name).map_or(FieldValue::Absent, json_field)
    }
}

impl Payload for Value {
    fn field(&self, name: &str) -> FieldValue<'_> {
        match self {
            Value::Object(map) => map.field(name),
            _ => FieldValue::Absent,
        }
    }

    fn shape(&self) -> &'static str {
        json_field(self).shape()
    }
}

fn json_field(value: &Value) -> FieldValue<'_> {
    match value {
        Value::Null => FieldValue::Absent,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => n.as_f64().map_or(FieldValue::Absent, FieldValue::Decimal),
        },
        Value::String(s) => FieldValue::Text(s),
        Value::Array(items) => FieldValue::List(items.iter().map(json_field).collect()),
        Value::Object(map) => FieldValue::Object(map),
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// Rule attachment as written in a schema declaration
#[derive(Debug, Clone)]
pub enum RuleRef {
    /// Looked up in the rule catalog at bind time
    Named(String),
    /// Parametric rule attached directly, reported under its kind name
    Inline(Rule),
}

/// Declared kind of a field
#[derive(Debug, Clone)]
pub enum KindSpec {
    Text,
    Integer,
    Decimal,
    Timestamp,
    Object(SchemaSpec),
    List(SchemaSpec),
}

/// Declaration of one field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    kind: KindSpec,
    optional: bool,
    rules: Vec<RuleRef>,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: KindSpec) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
            rules: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, KindSpec::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, KindSpec::Integer)
    }

    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, KindSpec::Decimal)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, KindSpec::Timestamp)
    }

    pub fn object(name: impl Into<String>, schema: SchemaSpec) -> Self {
        Self::new(name, KindSpec::Object(schema))
    }

    pub fn list(name: impl Into<String>, schema: SchemaSpec) -> Self {
        Self::new(name, KindSpec::List(schema))
    }

    /// Mark the field as optional; absent optional fields skip their rules
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attach a rule from the catalog by name
    pub fn rule(mut self, name: impl Into<String>) -> Self {
        self.rules.push(RuleRef::Named(name.into()));
        self
    }

    /// Attach a parametric rule directly
    pub fn check(mut self, rule: Rule) -> Self {
        self.rules.push(RuleRef::Inline(rule));
        self
    }

    fn bind(&self, catalog: &RuleCatalog) -> Result<Field, CoreError> {
        let kind = match &self.kind {
            KindSpec::Text => FieldKind::Text,
            KindSpec::Integer => FieldKind::Integer,
            KindSpec::Decimal => FieldKind::Decimal,
            KindSpec::Timestamp => FieldKind::Timestamp,
            KindSpec::Object(spec) => FieldKind::Object(spec.bind(catalog)?),
            KindSpec::List(spec) => FieldKind::List(spec.bind(catalog)?),
        };

        let mut rules = Vec::with_capacity(self.rules.len());
        for rule_ref in &self.rules {
            let (name, rule) = match rule_ref {
                RuleRef::Named(name) => (name.clone(), catalog.resolve(name, &self.name)?.clone()),
                RuleRef::Inline(rule) => (rule.kind_name().to_string(), rule.clone()),
            };
            if !rule.applies_to(&kind) {
                return Err(CoreError::RuleKindMismatch {
                    rule: name,
                    field: self.name.clone(),
                    kind: kind.name(),
                });
            }
            rules.push(BoundRule { name, rule });
        }

        Ok(Field {
            name: self.name.clone(),
            kind,
            optional: self.optional,
            rules,
        })
    }
}

/// Declaration of a whole payload
#[derive(Debug, Clone)]
pub struct SchemaSpec {
    name: String,
    fields: Vec<FieldSpec>,
}

impl SchemaSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Resolve every rule reference against the catalog
    pub fn bind(&self, catalog: &RuleCatalog) -> Result<PayloadSchema, CoreError> {
        let fields = self
            .fields
            .iter()
            .map(|field| field.bind(catalog))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PayloadSchema {
            name: self.name.clone(),
            fields,
        })
    }
}

// ============================================================================
// Bound schemas
// ============================================================================

/// Kind of a bound field
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Timestamp,
    Object(PayloadSchema),
    List(PayloadSchema),
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Decimal => "decimal",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Object(_) => "object",
            FieldKind::List(_) => "list",
        }
    }
}

/// Rule resolved from the catalog, kept with the name it was attached under
#[derive(Debug, Clone)]
pub struct BoundRule {
    pub name: String,
    pub rule: Rule,
}

/// One field of a bound schema
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    optional: bool,
    rules: Vec<BoundRule>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Rules in attachment order
    pub fn rules(&self) -> &[BoundRule] {
        &self.rules
    }

    /// Name of the first attached `required` rule, if any
    pub fn required_rule(&self) -> Option<&str> {
        self.rules
            .iter()
            .find(|bound| matches!(bound.rule, Rule::Required))
            .map(|bound| bound.name.as_str())
    }
}

/// Immutable field set for one direction of one feature
#[derive(Debug, Clone)]
pub struct PayloadSchema {
    name: String,
    fields: Vec<Field>,
}

impl PayloadSchema {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn describe_fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> RuleCatalog {
        RuleCatalog::with_builtins()
    }

    #[test]
    fn test_bind_keeps_declaration_order() {
        let schema = SchemaSpec::new("Sample")
            .field(FieldSpec::text("b").rule("required"))
            .field(FieldSpec::integer("a").optional().rule("nonNegative"))
            .field(FieldSpec::timestamp("c").optional())
            .bind(&catalog())
            .unwrap();

        let names: Vec<_> = schema.describe_fields().iter().map(Field::name).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert!(schema.field("a").unwrap().is_optional());
        assert_eq!(schema.field("b").unwrap().required_rule(), Some("required"));
    }

    #[test]
    fn test_bind_rejects_unregistered_rule() {
        let err = SchemaSpec::new("Sample")
            .field(FieldSpec::text("status").rule("noSuchRule"))
            .bind(&catalog())
            .unwrap_err();

        assert_eq!(
            err,
            CoreError::UnregisteredRule {
                rule: "noSuchRule".to_string(),
                field: "status".to_string(),
            }
        );
    }

    #[test]
    fn test_bind_rejects_rule_on_wrong_kind() {
        let err = SchemaSpec::new("Sample")
            .field(FieldSpec::integer("retries").check(Rule::max_length(10)))
            .bind(&catalog())
            .unwrap_err();

        assert!(matches!(err, CoreError::RuleKindMismatch { kind: "integer", .. }));
    }

    #[test]
    fn test_bind_checks_nested_schemas() {
        let nested = SchemaSpec::new("Inner").field(FieldSpec::text("x").rule("missing"));
        let err = SchemaSpec::new("Outer")
            .field(FieldSpec::list("items", nested))
            .bind(&catalog())
            .unwrap_err();

        assert!(matches!(err, CoreError::UnregisteredRule { .. }));
    }

    #[test]
    fn test_json_payload_fields() {
        let value = json!({
            "location": "ftp://example.com",
            "retries": 0,
            "ratio": 0.5,
            "startTime": null,
            "items": [{"a": 1}],
        });

        assert!(matches!(value.field("location"), FieldValue::Text("ftp://example.com")));
        assert!(matches!(value.field("retries"), FieldValue::Integer(0)));
        assert!(matches!(value.field("ratio"), FieldValue::Decimal(_)));
        assert!(value.field("startTime").is_absent());
        assert_eq!(value.shape(), "object");
        assert_eq!(json!("garbage").shape(), "text");
        assert_eq!(json!(42).shape(), "integer");
        assert!(value.field("missing").is_absent());
        match value.field("items") {
            FieldValue::List(items) => assert_eq!(items.len(), 1),
            other => panic!("Expected list, got {}", other.shape()),
        }
    }

    #[test]
    fn test_option_conversion_distinguishes_zero_from_absent() {
        let zero: FieldValue<'_> = Some(0i32).into();
        let none: FieldValue<'_> = Option::<i32>::None.into();

        assert!(matches!(zero, FieldValue::Integer(0)));
        assert!(none.is_absent());
    }
}
