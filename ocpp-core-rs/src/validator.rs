//! Validator engine
//!
//! Runs every rule attached to a schema against a payload and collects the
//! violations in a deterministic order: fields in declaration order, rules in
//! attachment order, nested payloads depth-first at the position of their
//! parent field.
//!
//! A missing required field yields a single violation and skips the rest of
//! that field's rules. A present value of the wrong shape yields a `type`
//! violation and also skips them. Sibling fields are always checked. A
//! payload that is not an object at all yields one `type` violation at the
//! empty path and nothing else.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::error::{ValidationErrors, Violation};
use crate::registry::FeatureRegistry;
use crate::rules::RuleContext;
use crate::schema::{Field, FieldKind, FieldValue, Payload, PayloadSchema};

/// Rule name reported for a missing field that has no `required` rule attached
pub const RULE_REQUIRED: &str = "required";

/// Rule name reported when a value has the wrong shape
pub const RULE_TYPE: &str = "type";

/// Outcome of validating one payload
pub type ValidationResult = Result<(), ValidationErrors>;

/// Check a payload against its schema
pub fn validate<P: Payload + ?Sized>(
    payload: &P,
    schema: &PayloadSchema,
    registry: &FeatureRegistry,
) -> ValidationResult {
    let ctx = RuleContext::new(registry);
    let mut violations = Vec::new();

    match payload.shape() {
        "object" => validate_fields(&payload_ref(payload), schema, &ctx, "", &mut violations),
        found => violations.push(Violation {
            field: String::new(),
            rule: RULE_TYPE.to_string(),
            reason: format!("expected object, found {}", found),
        }),
    }

    match ValidationErrors::new(violations) {
        None => Ok(()),
        Some(errors) => {
            debug!(
                "{} failed validation with {} violation(s)",
                schema.name(),
                errors.len()
            );
            Err(errors)
        }
    }
}

/// Lets `validate` accept unsized payloads such as `dyn AnyPayload`
struct PayloadRef<'a, P: ?Sized>(&'a P);

impl<P: Payload + ?Sized> Payload for PayloadRef<'_, P> {
    fn field(&self, name: &str) -> FieldValue<'_> {
        self.0.field(name)
    }

    fn shape(&self) -> &'static str {
        self.0.shape()
    }
}

fn payload_ref<P: Payload + ?Sized>(payload: &P) -> PayloadRef<'_, P> {
    PayloadRef(payload)
}

fn validate_fields(
    payload: &dyn Payload,
    schema: &PayloadSchema,
    ctx: &RuleContext<'_>,
    prefix: &str,
    out: &mut Vec<Violation>,
) {
    for field in schema.describe_fields() {
        let path = if prefix.is_empty() {
            field.name().to_string()
        } else {
            format!("{}.{}", prefix, field.name())
        };
        let value = payload.field(field.name());
        check_field(field, value, ctx, &path, out);
    }
}

fn check_field(
    field: &Field,
    value: FieldValue<'_>,
    ctx: &RuleContext<'_>,
    path: &str,
    out: &mut Vec<Violation>,
) {
    let required_rule = field
        .required_rule()
        .or(if field.is_optional() { None } else { Some(RULE_REQUIRED) });

    let missing = match &value {
        FieldValue::Absent => true,
        FieldValue::Text(s) => s.is_empty() && field.required_rule().is_some(),
        _ => false,
    };

    if missing {
        if let Some(rule) = required_rule {
            out.push(Violation {
                field: path.to_string(),
                rule: rule.to_string(),
                reason: "is required".to_string(),
            });
        }
        return;
    }

    let value = match coerce(field.kind(), value) {
        Ok(value) => value,
        Err(found) => {
            out.push(Violation {
                field: path.to_string(),
                rule: RULE_TYPE.to_string(),
                reason: format!("expected {}, found {}", field.kind().name(), found),
            });
            return;
        }
    };

    for bound in field.rules() {
        let outcome = bound.rule.check(&value, ctx);
        trace!("{} {} -> {:?}", path, bound.name, outcome);
        if let Err(reason) = outcome {
            out.push(Violation {
                field: path.to_string(),
                rule: bound.name.clone(),
                reason,
            });
        }
    }

    match (field.kind(), &value) {
        (FieldKind::Object(schema), FieldValue::Object(nested)) => {
            validate_fields(*nested, schema, ctx, path, out);
        }
        (FieldKind::List(schema), FieldValue::List(items)) => {
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                match item {
                    FieldValue::Object(nested) => {
                        validate_fields(*nested, schema, ctx, &item_path, out);
                    }
                    other => out.push(Violation {
                        field: item_path,
                        rule: RULE_TYPE.to_string(),
                        reason: format!("expected object, found {}", other.shape()),
                    }),
                }
            }
        }
        _ => {}
    }
}

/// Bring a value into the shape its field kind expects; `Err` names the shape found
fn coerce<'a>(kind: &FieldKind, value: FieldValue<'a>) -> Result<FieldValue<'a>, &'static str> {
    match (kind, value) {
        (FieldKind::Text, v @ FieldValue::Text(_)) => Ok(v),
        (FieldKind::Integer, v @ FieldValue::Integer(_)) => Ok(v),
        (FieldKind::Decimal, v @ FieldValue::Decimal(_)) => Ok(v),
        (FieldKind::Decimal, FieldValue::Integer(i)) => Ok(FieldValue::Decimal(i as f64)),
        (FieldKind::Timestamp, v @ FieldValue::Timestamp(_)) => Ok(v),
        (FieldKind::Timestamp, FieldValue::Text(s)) => DateTime::parse_from_rfc3339(s)
            .map(|t| FieldValue::Timestamp(t.with_timezone(&Utc)))
            .map_err(|_| "text that is not an RFC 3339 timestamp"),
        (FieldKind::Object(_), v @ FieldValue::Object(_)) => Ok(v),
        (FieldKind::List(_), v @ FieldValue::List(_)) => Ok(v),
        (_, other) => Err(other.shape()),
    }
}
