//! Constraint rules
//!
//! Each rule is a pure check of one field value. Rules that need to know which
//! features exist (the `oneOfDynamic` kind) get the registry through
//! [`RuleContext`] at validation time and never keep a copy of its contents,
//! so a registry that grows or shrinks is reflected on the next validation.
//!
//! Named rules live in a [`RuleCatalog`] built once during initialization.
//! Registering a name twice is an error.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::CoreError;
use crate::registry::FeatureRegistry;
use crate::schema::{FieldKind, FieldValue};

/// Result of checking one rule: `Err` carries the reason
pub type Outcome = Result<(), String>;

/// What a rule may look at besides the field value
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub registry: &'a FeatureRegistry,
}

impl<'a> RuleContext<'a> {
    pub fn new(registry: &'a FeatureRegistry) -> Self {
        Self { registry }
    }
}

/// Computes the legal value set of a dynamic enumeration from the registry
#[derive(Clone, Copy)]
pub struct Resolver {
    name: &'static str,
    resolve: fn(&FeatureRegistry) -> BTreeSet<String>,
}

impl Resolver {
    pub const fn new(name: &'static str, resolve: fn(&FeatureRegistry) -> BTreeSet<String>) -> Self {
        Self { name, resolve }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn resolve(&self, registry: &FeatureRegistry) -> BTreeSet<String> {
        (self.resolve)(registry)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resolver").field(&self.name).finish()
    }
}

/// Named string formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Absolute URI with a scheme (`ftp://host/path`)
    Uri,
    /// Printable ASCII only (OCPP CiString content)
    Printable,
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Uri => "uri",
            Format::Printable => "printable",
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Format::Uri => url::Url::parse(value).is_ok(),
            Format::Printable => value.chars().all(|c| (' '..='~').contains(&c)),
        }
    }
}

/// A field-level constraint
#[derive(Debug, Clone)]
pub enum Rule {
    /// Field must be present; text must also be non-empty
    Required,
    NumericMin(i64),
    NumericMax(i64),
    /// Maximum length in characters
    MaxLength(usize),
    MinItems(usize),
    Format(Format),
    OneOf(&'static [&'static str]),
    OneOfDynamic(Resolver),
}

impl Rule {
    pub fn numeric_min(min: i64) -> Self {
        Rule::NumericMin(min)
    }

    pub fn numeric_max(max: i64) -> Self {
        Rule::NumericMax(max)
    }

    pub fn max_length(max: usize) -> Self {
        Rule::MaxLength(max)
    }

    pub fn min_items(min: usize) -> Self {
        Rule::MinItems(min)
    }

    pub fn one_of(values: &'static [&'static str]) -> Self {
        Rule::OneOf(values)
    }

    pub fn one_of_dynamic(resolver: Resolver) -> Self {
        Rule::OneOfDynamic(resolver)
    }

    /// Name of the rule kind, used for inline attachments
    pub fn kind_name(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::NumericMin(_) => "numericMin",
            Rule::NumericMax(_) => "numericMax",
            Rule::MaxLength(_) => "maxLength",
            Rule::MinItems(_) => "minItems",
            Rule::Format(_) => "format",
            Rule::OneOf(_) => "oneOf",
            Rule::OneOfDynamic(_) => "oneOfDynamic",
        }
    }

    /// Whether this rule can check values of the given field kind
    pub fn applies_to(&self, kind: &FieldKind) -> bool {
        match self {
            Rule::Required => true,
            Rule::NumericMin(_) | Rule::NumericMax(_) => {
                matches!(kind, FieldKind::Integer | FieldKind::Decimal)
            }
            Rule::MaxLength(_) | Rule::Format(_) | Rule::OneOf(_) | Rule::OneOfDynamic(_) => {
                matches!(kind, FieldKind::Text)
            }
            Rule::MinItems(_) => matches!(kind, FieldKind::List(_)),
        }
    }

    /// Check a value. Values of a shape the rule does not apply to pass.
    pub fn check(&self, value: &FieldValue<'_>, ctx: &RuleContext<'_>) -> Outcome {
        match (self, value) {
            (Rule::Required, FieldValue::Absent) => Err("is required".to_string()),
            (Rule::Required, FieldValue::Text(s)) if s.is_empty() => {
                Err("is required and must not be empty".to_string())
            }

            (Rule::NumericMin(min), FieldValue::Integer(v)) if v < min => {
                Err(format!("must be at least {}, got {}", min, v))
            }
            (Rule::NumericMin(min), FieldValue::Decimal(v)) if *v < *min as f64 => {
                Err(format!("must be at least {}, got {}", min, v))
            }
            (Rule::NumericMax(max), FieldValue::Integer(v)) if v > max => {
                Err(format!("must be at most {}, got {}", max, v))
            }
            (Rule::NumericMax(max), FieldValue::Decimal(v)) if *v > *max as f64 => {
                Err(format!("must be at most {}, got {}", max, v))
            }

            (Rule::MaxLength(max), FieldValue::Text(s)) => {
                let len = s.chars().count();
                if len > *max {
                    Err(format!("length {} exceeds maximum of {}", len, max))
                } else {
                    Ok(())
                }
            }

            (Rule::MinItems(min), FieldValue::List(items)) if items.len() < *min => {
                Err(format!("must contain at least {} item(s), got {}", min, items.len()))
            }

            (Rule::Format(format), FieldValue::Text(s)) if !format.matches(s) => {
                Err(format!("'{}' is not a valid {}", s, format.name()))
            }

            (Rule::OneOf(allowed), FieldValue::Text(s)) if !allowed.iter().any(|a| a == s) => {
                Err(format!("'{}' is not one of [{}]", s, allowed.join(", ")))
            }

            (Rule::OneOfDynamic(resolver), FieldValue::Text(s)) => {
                let allowed = resolver.resolve(ctx.registry);
                if allowed.contains(*s) {
                    Ok(())
                } else {
                    let names: Vec<&str> = allowed.iter().map(String::as_str).collect();
                    Err(format!(
                        "'{}' is not one of the {} [{}]",
                        s,
                        resolver.name(),
                        names.join(", ")
                    ))
                }
            }

            _ => Ok(()),
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Process-wide set of named rules, populated once at startup
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: HashMap<String, Rule>,
}

impl RuleCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the generic rules every schema may use
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for (name, rule) in [
            ("required", Rule::Required),
            ("uri", Rule::Format(Format::Uri)),
            ("printable", Rule::Format(Format::Printable)),
            ("nonNegative", Rule::NumericMin(0)),
            ("positive", Rule::NumericMin(1)),
        ] {
            catalog.rules.insert(name.to_string(), rule);
        }
        catalog
    }

    /// Register a named rule; fails if the name is taken
    pub fn register(&mut self, name: impl Into<String>, rule: Rule) -> Result<(), CoreError> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(CoreError::DuplicateRule(name));
        }
        tracing::debug!("Registered rule {} ({})", name, rule.kind_name());
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Look up a rule referenced by `field`
    pub fn resolve(&self, name: &str, field: &str) -> Result<&Rule, CoreError> {
        self.rules.get(name).ok_or_else(|| CoreError::UnregisteredRule {
            rule: name.to_string(),
            field: field.to_string(),
        })
    }

    /// Registered names, sorted
    pub fn names(&self) -> BTreeSet<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(rule: &Rule, value: FieldValue<'_>) -> Outcome {
        let registry = FeatureRegistry::new();
        rule.check(&value, &RuleContext::new(&registry))
    }

    #[test]
    fn test_required() {
        assert!(check(&Rule::Required, FieldValue::Absent).is_err());
        assert!(check(&Rule::Required, FieldValue::Text("")).is_err());
        assert!(check(&Rule::Required, FieldValue::Text("x")).is_ok());
        assert!(check(&Rule::Required, FieldValue::Integer(0)).is_ok());
    }

    #[test]
    fn test_numeric_bounds() {
        let min = Rule::numeric_min(0);
        assert!(check(&min, FieldValue::Integer(-1)).is_err());
        assert!(check(&min, FieldValue::Integer(0)).is_ok());
        assert!(check(&min, FieldValue::Decimal(-0.5)).is_err());

        let max = Rule::numeric_max(10);
        assert!(check(&max, FieldValue::Integer(10)).is_ok());
        assert!(check(&max, FieldValue::Integer(11)).is_err());
    }

    #[test]
    fn test_max_length_counts_characters() {
        let rule = Rule::max_length(3);
        assert!(check(&rule, FieldValue::Text("äöü")).is_ok());
        assert!(check(&rule, FieldValue::Text("abcd")).is_err());
    }

    #[test]
    fn test_formats() {
        let uri = Rule::Format(Format::Uri);
        assert!(check(&uri, FieldValue::Text("ftp://diag.example.com/upload")).is_ok());
        assert!(check(&uri, FieldValue::Text("not a uri")).is_err());

        let printable = Rule::Format(Format::Printable);
        assert!(check(&printable, FieldValue::Text("EK3-001")).is_ok());
        assert!(check(&printable, FieldValue::Text("tab\there")).is_err());
    }

    #[test]
    fn test_one_of() {
        let rule = Rule::one_of(&["Accepted", "Rejected"]);
        assert!(check(&rule, FieldValue::Text("Accepted")).is_ok());

        let reason = check(&rule, FieldValue::Text("Maybe")).unwrap_err();
        assert!(reason.contains("Maybe"));
        assert!(reason.contains("Accepted, Rejected"));
    }

    #[test]
    fn test_rule_ignores_other_shapes() {
        assert!(check(&Rule::max_length(1), FieldValue::Integer(12345)).is_ok());
        assert!(check(&Rule::numeric_min(5), FieldValue::Text("1")).is_ok());
    }

    #[test]
    fn test_applies_to() {
        assert!(Rule::max_length(5).applies_to(&FieldKind::Text));
        assert!(!Rule::max_length(5).applies_to(&FieldKind::Integer));
        assert!(Rule::numeric_min(0).applies_to(&FieldKind::Decimal));
        assert!(Rule::Required.applies_to(&FieldKind::Timestamp));
    }

    #[test]
    fn test_catalog_rejects_duplicate_names() {
        let mut catalog = RuleCatalog::with_builtins();
        let before = catalog.len();

        catalog.register("status", Rule::one_of(&["A"])).unwrap();
        let err = catalog.register("status", Rule::one_of(&["B"])).unwrap_err();

        assert_eq!(err, CoreError::DuplicateRule("status".to_string()));
        assert_eq!(catalog.len(), before + 1);
        assert!(matches!(catalog.get("status"), Some(Rule::OneOf(values)) if values[0] == "A"));
    }

    #[test]
    fn test_catalog_builtins() {
        let catalog = RuleCatalog::with_builtins();
        assert!(catalog.names().contains("required"));
        assert!(matches!(catalog.get("nonNegative"), Some(Rule::NumericMin(0))));
        assert!(catalog.resolve("nope", "field").is_err());
    }
}
