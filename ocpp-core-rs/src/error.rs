//! Error taxonomy for the OCPP core
//!
//! Initialization errors (`DuplicateAction`, `DuplicateRule`, `UnregisteredRule`,
//! `RuleKindMismatch`) must abort startup. Steady-state errors (`UnknownAction`,
//! `Validation`) are returned as data so the protocol layer can answer with a
//! CALLERROR instead of dropping the connection.

use std::fmt;

use thiserror::Error;

use crate::messages::ErrorCode;
use crate::validator::{RULE_REQUIRED, RULE_TYPE};

/// Errors raised by the registry, rule catalog and validator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Duplicate action: {0}")]
    DuplicateAction(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Duplicate rule: {0}")]
    DuplicateRule(String),

    #[error("Unregistered rule '{rule}' referenced by field '{field}'")]
    UnregisteredRule { rule: String, field: String },

    #[error("Rule '{rule}' cannot check {kind} field '{field}'")]
    RuleKindMismatch {
        rule: String,
        field: String,
        kind: &'static str,
    },

    #[error("Validation failed:\n{0}")]
    Validation(ValidationErrors),
}

impl CoreError {
    /// True for errors that can only happen while the catalog is being built
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            CoreError::DuplicateAction(_)
                | CoreError::DuplicateRule(_)
                | CoreError::UnregisteredRule { .. }
                | CoreError::RuleKindMismatch { .. }
        )
    }

    /// OCPP-J error code to answer a peer with
    pub fn call_error_code(&self) -> ErrorCode {
        match self {
            CoreError::UnknownAction(_) => ErrorCode::NotImplemented,
            CoreError::Validation(errors) => errors.call_error_code(),
            _ => ErrorCode::InternalError,
        }
    }
}

/// A single violated constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Field path, e.g. `location` or `meterValue[0].timestamp`
    pub field: String,
    /// Name the rule was attached under
    pub rule: String,
    pub reason: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.field.is_empty() { "payload" } else { self.field.as_str() };
        write!(f, "{}: {} ({})", field, self.reason, self.rule)
    }
}

/// Non-empty list of violations, in field declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    violations: Vec<Violation>,
}

impl ValidationErrors {
    /// Wrap a violation list; `None` when the list is empty
    pub fn new(violations: Vec<Violation>) -> Option<Self> {
        if violations.is_empty() {
            None
        } else {
            Some(Self { violations })
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations reported against a given field path
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations.iter().filter(move |v| v.field == field)
    }

    /// Most specific OCPP-J error code for the first violation
    pub fn call_error_code(&self) -> ErrorCode {
        match self.violations.first().map(|v| v.rule.as_str()) {
            Some(RULE_REQUIRED) => ErrorCode::OccurrenceConstraintViolation,
            Some(RULE_TYPE) => ErrorCode::TypeConstraintViolation,
            _ => ErrorCode::PropertyConstraintViolation,
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl From<ValidationErrors> for CoreError {
    fn from(errors: ValidationErrors) -> Self {
        CoreError::Validation(errors)
    }
}
