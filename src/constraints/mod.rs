//! Constraint evaluation for question answers
//!
//! A constraint is a pure predicate over candidate answer values, tied to
//! the field type it guards. A question's effective validity for a value is
//! the logical AND over all attached constraints; an empty constraint set
//! accepts everything.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::value_objects::FieldType;

/// Conservative email shape: one `@`, non-empty local part, dotted domain
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

/// Accepted calendar date formats
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// A per-field-type validation predicate attached to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// The field type this constraint guards
    pub field_type: FieldType,
    /// The predicate itself
    pub rule: ConstraintRule,
}

/// Type-specific validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintRule {
    /// Any text is valid
    Text,
    /// Whole number within the optional bounds
    Integer {
        min: Option<i64>,
        max: Option<i64>,
    },
    /// Decimal number within the optional bounds
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Case-insensitive true/false
    Boolean,
    /// Calendar date in an accepted format
    Date,
    /// Email address
    Email,
    /// Value must match the regular expression
    Pattern { pattern: String },
    /// Value must be a member of the enumerated set
    OneOf { allowed: Vec<String> },
}

impl Constraint {
    /// Build the canonical constraint for a declared field type.
    ///
    /// Returns `None` for `FieldType::None` and for the parameterized types
    /// (`Pattern`, `OneOf`), which have no canonical parameterless form and
    /// must be attached explicitly.
    pub fn from_field_type(field_type: FieldType) -> Option<Self> {
        let rule = match field_type {
            FieldType::None | FieldType::Pattern | FieldType::OneOf => return None,
            FieldType::Text => ConstraintRule::Text,
            FieldType::Integer => ConstraintRule::Integer {
                min: None,
                max: None,
            },
            FieldType::Number => ConstraintRule::Number {
                min: None,
                max: None,
            },
            FieldType::Boolean => ConstraintRule::Boolean,
            FieldType::Date => ConstraintRule::Date,
            FieldType::Email => ConstraintRule::Email,
        };
        Some(Self { field_type, rule })
    }

    /// An integer constraint with inclusive bounds
    pub fn integer_range(min: Option<i64>, max: Option<i64>) -> Self {
        Self {
            field_type: FieldType::Integer,
            rule: ConstraintRule::Integer { min, max },
        }
    }

    /// A number constraint with inclusive bounds
    pub fn number_range(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            field_type: FieldType::Number,
            rule: ConstraintRule::Number { min, max },
        }
    }

    /// A regular-expression constraint
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            field_type: FieldType::Pattern,
            rule: ConstraintRule::Pattern {
                pattern: pattern.into(),
            },
        }
    }

    /// An enumerated-set constraint
    pub fn one_of(allowed: Vec<String>) -> Self {
        Self {
            field_type: FieldType::OneOf,
            rule: ConstraintRule::OneOf { allowed },
        }
    }

    /// Validate a candidate value against this constraint.
    ///
    /// Pure and total: any input, including empty or malformed text, yields
    /// a boolean. An unparseable pattern yields `false`.
    pub fn validate(&self, value: &str) -> bool {
        match &self.rule {
            ConstraintRule::Text => true,
            ConstraintRule::Integer { min, max } => match value.trim().parse::<i64>() {
                Ok(n) => min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi),
                Err(_) => false,
            },
            ConstraintRule::Number { min, max } => match value.trim().parse::<f64>() {
                Ok(n) => {
                    n.is_finite()
                        && min.is_none_or(|lo| n >= lo)
                        && max.is_none_or(|hi| n <= hi)
                }
                Err(_) => false,
            },
            ConstraintRule::Boolean => {
                let v = value.trim();
                v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false")
            }
            ConstraintRule::Date => DATE_FORMATS
                .iter()
                .any(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).is_ok()),
            ConstraintRule::Email => Regex::new(EMAIL_PATTERN)
                .map(|re| re.is_match(value.trim()))
                .unwrap_or(false),
            ConstraintRule::Pattern { pattern } => Regex::new(pattern)
                .map(|re| re.is_match(value))
                .unwrap_or(false),
            ConstraintRule::OneOf { allowed } => allowed.iter().any(|a| a == value),
        }
    }
}
