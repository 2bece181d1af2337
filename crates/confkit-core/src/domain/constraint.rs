//! Constraint descriptors attached to configuration keys.
//!
//! A [`KeyDescriptor`] is the declarative side of a key: its name, default
//! value, and validation constraints.  Descriptors are built once at
//! registration time and resolved into a key handler; nothing is discovered
//! at access time.
//!
//! ```rust
//! use confkit_core::domain::KeyDescriptor;
//!
//! let retries = KeyDescriptor::<i32>::new("retries")
//!     .default_value(3)
//!     .int_range(0, 5)
//!     .description("How often a failed request is retried");
//!
//! assert_eq!(retries.key(), "retries");
//! assert_eq!(retries.default(), Some(&3));
//! ```

use std::fmt;

use thiserror::Error;

use crate::codec::CodecError;
use crate::domain::setting::{HandlerVariant, SettingType};

// ── Constraint kinds ──────────────────────────────────────────────────────────

/// The kind of a [`Constraint`], used to check it is legal for a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    IntRange,
    FloatRange,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintKind::IntRange => f.write_str("integer range"),
            ConstraintKind::FloatRange => f.write_str("float range"),
        }
    }
}

/// Inclusive integer bounds plus the spinner step a UI should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl IntRange {
    /// Checks `value` against the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BelowMinimum`] or
    /// [`ValidationError::AboveMaximum`].
    pub fn check(&self, value: i64) -> Result<(), ValidationError> {
        if value < self.min {
            return Err(ValidationError::BelowMinimum {
                value: value.to_string(),
                min: self.min.to_string(),
            });
        }
        if value > self.max {
            return Err(ValidationError::AboveMaximum {
                value: value.to_string(),
                max: self.max.to_string(),
            });
        }
        Ok(())
    }
}

/// Inclusive float bounds plus the spinner step a UI should use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FloatRange {
    /// Checks `value` against the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotANumber`] for NaN, otherwise
    /// [`ValidationError::BelowMinimum`] or [`ValidationError::AboveMaximum`].
    pub fn check(&self, value: f64) -> Result<(), ValidationError> {
        if value.is_nan() {
            return Err(ValidationError::NotANumber);
        }
        if value < self.min {
            return Err(ValidationError::BelowMinimum {
                value: value.to_string(),
                min: self.min.to_string(),
            });
        }
        if value > self.max {
            return Err(ValidationError::AboveMaximum {
                value: value.to_string(),
                max: self.max.to_string(),
            });
        }
        Ok(())
    }
}

/// A validation constraint declared on a key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    IntRange(IntRange),
    FloatRange(FloatRange),
}

impl Constraint {
    /// Returns the kind of this constraint.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::IntRange(_) => ConstraintKind::IntRange,
            Constraint::FloatRange(_) => ConstraintKind::FloatRange,
        }
    }

    /// Checks that the constraint itself is well-formed.
    ///
    /// Returns a reason string when it is not; callers wrap it in
    /// [`SchemaError::InvalidBounds`] together with the key name.
    pub fn bounds_problem(&self) -> Option<String> {
        match self {
            Constraint::IntRange(r) if r.min > r.max => {
                Some(format!("min {} is greater than max {}", r.min, r.max))
            }
            Constraint::IntRange(r) if r.step <= 0 => {
                Some(format!("step {} must be positive", r.step))
            }
            Constraint::FloatRange(r) if !(r.min.is_finite() && r.max.is_finite()) => {
                Some("bounds must be finite".to_string())
            }
            Constraint::FloatRange(r) if r.min > r.max => {
                Some(format!("min {} is greater than max {}", r.min, r.max))
            }
            Constraint::FloatRange(r) if !(r.step > 0.0) => {
                Some(format!("step {} must be positive", r.step))
            }
            _ => None,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A value was rejected by a key's constraints.
///
/// Recoverable: the store is untouched and the caller decides how to surface
/// the problem.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("value {value} is below the minimum {min}")]
    BelowMinimum { value: String, min: String },

    #[error("value {value} is above the maximum {max}")]
    AboveMaximum { value: String, max: String },

    #[error("value is not a number")]
    NotANumber,

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        source: Box<ValidationError>,
    },
}

/// A key's declaration is inconsistent with its variant.
///
/// Raised at registration time; this is a programming error in the key
/// declarations, not a runtime condition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("configuration keys must not be empty")]
    EmptyKey,

    #[error("key {0:?} is already registered")]
    DuplicateKey(String),

    #[error("{constraint} constraint is not allowed on {variant} key {key:?}")]
    ConstraintNotAllowed {
        key: String,
        constraint: ConstraintKind,
        variant: HandlerVariant,
    },

    #[error("invalid bounds on key {key:?}: {reason}")]
    InvalidBounds { key: String, reason: String },

    #[error("default value of key {key:?} violates its constraints: {source}")]
    DefaultRejected {
        key: String,
        #[source]
        source: ValidationError,
    },

    #[error("default value of key {key:?} cannot be persisted: {source}")]
    DefaultNotPersistable {
        key: String,
        #[source]
        source: CodecError,
    },
}

// ── Key descriptor ────────────────────────────────────────────────────────────

/// Declarative metadata for one configuration key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDescriptor<T> {
    key: String,
    default: Option<T>,
    constraints: Vec<Constraint>,
    description: Option<String>,
}

impl<T: SettingType> KeyDescriptor<T> {
    /// Starts a descriptor for `key` with no default and no constraints.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: None,
            constraints: Vec::new(),
            description: None,
        }
    }

    /// Sets the default value returned while the key is absent.
    pub fn default_value(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    /// Adds an inclusive integer range with a spinner step of 1.
    pub fn int_range(self, min: i64, max: i64) -> Self {
        self.int_range_with_step(min, max, 1)
    }

    /// Adds an inclusive integer range with an explicit spinner step.
    pub fn int_range_with_step(self, min: i64, max: i64, step: i64) -> Self {
        self.constraint(Constraint::IntRange(IntRange { min, max, step }))
    }

    /// Adds an inclusive float range with a spinner step of 1.0.
    pub fn float_range(self, min: f64, max: f64) -> Self {
        self.float_range_with_step(min, max, 1.0)
    }

    /// Adds an inclusive float range with an explicit spinner step.
    pub fn float_range_with_step(self, min: f64, max: f64, step: f64) -> Self {
        self.constraint(Constraint::FloatRange(FloatRange { min, max, step }))
    }

    /// Adds an arbitrary constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Attaches a human-readable description.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range_accepts_inclusive_bounds() {
        let range = IntRange { min: 0, max: 5, step: 1 };
        assert!(range.check(0).is_ok());
        assert!(range.check(5).is_ok());
    }

    #[test]
    fn test_int_range_rejects_values_outside_bounds() {
        // Arrange
        let range = IntRange { min: 0, max: 5, step: 1 };

        // Act
        let high = range.check(10);
        let low = range.check(-1);

        // Assert
        assert_eq!(
            high,
            Err(ValidationError::AboveMaximum {
                value: "10".to_string(),
                max: "5".to_string(),
            })
        );
        assert!(matches!(low, Err(ValidationError::BelowMinimum { .. })));
    }

    #[test]
    fn test_float_range_rejects_nan() {
        let range = FloatRange { min: 0.0, max: 1.0, step: 0.1 };
        assert_eq!(range.check(f64::NAN), Err(ValidationError::NotANumber));
    }

    #[test]
    fn test_bounds_problem_detects_inverted_range() {
        let constraint = Constraint::IntRange(IntRange { min: 10, max: 1, step: 1 });
        assert!(constraint.bounds_problem().is_some());
    }

    #[test]
    fn test_bounds_problem_detects_non_positive_step() {
        let int = Constraint::IntRange(IntRange { min: 0, max: 1, step: 0 });
        let float = Constraint::FloatRange(FloatRange { min: 0.0, max: 1.0, step: -0.5 });
        assert!(int.bounds_problem().is_some());
        assert!(float.bounds_problem().is_some());
    }

    #[test]
    fn test_bounds_problem_accepts_well_formed_ranges() {
        let constraint = Constraint::FloatRange(FloatRange { min: 0.0, max: 1.0, step: 0.1 });
        assert_eq!(constraint.bounds_problem(), None);
    }

    #[test]
    fn test_descriptor_builder_collects_constraints() {
        // Arrange / Act
        let descriptor = KeyDescriptor::<i64>::new("timeout_ms")
            .default_value(500)
            .int_range_with_step(100, 10_000, 100)
            .description("request timeout");

        // Assert
        assert_eq!(descriptor.key(), "timeout_ms");
        assert_eq!(descriptor.default(), Some(&500));
        assert_eq!(
            descriptor.constraints(),
            &[Constraint::IntRange(IntRange {
                min: 100,
                max: 10_000,
                step: 100,
            })]
        );
        assert_eq!(descriptor.description_text(), Some("request timeout"));
    }

    #[test]
    fn test_element_error_names_index() {
        let err = ValidationError::Element {
            index: 2,
            source: Box::new(ValidationError::NotANumber),
        };
        assert_eq!(err.to_string(), "element 2: value is not a number");
    }
}
