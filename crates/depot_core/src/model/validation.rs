//! Field-level validation rules shared by entity types.
//!
//! # Invariants
//! - Rules only inspect one record; cross-record rules (uniqueness,
//!   references) live in the repository and service layers.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static TELEPHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()\-]{5,19}$").expect("valid telephone regex"));
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("valid date regex"));

/// Rejection reasons for a record or partial-update payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required text field is empty after trim.
    BlankField(&'static str),
    /// Quantity-like field holds a negative value.
    Negative { field: &'static str, value: i64 },
    /// Value falls outside its closed range.
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    /// Lower bound field exceeds its upper bound field.
    InvertedRange {
        lower: &'static str,
        upper: &'static str,
    },
    /// Decimal field holds NaN or an infinity.
    NonFinite { field: &'static str, value: f64 },
    InvalidTelephone(String),
    InvalidDate { field: &'static str, value: String },
    /// Partial-update payload cannot be decoded.
    MalformedPayload(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::Negative { field, value } => {
                write!(f, "field `{field}` must not be negative, got {value}")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "field `{field}` must be within {min}..={max}, got {value}"),
            Self::InvertedRange { lower, upper } => {
                write!(f, "field `{lower}` must not exceed `{upper}`")
            }
            Self::NonFinite { field, value } => {
                write!(f, "field `{field}` must be a finite number, got {value}")
            }
            Self::InvalidTelephone(value) => write!(f, "invalid telephone `{value}`"),
            Self::InvalidDate { field, value } => {
                write!(f, "field `{field}` must be a YYYY-MM-DD date, got `{value}`")
            }
            Self::MalformedPayload(message) => write!(f, "malformed payload: {message}"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field, value });
    }
    Ok(())
}

pub(crate) fn require_within(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn require_ordered(
    lower: (&'static str, i64),
    upper: (&'static str, i64),
) -> Result<(), ValidationError> {
    if lower.1 > upper.1 {
        return Err(ValidationError::InvertedRange {
            lower: lower.0,
            upper: upper.0,
        });
    }
    Ok(())
}

pub(crate) fn require_telephone(value: &str) -> Result<(), ValidationError> {
    if !TELEPHONE_RE.is_match(value.trim()) {
        return Err(ValidationError::InvalidTelephone(value.to_string()));
    }
    Ok(())
}

pub(crate) fn require_date(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !DATE_RE.is_match(value) {
        return Err(ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        require_date, require_finite, require_ordered, require_telephone, require_text,
        ValidationError,
    };

    #[test]
    fn telephone_accepts_common_formats() {
        assert!(require_telephone("+55 (11) 4002-8922").is_ok());
        assert!(require_telephone("5511999999999").is_ok());
        assert!(require_telephone("call me").is_err());
        assert!(require_telephone("12").is_err());
    }

    #[test]
    fn date_requires_iso_calendar_format() {
        assert!(require_date("due_date", "2022-04-04").is_ok());
        assert!(require_date("due_date", "2022-13-01").is_err());
        assert!(require_date("due_date", "04/04/2022").is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            require_text("first_name", "   "),
            Err(ValidationError::BlankField("first_name"))
        );
    }

    #[test]
    fn inverted_range_names_both_fields() {
        let err = require_ordered(("minimum_capacity", 10), ("maximum_capacity", 5)).unwrap_err();
        assert!(err.to_string().contains("minimum_capacity"));
        assert!(err.to_string().contains("maximum_capacity"));
    }

    #[test]
    fn decimals_must_be_finite() {
        assert!(require_finite("sale_price", -12.5).is_ok());
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                require_finite("sale_price", value),
                Err(ValidationError::NonFinite {
                    field: "sale_price",
                    ..
                })
            ));
        }
    }
}
