//! Input validation utilities.
//!
//! Raw form values are checked here before any store call, so a validation failure never leaves
//! a partial write behind. Every failure is a [`FrontDeskError::Validation`] naming the field.

use crate::id::RecordId;
use crate::{FrontDeskError, FrontDeskResult};
use chrono::NaiveDate;
use frontdesk_types::{Age, NonEmptyText, StockLevel, TextError};

fn invalid(field: &str, err: TextError) -> FrontDeskError {
    FrontDeskError::Validation(format!("{field}: {err}"))
}

/// A required text field; blank input is rejected.
pub fn required_text(field: &str, value: &str) -> FrontDeskResult<NonEmptyText> {
    NonEmptyText::new(value).map_err(|e| invalid(field, e))
}

/// An optional text field; blank input means "not supplied".
pub fn optional_text(value: &str) -> Option<NonEmptyText> {
    NonEmptyText::optional(value)
}

pub fn parse_age(years: i64) -> FrontDeskResult<Age> {
    Age::new(years).map_err(|e| invalid("age", e))
}

pub fn parse_stock(units: i64) -> FrontDeskResult<StockLevel> {
    StockLevel::new(units).map_err(|e| invalid("stock", e))
}

/// A required record id. Blank input is reported as missing rather than malformed.
pub fn required_id(field: &str, value: &str) -> FrontDeskResult<RecordId> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FrontDeskError::Validation(format!("{field} is required")));
    }
    RecordId::parse(value).map_err(|e| match e {
        FrontDeskError::Validation(msg) => FrontDeskError::Validation(format!("{field}: {msg}")),
        other => other,
    })
}

/// An optional record id; blank input means "not supplied".
pub fn optional_id(field: &str, value: &str) -> FrontDeskResult<Option<RecordId>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    required_id(field, value).map(Some)
}

/// An ISO-8601 calendar date (`YYYY-MM-DD`).
pub fn parse_date(field: &str, value: &str) -> FrontDeskResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        FrontDeskError::Validation(format!(
            "{field} must be a YYYY-MM-DD date, got '{value}'"
        ))
    })
}
