//! Form schema plumbing shared by the API server and its clients.
//!
//! Every entity form implements [`Validate`], turning raw user input into a typed
//! input value or a set of field-level [`ValidationErrors`]. The same code runs before
//! a client submits a form and again in the server before anything is written.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_'+\-.]*[A-Za-z0-9_+\-]@([A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

/// Field name to error messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
#[error("validation failed on {count} field(s)", count = .fields.len())]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// First message recorded for `field`.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }
}

/// A form that can be checked against its schema.
pub trait Validate {
    type Output;

    fn validate(&self) -> Result<Self::Output, ValidationErrors>;
}

/// Numeric form input: browsers submit strings, JSON clients submit numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    /// Coerces the input to a finite number. Blank text counts as absent.
    pub fn coerce(&self) -> Result<Option<f64>, &'static str> {
        let number = match self {
            NumericInput::Number(n) => *n,
            NumericInput::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Ok(None);
                }
                text.parse::<f64>().map_err(|_| "Expected a number")?
            }
        };

        if !number.is_finite() {
            return Err("Expected a number");
        }
        Ok(Some(number))
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value) && !value.starts_with('.') && !value.contains("..")
}

/// Hyphenated UUID, the only form the API hands out.
pub fn is_valid_uuid(value: &str) -> bool {
    value.len() == 36 && uuid::Uuid::try_parse(value).is_ok()
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (read as UTC) or `YYYY-MM-DD`.
pub fn parse_datetime(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

fn blank_to_none(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Collects field errors while a form is being converted.
#[derive(Default)]
pub(crate) struct FormChecker {
    errors: ValidationErrors,
}

impl FormChecker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.add(field, message);
    }

    fn check_length(&mut self, field: &str, value: &str, max: usize) -> bool {
        if value.chars().count() > max {
            self.fail(field, format!("Must be at most {} characters", max));
            return false;
        }
        true
    }

    pub(crate) fn required_text(
        &mut self,
        field: &str,
        value: Option<&String>,
        max: usize,
        missing: &str,
    ) -> String {
        match blank_to_none(value) {
            Some(text) => {
                self.check_length(field, &text, max);
                text
            }
            None => {
                self.fail(field, missing);
                String::new()
            }
        }
    }

    pub(crate) fn optional_text(
        &mut self,
        field: &str,
        value: Option<&String>,
        max: usize,
    ) -> Option<String> {
        let text = blank_to_none(value)?;
        self.check_length(field, &text, max).then_some(text)
    }

    pub(crate) fn optional_email(&mut self, field: &str, value: Option<&String>) -> Option<String> {
        let text = blank_to_none(value)?;
        if !is_valid_email(&text) {
            self.fail(field, "Invalid email");
            return None;
        }
        Some(text)
    }

    pub(crate) fn optional_uuid(&mut self, field: &str, value: Option<&String>) -> Option<String> {
        let text = blank_to_none(value)?;
        if !is_valid_uuid(&text) {
            self.fail(field, "Invalid UUID");
            return None;
        }
        Some(text.to_lowercase())
    }

    pub(crate) fn required_uuid(
        &mut self,
        field: &str,
        value: Option<&String>,
        message: &str,
    ) -> String {
        match blank_to_none(value) {
            Some(text) if is_valid_uuid(&text) => text.to_lowercase(),
            _ => {
                self.fail(field, message);
                String::new()
            }
        }
    }

    pub(crate) fn optional_number(
        &mut self,
        field: &str,
        value: Option<&NumericInput>,
    ) -> Option<f64> {
        match value?.coerce() {
            Ok(number) => number,
            Err(message) => {
                self.fail(field, message);
                None
            }
        }
    }

    pub(crate) fn optional_date(&mut self, field: &str, value: Option<&String>) -> Option<String> {
        let text = blank_to_none(value)?;
        match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
            Ok(date) => Some(date.format("%Y-%m-%d").to_string()),
            Err(_) => {
                self.fail(field, "Invalid date, expected YYYY-MM-DD");
                None
            }
        }
    }

    pub(crate) fn optional_datetime(&mut self, field: &str, value: Option<&String>) -> Option<i64> {
        let text = blank_to_none(value)?;
        let parsed = parse_datetime(&text);
        if parsed.is_none() {
            self.fail(field, "Invalid date");
        }
        parsed
    }

    /// Parses an enumerated field; blank input yields `default`.
    pub(crate) fn one_of<T: Copy>(
        &mut self,
        field: &str,
        value: Option<&String>,
        options: &[(&str, T)],
        default: T,
    ) -> T {
        match blank_to_none(value) {
            Some(text) => self.lookup(field, &text, options).unwrap_or(default),
            None => default,
        }
    }

    pub(crate) fn required_one_of<T: Copy>(
        &mut self,
        field: &str,
        value: Option<&String>,
        options: &[(&str, T)],
        missing: &str,
    ) -> Option<T> {
        match blank_to_none(value) {
            Some(text) => self.lookup(field, &text, options),
            None => {
                self.fail(field, missing);
                None
            }
        }
    }

    fn lookup<T: Copy>(&mut self, field: &str, text: &str, options: &[(&str, T)]) -> Option<T> {
        let found = options
            .iter()
            .find(|(name, _)| *name == text)
            .map(|(_, variant)| *variant);
        if found.is_none() {
            let names: Vec<&str> = options.iter().map(|(name, _)| *name).collect();
            self.fail(
                field,
                format!("Invalid option. Must be one of: {}", names.join(", ")),
            );
        }
        found
    }

    pub(crate) fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("jane.doe+crm@mail.example.co"));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("jane@example"));
        assert!(!is_valid_email(".jane@example.com"));
        assert!(!is_valid_email("jane..doe@example.com"));
    }

    #[test]
    fn test_uuid_format() {
        assert!(is_valid_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(!is_valid_uuid("550e8400e29b41d4a716446655440000"));
        assert!(!is_valid_uuid("not-a-uuid"));
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(NumericInput::from("5000").coerce(), Ok(Some(5000.0)));
        assert_eq!(NumericInput::from("  ").coerce(), Ok(None));
        assert_eq!(NumericInput::from(12.5).coerce(), Ok(Some(12.5)));
        assert!(NumericInput::from("abc").coerce().is_err());
        assert!(NumericInput::from("NaN").coerce().is_err());
    }

    #[test]
    fn test_numeric_input_deserializes_both_forms() {
        let number: NumericInput = serde_json::from_str("42").unwrap();
        let text: NumericInput = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(number.coerce(), Ok(Some(42.0)));
        assert_eq!(text.coerce(), Ok(Some(42.0)));
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert_eq!(parse_datetime("2025-01-15"), Some(1736899200));
        assert_eq!(parse_datetime("2025-01-15T10:30"), Some(1736937000));
        assert_eq!(parse_datetime("2025-01-15T10:30:00Z"), Some(1736937000));
        assert_eq!(parse_datetime("2025-01-15T12:30:00+02:00"), Some(1736937000));
        assert_eq!(parse_datetime("tomorrow"), None);
    }

    #[test]
    fn test_errors_accumulate_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "Deal title is required");
        errors.add("title", "second");
        errors.add("value", "Value must be positive");

        assert_eq!(errors.first("title"), Some("Deal title is required"));
        assert_eq!(errors.fields["title"].len(), 2);
        assert!(errors.contains("value"));
        assert_eq!(errors.to_string(), "validation failed on 2 field(s)");
    }
}
