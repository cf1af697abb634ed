//! The closed set of custom field types and their coercion rules.
//!
//! Every raw value goes through [`FieldType::coerce`] before it is stored.
//! Values are persisted as text ([`CanonicalValue::to_storage_string`]) and
//! [`FieldType::parse_stored`] turns that text back into the same canonical value.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::ops::RangeInclusive;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::UserError;

/// Declared type of a custom field
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FieldType {
    /// Single-line text
    #[default]
    #[sea_orm(string_value = "string")]
    String,
    #[serde(alias = "int")]
    #[strum(to_string = "integer", serialize = "int")]
    #[sea_orm(string_value = "integer")]
    Integer,
    #[sea_orm(string_value = "float")]
    Float,
    #[serde(alias = "bool")]
    #[strum(to_string = "boolean", serialize = "bool")]
    #[sea_orm(string_value = "boolean")]
    Boolean,
    /// Calendar date, `YYYY-MM-DD`, years 0000 to 9999
    #[sea_orm(string_value = "date")]
    Date,
    /// Instant in time, normalized to UTC
    ///
    /// RFC 3339 with an offset, or `YYYY-MM-DD[T ]HH:MM[:SS[.f]]` with an optional
    /// trailing `Z`, taken as UTC. Years 0000 to 9999 after conversion.
    #[sea_orm(string_value = "datetime")]
    DateTime,
    /// Long or multi-line text; validated like `string`
    #[sea_orm(string_value = "text")]
    Text,
    /// Any JSON document
    #[sea_orm(string_value = "json")]
    Json,
}

/// Why a raw value was rejected for a [`FieldType`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    pub expected: FieldType,
    pub reason: String,
}

impl CoercionError {
    fn new(expected: FieldType, reason: impl Into<String>) -> Self {
        Self {
            expected,
            reason: reason.into(),
        }
    }

    /// Attaches the field name, producing `UserError::InvalidFieldValue`.
    pub fn for_field(self, field: impl Into<String>) -> UserError {
        UserError::InvalidFieldValue {
            field: field.into(),
            expected: self.expected,
            reason: self.reason,
        }
    }
}

/// A value that passed coercion for its type
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Text(String),
    Json(Value),
}

impl CanonicalValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            CanonicalValue::String(_) => FieldType::String,
            CanonicalValue::Integer(_) => FieldType::Integer,
            CanonicalValue::Float(_) => FieldType::Float,
            CanonicalValue::Boolean(_) => FieldType::Boolean,
            CanonicalValue::Date(_) => FieldType::Date,
            CanonicalValue::DateTime(_) => FieldType::DateTime,
            CanonicalValue::Text(_) => FieldType::Text,
            CanonicalValue::Json(_) => FieldType::Json,
        }
    }

    /// Text form written to the `value` column.
    pub fn to_storage_string(&self) -> String {
        match self {
            CanonicalValue::String(s) | CanonicalValue::Text(s) => s.clone(),
            CanonicalValue::Integer(n) => n.to_string(),
            CanonicalValue::Float(f) => f.to_string(),
            CanonicalValue::Boolean(b) => b.to_string(),
            CanonicalValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CanonicalValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            CanonicalValue::Json(v) => v.to_string(),
        }
    }

    /// Typed JSON for API responses; dates and datetimes stay strings.
    pub fn to_json(&self) -> Value {
        match self {
            CanonicalValue::Integer(n) => Value::from(*n),
            CanonicalValue::Float(f) => Value::from(*f),
            CanonicalValue::Boolean(b) => Value::Bool(*b),
            CanonicalValue::Json(v) => v.clone(),
            other => Value::String(other.to_storage_string()),
        }
    }
}

impl FieldType {
    pub const ALL: [FieldType; 8] = [
        FieldType::String,
        FieldType::Integer,
        FieldType::Float,
        FieldType::Boolean,
        FieldType::Date,
        FieldType::DateTime,
        FieldType::Text,
        FieldType::Json,
    ];

    /// Validates `raw` and converts it to the canonical value for this type.
    pub fn coerce(&self, raw: &Value) -> Result<CanonicalValue, CoercionError> {
        if raw.is_null() && *self != FieldType::Json {
            return Err(CoercionError::new(*self, "value is null"));
        }

        match self {
            FieldType::String => coerce_text(*self, raw).map(CanonicalValue::String),
            FieldType::Text => coerce_text(*self, raw).map(CanonicalValue::Text),
            FieldType::Integer => coerce_integer(raw).map(CanonicalValue::Integer),
            FieldType::Float => coerce_float(raw).map(CanonicalValue::Float),
            FieldType::Boolean => coerce_boolean(raw).map(CanonicalValue::Boolean),
            FieldType::Date => coerce_date(raw).map(CanonicalValue::Date),
            FieldType::DateTime => coerce_datetime(raw).map(CanonicalValue::DateTime),
            FieldType::Json => coerce_json(raw).map(CanonicalValue::Json),
        }
    }

    /// Re-reads a value previously produced by [`CanonicalValue::to_storage_string`].
    pub fn parse_stored(&self, stored: &str) -> Result<CanonicalValue, CoercionError> {
        self.coerce(&Value::String(stored.to_owned()))
    }
}

fn expect_str(expected: FieldType, raw: &Value) -> Result<&str, CoercionError> {
    raw.as_str()
        .map(str::trim)
        .ok_or_else(|| CoercionError::new(expected, format!("expected a string, got {}", kind(raw))))
}

fn kind(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn coerce_text(expected: FieldType, raw: &Value) -> Result<String, CoercionError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CoercionError::new(
            expected,
            format!("{} cannot be used as text", kind(other)),
        )),
    }
}

fn coerce_integer(raw: &Value) -> Result<i64, CoercionError> {
    let expected = FieldType::Integer;
    match raw {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CoercionError::new(expected, format!("{} is not a whole number in range", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CoercionError::new(expected, format!("'{}' is not a whole number", s))),
        other => Err(CoercionError::new(
            expected,
            format!("expected a whole number, got {}", kind(other)),
        )),
    }
}

fn coerce_float(raw: &Value) -> Result<f64, CoercionError> {
    let expected = FieldType::Float;
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => {
            return Err(CoercionError::new(
                expected,
                format!("expected a number, got {}", kind(other)),
            ));
        }
    };

    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(CoercionError::new(expected, format!("{} is not a finite number", raw))),
    }
}

fn coerce_boolean(raw: &Value) -> Result<bool, CoercionError> {
    let expected = FieldType::Boolean;
    match raw {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(CoercionError::new(expected, format!("{} is not 0 or 1", n))),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(CoercionError::new(
                expected,
                format!("'{}' is not one of true, false, 1, 0", s),
            )),
        },
        other => Err(CoercionError::new(
            expected,
            format!("expected a boolean, got {}", kind(other)),
        )),
    }
}

/// Years the four-digit storage formats can write and read back
const STORABLE_YEARS: RangeInclusive<i32> = 0..=9999;

fn ensure_storable_year(expected: FieldType, year: i32, raw: &str) -> Result<(), CoercionError> {
    if STORABLE_YEARS.contains(&year) {
        return Ok(());
    }
    Err(CoercionError::new(
        expected,
        format!("'{}' is outside the years 0000 to 9999", raw),
    ))
}

fn coerce_date(raw: &Value) -> Result<NaiveDate, CoercionError> {
    let expected = FieldType::Date;
    let s = expect_str(expected, raw)?;
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CoercionError::new(expected, format!("'{}' is not a YYYY-MM-DD date", s)))?;
    ensure_storable_year(expected, date.year(), s)?;
    Ok(date)
}

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn coerce_datetime(raw: &Value) -> Result<DateTime<Utc>, CoercionError> {
    let expected = FieldType::DateTime;
    let s = expect_str(expected, raw)?;

    let parsed = match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => dt.with_timezone(&Utc),
        // Without an offset, or with a bare `Z`, the value is taken as UTC
        Err(_) => {
            let naive = s.strip_suffix(['Z', 'z']).unwrap_or(s);
            NAIVE_DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
                .map(|naive| naive.and_utc())
                .ok_or_else(|| {
                    CoercionError::new(expected, format!("'{}' is not an ISO-8601 date-time", s))
                })?
        }
    };

    ensure_storable_year(expected, parsed.year(), s)?;
    Ok(parsed)
}

fn coerce_json(raw: &Value) -> Result<Value, CoercionError> {
    match raw {
        Value::String(s) => serde_json::from_str(s)
            .map_err(|e| CoercionError::new(FieldType::Json, format!("invalid JSON: {}", e))),
        other => Ok(other.clone()),
    }
}
