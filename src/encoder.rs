//! Total JSON encoding for log payloads and cache values.
//!
//! Anything `Serialize` is encoded through its own `Serialize` impl, which
//! covers the usual suspects when their `serde` features are on:
//!
//! | type                                   | encoded as                   |
//! |----------------------------------------|------------------------------|
//! | `chrono::DateTime<Tz>`, `NaiveDateTime`| ISO-8601 date-time string    |
//! | `chrono::NaiveDate`                    | ISO-8601 date string         |
//! | `chrono::NaiveTime`                    | ISO-8601 time string         |
//! | `rust_decimal::Decimal` (`serde-float`)| JSON number                  |
//! | enum with `#[serde(into = "i32")]`     | its stored value             |
//! | `uuid::Uuid`                           | hyphenated string            |
//! | `#[derive(Serialize)]` struct          | object of its fields         |
//!
//! If serialization fails (non-string map keys, a custom impl returning an
//! error, ...) the value's `Debug` rendering is used instead, so encoding
//! never fails. It runs inside logging paths and must not take the
//! caller down with it.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

/// Encode `value` as a JSON value, falling back to its `Debug` string.
pub fn to_value<T>(value: &T) -> Value
where
    T: Serialize + Debug + ?Sized,
{
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(format!("{:?}", value)))
}

/// Encode `value` as JSON text, falling back to its `Debug` string.
///
/// Non-ASCII characters are written as-is.
pub fn to_string<T>(value: &T) -> String
where
    T: Serialize + Debug + ?Sized,
{
    let encoded = to_value(value);
    serde_json::to_string(&encoded).unwrap_or_else(|_| format!("{:?}", value))
}
