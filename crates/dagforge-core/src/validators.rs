//! Stock value validators
//!
//! Each validator takes a present, non-null raw value and returns the
//! normalised value or a short cause. The cause ends up inside
//! `ConfigError::TypeMismatch`.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde_json::Value;

use crate::error::type_name;

/// Format authors write timestamps in, e.g. `2019-11-01T03:00`
pub const TIMESTAMP_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Format timestamps are normalised to
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Scalars coerce to their string form
pub fn string(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(format!("expected a string, found {}", type_name(other))),
    }
}

/// Integers, or strings holding one
pub fn integer(value: &Value) -> Result<Value, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Value::from)
            .ok_or_else(|| format!("expected an integer, found {}", n)),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("expected an integer, found '{}'", s)),
        other => Err(format!("expected an integer, found {}", type_name(other))),
    }
}

/// Booleans, or the strings `true` / `false`
pub fn boolean(value: &Value) -> Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
        other => Err(format!("expected a boolean, found {}", type_name(other))),
    }
}

pub fn object(value: &Value) -> Result<Value, String> {
    match value {
        Value::Object(_) => Ok(value.clone()),
        other => Err(format!("expected a map, found {}", type_name(other))),
    }
}

pub fn list(value: &Value) -> Result<Value, String> {
    match value {
        Value::Array(_) => Ok(value.clone()),
        other => Err(format!("expected a list, found {}", type_name(other))),
    }
}

/// `YYYY-mm-ddTHH:MM`, normalised to [`TIMESTAMP_FORMAT`]
pub fn timestamp(value: &Value) -> Result<Value, String> {
    let Value::String(raw) = value else {
        return Err(format!("expected a timestamp string, found {}", type_name(value)));
    };

    let parsed = NaiveDateTime::parse_from_str(raw, TIMESTAMP_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT))
        .map_err(|_| format!("expected a timestamp like 2019-11-01T03:00, found '{}'", raw))?;

    Ok(Value::String(parsed.format(TIMESTAMP_FORMAT).to_string()))
}

/// Five-field crontab expression or an `@daily`-style preset
pub fn cron(value: &Value) -> Result<Value, String> {
    static PRESET: OnceLock<Regex> = OnceLock::new();
    static FIELD: OnceLock<Regex> = OnceLock::new();

    let Value::String(raw) = value else {
        return Err(format!("expected a cron expression, found {}", type_name(value)));
    };

    let preset = PRESET.get_or_init(|| {
        Regex::new(r"^@(yearly|annually|monthly|weekly|daily|hourly|once)$").expect("valid regex")
    });
    let field = FIELD.get_or_init(|| Regex::new(r"^[0-9A-Za-z*/,\-?#]+$").expect("valid regex"));

    let trimmed = raw.trim();
    if preset.is_match(trimmed) {
        return Ok(Value::String(trimmed.to_string()));
    }

    let fields: Vec<&str> = trimmed.split_whitespace().collect();
    if fields.len() == 5 && fields.iter().all(|f| field.is_match(f)) {
        return Ok(Value::String(fields.join(" ")));
    }

    Err(format!("expected a crontab like '0 3 * * *', found '{}'", raw))
}

/// Parse a timestamp produced by [`timestamp`]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}
