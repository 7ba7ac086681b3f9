//! Conversão de folhas para uma representação comum
//!
//! Usada quando a igualdade direta falha e a conversão automática está
//! ligada: `"36"` equivale a `36`, `"true"` a `true` e
//! `"2024-01-02T03:04:05"` à data correspondente. Uma conversão que falha
//! nunca é erro; a comparação apenas continua desigual.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::value::Value;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Compara após converter o lado texto para a forma do outro lado
///
/// Simétrica: o texto é sempre interpretado, nunca o número formatado, então
/// `1.0` e `"1.0"` equivalem nas duas direções.
pub fn equal_after_conversion(subject: &Value, expectation: &Value) -> bool {
    converts_to(subject, expectation) || converts_to(expectation, subject)
}

fn converts_to(value: &Value, target: &Value) -> bool {
    convert_to_shape_of(value, target).is_some_and(|converted| converted.strict_eq(target))
}

/// Interpreta o texto `value` na forma de `target`, se houver conversão conhecida
pub fn convert_to_shape_of(value: &Value, target: &Value) -> Option<Value> {
    match (value, target) {
        (Value::Str(s), Value::Int(_) | Value::UInt(_) | Value::Float(_)) => parse_number(s),
        (Value::Str(s), Value::Bool(_)) => parse_bool(s).map(Value::Bool),
        (Value::Str(s), Value::DateTime(_)) => parse_datetime(s).map(Value::DateTime),
        _ => None,
    }
}

/// `"36"` → `Int(36)`, `"1.5"` → `Float(1.5)`
pub fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Int(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Some(Value::UInt(u));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Some(Value::Float(f)),
        _ => None,
    }
}

pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// RFC 3339 (convertido para UTC), ISO-8601 sem fuso, ou só a data
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
