//! Attribute casting and the textual rendering of attribute values.
//!
//! Values live as [`serde_json::Value`] so that anything a dictionary update
//! can express round-trips through persistence unchanged. Rendering follows
//! the console's historical output format: quoted strings, `True`/`False`,
//! `None`, and floats that always carry a fractional part or an exponent.

// used for timestamps on entities
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde_json::{Number, Value};

// used to build rendered forms piece by piece
use std::fmt::Write;

/// Coercion applied to an attribute before it is assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Caster {
    Str,
    Int,
    Float,
}

impl Caster {
    /// Casts `value`, returning `None` when the value cannot be represented
    /// in the target type.
    pub fn cast(self, value: &Value) -> Option<Value> {
        match self {
            Caster::Str => Some(Value::String(py_str(value))),
            Caster::Int => match value {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => Some(Value::from(i)),
                    // integers beyond i64 don't fit
                    None if n.is_u64() => None,
                    None => {
                        // i64::MAX as f64 rounds up to 2^63, which is out of range
                        let f = n.as_f64()?.trunc();
                        if f >= i64::MIN as f64 && f < i64::MAX as f64 {
                            Some(Value::from(f as i64))
                        } else {
                            None
                        }
                    }
                },
                Value::Bool(b) => Some(Value::from(*b as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::from),
                _ => None,
            },
            Caster::Float => {
                let f = match value {
                    Value::Number(n) => n.as_f64()?,
                    Value::Bool(b) => *b as i64 as f64,
                    Value::String(s) => s.trim().parse::<f64>().ok()?,
                    _ => return None,
                };
                Number::from_f64(f).map(Value::Number)
            }
        }
    }

    /// The numeric guess made for a bare (unquoted) update value: a float when
    /// it contains a decimal point, an integer otherwise, and the original
    /// text when neither parse succeeds.
    pub fn infer(raw: &str) -> Value {
        let caster = if raw.contains('.') { Caster::Float } else { Caster::Int };
        let text = Value::String(raw.to_string());
        caster.cast(&text).unwrap_or(text)
    }
}

/// Renders a value the way it appears inside a printed mapping or list.
pub fn py_repr(value: &Value) -> String {
    match value {
        Value::Null => String::from("None"),
        Value::Bool(true) => String::from("True"),
        Value::Bool(false) => String::from("False"),
        Value::Number(n) => repr_number(n),
        Value::String(s) => repr_str(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(py_repr).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", repr_str(k), py_repr(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Renders a value as plain text: strings unquoted, everything else as in
/// [`py_repr`].
pub fn py_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => py_repr(other),
    }
}

/// Quotes a string, preferring single quotes unless the text contains a
/// single quote and no double quote.
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn repr_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) => repr_float(f),
        None => n.to_string(),
    }
}

/// Shortest round-trip float text, switching to exponent notation outside
/// `[1e-4, 1e16)`.
pub fn repr_float(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let scientific = format!("{f:e}");
        return match scientific.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{mantissa}e{sign}{digits:0>2}")
            }
            None => scientific,
        };
    }
    let plain = f.to_string();
    if plain.contains('.') {
        plain
    } else {
        plain + ".0"
    }
}

/// Renders a timestamp as `datetime.datetime(Y, M, D, h, m[, s[, us]])`,
/// dropping trailing zero components.
pub fn repr_datetime(t: &NaiveDateTime) -> String {
    let mut parts = vec![
        t.year() as i64,
        t.month() as i64,
        t.day() as i64,
        t.hour() as i64,
        t.minute() as i64,
        t.second() as i64,
        (t.nanosecond() / 1_000) as i64,
    ];
    for _ in 0..2 {
        if parts.last() == Some(&0) {
            parts.pop();
        }
    }
    let parts: Vec<String> = parts.iter().map(i64::to_string).collect();
    format!("datetime.datetime({})", parts.join(", "))
}
