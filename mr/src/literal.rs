//! MOO literal encoding
//!
//! Converts JSON-shaped tool arguments into the literal syntax understood by
//! the server's evaluator:
//!
//! | Value       | Literal                      |
//! |-------------|------------------------------|
//! | null        | `0`                          |
//! | true/false  | `true` / `false`             |
//! | integer     | `42`                         |
//! | float       | `1.5`, `1.0`, `1e100`        |
//! | string      | `"a \"quoted\" word"`        |
//! | reference   | `#42`, `$room`, `match("x")` |
//! | list        | `{1, "two", {3}}`            |
//! | map         | `["key" -> 1, "k2" -> {}]`   |

use serde_json::Value;
use tracing::debug;

use crate::error::MoorError;
use crate::reference::{Reference, resolve};

/// A JSON-like value extended with object references
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Reference(Reference),
    List(Vec<LiteralValue>),
    /// Key/value pairs in insertion order
    Map(Vec<(String, LiteralValue)>),
}

/// Integer or floating point number, kept apart as in the source JSON
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl LiteralValue {
    /// Convert a JSON value
    ///
    /// A single-key object `{"obj": "<reference>"}` (the shape the server uses
    /// for object values) becomes a [`LiteralValue::Reference`]. Integers
    /// outside the signed 64-bit range have no MOO representation.
    pub fn from_json(value: &Value) -> Result<Self, MoorError> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(number_from_json(n)?),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect::<Result<_, _>>()?),
            Value::Object(map) => {
                if map.len() == 1
                    && let Some(Value::String(curie)) = map.get("obj")
                {
                    return resolve(curie).map(Self::Reference);
                }
                Self::Map(
                    map.iter()
                        .map(|(k, v)| Self::from_json(v).map(|literal| (k.clone(), literal)))
                        .collect::<Result<_, _>>()?,
                )
            }
        })
    }

    /// Encode as MOO literal text
    pub fn encode(&self) -> Result<String, MoorError> {
        let mut out = String::new();
        write_literal(&mut out, self)?;
        Ok(out)
    }
}

fn number_from_json(n: &serde_json::Number) -> Result<Number, MoorError> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::Int(i));
    }
    if n.is_u64() {
        return Err(MoorError::encoding(format!("integer {} is out of range for MOO", n)));
    }
    n.as_f64()
        .map(Number::Float)
        .ok_or_else(|| MoorError::encoding(format!("unrepresentable number {}", n)))
}

impl From<Reference> for LiteralValue {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for LiteralValue {
    fn from(i: i64) -> Self {
        Self::Number(Number::Int(i))
    }
}

impl From<f64> for LiteralValue {
    fn from(f: f64) -> Self {
        Self::Number(Number::Float(f))
    }
}

/// Encode a JSON value as MOO literal text
pub fn encode_json(value: &Value) -> Result<String, MoorError> {
    debug!("encode_json: called");
    LiteralValue::from_json(value)?.encode()
}

fn write_literal(out: &mut String, value: &LiteralValue) -> Result<(), MoorError> {
    match value {
        LiteralValue::Null => out.push('0'),
        LiteralValue::Bool(true) => out.push_str("true"),
        LiteralValue::Bool(false) => out.push_str("false"),
        LiteralValue::Number(Number::Int(i)) => out.push_str(&i.to_string()),
        LiteralValue::Number(Number::Float(f)) => out.push_str(&encode_float(*f)?),
        LiteralValue::String(s) => write_string(out, s),
        LiteralValue::Reference(reference) => out.push_str(&reference.render()),
        LiteralValue::List(items) => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, item)?;
            }
            out.push('}');
        }
        LiteralValue::Map(pairs) => {
            out.push('[');
            for (i, (key, item)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_string(out, key);
                out.push_str(" -> ");
                write_literal(out, item)?;
            }
            out.push(']');
        }
    }
    Ok(())
}

fn encode_float(f: f64) -> Result<String, MoorError> {
    if !f.is_finite() {
        return Err(MoorError::encoding(format!("{} has no MOO literal form", f)));
    }
    // Debug formatting always keeps a fraction or exponent, so 1.0 stays a float
    Ok(format!("{:?}", f))
}

/// Quote a string as a MOO string literal
///
/// Escapes the quote, backslash and ASCII control characters; everything else
/// is copied through unchanged.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    write_string(&mut out, s);
    out
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Every control character, C1 included, sits below U+0100
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
