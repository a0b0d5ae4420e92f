//! JCS-like canonical JSON
//!
//! Object keys are sorted by byte-wise comparison, arrays keep their order,
//! and no insignificant whitespace is emitted. Two structurally equal values
//! always produce the same bytes regardless of key insertion order.
//!
//! Number formatting rule:
//! - integers are written in plain decimal (`-7`, `18446744073709551615`)
//! - floats are written the way ECMAScript `Number::toString` writes them:
//!   shortest round-trip digits, plain notation for magnitudes in
//!   `[1e-6, 1e21)` (`1.0` becomes `1`, `-0.0` becomes `0`,
//!   `18014398509481984.0` becomes `18014398509481984`), exponent notation
//!   with an explicit sign otherwise (`1.5e+300`, `1e-7`)
//! - non-finite numbers are rejected

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::io::Write;

/// Decimal exponent from which floats switch to exponent notation
const PLAIN_EXPONENT_LIMIT: i32 = 21;

/// Identifier of the canonicalization rule a tree was built with
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonRule {
    #[default]
    #[serde(rename = "JCS-like")]
    JcsLike,
}

impl CanonRule {
    /// Code used by ledger contracts
    pub fn as_u8(&self) -> u8 {
        match self {
            CanonRule::JcsLike => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonRule::JcsLike => "JCS-like",
        }
    }
}

/// Canonical bytes of a JSON value
pub fn canonicalize(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    write_value(value, &mut out)?;
    Ok(out)
}

/// Canonical form as a string (always valid UTF-8)
pub fn to_canonical_string(value: &Value) -> Result<String> {
    let bytes = canonicalize(value)?;
    String::from_utf8(bytes).map_err(|e| Error::NonCanonical(e.to_string()))
}

/// Parse JSON text and return its canonical form
pub fn canonicalize_str(json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json)?;
    to_canonical_string(&value)
}

/// Build a JSON number from a float, refusing NaN and infinities
///
/// `serde_json` would otherwise turn them into `null` when serializing.
pub fn float(f: f64) -> Result<Value> {
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| Error::NonCanonical(format!("non-finite number: {}", f)))
}

fn write_value(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => write_number(n, out)?,
        Value::String(s) => serde_json::to_writer(&mut *out, s)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out)?;
            }
            out.push(b']');
        }
        Value::Object(map) => {
            // Sort explicitly: Map ordering depends on serde_json features
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push(b'{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_value(val, out)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_number(n: &Number, out: &mut Vec<u8>) -> Result<()> {
    if let Some(i) = n.as_i64() {
        write!(out, "{}", i)?;
    } else if let Some(u) = n.as_u64() {
        write!(out, "{}", u)?;
    } else {
        let f = n
            .as_f64()
            .ok_or_else(|| Error::NonCanonical(format!("unrepresentable number: {}", n)))?;
        if !f.is_finite() {
            return Err(Error::NonCanonical(format!("non-finite number: {}", n)));
        }
        out.extend_from_slice(format_float(f)?.as_bytes());
    }
    Ok(())
}

/// ECMAScript number-to-string for a finite float
fn format_float(f: f64) -> Result<String> {
    if f == 0.0 {
        return Ok("0".to_string());
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.5e300`
    let sci = format!("{:e}", f.abs());
    let (mantissa, exponent) = sci
        .split_once('e')
        .ok_or_else(|| Error::NonCanonical(format!("unexpected float form: {}", sci)))?;
    let exponent: i32 = exponent
        .parse()
        .map_err(|_| Error::NonCanonical(format!("unexpected float form: {}", sci)))?;
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    // value = 0.digits * 10^n
    let k = digits.len() as i32;
    let n = exponent + 1;

    let mut text = String::new();
    if f < 0.0 {
        text.push('-');
    }
    if k <= n && n <= PLAIN_EXPONENT_LIMIT {
        text.push_str(&digits);
        text.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= PLAIN_EXPONENT_LIMIT {
        let (int_part, frac_part) = digits.split_at(n as usize);
        text.push_str(int_part);
        text.push('.');
        text.push_str(frac_part);
    } else if -6 < n && n <= 0 {
        text.push_str("0.");
        text.extend(std::iter::repeat('0').take((-n) as usize));
        text.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        text.push_str(first);
        if !rest.is_empty() {
            text.push('.');
            text.push_str(rest);
        }
        let e = n - 1;
        text.push('e');
        text.push(if e < 0 { '-' } else { '+' });
        text.push_str(&e.abs().to_string());
    }
    Ok(text)
}
