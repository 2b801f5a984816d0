//! Binary-format decoding for PostgreSQL `NUMERIC` values.
//!
//! The driver has no built-in decimal type, and the export needs the exact
//! textual form anyway, so the wire representation (sign, weight, display
//! scale and base-10000 digit groups) is rendered straight into a string
//! without going through floating point.

use std::error::Error;

use postgres::types::{FromSql, Type};

const SIGN_NEG: u16 = 0x4000;
const SIGN_NAN: u16 = 0xC000;

type BoxError = Box<dyn Error + Sync + Send>;

/// A `NUMERIC` value decoded to its canonical decimal text, e.g. `-12345.678`
/// or `7.00` (trailing zeros follow the column's display scale).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgNumeric(String);

impl PgNumeric {
    pub fn into_string(self) -> String {
        self.0
    }
}

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        render_numeric(raw).map(PgNumeric)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

fn read_u16(raw: &[u8], at: usize) -> std::result::Result<u16, BoxError> {
    raw.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "truncated numeric value".into())
}

fn render_numeric(raw: &[u8]) -> std::result::Result<String, BoxError> {
    let ndigits = read_u16(raw, 0)? as usize;
    let weight = read_u16(raw, 2)? as i16 as i32;
    let sign = read_u16(raw, 4)?;
    let dscale = read_u16(raw, 6)? as usize;

    if sign == SIGN_NAN {
        return Ok("NaN".to_string());
    }

    let mut digits = Vec::with_capacity(ndigits);
    for i in 0..ndigits {
        digits.push(read_u16(raw, 8 + 2 * i)?);
    }

    let mut out = String::new();
    if sign == SIGN_NEG {
        out.push('-');
    }

    // Integer part: digit group i carries weight 10000^(weight - i).
    if weight < 0 || ndigits == 0 {
        out.push('0');
    } else {
        for i in 0..=weight as usize {
            let group = digits.get(i).copied().unwrap_or(0);
            if i == 0 {
                out.push_str(&group.to_string());
            } else {
                out.push_str(&format!("{:04}", group));
            }
        }
    }

    // Fractional part, padded or truncated to the display scale.
    if dscale > 0 {
        out.push('.');
        let mut frac = String::new();
        let mut k = 1i32;
        while frac.len() < dscale {
            let idx = weight + k;
            let group = if idx >= 0 {
                digits.get(idx as usize).copied().unwrap_or(0)
            } else {
                0
            };
            frac.push_str(&format!("{:04}", group));
            k += 1;
        }
        frac.truncate(dscale);
        out.push_str(&frac);
    }

    Ok(out)
}
