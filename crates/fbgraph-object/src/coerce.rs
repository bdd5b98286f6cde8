//! The coercion table: which values a field of each declared type accepts.
//!
//! | target  | accepted                                                                 |
//! |---------|--------------------------------------------------------------------------|
//! | string  | string; boolean as `"1"`/`"0"`; integer; finite float                    |
//! | integer | integer; boolean as 1/0; integral float in range; canonical digit string |
//! | float   | finite float; integer up to 2^53 in magnitude; boolean; finite numeric string |
//! | boolean | boolean; 0/1; 0.0/1.0; `"0"`, `"1"`, `"true"`, `"false"`                 |
//! | array   | array; object                                                            |
//! | object  | object; empty array                                                      |
//!
//! Every accepted conversion maps back to the input unambiguously. Anything not in
//! the table is rejected.

use std::collections::BTreeMap;

use fbgraph_common::value::FieldValue;
use smol_str::{SmolStr, ToSmolStr};

use crate::schema::FieldType;

const MAX_EXACT_FLOAT_INT: i64 = 1 << 53;

/// Convert `value` to `target`, handing the value back unchanged when the table
/// has no rule for it.
///
/// `Null` is not handled here; records treat it as "clear the field".
pub fn coerce(value: FieldValue, target: FieldType) -> Result<FieldValue, FieldValue> {
    match target {
        FieldType::String => to_string(value),
        FieldType::Integer => to_integer(value),
        FieldType::Float => to_float(value),
        FieldType::Boolean => to_boolean(value),
        FieldType::Array => to_array(value),
        FieldType::Object => to_object(value),
    }
}

fn to_string(value: FieldValue) -> Result<FieldValue, FieldValue> {
    let text: SmolStr = match &value {
        FieldValue::String(_) => return Ok(value),
        FieldValue::Boolean(true) => "1".into(),
        FieldValue::Boolean(false) => "0".into(),
        FieldValue::Integer(i) => i.to_smolstr(),
        FieldValue::Float(f) if f.is_finite() => f.to_smolstr(),
        _ => return Err(value),
    };
    Ok(FieldValue::String(text))
}

fn to_integer(value: FieldValue) -> Result<FieldValue, FieldValue> {
    let int = match &value {
        FieldValue::Integer(_) => return Ok(value),
        FieldValue::Boolean(b) => i64::from(*b),
        FieldValue::Float(f) => match float_to_int(*f) {
            Some(i) => i,
            None => return Err(value),
        },
        FieldValue::String(s) => match canonical_int(s) {
            Some(i) => i,
            None => return Err(value),
        },
        _ => return Err(value),
    };
    Ok(FieldValue::Integer(int))
}

fn to_float(value: FieldValue) -> Result<FieldValue, FieldValue> {
    let float = match &value {
        FieldValue::Float(f) if f.is_finite() => return Ok(value),
        FieldValue::Integer(i) if i.unsigned_abs() <= MAX_EXACT_FLOAT_INT as u64 => *i as f64,
        FieldValue::Boolean(b) => f64::from(u8::from(*b)),
        FieldValue::String(s) => match numeric_str(s) {
            Some(f) => f,
            None => return Err(value),
        },
        _ => return Err(value),
    };
    Ok(FieldValue::Float(float))
}

fn to_boolean(value: FieldValue) -> Result<FieldValue, FieldValue> {
    let flag = match &value {
        FieldValue::Boolean(_) => return Ok(value),
        FieldValue::Integer(0) => false,
        FieldValue::Integer(1) => true,
        FieldValue::Float(f) if *f == 0.0 => false,
        FieldValue::Float(f) if *f == 1.0 => true,
        FieldValue::String(s) => match s.as_str() {
            "0" | "false" => false,
            "1" | "true" => true,
            _ => return Err(value),
        },
        _ => return Err(value),
    };
    Ok(FieldValue::Boolean(flag))
}

fn to_array(value: FieldValue) -> Result<FieldValue, FieldValue> {
    match value {
        FieldValue::Array(_) | FieldValue::Object(_) => Ok(value),
        other => Err(other),
    }
}

fn to_object(value: FieldValue) -> Result<FieldValue, FieldValue> {
    match value {
        FieldValue::Object(_) => Ok(value),
        FieldValue::Array(items) if items.is_empty() => Ok(FieldValue::Object(BTreeMap::new())),
        other => Err(other),
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// `-?[0-9]+` with no leading zeros, so that printing the result gives back `s`.
fn canonical_int(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    if s == "-0" {
        return None;
    }
    s.parse().ok()
}

fn numeric_str(s: &str) -> Option<f64> {
    // `str::parse::<f64>` also accepts "inf", "NaN" and friends
    let looks_numeric = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
        && s.bytes().any(|b| b.is_ascii_digit());
    if !looks_numeric {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(value: impl Into<FieldValue>, target: FieldType) -> FieldValue {
        coerce(value.into(), target).expect("should coerce")
    }

    fn rejected(value: impl Into<FieldValue>, target: FieldType) -> bool {
        coerce(value.into(), target).is_err()
    }

    #[test]
    fn into_string() {
        assert_eq!(ok(true, FieldType::String), FieldValue::from("1"));
        assert_eq!(ok(false, FieldType::String), FieldValue::from("0"));
        assert_eq!(ok(123456, FieldType::String), FieldValue::from("123456"));
        assert_eq!(ok(1.5, FieldType::String), FieldValue::from("1.5"));
        assert!(rejected(vec!["x"], FieldType::String));
        assert!(rejected(f64::NAN, FieldType::String));
        assert!(rejected(BTreeMap::<SmolStr, FieldValue>::new(), FieldType::String));
    }

    #[test]
    fn into_integer() {
        assert_eq!(ok("42", FieldType::Integer), FieldValue::Integer(42));
        assert_eq!(ok("-7", FieldType::Integer), FieldValue::Integer(-7));
        assert_eq!(ok(true, FieldType::Integer), FieldValue::Integer(1));
        assert_eq!(ok(3.0, FieldType::Integer), FieldValue::Integer(3));
        for bad in ["", "-", "007", "-0", "+5", " 5", "5 ", "4.0", "1e3", "12abc"] {
            assert!(rejected(bad, FieldType::Integer), "{bad:?}");
        }
        assert!(rejected(3.5, FieldType::Integer));
        assert!(rejected(1e300, FieldType::Integer));
        assert!(rejected("99999999999999999999", FieldType::Integer));
    }

    #[test]
    fn into_float() {
        assert_eq!(ok(2, FieldType::Float), FieldValue::Float(2.0));
        assert_eq!(ok("0.25", FieldType::Float), FieldValue::Float(0.25));
        assert_eq!(ok("-1e2", FieldType::Float), FieldValue::Float(-100.0));
        assert!(rejected("inf", FieldType::Float));
        assert!(rejected("NaN", FieldType::Float));
        assert!(rejected("", FieldType::Float));
        assert!(rejected(i64::MAX, FieldType::Float));
        assert!(rejected(f64::NAN, FieldType::Float));
        assert!(rejected(f64::INFINITY, FieldType::Float));
        assert!(rejected(f64::NEG_INFINITY, FieldType::Float));
    }

    #[test]
    fn into_boolean() {
        assert_eq!(ok(1, FieldType::Boolean), FieldValue::Boolean(true));
        assert_eq!(ok("false", FieldType::Boolean), FieldValue::Boolean(false));
        assert_eq!(ok(0.0, FieldType::Boolean), FieldValue::Boolean(false));
        assert!(rejected(2, FieldType::Boolean));
        assert!(rejected("yes", FieldType::Boolean));
        assert!(rejected("", FieldType::Boolean));
    }

    #[test]
    fn collections() {
        let mut map = BTreeMap::new();
        map.insert(SmolStr::new("k"), FieldValue::from(1));
        assert_eq!(ok(map.clone(), FieldType::Array), FieldValue::Object(map.clone()));
        assert_eq!(
            ok(Vec::<FieldValue>::new(), FieldType::Object),
            FieldValue::Object(BTreeMap::new())
        );
        assert!(rejected(vec![1], FieldType::Object));
        assert!(rejected("x", FieldType::Array));
        assert!(rejected(1, FieldType::Object));
    }

    #[test]
    fn rejection_hands_back_the_value() {
        let back = coerce(FieldValue::from(vec!["x"]), FieldType::String).unwrap_err();
        assert_eq!(back, FieldValue::from(vec!["x"]));
    }
}
