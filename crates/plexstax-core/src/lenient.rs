// Tolerant readers for remote JSON
//
// The services report the same figures as numbers on one release and as
// numeric strings on the next. These helpers read either and treat anything
// else as absent.

use serde_json::Value;

/// Read a finite number from a JSON number or a numeric string.
pub fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Read a non-negative whole count; fractional values are truncated.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn count(value: Option<&Value>) -> Option<u64> {
    number(value).filter(|n| *n >= 0.0).map(|n| n as u64)
}

/// Clamp to `0..=100` and round to a whole percent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn percent(n: f64) -> u8 {
    if n.is_nan() {
        return 0;
    }
    n.round().clamp(0.0, 100.0) as u8
}

/// Walk a dotted path through nested objects.
pub fn path<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted.split('.').try_fold(value, |v, key| v.get(key))
}

/// First non-empty string among `keys`.
pub fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| path(value, k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}
