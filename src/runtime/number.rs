//! Lenient numeric parsing and canonical number formatting.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Integer(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Floats truncate toward zero; out-of-range values saturate.
    pub fn as_i64(self) -> i64 {
        match self {
            Number::Integer(i) => i,
            Number::Float(f) => f as i64,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Number::Integer(i) => i == 0,
            Number::Float(f) => f == 0.0,
        }
    }
}

/// Parses a numeric string. Surrounding whitespace is tolerated, an optional
/// sign is accepted, and a `0x` prefix selects hexadecimal integer syntax.
/// Decimal integers that overflow `i64` parse as floats.
pub fn parse(text: &str) -> Option<Number> {
    let trimmed = text.trim_matches(|c: char| c == ' ' || c == '\t' || c == '\r' || c == '\n');
    if trimmed.is_empty() {
        return None;
    }

    let (negative, digits) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if digits.is_empty() {
        return None;
    }

    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let magnitude = u64::from_str_radix(hex, 16).ok()?;
        let value = magnitude as i64;
        return Some(Number::Integer(if negative {
            value.wrapping_neg()
        } else {
            value
        }));
    }

    if digits.bytes().all(|b| b.is_ascii_digit()) {
        return match trimmed.parse::<i64>() {
            Ok(i) => Some(Number::Integer(i)),
            Err(_) => trimmed.parse::<f64>().ok().map(Number::Float),
        };
    }

    if is_float_syntax(digits) {
        return trimmed.parse::<f64>().ok().map(Number::Float);
    }
    None
}

// Rejects forms Rust's float parser accepts but scripts do not, such as
// "inf" and "nan".
fn is_float_syntax(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    let mut i = 0;
    let mut mantissa_digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
        mantissa_digits += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
            mantissa_digits += 1;
        }
    }
    if mantissa_digits == 0 {
        return false;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exponent_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return false;
        }
    }
    i == bytes.len()
}

pub fn format_integer(value: i64) -> String {
    value.to_string()
}

/// Shortest round-trip form; always carries a decimal point or exponent so
/// the text reads back as a float.
pub fn format_float(value: f64) -> String {
    format!("{:?}", value)
}
