//! Text → number coercion for input edits.
//!
//! Follows standard string-to-number coercion: blank text is zero, decimal
//! and exponent literals parse normally, `0x`/`0o`/`0b` prefixes select a
//! radix, `Infinity` is spelled out, and everything else is NaN. No error is
//! ever reported; the caller stores whatever comes back.

/// Coerce raw input text to a number.
pub fn coerce_number(raw: &str) -> f64 {
    let s = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');

    if s.is_empty() {
        return 0.0;
    }

    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(value) = parse_radix_literal(s) {
        return value;
    }

    if is_decimal_literal(s) {
        // Grammar already checked, so the std parser only sees accepted forms
        // (it would otherwise also accept "inf" and "nan").
        return s.parse::<f64>().unwrap_or(f64::NAN);
    }

    f64::NAN
}

/// `0x1F`, `0o17`, `0b101`. Unsigned only; an empty digit run is NaN.
fn parse_radix_literal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };

    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }

    let mut value = 0.0f64;
    for ch in digits.chars() {
        match ch.to_digit(radix) {
            Some(d) => value = value * radix as f64 + d as f64,
            None => return Some(f64::NAN),
        }
    }
    Some(value)
}

/// `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?`
fn is_decimal_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;

    let mut frac_digits = 0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }

    if int_digits == 0 && frac_digits == 0 {
        return false;
    }

    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_is_zero() {
        assert_eq!(coerce_number(""), 0.0);
        assert_eq!(coerce_number("   "), 0.0);
        assert_eq!(coerce_number("\t\n"), 0.0);
    }

    #[test]
    fn test_plain_decimals() {
        assert_eq!(coerce_number("100"), 100.0);
        assert_eq!(coerce_number("  42  "), 42.0);
        assert_eq!(coerce_number("2.5"), 2.5);
        assert_eq!(coerce_number(".5"), 0.5);
        assert_eq!(coerce_number("5."), 5.0);
        assert_eq!(coerce_number("-3"), -3.0);
        assert_eq!(coerce_number("+7"), 7.0);
        assert_eq!(coerce_number("007"), 7.0);
    }

    #[test]
    fn test_negative_zero_keeps_sign() {
        let z = coerce_number("-0");
        assert_eq!(z, 0.0);
        assert!(z.is_sign_negative());
    }

    #[test]
    fn test_exponents() {
        assert_eq!(coerce_number("1e3"), 1000.0);
        assert_eq!(coerce_number("1.5E-1"), 0.15);
        assert_eq!(coerce_number("2e+2"), 200.0);
        assert!(coerce_number("1e").is_nan());
        assert!(coerce_number("e5").is_nan());
    }

    #[test]
    fn test_radix_prefixes() {
        assert_eq!(coerce_number("0x1F"), 31.0);
        assert_eq!(coerce_number("0X10"), 16.0);
        assert_eq!(coerce_number("0o17"), 15.0);
        assert_eq!(coerce_number("0b101"), 5.0);
        assert!(coerce_number("0x").is_nan());
        assert!(coerce_number("0xZZ").is_nan());
        assert!(coerce_number("-0x10").is_nan());
    }

    #[test]
    fn test_infinity_spelling() {
        assert_eq!(coerce_number("Infinity"), f64::INFINITY);
        assert_eq!(coerce_number("+Infinity"), f64::INFINITY);
        assert_eq!(coerce_number("-Infinity"), f64::NEG_INFINITY);
        assert!(coerce_number("inf").is_nan());
        assert!(coerce_number("infinity").is_nan());
    }

    #[test]
    fn test_garbage_is_nan() {
        assert!(coerce_number("abc").is_nan());
        assert!(coerce_number("12abc").is_nan());
        assert!(coerce_number("1,5").is_nan());
        assert!(coerce_number("1.2.3").is_nan());
        assert!(coerce_number("nan").is_nan());
        assert!(coerce_number(".").is_nan());
        assert!(coerce_number("-").is_nan());
        assert!(coerce_number("R$ 10").is_nan());
    }
}
