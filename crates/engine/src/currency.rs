//! pt-BR currency formatting (Brazilian Real).
//!
//! This is the only locale-aware code in the engine. Output matches the
//! platform `pt-BR` / `BRL` currency style: `R$`, a no-break space, `.` for
//! thousands, `,` for decimals, two fraction digits.

/// Currency symbol.
pub const SYMBOL: &str = "R$";

/// Separator between symbol and amount (U+00A0 NO-BREAK SPACE).
pub const SYMBOL_SEPARATOR: char = '\u{a0}';

const THOUSANDS_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';

/// Format a BRL amount, e.g. `50400.0` → `"R$ 50.400,00"` (no-break space).
///
/// Fractions round half away from zero. Negative values, including negative
/// zero, carry a leading `-`. NaN renders as `R$ NaN` and infinities as `R$ ∞`.
pub fn format_brl(value: f64) -> String {
    let sign = if value.is_sign_negative() && !value.is_nan() { "-" } else { "" };

    if value.is_nan() {
        return format!("{}{}NaN", SYMBOL, SYMBOL_SEPARATOR);
    }
    if value.is_infinite() {
        return format!("{}{}{}∞", sign, SYMBOL, SYMBOL_SEPARATOR);
    }

    let fixed = fixed_two_places(value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    format!(
        "{}{}{}{}{}{}",
        sign,
        SYMBOL,
        SYMBOL_SEPARATOR,
        group_thousands(int_part),
        DECIMAL_SEPARATOR,
        frac_part
    )
}

/// Non-negative value to `"1234.50"` form.
///
/// Rounds the shortest round-trip decimal text of the value, half away from
/// zero, so `1.005` gives `"1.01"` and `1e23` keeps its short digits. Scaling
/// the binary value by 100 first would round `1.9949999999999999` up.
fn fixed_two_places(abs: f64) -> String {
    // `{}` never uses exponent notation for f64
    let shortest = format!("{}", abs);
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));

    let mut digits: Vec<u8> = int_part.bytes().collect();
    let mut frac = frac_part.bytes();
    digits.push(frac.next().unwrap_or(b'0'));
    digits.push(frac.next().unwrap_or(b'0'));

    if frac.next().is_some_and(|d| d >= b'5') {
        round_up(&mut digits);
    }

    let split = digits.len() - 2;
    let int_digits = String::from_utf8_lossy(&digits[..split]);
    let frac_digits = String::from_utf8_lossy(&digits[split..]);
    format!("{}.{}", int_digits, frac_digits)
}

/// Add one unit in the last place of an ASCII digit string.
fn round_up(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(ch);
    }
    out
}
