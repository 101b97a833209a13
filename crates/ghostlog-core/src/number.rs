//! Numeric parsing and printing with dynamic-host semantics.
//!
//! `%d`, `%i` and `%f` substitutions parse their argument the way a scripting
//! host's `parseInt`/`parseFloat` would, and every number is printed in the
//! host's canonical shortest form (`NaN`, `Infinity`, `1e+21`).

use std::sync::LazyLock;

use regex::Regex;

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("float prefix pattern is valid")
});

/// Parses the leading integer of `text`; returns NaN when there is none.
#[must_use]
pub fn parse_int(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (radix, digits) = if rest.len() > 1 && (rest.starts_with("0x") || rest.starts_with("0X"))
    {
        (16, &rest[2..])
    } else {
        (10, rest)
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_digit(radix))
        .map_or(digits.len(), |(i, _)| i);
    if end == 0 {
        return f64::NAN;
    }

    let magnitude = digits[..end].chars().fold(0.0_f64, |acc, c| {
        acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
    });
    if negative { -magnitude } else { magnitude }
}

/// Parses the leading decimal literal of `text`; returns NaN when there is none.
#[must_use]
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let Some(found) = FLOAT_PREFIX.find(trimmed) else {
        return f64::NAN;
    };
    let literal = found.as_str();
    if literal.ends_with("Infinity") {
        return if literal.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    literal.parse::<f64>().unwrap_or(f64::NAN)
}

/// Prints a number the way the host's `String(n)` would.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let magnitude = n.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let formatted = format!("{n:e}");
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => formatted,
        };
    }
    format!("{n}")
}

/// Like [`format_number`] but keeps the sign of negative zero, as inspection does.
#[must_use]
pub fn inspect_number(n: f64) -> String {
    if n == 0.0 && n.is_sign_negative() {
        "-0".to_string()
    } else {
        format_number(n)
    }
}
