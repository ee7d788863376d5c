//! Numeric token parsing for recognized tick text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Signed decimal with optional exponent.
    static ref NUMBER: Regex = Regex::new(r"[-+]?\d*\.?\d+(?:[eE][-+]?\d+)?").expect("valid number regex");
}

/// Replace typographic minus signs and dashes with ASCII `-`.
fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            '\u{2212}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect()
}

/// Parse the first number in a piece of OCR text.
///
/// # Examples
///
/// ```
/// use chart_oxide::ocr::parse_number;
///
/// assert_eq!(parse_number(" 12.5\n"), Some(12.5));
/// assert_eq!(parse_number("\u{2212}3"), Some(-3.0));
/// assert_eq!(parse_number("1.2E+3"), Some(1200.0));
/// assert_eq!(parse_number("abc"), None);
/// ```
pub fn parse_number(text: &str) -> Option<f64> {
    NUMBER
        .find(&normalize(text))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse every number in a piece of OCR text, in reading order.
pub fn parse_numbers(text: &str) -> Vec<f64> {
    let normalized = normalize(text);
    NUMBER
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_variants() {
        assert_eq!(parse_number("-5.6"), Some(-5.6));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e-5"), Some(1e-5));
        assert_eq!(parse_number("x=42"), Some(42.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn test_parse_numbers_in_order() {
        assert_eq!(parse_numbers("0 10 20\n30"), vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(parse_numbers("| 1.5 | \u{2212}2 |"), vec![1.5, -2.0]);
    }
}
