//! Monetary amount parsing and formatting
//!
//! Price lists arrive written in either European (`2.530,00`) or American
//! (`2,530.00`) notation, sometimes with a single ambiguous separator
//! (`2,530`, `2,53000`). [`parse_amount`] resolves all of them to an exact
//! [`Decimal`] without ever reading a grouping separator as a decimal mark.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbols stripped before the number is interpreted
const CURRENCY_SYMBOLS: &[char] = &['€', '$', '£', '¥'];

/// Digit-run lengths after a lone separator that mark it as thousands grouping
const GROUPING_TAILS: &[usize] = &[3, 6, 9];

/// Parse a monetary string into an exact decimal.
///
/// Returns `None` for empty input and anything that is not a number once
/// signs, currency symbols and separators are resolved.
///
/// Rules:
/// - `(…)` or a leading `-` makes the value negative; a leading `+` is
///   accepted.
/// - Currency symbols and all whitespace (non-breaking space included) are
///   dropped.
/// - With both `,` and `.` present, the rightmost one is the decimal mark and
///   the other is grouping.
/// - With a single kind of separator, a trailing run of exactly 3, 6 or 9
///   digits makes it grouping; anything else makes it the decimal mark.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let mut negative = false;
    if text.len() >= 2 && text.starts_with('(') && text.ends_with(')') {
        negative = true;
        text = text[1..text.len() - 1].trim();
    }

    let mut cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();

    if let Some(rest) = cleaned.strip_prefix('-') {
        negative = true;
        cleaned = rest.to_string();
    } else if let Some(rest) = cleaned.strip_prefix('+') {
        cleaned = rest.to_string();
    }

    let normalized = normalize_separators(&cleaned);
    let value = parse_plain_decimal(&normalized)?;

    Some(if negative { -value } else { value })
}

/// Rewrite `cleaned` so that it contains at most one `.` as decimal mark
fn normalize_separators(cleaned: &str) -> String {
    match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => resolve_lone_separator(cleaned, ','),
        (None, Some(_)) => resolve_lone_separator(cleaned, '.'),
        (None, None) => cleaned.to_string(),
    }
}

fn resolve_lone_separator(cleaned: &str, separator: char) -> String {
    let tail = cleaned.rsplit(separator).next().unwrap_or_default();
    if is_grouping_tail(tail) {
        cleaned.replace(separator, "")
    } else {
        cleaned.replace(separator, ".")
    }
}

fn is_grouping_tail(tail: &str) -> bool {
    GROUPING_TAILS.contains(&tail.len()) && tail.chars().all(|c| c.is_ascii_digit())
}

/// Parse `digits[.digits]`, rejecting exponents, signs and stray characters
fn parse_plain_decimal(normalized: &str) -> Option<Decimal> {
    let digits = normalized.chars().filter(char::is_ascii_digit).count();
    let dots = normalized.chars().filter(|&c| c == '.').count();
    if digits == 0 || dots > 1 || digits + dots != normalized.chars().count() {
        return None;
    }

    let mut canonical = normalized.trim_end_matches('.').to_string();
    if canonical.starts_with('.') {
        canonical.insert(0, '0');
    }

    Decimal::from_str(&canonical).ok()
}

/// Decimal mark used when rendering computed amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecimalStyle {
    /// `90,00`
    #[default]
    Comma,
    /// `90.00`
    Point,
}

impl DecimalStyle {
    /// The decimal mark character
    pub fn mark(self) -> char {
        match self {
            DecimalStyle::Comma => ',',
            DecimalStyle::Point => '.',
        }
    }
}

impl FromStr for DecimalStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "comma" | "," => Ok(DecimalStyle::Comma),
            "point" | "dot" | "." => Ok(DecimalStyle::Point),
            other => Err(format!("unknown decimal style '{}', expected comma or point", other)),
        }
    }
}

impl fmt::Display for DecimalStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimalStyle::Comma => write!(f, "comma"),
            DecimalStyle::Point => write!(f, "point"),
        }
    }
}

/// Render an amount with exactly two fractional digits.
///
/// Halves round away from zero; a zero result never carries a minus sign.
pub fn format_amount(value: Decimal, style: DecimalStyle) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }

    let text = rounded.to_string();
    match style {
        DecimalStyle::Point => text,
        DecimalStyle::Comma => text.replace('.', ","),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_ambiguous_comma_as_decimal() {
        assert_eq!(parse_amount("2,53000"), Some(dec("2.53")));
        assert_eq!(parse_amount("100,00"), Some(dec("100")));
        assert_eq!(parse_amount("12,5"), Some(dec("12.5")));
    }

    #[test]
    fn test_parse_grouping_tail() {
        assert_eq!(parse_amount("2,530"), Some(dec("2530")));
        assert_eq!(parse_amount("2.530"), Some(dec("2530")));
        assert_eq!(parse_amount("1.234.567"), Some(dec("1234567")));
        assert_eq!(parse_amount("1,234,567"), Some(dec("1234567")));
    }

    #[test]
    fn test_parse_both_separators() {
        assert_eq!(parse_amount("2.530,00"), Some(dec("2530.00")));
        assert_eq!(parse_amount("2,530.00"), Some(dec("2530.00")));
        assert_eq!(parse_amount("1.234.567,89"), Some(dec("1234567.89")));
    }

    #[test]
    fn test_parse_negative_forms() {
        assert_eq!(parse_amount("(123,45)"), Some(dec("-123.45")));
        assert_eq!(parse_amount("-7,5"), Some(dec("-7.5")));
        assert_eq!(parse_amount("( 10 )"), Some(dec("-10")));
    }

    #[test]
    fn test_parse_explicit_plus() {
        assert_eq!(parse_amount("+5"), Some(dec("5")));
        assert_eq!(parse_amount("+1.250,50"), Some(dec("1250.50")));
        assert_eq!(parse_amount("+-5"), None);
        assert_eq!(parse_amount("-+5"), None);
    }

    #[test]
    fn test_parse_currency_and_spaces() {
        assert_eq!(parse_amount("€ 1.250,50"), Some(dec("1250.50")));
        assert_eq!(parse_amount("1\u{00A0}250,50 €"), Some(dec("1250.50")));
        assert_eq!(parse_amount("$2,530.10"), Some(dec("2530.10")));
        assert_eq!(parse_amount("€ -5,00"), Some(dec("-5")));
    }

    #[test]
    fn test_parse_not_a_number() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("1e5"), None);
        assert_eq!(parse_amount("1,234,56"), None);
        assert_eq!(parse_amount("()"), None);
        assert_eq!(parse_amount("€"), None);
    }

    #[test]
    fn test_parse_plain_integers() {
        assert_eq!(parse_amount("10"), Some(dec("10")));
        assert_eq!(parse_amount(" 0 "), Some(Decimal::ZERO));
    }

    #[test]
    fn test_format_amount_styles() {
        assert_eq!(format_amount(dec("90"), DecimalStyle::Comma), "90,00");
        assert_eq!(format_amount(dec("90"), DecimalStyle::Point), "90.00");
        assert_eq!(format_amount(dec("2.345"), DecimalStyle::Point), "2.35");
        assert_eq!(format_amount(dec("-2.345"), DecimalStyle::Point), "-2.35");
        assert_eq!(format_amount(dec("1234.5"), DecimalStyle::Comma), "1234,50");
    }

    #[test]
    fn test_format_zero_has_no_sign() {
        assert_eq!(format_amount(dec("-0.001"), DecimalStyle::Comma), "0,00");
        assert_eq!(format_amount(-Decimal::ZERO, DecimalStyle::Point), "0.00");
    }

    #[test]
    fn test_format_then_parse_keeps_value() {
        for raw in ["12.5", "-3,75", "1.234,56", "2530", "(0,10)", "99.99"] {
            let value = parse_amount(raw).unwrap();
            for style in [DecimalStyle::Comma, DecimalStyle::Point] {
                let text = format_amount(value, style);
                assert_eq!(parse_amount(&text), Some(value), "{} via {}", raw, text);
            }
        }
    }

    #[test]
    fn test_decimal_style_from_str() {
        assert_eq!("comma".parse::<DecimalStyle>(), Ok(DecimalStyle::Comma));
        assert_eq!("Point".parse::<DecimalStyle>(), Ok(DecimalStyle::Point));
        assert_eq!(".".parse::<DecimalStyle>(), Ok(DecimalStyle::Point));
        assert!("semicolon".parse::<DecimalStyle>().is_err());
    }
}
