//! Brazilian Portuguese number, currency, and period formatting.

use crate::sim::types::month_label;

/// Formats a monetary value as Brazilian reais.
///
/// # Examples
///
/// ```
/// use acl_sim::locale::format_brl;
///
/// assert_eq!(format_brl(1234.56), "R$ 1.234,56");
/// assert_eq!(format_brl(-0.5), "-R$ 0,50");
/// ```
pub fn format_brl(value: f64) -> String {
    let (negative, digits) = split_sign(value);
    let sign = if negative { "-" } else { "" };
    format!("{sign}R$ {digits}")
}

/// Formats a fraction as a percentage with a decimal comma (`0.2534` → `"25,34%"`).
pub fn format_percent(fraction: f64) -> String {
    let (negative, digits) = split_sign(fraction * 100.0);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{digits}%")
}

/// Formats a contract period, e.g. `"Jan/2024 a Dez/2026"`.
pub fn format_period(start_month: u32, start_year: i32, end_month: u32, end_year: i32) -> String {
    format!(
        "{} a {}",
        month_label(start_month, start_year),
        month_label(end_month, end_year)
    )
}

/// Parses a number written with `.` thousands separators and a `,` decimal mark.
///
/// Empty or malformed input reads as 0, matching how blank cells appear in
/// the regulator's published tables.
///
/// # Examples
///
/// ```
/// use acl_sim::locale::parse_br_number;
///
/// assert_eq!(parse_br_number("1.234,5"), 1234.5);
/// assert_eq!(parse_br_number(",00"), 0.0);
/// assert_eq!(parse_br_number("n/a"), 0.0);
/// ```
pub fn parse_br_number(text: &str) -> f64 {
    let normalized = text.trim().replace('.', "").replace(',', ".");
    normalized.parse().unwrap_or(0.0)
}

/// Returns the sign and the absolute value rendered as `1.234,56`.
///
/// Values that round to zero are never reported as negative.
fn split_sign(value: f64) -> (bool, String) {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed != "0.00";
    (negative, format!("{grouped},{dec_part}"))
}
