//! Brazilian Portuguese number formatting.
//!
//! `.` groups thousands and `,` is the decimal point: `354000` renders as
//! `354.000` and `4.96` as `4,96`. Every function here is pure.

use serde::{Deserialize, Serialize};

/// Marker shown in place of a value that has no data.
pub const NO_DATA: &str = "—";

/// Scale of a value handed to [`format_percentage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentScale {
    /// A fraction in `[0, 1]`; multiplied by 100 before rendering.
    Fraction,
    /// Already a percentage; rendered as is.
    Percent,
}

/// Group the digits of an unsigned integer string with `.`.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// Format an integer with `.` as thousands separator.
///
/// ```ignore
/// assert_eq!(format_integer(354_000), "354.000");
/// ```
pub fn format_integer(n: i64) -> String {
    let digits = group_thousands(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{}", digits)
    } else {
        digits
    }
}

/// Format an integer with an explicit sign for positive values.
pub fn format_signed_integer(n: i64) -> String {
    if n > 0 {
        format!("+{}", format_integer(n))
    } else {
        format_integer(n)
    }
}

/// Format a number with a fixed count of decimals, `,` as decimal point
/// and `.` grouping the integer part.
///
/// Non-finite values render as [`NO_DATA`].
pub fn format_decimal(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }

    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rendered.as_str(), None),
    };

    let is_zero = rendered.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    match frac_part {
        Some(f) => format!("{}{},{}", sign, group_thousands(int_part), f),
        None => format!("{}{}", sign, group_thousands(int_part)),
    }
}

/// Format a percentage with a trailing `%`.
///
/// The input scale is explicit: a fraction `0.0496` and a percent `4.96`
/// both render as `4,96%` with two decimals.
pub fn format_percentage(value: f64, decimals: usize, scale: PercentScale) -> String {
    if !value.is_finite() {
        return NO_DATA.to_string();
    }
    let percent = match scale {
        PercentScale::Fraction => value * 100.0,
        PercentScale::Percent => value,
    };
    format!("{}%", format_decimal(percent, decimals))
}
