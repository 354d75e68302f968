//! Display formatting for individual cells.
//!
//! Formatting is presentation only; rows keep their original values for
//! sorting and export.

use resultgrid_types::CellValue;
use serde::{Deserialize, Serialize};

/// Column-name fragment marking relative differences, shown as percentages.
pub const DEFAULT_RELATIVE_MARKERS: &[&str] = &["dif_rel"];
pub const DEFAULT_PERCENT_FRACTION_DIGITS: usize = 3;
pub const DEFAULT_DECIMAL_FRACTION_DIGITS: usize = 4;

/// Digit grouping and decimal separator conventions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberLocale {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl NumberLocale {
    pub fn decimal_separator(self) -> char {
        match self {
            Self::PtBr => ',',
            Self::EnUs => '.',
        }
    }

    pub fn group_separator(self) -> char {
        match self {
            Self::PtBr => '.',
            Self::EnUs => ',',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub locale: NumberLocale,
    pub relative_markers: Vec<String>,
    pub percent_fraction_digits: usize,
    pub decimal_fraction_digits: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            locale: NumberLocale::default(),
            relative_markers: DEFAULT_RELATIVE_MARKERS.iter().map(|marker| marker.to_string()).collect(),
            percent_fraction_digits: DEFAULT_PERCENT_FRACTION_DIGITS,
            decimal_fraction_digits: DEFAULT_DECIMAL_FRACTION_DIGITS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CellFormatter {
    options: FormatOptions,
    markers: Vec<String>,
}

impl Default for CellFormatter {
    fn default() -> Self {
        Self::new(FormatOptions::default())
    }
}

impl CellFormatter {
    pub fn new(options: FormatOptions) -> Self {
        let markers = options.relative_markers.iter().map(|marker| marker.to_lowercase()).collect();
        Self { options, markers }
    }

    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Renders a cell for display. Absent and null cells render empty.
    pub fn format_cell(&self, column: &str, value: Option<&CellValue>) -> String {
        match value {
            None | Some(CellValue::Null) => String::new(),
            Some(CellValue::Bool(flag)) => flag.to_string(),
            Some(CellValue::Text(text)) => text.clone(),
            Some(number @ CellValue::Number(_)) => match number.as_f64() {
                Some(float) if self.is_relative_column(column) => {
                    let percent = format_number(float * 100.0, self.options.percent_fraction_digits, self.options.locale);
                    format!("{percent}%")
                }
                Some(float) => format_number(float, self.options.decimal_fraction_digits, self.options.locale),
                None => number.to_raw_string(),
            },
        }
    }

    fn is_relative_column(&self, column: &str) -> bool {
        let lowered = column.to_lowercase();
        self.markers.iter().any(|marker| lowered.contains(marker.as_str()))
    }
}

/// Formats a number with at most `max_fraction_digits` decimals, dropping
/// trailing zeros and grouping the integer part in thousands.
pub fn format_number(value: f64, max_fraction_digits: usize, locale: NumberLocale) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let rendered = round_half_away(value.abs(), max_fraction_digits);
    let (integer, fraction) = match rendered.split_once('.') {
        Some((integer, fraction)) => (integer, fraction.trim_end_matches('0')),
        None => (rendered.as_str(), ""),
    };

    // Values that round to zero never carry a sign.
    let negative = value < 0.0 && (integer.bytes().any(|digit| digit != b'0') || !fraction.is_empty());

    let mut out = String::with_capacity(rendered.len() + integer.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    out.push_str(&group_thousands(integer, locale.group_separator()));
    if !fraction.is_empty() {
        out.push(locale.decimal_separator());
        out.push_str(fraction);
    }
    out
}

/// Enough fraction digits to print any finite `f64` exactly.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Fixed-point rendering of a non-negative `value` where exact midpoints
/// round up instead of to the even neighbour.
fn round_half_away(value: f64, digits: usize) -> String {
    let rendered = format!("{value:.digits$}");
    let next = digits + 1;
    if digits >= EXACT_FRACTION_DIGITS || !format!("{value:.next$}").ends_with('5') {
        return rendered;
    }

    let exact_digits = EXACT_FRACTION_DIGITS;
    let exact = format!("{value:.exact_digits$}");
    let Some((integer, fraction)) = exact.split_once('.') else {
        return rendered;
    };
    let (kept, tail) = fraction.split_at(digits);
    if !(tail.starts_with('5') && tail[1..].bytes().all(|digit| digit == b'0')) {
        return rendered;
    }

    let truncated = if digits == 0 {
        integer.to_string()
    } else {
        format!("{integer}.{kept}")
    };
    increment_last_digit(&truncated)
}

fn increment_last_digit(number: &str) -> String {
    let mut digits: Vec<char> = number.chars().collect();
    let mut index = digits.len();
    while index > 0 {
        index -= 1;
        match digits[index] {
            '.' => {}
            '9' => digits[index] = '0',
            digit => {
                digits[index] = (digit as u8 + 1) as char;
                return digits.into_iter().collect();
            }
        }
    }
    digits.insert(0, '1');
    digits.into_iter().collect()
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    let lead = digits.len() % 3;
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (index + 3 - lead) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    grouped
}
