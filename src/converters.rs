use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::table::CellValue;

/// Per-column cell conversion applied while parsing a sheet range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Converter {
    /// "12,34%" -> 0.12
    PercentToFraction,
    /// "1\u{a0}234" -> 1234
    ThousandsToInt,
}

impl Converter {
    pub fn apply(&self, raw: &str) -> CellValue {
        match self {
            Converter::PercentToFraction => match percent_to_float(raw) {
                Some(value) => CellValue::Float(value),
                None => {
                    warn!("Unparseable percent value '{}', storing null", raw);
                    CellValue::Null
                }
            },
            Converter::ThousandsToInt => string_to_int(raw)
                .map(CellValue::Int)
                .unwrap_or(CellValue::Null),
        }
    }
}

/// Convert a percent string with a comma or dot decimal separator to a fraction
/// rounded to two decimals. An empty string is 0.0.
///
/// Rounding works on the exact binary value of the fraction, so `0.005`
/// (stored slightly above the tie) goes up while an exact tie like `0.125`
/// goes to even.
///
/// Returns `None` when the remaining text is not a number.
pub fn percent_to_float(s: &str) -> Option<f64> {
    if s.is_empty() {
        return Some(0.0);
    }
    let normalized = s.trim().trim_matches('%').trim().replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    format!("{:.2}", value / 100.0).parse().ok()
}

/// Parse an integer written with non-breaking-space thousands separators.
///
/// Anything that is not purely ASCII digits after stripping yields `None`.
pub fn string_to_int(s: &str) -> Option<i64> {
    let stripped: String = s.chars().filter(|c| *c != '\u{a0}').collect();
    if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    stripped.parse().ok()
}
