//! Brazilian-format monetary token extraction and parsing
//!
//! The pattern (`1.234,56`: dot-grouped thousands, two-digit decimal comma)
//! is the sole numeric bridge between free document text and computed
//! balances, so the grouping convention is deliberately locale-specific.

use std::sync::OnceLock;

use regex::Regex;

fn money_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\d{1,3}(?:\.\d{3})*,\d{2}").expect("valid regex"))
}

/// Extract every monetary token from `text`, in order of appearance.
pub fn extract_monetary_values(text: &str) -> Vec<String> {
    money_re()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse a raw monetary token ("9.999,99") into a number (9999.99).
///
/// Returns `None` for anything that does not parse to a finite number.
pub fn parse_monetary(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }

    let cleaned = raw.replace('.', "").replace(',', ".");
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}
