//! # Quantity Parser
//!
//! Converts a free-text quantity expression into a decimal. Recipe plans use
//! a mix of numerals and Polish quantity words, so the parser recognizes, in
//! priority order:
//!
//! - Polish word prefixes ("pół", "ćwierć", "półtorej", "dwa", ...)
//! - Numeric ranges ("2-3" → arithmetic mean)
//! - Mixed numbers ("1 1/2")
//! - Simple fractions ("3/4")
//! - Plain decimals with either comma or dot separator ("1,5" / "1.5")
//!
//! ## Usage
//!
//! ```rust
//! use dietplan::quantity_parser::parse_quantity;
//!
//! assert_eq!(parse_quantity("1,5"), Some(1.5));
//! assert_eq!(parse_quantity("2-3"), Some(2.5));
//! assert_eq!(parse_quantity("pół"), Some(0.5));
//! ```

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

/// Polish quantity words matched as string prefixes.
///
/// Ordered longest-first so that "półtorej" wins over "pół". A prefix match
/// short-circuits any numeric text that follows in the same token.
const WORD_PREFIXES: &[(&str, f64)] = &[
    ("półtorej", 1.5),
    ("półtora", 1.5),
    ("ćwierć", 0.25),
    ("pół", 0.5),
    ("jedna", 1.0),
    ("jeden", 1.0),
    ("cztery", 4.0),
    ("pięć", 5.0),
    ("trzy", 3.0),
    ("dwa", 2.0),
];

/// Compiled regex patterns for the numeric quantity formats
struct QuantityPatterns {
    /// Matches ranges: "2-3", "1,5-2"
    range: Regex,
    /// Matches mixed numbers: "1 1/2"
    mixed: Regex,
    /// Matches simple fractions: "3/4"
    fraction: Regex,
    /// Matches plain decimals: "2", "1.5", "0,25"
    decimal: Regex,
}

impl QuantityPatterns {
    fn new() -> Self {
        Self {
            range: Regex::new(r"^(\d+(?:[.,]\d+)?)\s*-\s*(\d+(?:[.,]\d+)?)$").unwrap(),
            mixed: Regex::new(r"^(\d+)\s+(\d+)/(\d+)$").unwrap(),
            fraction: Regex::new(r"^(\d+)/(\d+)$").unwrap(),
            decimal: Regex::new(r"^(\d+(?:[.,]\d+)?)$").unwrap(),
        }
    }
}

lazy_static! {
    static ref PATTERNS: QuantityPatterns = QuantityPatterns::new();
}

/// Parse a decimal number that may use a comma as the separator
fn parse_decimal(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok()
}

/// Parse a free-text quantity expression into a decimal
///
/// Returns `None` when no pattern matches; the caller must treat this as an
/// unparseable quantity and fall back on its own default.
pub fn parse_quantity(input: &str) -> Option<f64> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    // Word prefixes take precedence over any trailing numeric pattern
    for (prefix, value) in WORD_PREFIXES {
        if input.starts_with(prefix) {
            trace!("Quantity word prefix '{}' matched in '{}'", prefix, input);
            return Some(*value);
        }
    }

    if let Some(caps) = PATTERNS.range.captures(&input) {
        let low = parse_decimal(&caps[1])?;
        let high = parse_decimal(&caps[2])?;
        return Some((low + high) / 2.0);
    }

    if let Some(caps) = PATTERNS.mixed.captures(&input) {
        let whole: f64 = caps[1].parse().ok()?;
        let numerator: f64 = caps[2].parse().ok()?;
        let denominator: f64 = caps[3].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(whole + numerator / denominator);
    }

    if let Some(caps) = PATTERNS.fraction.captures(&input) {
        let numerator: f64 = caps[1].parse().ok()?;
        let denominator: f64 = caps[2].parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        return Some(numerator / denominator);
    }

    if PATTERNS.decimal.is_match(&input) {
        return parse_decimal(&input);
    }

    None
}
