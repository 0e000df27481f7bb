//! # Product Parser
//!
//! Parses one free-text ingredient line into a structured [`ParsedProduct`].
//! Combines the quantity parser and the unit registry, handling both
//! "quantity-first" phrasing ("2 kg mąki") and "quantity-last" phrasing
//! ("mąka 2 kg"), with a default unit of "szt" when nothing resolves.
//!
//! Also provides product-name canonicalization used as the deduplication and
//! categorization key, and a Levenshtein-based similarity score for fuzzy
//! matching of product names.
//!
//! ## Usage
//!
//! ```rust
//! use dietplan::product_parser::parse_product;
//!
//! let product = parse_product("2 kg mąki").unwrap();
//! assert_eq!(product.quantity, 2000.0);
//! assert_eq!(product.unit, "g");
//! ```

use crate::diet_model::ParsedProduct;
use crate::quantity_parser::parse_quantity;
use crate::units::{detect_unit_in_text, get_unit, normalize_to_base_unit};
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;

/// Default unit when no unit token resolves
pub const DEFAULT_UNIT: &str = "szt";

/// Errors that can occur while parsing an ingredient line
#[derive(Debug, Clone, PartialEq)]
pub enum ProductParseError {
    /// The line is empty after cleanup
    EmptyInput,
    /// No quantity could be extracted from the line
    NoQuantity(String),
}

impl std::fmt::Display for ProductParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductParseError::EmptyInput => write!(f, "Empty ingredient line"),
            ProductParseError::NoQuantity(line) => {
                write!(f, "No quantity found in ingredient line: '{}'", line)
            }
        }
    }
}

impl std::error::Error for ProductParseError {}

lazy_static! {
    /// Leading bullet/dash characters stripped before parsing
    static ref LEADING_BULLETS: Regex = Regex::new(r"^[\s\-–•*·]+").unwrap();
    /// Parenthetical content removed by `clean_product_name`
    static ref PARENTHETICAL: Regex = Regex::new(r"\([^)]*\)").unwrap();
    /// Quantity-first shape: "2 kg mąki", "pół szklanki cukru", "1 1/2 łyżki masła"
    static ref QTY_FIRST: Regex = Regex::new(
        r"^(?P<qty>\d+(?:[.,]\d+)?(?:\s*-\s*\d+(?:[.,]\d+)?|\s+\d+/\d+)?|\d+/\d+|\p{L}+)\s+(?P<rest>.+)$"
    )
    .unwrap();
    /// Quantity-last shape: "mąka 2 kg", "jajka 5 sztuk"
    static ref QTY_LAST: Regex = Regex::new(
        r"^(?P<rest>.+?)\s+(?P<qty>\d+(?:[.,]\d+)?(?:\s*-\s*\d+(?:[.,]\d+)?|\s+\d+/\d+)?|\d+/\d+)(?:\s+(?P<unit>[\p{L}.]+))?$"
    )
    .unwrap();
}

/// Strip leading bullets and collapse whitespace
fn clean_line(input: &str) -> String {
    let stripped = LEADING_BULLETS.replace(input, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical product-name key used for deduplication and categorization
///
/// Strips parenthetical content, collapses whitespace and lowercases.
/// Idempotent: applying it twice yields the same result.
pub fn clean_product_name(name: &str) -> String {
    let without_parens = PARENTHETICAL.replace_all(name, " ");
    without_parens
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Similarity between two product names in [0, 1]
///
/// `1 - levenshtein(a, b) / max(len(a), len(b))` over cleaned names.
/// Symmetric; two empty names compare as identical.
pub fn calculate_similarity(a: &str, b: &str) -> f64 {
    let a = clean_product_name(a);
    let b = clean_product_name(b);
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(&a, &b);
    1.0 - distance as f64 / max_len as f64
}

/// Remove the matched unit substring from the remaining text to recover the
/// product name
fn excise_unit(text: &str, matched: &str) -> String {
    let name = text.replacen(matched, "", 1);
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assemble the final product, normalizing into the base unit when possible
fn build_product(name: &str, quantity: f64, unit: &str, original: &str, detected: bool) -> ParsedProduct {
    let (final_quantity, final_unit) = match normalize_to_base_unit(quantity, unit) {
        Some((value, base)) => (value, base.to_string()),
        None => (quantity, unit.to_string()),
    };

    // Custom only if the unit is neither a registry unit nor was detected
    let has_custom_unit = get_unit(&final_unit).is_none() && !detected;

    ParsedProduct {
        name: name.trim().to_string(),
        quantity: final_quantity,
        unit: final_unit,
        original: original.to_string(),
        has_custom_unit,
        similarity: None,
    }
}

/// Parse one ingredient line into a structured product
///
/// Tries the quantity-first pattern, then the quantity-last pattern; the
/// first pattern whose quantity string parses wins. When a quantity parses
/// but no unit token resolves, the remainder becomes the product name with
/// the default unit "szt".
///
/// Fails only when no quantity can be extracted at all; callers should fall
/// back on [`fallback_product`].
pub fn parse_product(input: &str) -> Result<ParsedProduct, ProductParseError> {
    let cleaned = clean_line(input);
    if cleaned.is_empty() {
        return Err(ProductParseError::EmptyInput);
    }

    trace!("Parsing ingredient line: '{}'", cleaned);

    // Quantity-first: "2 kg mąki", "pół szklanki cukru"
    if let Some(caps) = QTY_FIRST.captures(&cleaned) {
        let qty_str = caps.name("qty").map(|m| m.as_str()).unwrap_or("");
        if let Some(quantity) = parse_quantity(qty_str) {
            let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or("").trim();

            // First token of the remainder is the unit candidate; if it does
            // not resolve, scan the whole remainder and excise the match
            let (unit_token, after_unit) = match rest.split_once(' ') {
                Some((first, tail)) => (first, tail),
                None => (rest, ""),
            };

            let token_detection = detect_unit_in_text(unit_token);
            let (unit, name, detected) =
                if token_detection.matched && token_detection.matched_text.as_deref() == Some(unit_token) {
                    (token_detection.unit, after_unit.trim().to_string(), true)
                } else {
                    let detection = detect_unit_in_text(rest);
                    if detection.matched {
                        let name = match &detection.matched_text {
                            Some(matched) => excise_unit(rest, matched),
                            None => rest.to_string(),
                        };
                        (detection.unit, name, true)
                    } else {
                        (DEFAULT_UNIT.to_string(), rest.to_string(), false)
                    }
                };

            debug!(
                "Quantity-first parse: '{}' -> qty={}, unit='{}', name='{}'",
                cleaned, quantity, unit, name
            );
            return Ok(build_product(&name, quantity, &unit, input, detected));
        }
    }

    // Quantity-last: "mąka 2 kg"
    if let Some(caps) = QTY_LAST.captures(&cleaned) {
        let qty_str = caps.name("qty").map(|m| m.as_str()).unwrap_or("");
        if let Some(quantity) = parse_quantity(qty_str) {
            let name = caps.name("rest").map(|m| m.as_str()).unwrap_or("").trim();
            let unit_token = caps.name("unit").map(|m| m.as_str());

            let (unit, detected) = match unit_token {
                Some(token) => {
                    let detection = detect_unit_in_text(token);
                    if detection.matched {
                        (detection.unit, true)
                    } else {
                        // Trailing token is kept as a custom unit
                        (token.to_string(), false)
                    }
                }
                None => (DEFAULT_UNIT.to_string(), false),
            };

            debug!(
                "Quantity-last parse: '{}' -> qty={}, unit='{}', name='{}'",
                cleaned, quantity, unit, name
            );
            return Ok(build_product(name, quantity, &unit, input, detected));
        }
    }

    Err(ProductParseError::NoQuantity(cleaned))
}

/// Safe fallback product for lines where no quantity could be extracted
///
/// Quantity 1, unit "szt", the whole input as the name.
pub fn fallback_product(input: &str) -> ParsedProduct {
    ParsedProduct {
        name: clean_line(input),
        quantity: 1.0,
        unit: DEFAULT_UNIT.to_string(),
        original: input.to_string(),
        has_custom_unit: false,
        similarity: None,
    }
}

/// Parse a line, falling back on the safe default instead of failing
pub fn parse_product_or_fallback(input: &str) -> ParsedProduct {
    match parse_product(input) {
        Ok(product) => product,
        Err(err) => {
            debug!("Falling back for unparseable line: {}", err);
            fallback_product(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_first_with_unit() {
        let p = parse_product("2 kg mąki").unwrap();
        assert_eq!(p.quantity, 2000.0);
        assert_eq!(p.unit, "g");
        assert_eq!(p.name, "mąki");
        assert!(!p.has_custom_unit);
        assert_eq!(p.original, "2 kg mąki");
    }

    #[test]
    fn test_quantity_last_with_unit() {
        let p = parse_product("mąka 2 kg").unwrap();
        assert_eq!(p.quantity, 2000.0);
        assert_eq!(p.unit, "g");
        assert_eq!(p.name, "mąka");
        assert!(!p.has_custom_unit);
    }

    #[test]
    fn test_order_independence() {
        let first = parse_product("2 kg mąki").unwrap();
        let last = parse_product("mąka 2 kg").unwrap();
        assert_eq!(first.quantity, last.quantity);
        assert_eq!(first.unit, last.unit);
    }

    #[test]
    fn test_quantity_without_unit_defaults_to_szt() {
        let p = parse_product("3 jajka").unwrap();
        assert_eq!(p.quantity, 3.0);
        assert_eq!(p.unit, "szt");
        assert_eq!(p.name, "jajka");
        assert!(!p.has_custom_unit);
    }

    #[test]
    fn test_word_quantity_prefix() {
        let p = parse_product("pół szklanki cukru").unwrap();
        // pół -> 0.5 szklanki -> 125 ml
        assert_eq!(p.quantity, 125.0);
        assert_eq!(p.unit, "ml");
        assert_eq!(p.name, "cukru");
    }

    #[test]
    fn test_unit_detected_inside_remaining_text() {
        let p = parse_product("2 duże łyżki oliwy").unwrap();
        assert_eq!(p.unit, "ml");
        assert_eq!(p.quantity, 30.0);
        assert_eq!(p.name, "duże oliwy");
    }

    #[test]
    fn test_bullet_prefix_stripped() {
        let p = parse_product("- 100 g masła").unwrap();
        assert_eq!(p.quantity, 100.0);
        assert_eq!(p.unit, "g");
        assert_eq!(p.name, "masła");
    }

    #[test]
    fn test_fraction_and_range_quantities() {
        let p = parse_product("1/2 l mleka").unwrap();
        assert_eq!(p.quantity, 500.0);
        assert_eq!(p.unit, "ml");

        let p = parse_product("2-3 szt cebuli").unwrap();
        assert_eq!(p.quantity, 2.5);
        assert_eq!(p.unit, "szt");
        assert_eq!(p.name, "cebuli");
    }

    #[test]
    fn test_piece_units_not_normalized() {
        let p = parse_product("2 opak jogurtu").unwrap();
        assert_eq!(p.quantity, 2.0);
        assert_eq!(p.unit, "opak");
        assert!(!p.has_custom_unit);
    }

    #[test]
    fn test_unrecognized_trailing_token_becomes_custom_unit() {
        let p = parse_product("proszek do pieczenia 2 saszetki").unwrap();
        assert_eq!(p.quantity, 2.0);
        assert_eq!(p.unit, "saszetki");
        assert!(p.has_custom_unit);
        assert_eq!(p.name, "proszek do pieczenia");
    }

    #[test]
    fn test_no_quantity_is_error() {
        assert!(matches!(
            parse_product("szczypta soli do smaku"),
            Err(ProductParseError::NoQuantity(_))
        ));
        assert_eq!(parse_product(""), Err(ProductParseError::EmptyInput));
    }

    #[test]
    fn test_fallback_product() {
        let p = parse_product_or_fallback("sól do smaku");
        assert_eq!(p.quantity, 1.0);
        assert_eq!(p.unit, "szt");
        assert_eq!(p.name, "sól do smaku");
        assert_eq!(p.original, "sól do smaku");
    }

    #[test]
    fn test_clean_product_name() {
        assert_eq!(clean_product_name("Mąka  Pszenna (typ 500)"), "mąka pszenna");
        assert_eq!(clean_product_name("MLEKO"), "mleko");
    }

    #[test]
    fn test_clean_product_name_idempotent() {
        let inputs = ["Mąka (typ 500)", "  Mleko   2%  ", "jajka"];
        for input in inputs {
            let once = clean_product_name(input);
            assert_eq!(clean_product_name(&once), once);
        }
    }

    #[test]
    fn test_similarity_range_and_symmetry() {
        assert_eq!(calculate_similarity("mleko", "mleko"), 1.0);
        let a_b = calculate_similarity("mleko", "mleczko");
        let b_a = calculate_similarity("mleczko", "mleko");
        assert_eq!(a_b, b_a);
        assert!(a_b > 0.0 && a_b < 1.0);
        assert!(calculate_similarity("mleko", "xxxxx") < 0.2);
    }

    #[test]
    fn test_similarity_one_edit_on_short_name() {
        // "mleko" vs "mleka": one substitution over five chars -> 0.8
        let sim = calculate_similarity("mleko", "mleka");
        assert!((sim - 0.8).abs() < 1e-9);
    }
}
