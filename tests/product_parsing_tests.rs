#[cfg(test)]
mod tests {
    use dietplan::product_parser::{
        calculate_similarity, clean_product_name, parse_product, parse_product_or_fallback,
    };
    use dietplan::quantity_parser::parse_quantity;
    use dietplan::units::{detect_unit_in_text, normalize_to_base_unit};

    #[test]
    fn test_decimal_separator_equivalence() {
        // Comma and dot separators yield the same value
        for (comma, dot) in [("1,5", "1.5"), ("0,25", "0.25"), ("10,75", "10.75")] {
            assert_eq!(parse_quantity(comma), parse_quantity(dot));
            assert!(parse_quantity(comma).is_some());
        }
    }

    #[test]
    fn test_alias_detection_canonicalizes() {
        let cases = [
            ("sztuk", "szt"),
            ("sztuki", "szt"),
            ("litrów", "l"),
            ("gramów", "g"),
            ("kilogramy", "kg"),
            ("łyżek", "łyżka"),
            ("szklanki", "szklanka"),
        ];
        for (alias, canonical) in cases {
            let detection = detect_unit_in_text(alias);
            assert!(detection.matched, "alias '{}' should be detected", alias);
            assert_eq!(detection.unit, canonical);
        }
    }

    #[test]
    fn test_base_unit_normalization() {
        assert_eq!(normalize_to_base_unit(2.0, "kg"), Some((2000.0, "g")));
        assert_eq!(normalize_to_base_unit(1.0, "szt"), None);
    }

    #[test]
    fn test_round_trip_order_independence() {
        let qty_first = parse_product("2 kg mąki").unwrap();
        assert_eq!(qty_first.quantity, 2000.0);
        assert_eq!(qty_first.unit, "g");
        assert!(!qty_first.has_custom_unit);

        let qty_last = parse_product("mąka 2 kg").unwrap();
        assert_eq!(qty_last.quantity, qty_first.quantity);
        assert_eq!(qty_last.unit, qty_first.unit);
    }

    #[test]
    fn test_clean_name_idempotence() {
        for input in ["Mąka Pszenna (typ 500)", "  MLEKO  2% ", "jajka (rozmiar L)"] {
            let once = clean_product_name(input);
            assert_eq!(clean_product_name(&once), once);
        }
    }

    #[test]
    fn test_polish_word_quantities_in_full_lines() {
        let p = parse_product("pół kg cukru").unwrap();
        assert_eq!(p.quantity, 500.0);
        assert_eq!(p.unit, "g");

        let p = parse_product("ćwierć szklanki oleju").unwrap();
        assert_eq!(p.quantity, 62.5);
        assert_eq!(p.unit, "ml");
    }

    #[test]
    fn test_fallback_preserves_original() {
        let p = parse_product_or_fallback("sól morska do smaku");
        assert_eq!(p.quantity, 1.0);
        assert_eq!(p.unit, "szt");
        assert_eq!(p.original, "sól morska do smaku");
    }

    #[test]
    fn test_similarity_threshold_cases() {
        // One edit on a five-letter name sits exactly at the 0.8 threshold
        assert!(calculate_similarity("mleko", "mleka") >= 0.8);
        // Unrelated names fall well below
        assert!(calculate_similarity("mleko", "wołowina") < 0.5);
        // Cleaning happens before comparison
        assert_eq!(calculate_similarity("MLEKO", "mleko (świeże)"), 1.0);
    }
}
