//! Canonicalization of free-text categorical values.
//!
//! Applied independently by the training and serving paths, so it must be
//! idempotent: `normalize_text(&normalize_text(s)) == normalize_text(s)`.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a text value: upper-case, accents stripped, anything outside
/// `[A-Z0-9 _-]` replaced by a space, whitespace collapsed and trimmed.
pub fn normalize_text(value: &str) -> String {
    let upper = value.trim().to_uppercase();

    let replaced: String = upper
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional field. Missing stays missing, and a value that
/// normalizes to nothing becomes missing.
pub fn normalize_field(value: Option<&str>) -> Option<String> {
    let normalized = normalize_text(value?);
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ' || c == '_' || c == '-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strips_portuguese_diacritics() {
        assert_eq!(normalize_text("São Paulo"), "SAO PAULO");
        assert_eq!(normalize_text("  Ciência da Computação "), "CIENCIA DA COMPUTACAO");
        assert_eq!(normalize_text("indígena"), "INDIGENA");
        assert_eq!(normalize_text("Não"), "NAO");
    }

    #[test]
    fn test_accent_insensitive() {
        assert_eq!(normalize_text("São Paulo"), normalize_text("SAO PAULO"));
        assert_eq!(normalize_text("pardá"), normalize_text("PARDA"));
    }

    #[test]
    fn test_replaces_disallowed_and_collapses_whitespace() {
        assert_eq!(normalize_text("Direito (noturno)"), "DIREITO NOTURNO");
        assert_eq!(normalize_text("a\t\tb\n c"), "A B C");
        assert_eq!(normalize_text("centro-oeste"), "CENTRO-OESTE");
        assert_eq!(normalize_text("ead_100%"), "EAD_100");
    }

    #[test]
    fn test_field_missing_passthrough() {
        assert_eq!(normalize_field(None), None);
        assert_eq!(normalize_field(Some("?!")), None);
        assert_eq!(normalize_field(Some("sp")), Some("SP".to_string()));
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }

        #[test]
        fn prop_output_alphabet_is_restricted(s in "\\PC{0,40}") {
            let out = normalize_text(&s);
            prop_assert!(out.chars().all(is_allowed));
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
            prop_assert!(!out.contains("  "));
        }
    }
}
