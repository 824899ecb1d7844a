//! Text normalization for tolerant comparison
//!
//! Ledger and accounts-payable text comes out of PDF extraction with
//! inconsistent casing, accents and spacing. Every comparison in the
//! matcher runs over this canonical form.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize text for comparison.
///
/// - NFD-decomposes and drops combining marks ("Índústria" becomes "industria")
/// - replaces any non-alphanumeric character (line breaks included) with a space
/// - collapses repeated whitespace, lowercases, trims
///
/// Total and idempotent: empty input yields an empty string, and
/// `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;

    for c in input.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            // Whitespace and punctuation both act as token separators
            pending_space = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_accents() {
        assert_eq!(normalize("Índústria"), "industria");
        assert_eq!(normalize("João & Cia Ltda."), "joao cia ltda");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  FORNECEDOR \t ABC \r\n LTDA  "), "fornecedor abc ltda");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("Açúcar  União - S/A");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ---  "), "");
    }
}
