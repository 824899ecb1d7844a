//! Fiscal identifier (CNPJ/CPF) extraction
//!
//! Used by the strategic-profile round to attach every formatted
//! identifier found across the uploaded documents.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::Document;

fn cnpj_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}").expect("valid regex"))
}

fn cpf_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\d{3}\.\d{3}\.\d{3}-\d{2}").expect("valid regex"))
}

/// Collect all CNPJ/CPF-formatted identifiers from `text`, in order of
/// first appearance.
pub fn extract_identifiers(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for re in [cnpj_re(), cpf_re()] {
        for m in re.find_iter(text) {
            let id = m.as_str().to_string();
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }

    out
}

/// Collect identifiers across every document of a run, deduplicated.
pub fn extract_from_documents(documents: &[Document]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for doc in documents {
        for id in extract_identifiers(&doc.full_text) {
            if seen.insert(id.clone()) {
                out.push(id);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentKind;

    #[test]
    fn test_extract_cnpj_and_cpf() {
        let text = "Empresa 12.345.678/0001-95 responsável 123.456.789-09";
        assert_eq!(
            extract_identifiers(text),
            vec!["12.345.678/0001-95", "123.456.789-09"]
        );
    }

    #[test]
    fn test_deduplicates_preserving_order() {
        let text = "12.345.678/0001-95 e de novo 12.345.678/0001-95";
        assert_eq!(extract_identifiers(text), vec!["12.345.678/0001-95"]);
    }

    #[test]
    fn test_unformatted_digits_ignored() {
        assert!(extract_identifiers("12345678000195 sem pontuação").is_empty());
    }

    #[test]
    fn test_across_documents() {
        let docs = vec![
            Document::new(DocumentKind::Razao, "razao.pdf", "CNPJ 12.345.678/0001-95"),
            Document::new(
                DocumentKind::Pagamentos,
                "pagamentos.pdf",
                "12.345.678/0001-95 e CPF 123.456.789-09",
            ),
        ];
        assert_eq!(
            extract_from_documents(&docs),
            vec!["12.345.678/0001-95", "123.456.789-09"]
        );
    }
}
