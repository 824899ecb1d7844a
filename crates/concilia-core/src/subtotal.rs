//! Open-items subtotal resolution from accounts-payable text
//!
//! The resolved figure is force-written into the first open-title record
//! of the final report, overriding whatever the model produced. Without
//! this override the reported total drifts between pipeline runs on the
//! same input.

use tracing::debug;

use crate::matching::FuzzyMatcher;
use crate::models::{OverdueTitle, ReconciliationReport};
use crate::money::parse_monetary;

/// Resolves a supplier's open-items subtotal within accounts-payable text
#[derive(Debug, Clone, Default)]
pub struct SubtotalResolver {
    matcher: FuzzyMatcher,
}

impl SubtotalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matcher(matcher: FuzzyMatcher) -> Self {
        Self { matcher }
    }

    /// Find the supplier's open-items subtotal.
    ///
    /// Prefers a matched line whose normalized text carries the phrase
    /// "sub total"; falls back to the matched line with the largest
    /// trailing value. The fallback can pick a large single invoice
    /// instead of a true subtotal; that heuristic is inherited behavior
    /// and kept as is.
    pub fn resolve(&self, accounts_payable_text: &str, supplier: &str) -> Option<f64> {
        let lines = self.matcher.matched_lines(supplier, accounts_payable_text);
        if lines.is_empty() {
            return None;
        }

        for line in &lines {
            if line.normalized_text.contains("sub total") {
                if let Some(value) = line.last_value.as_deref().and_then(parse_monetary) {
                    debug!(value, "subtotal resolved from explicit sub total line");
                    return Some(value);
                }
            }
        }

        let max = lines
            .iter()
            .filter_map(|line| line.last_value.as_deref().and_then(parse_monetary))
            .fold(None::<f64>, |acc, v| {
                Some(acc.map_or(v, |current| current.max(v)))
            });

        if let Some(value) = max {
            debug!(value, "subtotal resolved from max-value fallback");
        }
        max
    }

    /// Write `subtotal` into the first overdue-title record of `report`,
    /// synthesizing one when the model produced none.
    pub fn apply_override(report: &mut ReconciliationReport, subtotal: f64) {
        match report.overdue_titles.first_mut() {
            Some(first) => {
                first.estimated_value = Some(subtotal);
            }
            None => {
                report.overdue_titles.push(OverdueTitle {
                    description:
                        "Total de títulos em aberto do fornecedor apurado no relatório de contas a pagar."
                            .to_string(),
                    estimated_value: Some(subtotal),
                    references: vec!["Relatório: Contas a Pagar".to_string()],
                    estimated_days_overdue: None,
                    severity: None,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_sub_total_line() {
        let resolver = SubtotalResolver::new();
        let text = "\
Fornecedor Alfa Beta NF 101 500,00
Fornecedor Alfa Beta NF 102 12.300,00
Fornecedor Alfa Beta SUB TOTAL 15.000,00";

        assert_eq!(resolver.resolve(text, "Fornecedor Alfa Beta"), Some(15000.0));
    }

    #[test]
    fn test_falls_back_to_max_value() {
        let resolver = SubtotalResolver::new();
        let text = "\
Fornecedor Alfa Beta NF 101 500,00
Fornecedor Alfa Beta NF 102 12.300,00";

        assert_eq!(resolver.resolve(text, "Fornecedor Alfa Beta"), Some(12300.0));
    }

    #[test]
    fn test_no_matching_lines() {
        let resolver = SubtotalResolver::new();
        assert_eq!(resolver.resolve("outro texto 1.000,00", "Fornecedor Alfa Beta"), None);
    }

    #[test]
    fn test_matching_lines_without_values() {
        let resolver = SubtotalResolver::new();
        let text = "Fornecedor Alfa Beta sem valor algum";
        assert_eq!(resolver.resolve(text, "Fornecedor Alfa Beta"), None);
    }

    #[test]
    fn test_override_rewrites_first_title() {
        let mut report = ReconciliationReport::default();
        report.overdue_titles.push(OverdueTitle {
            description: "NF 101 vencida".into(),
            estimated_value: Some(999.0),
            references: vec![],
            estimated_days_overdue: Some(12),
            severity: None,
        });
        report.overdue_titles.push(OverdueTitle {
            description: "NF 102 vencida".into(),
            estimated_value: Some(50.0),
            references: vec![],
            estimated_days_overdue: None,
            severity: None,
        });

        SubtotalResolver::apply_override(&mut report, 15000.0);

        assert_eq!(report.overdue_titles[0].estimated_value, Some(15000.0));
        // Only the first record is touched
        assert_eq!(report.overdue_titles[1].estimated_value, Some(50.0));
    }

    #[test]
    fn test_override_synthesizes_title_when_absent() {
        let mut report = ReconciliationReport::default();
        SubtotalResolver::apply_override(&mut report, 12300.0);

        assert_eq!(report.overdue_titles.len(), 1);
        assert_eq!(report.overdue_titles[0].estimated_value, Some(12300.0));
        assert!(!report.overdue_titles[0].description.is_empty());
    }
}
