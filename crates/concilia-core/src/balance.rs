//! Cross-document balance indicators and the automatic assessment
//!
//! For each balance-bearing document (trial balance, accounts payable,
//! ledger) the builder collects every supplier-matching line, parses the
//! trailing monetary value of each, and compares the collected balances
//! across documents. The verdict is attached to the model payload and is
//! the objective evidence used to police the model's own claims.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matching::{FuzzyMatcher, MatchedLine};
use crate::models::{Document, DocumentKind};
use crate::money::parse_monetary;

/// Maximum difference between reconciled balances still considered equal
pub const DEFAULT_BALANCE_TOLERANCE: f64 = 0.10;

/// Matched lines and parsed balances for a single document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceIndicator {
    #[serde(rename = "linhasEncontradas")]
    pub matched_lines: Vec<MatchedLine>,
    #[serde(rename = "saldosNumericos")]
    pub numeric_balances: Vec<f64>,
}

/// Deterministic verdict over the collected balances
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum Assessment {
    /// All observed balances agree within tolerance
    #[serde(rename = "saldos_iguais")]
    Equal {
        /// Midpoint of the observed min/max, rounded to 2 decimals
        #[serde(rename = "valorReferencia")]
        reference_value: f64,
    },
    /// At least two documents disagree beyond tolerance
    #[serde(rename = "saldos_diferentes")]
    Different,
    /// Fewer than two documents yielded any balance
    #[serde(rename = "dados_insuficientes")]
    Insufficient,
}

/// Indicators per document plus the cross-document assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceIndicators {
    #[serde(rename = "porRelatorio")]
    pub by_document: BTreeMap<DocumentKind, BalanceIndicator>,
    #[serde(rename = "avaliacaoAutomatica")]
    pub assessment: Assessment,
}

/// Builds balance indicators for a supplier across documents
#[derive(Debug, Clone)]
pub struct BalanceIndicatorBuilder {
    matcher: FuzzyMatcher,
    tolerance: f64,
}

impl Default for BalanceIndicatorBuilder {
    fn default() -> Self {
        Self {
            matcher: FuzzyMatcher::new(),
            tolerance: DEFAULT_BALANCE_TOLERANCE,
        }
    }
}

impl BalanceIndicatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matcher(matcher: FuzzyMatcher) -> Self {
        Self {
            matcher,
            tolerance: DEFAULT_BALANCE_TOLERANCE,
        }
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Collect per-document balances for `supplier` and compute the
    /// automatic assessment. Documents outside the balance-bearing set
    /// are ignored; absent documents are simply skipped.
    pub fn build(&self, supplier: &str, documents: &[Document]) -> BalanceIndicators {
        let mut by_document = BTreeMap::new();

        for kind in DocumentKind::BALANCE_BEARING {
            let Some(doc) = documents.iter().find(|d| d.kind == kind) else {
                continue;
            };

            let matched_lines = self.matcher.matched_lines(supplier, &doc.full_text);
            let numeric_balances: Vec<f64> = matched_lines
                .iter()
                .filter_map(|line| line.last_value.as_deref().and_then(parse_monetary))
                .collect();

            debug!(
                document = %kind,
                lines = matched_lines.len(),
                balances = numeric_balances.len(),
                "balance indicator built"
            );

            by_document.insert(
                kind,
                BalanceIndicator {
                    matched_lines,
                    numeric_balances,
                },
            );
        }

        let assessment = self.assess(&by_document);
        BalanceIndicators {
            by_document,
            assessment,
        }
    }

    fn assess(&self, by_document: &BTreeMap<DocumentKind, BalanceIndicator>) -> Assessment {
        let documents_with_values = by_document
            .values()
            .filter(|ind| !ind.numeric_balances.is_empty())
            .count();

        if documents_with_values < 2 {
            return Assessment::Insufficient;
        }

        let all: Vec<f64> = by_document
            .values()
            .flat_map(|ind| ind.numeric_balances.iter().copied())
            .collect();

        let min = all.iter().copied().fold(f64::INFINITY, f64::min);
        let max = all.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max - min <= self.tolerance {
            let midpoint = (min + max) / 2.0;
            Assessment::Equal {
                reference_value: (midpoint * 100.0).round() / 100.0,
            }
        } else {
            Assessment::Different
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    fn doc(kind: DocumentKind, text: &str) -> Document {
        Document::new(kind, format!("{kind}.pdf"), text)
    }

    #[test]
    fn test_equal_within_tolerance_reports_midpoint() {
        let builder = BalanceIndicatorBuilder::new();
        let documents = vec![
            doc(DocumentKind::Balancete, "Fornecedor Alfa Beta saldo 1.000,00"),
            doc(DocumentKind::Razao, "Fornecedor Alfa Beta saldo 1.000,05"),
        ];

        let indicators = builder.build("Fornecedor Alfa Beta", &documents);
        assert_eq!(
            indicators.assessment,
            Assessment::Equal {
                reference_value: 1000.03
            }
        );
    }

    #[test]
    fn test_different_beyond_tolerance() {
        let builder = BalanceIndicatorBuilder::new();
        let documents = vec![
            doc(DocumentKind::Balancete, "Fornecedor Alfa Beta saldo 1.000,00"),
            doc(DocumentKind::Razao, "Fornecedor Alfa Beta saldo 2.000,00"),
        ];

        let indicators = builder.build("Fornecedor Alfa Beta", &documents);
        assert_eq!(indicators.assessment, Assessment::Different);
    }

    #[test]
    fn test_single_document_is_insufficient() {
        let builder = BalanceIndicatorBuilder::new();
        let documents = vec![doc(
            DocumentKind::Balancete,
            "Fornecedor Alfa Beta saldo 1.000,00",
        )];

        let indicators = builder.build("Fornecedor Alfa Beta", &documents);
        assert_eq!(indicators.assessment, Assessment::Insufficient);
    }

    #[test]
    fn test_no_matching_lines_is_insufficient() {
        let builder = BalanceIndicatorBuilder::new();
        let documents = vec![
            doc(DocumentKind::Balancete, "outro fornecedor 1.000,00"),
            doc(DocumentKind::Razao, "mais um diferente 2.000,00"),
        ];

        let indicators = builder.build("Fornecedor Alfa Beta", &documents);
        assert_eq!(indicators.assessment, Assessment::Insufficient);
        assert!(indicators
            .by_document
            .values()
            .all(|ind| ind.numeric_balances.is_empty()));
    }

    #[test]
    fn test_midpoint_rounds_half_up() {
        let builder = BalanceIndicatorBuilder::new();
        let documents = vec![
            doc(DocumentKind::ContasPagar, "Fornecedor Alfa Beta 500,00"),
            doc(DocumentKind::Razao, "Fornecedor Alfa Beta 500,05"),
        ];

        let indicators = builder.build("Fornecedor Alfa Beta", &documents);
        assert_eq!(
            indicators.assessment,
            Assessment::Equal {
                reference_value: 500.03
            }
        );
    }

    #[test]
    fn test_lines_without_values_do_not_count() {
        let builder = BalanceIndicatorBuilder::new();
        // Matching lines with no monetary token contribute no balances
        let documents = vec![
            doc(DocumentKind::Balancete, "Fornecedor Alfa Beta sem valor"),
            doc(DocumentKind::Razao, "Fornecedor Alfa Beta saldo 1.000,00"),
        ];

        let indicators = builder.build("Fornecedor Alfa Beta", &documents);
        assert_eq!(indicators.assessment, Assessment::Insufficient);
    }

    #[test]
    fn test_pagamentos_not_balance_bearing() {
        let builder = BalanceIndicatorBuilder::new();
        let documents = vec![doc(DocumentKind::Pagamentos, "Fornecedor Alfa Beta 1,00")];
        let indicators = builder.build("Fornecedor Alfa Beta", &documents);
        assert!(indicators.by_document.is_empty());
    }
}
