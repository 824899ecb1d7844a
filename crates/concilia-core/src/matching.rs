//! Fuzzy supplier matching over extracted document text
//!
//! Two granularities share one token-overlap score:
//!
//! - `is_present` is the conservative presence gate (threshold 0.70): a
//!   false positive here would skip the model call for a supplier that is
//!   actually in the ledger.
//! - `matched_lines` is the permissive balance-row collector (threshold
//!   0.60): extraction noise from PDF line wrapping must not hide a
//!   genuine balance row.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::money::extract_monetary_values;
use crate::text::normalize;

/// Matching thresholds.
///
/// The defaults are tuned values carried over from production behavior;
/// which discrepancies get suppressed depends on them, so override with
/// care.
#[derive(Debug, Clone, Copy)]
pub struct MatcherConfig {
    /// Minimum token score for the supplier presence gate
    pub presence_threshold: f64,
    /// Minimum token score for balance-row extraction
    pub line_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            presence_threshold: 0.70,
            line_threshold: 0.60,
        }
    }
}

/// A document line that matched the supplier name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedLine {
    /// Line as it appeared in the extracted text
    #[serde(rename = "textoOriginal")]
    pub original_text: String,
    /// Normalized form used for scoring
    #[serde(rename = "textoNormalizado")]
    pub normalized_text: String,
    /// Token overlap score in [0, 1]
    #[serde(rename = "pontuacao")]
    pub score: f64,
    /// Monetary tokens found on the line, in order
    #[serde(rename = "valoresMonetarios")]
    pub monetary_values: Vec<String>,
    /// Last monetary token, treated as the trailing balance column
    #[serde(rename = "ultimoValor")]
    pub last_value: Option<String>,
}

/// Token-overlap matcher for supplier names
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher {
    config: MatcherConfig,
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Significant words of a normalized target: tokens of length ≤2 are
    /// discarded so common short words ("de", "e", "sa") cannot produce
    /// trivial matches.
    fn significant_tokens(normalized_target: &str) -> Vec<&str> {
        normalized_target
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .collect()
    }

    /// Fraction of target tokens found in the normalized line.
    fn token_score(tokens: &[&str], normalized_line: &str) -> f64 {
        if tokens.is_empty() {
            return 0.0;
        }
        let matched = tokens.iter().filter(|t| normalized_line.contains(**t)).count();
        matched as f64 / tokens.len() as f64
    }

    /// Whether `target` appears in `text`.
    ///
    /// Tries an exact substring test on the fully normalized text first,
    /// then falls back to per-line token scoring against the presence
    /// threshold. A target with no significant tokens never matches.
    pub fn is_present(&self, target: &str, text: &str) -> bool {
        let target_norm = normalize(target);
        if target_norm.is_empty() {
            return false;
        }

        if normalize(text).contains(&target_norm) {
            return true;
        }

        let tokens = Self::significant_tokens(&target_norm);
        if tokens.is_empty() {
            return false;
        }

        text.lines().any(|line| {
            let score = Self::token_score(&tokens, &normalize(line));
            score >= self.config.presence_threshold
        })
    }

    /// All lines of `text` that score at least the line threshold against
    /// `target`, each with its monetary tokens extracted from the original
    /// (non-normalized) line.
    pub fn matched_lines(&self, target: &str, text: &str) -> Vec<MatchedLine> {
        let target_norm = normalize(target);
        let tokens = Self::significant_tokens(&target_norm);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for line in text.lines() {
            let original = line.trim_end_matches('\r');
            let normalized = normalize(original);
            if normalized.is_empty() {
                continue;
            }

            let score = Self::token_score(&tokens, &normalized);
            if score < self.config.line_threshold {
                continue;
            }

            let monetary_values = extract_monetary_values(original);
            matches.push(MatchedLine {
                original_text: original.to_string(),
                normalized_text: normalized,
                score,
                last_value: monetary_values.last().cloned(),
                monetary_values,
            });
        }

        debug!(
            target_tokens = tokens.len(),
            matched = matches.len(),
            "fuzzy line matching"
        );
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_exact_substring() {
        let matcher = FuzzyMatcher::new();
        assert!(matcher.is_present(
            "Comercial Rio Ltda",
            "01/02 ... comercial rio ltda 1.234,00 ..."
        ));
    }

    #[test]
    fn test_present_accent_and_case_insensitive() {
        let matcher = FuzzyMatcher::new();
        assert!(matcher.is_present("INDÚSTRIA SÃO JOSÉ", "saldo industria sao jose 10,00"));
    }

    #[test]
    fn test_two_of_three_tokens_is_line_match_but_not_presence() {
        let matcher = FuzzyMatcher::new();
        // "Comercial Rio Norte": the line carries only "comercial" and
        // "norte" → score 0.667, below 0.70 but at or above 0.60.
        let text = "lancamento comercial norte 2.500,00";

        assert!(!matcher.is_present("Comercial Rio Norte", text));

        let lines = matcher.matched_lines("Comercial Rio Norte", text);
        assert_eq!(lines.len(), 1);
        assert!((lines[0].score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(lines[0].last_value.as_deref(), Some("2.500,00"));
    }

    #[test]
    fn test_short_tokens_never_match() {
        let matcher = FuzzyMatcher::new();
        // Every token has length ≤2, so nothing qualifies
        assert!(!matcher.is_present("A B SA", "a b sa em toda linha a b sa"));
        assert!(matcher.matched_lines("A B SA", "a b sa 1,00").is_empty());
    }

    #[test]
    fn test_matched_lines_collects_all_values() {
        let matcher = FuzzyMatcher::new();
        let text = "Fornecedor Alfa Beta NF 10 1.000,00 500,00\noutra linha qualquer";
        let lines = matcher.matched_lines("Alfa Beta", text);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].monetary_values, vec!["1.000,00", "500,00"]);
        assert_eq!(lines[0].last_value.as_deref(), Some("500,00"));
    }

    #[test]
    fn test_absent_supplier() {
        let matcher = FuzzyMatcher::new();
        assert!(!matcher.is_present("Fornecedor Gama", "texto sem o nome procurado"));
        assert!(matcher.matched_lines("Fornecedor Gama", "texto sem o nome").is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let matcher = FuzzyMatcher::with_config(MatcherConfig {
            presence_threshold: 0.5,
            line_threshold: 0.5,
        });
        // 2 of 3 tokens now passes the presence gate too
        assert!(matcher.is_present("Comercial Rio Norte", "comercial norte 1,00"));
    }
}
