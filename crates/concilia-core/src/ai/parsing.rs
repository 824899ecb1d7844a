//! JSON parsing helpers for model responses
//!
//! The instruction contract forbids text outside the JSON object, but
//! models still wrap answers in prose or code fences; these helpers
//! extract the JSON payload before deserializing.

use crate::error::{Error, Result};
use crate::models::ReconciliationReport;

/// Parse a reconciliation report from a raw model response.
///
/// Slices from the first `{` to the last `}` so leading/trailing prose
/// or markdown fences do not break the parse. The caller converts a
/// failure into the raw-fallback outcome; this never aborts a run.
pub fn parse_report(response: &str) -> Result<ReconciliationReport> {
    let response = response.trim();

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            serde_json::from_str(json_str).map_err(|err| {
                Error::InvalidData(format!(
                    "Invalid report JSON from model: {} | Raw: {}",
                    err,
                    truncate(json_str, 200)
                ))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in model response | Raw: {}",
            truncate(response, 200)
        ))),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DivergenceKind;

    #[test]
    fn test_parse_clean_json() {
        let response = r#"{"resumoExecutivo": "ok", "divergencias": [{"descricao": "saldo", "tipo": "saldo_diferente"}]}"#;
        let report = parse_report(response).unwrap();
        assert_eq!(report.summary, "ok");
        assert_eq!(report.divergences[0].kind, DivergenceKind::SaldoDiferente);
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let response = "Segue o diagnóstico:\n{\"resumoExecutivo\": \"ok\"}\nEspero ter ajudado!";
        let report = parse_report(response).unwrap();
        assert_eq!(report.summary, "ok");
    }

    #[test]
    fn test_parse_json_in_code_fence() {
        let response = "```json\n{\"resumoExecutivo\": \"ok\"}\n```";
        let report = parse_report(response).unwrap();
        assert_eq!(report.summary, "ok");
    }

    #[test]
    fn test_no_json_is_error() {
        assert!(parse_report("não consigo responder em JSON").is_err());
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(parse_report("{\"resumoExecutivo\": }").is_err());
    }
}
