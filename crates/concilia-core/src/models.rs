//! Wire and domain types for the reconciliation engine
//!
//! Field names and enum values stay in Brazilian Portuguese on the wire:
//! they are the contract shared with the model collaborator (which is
//! instructed to answer with exactly this JSON shape) and with the
//! spreadsheet-export collaborator downstream.

use serde::{Deserialize, Serialize};

/// Kind of uploaded supplier document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// General ledger (razão de fornecedores)
    Razao,
    /// Trial balance (balancete)
    Balancete,
    /// Accounts payable (contas a pagar)
    ContasPagar,
    /// Payment extract (extrato de pagamentos)
    Pagamentos,
    /// Invoices (notas fiscais)
    NotasFiscais,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::Razao,
        DocumentKind::Balancete,
        DocumentKind::ContasPagar,
        DocumentKind::Pagamentos,
        DocumentKind::NotasFiscais,
    ];

    /// Document kinds expected to carry a supplier balance column
    pub const BALANCE_BEARING: [DocumentKind; 3] = [
        DocumentKind::Balancete,
        DocumentKind::ContasPagar,
        DocumentKind::Razao,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Razao => "razao",
            DocumentKind::Balancete => "balancete",
            DocumentKind::ContasPagar => "contas_pagar",
            DocumentKind::Pagamentos => "pagamentos",
            DocumentKind::NotasFiscais => "notas_fiscais",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "razao" => Ok(DocumentKind::Razao),
            "balancete" => Ok(DocumentKind::Balancete),
            "contas_pagar" => Ok(DocumentKind::ContasPagar),
            "pagamentos" => Ok(DocumentKind::Pagamentos),
            "notas_fiscais" => Ok(DocumentKind::NotasFiscais),
            other => Err(format!("tipo de relatório desconhecido: {other}")),
        }
    }
}

/// Number of characters of full text kept as the short preview
const PREVIEW_MAX_CHARS: usize = 600;

/// An extracted document, produced by the external text-extraction
/// collaborator. Immutable within a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "tipo")]
    pub kind: DocumentKind,
    #[serde(rename = "nomeOriginal")]
    pub original_name: String,
    #[serde(rename = "conteudoTexto")]
    pub full_text: String,
    #[serde(rename = "preview")]
    pub preview: String,
}

impl Document {
    /// Build a document, deriving the preview from the first characters
    /// of the full text.
    pub fn new(kind: DocumentKind, original_name: impl Into<String>, full_text: impl Into<String>) -> Self {
        let full_text = full_text.into();
        let preview = truncate_chars(&full_text, PREVIEW_MAX_CHARS);
        Self {
            kind,
            original_name: original_name.into(),
            full_text,
            preview,
        }
    }

    pub fn length_chars(&self) -> usize {
        self.full_text.chars().count()
    }
}

/// Truncate at a character boundary (never splits a multi-byte char).
pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Criticality of a finding. Escalation is monotonic and saturates at
/// `Alta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Baixa,
    Media,
    Alta,
}

impl Severity {
    /// Raise one step, saturating at `Alta`. Idempotent at the ceiling.
    pub fn escalate(self) -> Severity {
        match self {
            Severity::Baixa => Severity::Media,
            Severity::Media => Severity::Alta,
            Severity::Alta => Severity::Alta,
        }
    }
}

/// Risk level of an orphan payment (masculine wire values, matching the
/// historical contract for `nivelRisco`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Baixo,
    Medio,
    Alto,
}

impl RiskLevel {
    pub fn escalate(self) -> RiskLevel {
        match self {
            RiskLevel::Baixo => RiskLevel::Medio,
            RiskLevel::Medio => RiskLevel::Alto,
            RiskLevel::Alto => RiskLevel::Alto,
        }
    }
}

impl From<Severity> for RiskLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Baixa => RiskLevel::Baixo,
            Severity::Media => RiskLevel::Medio,
            Severity::Alta => RiskLevel::Alto,
        }
    }
}

/// Classification of a reported discrepancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DivergenceKind {
    SaldoDiferente,
    TituloPagoNaoBaixado,
    TituloSemPagamento,
    FornecedorSemLancamento,
    Outro,
}

impl DivergenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DivergenceKind::SaldoDiferente => "saldo_diferente",
            DivergenceKind::TituloPagoNaoBaixado => "titulo_pago_nao_baixado",
            DivergenceKind::TituloSemPagamento => "titulo_sem_pagamento",
            DivergenceKind::FornecedorSemLancamento => "fornecedor_sem_lancamento",
            DivergenceKind::Outro => "outro",
        }
    }
}

/// A discrepancy found between documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Divergence {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "tipo")]
    pub kind: DivergenceKind,
    #[serde(rename = "referencias", default)]
    pub references: Vec<String>,
    #[serde(rename = "valorEstimado", default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(rename = "nivelCriticidade", default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// One explanatory line of the supplier balance composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceItem {
    #[serde(rename = "fonte")]
    pub source: String,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valorEstimado", default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(rename = "observacoes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A payment present in the extract with no matching open title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrphanPayment {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valorEstimado", default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(rename = "referencias", default)]
    pub references: Vec<String>,
    #[serde(rename = "nivelRisco", default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

/// An open title with no matching payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueTitle {
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "valorEstimado", default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<f64>,
    #[serde(rename = "referencias", default)]
    pub references: Vec<String>,
    #[serde(rename = "diasEmAtrasoEstimado", default, skip_serializing_if = "Option::is_none")]
    pub estimated_days_overdue: Option<i64>,
    #[serde(rename = "nivelCriticidade", default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// The canonical reconciliation diagnosis, exchanged verbatim with the
/// model collaborator and the export collaborator.
///
/// Every field defaults so a partially-filled model answer still parses;
/// missing evidence reduces content instead of failing the run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciliationReport {
    #[serde(rename = "resumoExecutivo", default)]
    pub summary: String,
    #[serde(rename = "composicaoSaldo", default)]
    pub balance_composition: Vec<BalanceItem>,
    #[serde(rename = "divergencias", default)]
    pub divergences: Vec<Divergence>,
    #[serde(rename = "pagamentosOrfaos", default)]
    pub orphan_payments: Vec<OrphanPayment>,
    #[serde(rename = "titulosVencidosSemContrapartida", default)]
    pub overdue_titles: Vec<OverdueTitle>,
    #[serde(rename = "passosRecomendados", default)]
    pub recommended_steps: Vec<String>,
    #[serde(rename = "observacoesGerais", default)]
    pub general_notes: String,
}

impl ReconciliationReport {
    /// Append a sentence to the general notes, separating from any
    /// existing content with a space.
    pub fn append_note(&mut self, note: &str) {
        if !self.general_notes.is_empty() && !self.general_notes.ends_with(' ') {
            self.general_notes.push(' ');
        }
        self.general_notes.push_str(note);
    }
}

/// The four reconciliation rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    /// Standard reconciliation
    Rodada1,
    /// Strategic supplier profile
    Rodada2,
    /// Monthly audit
    Rodada3,
    /// Invoice cross-check
    Rodada4,
}

impl RoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundKind::Rodada1 => "rodada1",
            RoundKind::Rodada2 => "rodada2",
            RoundKind::Rodada3 => "rodada3",
            RoundKind::Rodada4 => "rodada4",
        }
    }

    /// Lenient parse: anything unrecognized falls back to rodada1,
    /// matching the historical endpoint behavior.
    pub fn parse_lenient(input: &str) -> RoundKind {
        match input.trim().to_lowercase().as_str() {
            "rodada2" => RoundKind::Rodada2,
            "rodada3" => RoundKind::Rodada3,
            "rodada4" => RoundKind::Rodada4,
            _ => RoundKind::Rodada1,
        }
    }
}

impl std::fmt::Display for RoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supplier profile tag attached to a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Padrao,
    Estrategico,
    AuditoriaMensal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_escalation_table() {
        assert_eq!(Severity::Baixa.escalate(), Severity::Media);
        assert_eq!(Severity::Media.escalate(), Severity::Alta);
        assert_eq!(Severity::Alta.escalate(), Severity::Alta);
    }

    #[test]
    fn test_risk_level_escalation_saturates() {
        assert_eq!(RiskLevel::Baixo.escalate(), RiskLevel::Medio);
        assert_eq!(RiskLevel::Alto.escalate(), RiskLevel::Alto);
    }

    #[test]
    fn test_document_kind_wire_values() {
        assert_eq!(
            serde_json::to_string(&DocumentKind::ContasPagar).unwrap(),
            "\"contas_pagar\""
        );
        assert_eq!(
            serde_json::to_string(&DivergenceKind::FornecedorSemLancamento).unwrap(),
            "\"fornecedor_sem_lancamento\""
        );
        assert_eq!(serde_json::to_string(&Severity::Baixa).unwrap(), "\"baixa\"");
        assert_eq!(serde_json::to_string(&RiskLevel::Medio).unwrap(), "\"medio\"");
    }

    #[test]
    fn test_round_parse_lenient_falls_back() {
        assert_eq!(RoundKind::parse_lenient("RODADA2 "), RoundKind::Rodada2);
        assert_eq!(RoundKind::parse_lenient("qualquer coisa"), RoundKind::Rodada1);
        assert_eq!(RoundKind::parse_lenient(""), RoundKind::Rodada1);
    }

    #[test]
    fn test_report_parses_with_missing_fields() {
        let json = r#"{"resumoExecutivo": "ok", "divergencias": []}"#;
        let report: ReconciliationReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.summary, "ok");
        assert!(report.orphan_payments.is_empty());
        assert!(report.recommended_steps.is_empty());
    }

    #[test]
    fn test_document_preview_is_char_bounded() {
        let text = "á".repeat(1000);
        let doc = Document::new(DocumentKind::Razao, "razao.pdf", text);
        assert_eq!(doc.preview.chars().count(), 600);
        assert_eq!(doc.length_chars(), 1000);
    }

    #[test]
    fn test_divergence_wire_shape() {
        let d = Divergence {
            description: "saldo divergente".into(),
            kind: DivergenceKind::SaldoDiferente,
            references: vec!["NF 10".into()],
            estimated_value: Some(1200.0),
            severity: Some(Severity::Media),
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["tipo"], "saldo_diferente");
        assert_eq!(json["nivelCriticidade"], "media");
        assert_eq!(json["valorEstimado"], 1200.0);
    }
}
