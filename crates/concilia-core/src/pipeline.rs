//! Reconciliation pipeline: four rounds around one base procedure
//!
//! The base procedure gates on supplier presence in the ledger, builds
//! deterministic balance indicators, calls the model collaborator and
//! parses its structured answer. Each round layers its own augmentation
//! on top:
//!
//! - rodada1 (standard): subtotal override on the first open title
//! - rodada2 (strategic): fiscal identifiers + severity escalation
//! - rodada3 (monthly audit): full rodada1, then divergence aggregation
//! - rodada4 (invoice cross-check): base procedure only, extension point
//!
//! Every failure mode is a `RunOutcome` variant; the pipeline never
//! returns an error to the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{parsing, ModelBackend, ModelClient};
use crate::balance::{BalanceIndicatorBuilder, BalanceIndicators, DEFAULT_BALANCE_TOLERANCE};
use crate::escalation::apply_strategic_profile;
use crate::identifiers;
use crate::matching::{FuzzyMatcher, MatcherConfig};
use crate::models::{
    BalanceItem, Divergence, DivergenceKind, Document, DocumentKind, Profile,
    ReconciliationReport, RoundKind, Severity,
};
use crate::prompt;
use crate::subtotal::SubtotalResolver;

const MODEL_UNAVAILABLE_MESSAGE: &str =
    "Chave do modelo não configurada. Defina OPENAI_API_KEY para habilitar a conciliação assistida.";
const MODEL_FAILURE_MESSAGE: &str =
    "Falha ao gerar conciliação com o modelo. Veja os logs do servidor.";
const NOT_FOUND_NOTE: &str =
    "Fornecedor não encontrado na razão. Diagnóstico gerado sem chamada ao modelo.";

/// Pipeline tuning knobs. Defaults preserve the tuned production values.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub matcher: MatcherConfig,
    pub balance_tolerance: f64,
    pub excerpt_max_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            matcher: MatcherConfig::default(),
            balance_tolerance: DEFAULT_BALANCE_TOLERANCE,
            excerpt_max_chars: prompt::EXCERPT_MAX_CHARS,
        }
    }
}

/// Every exit path of a reconciliation run
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Supplier absent from the ledger; diagnosis synthesized without
    /// any model call
    RuleDerived {
        report: ReconciliationReport,
        raw_note: String,
    },
    /// Model answered with a parseable structured report
    Generated {
        report: ReconciliationReport,
        raw_response: String,
        model: String,
    },
    /// Model answered but the output did not parse; raw text preserved
    RawFallback { raw_response: String, model: String },
    /// No model credentials configured
    ModelUnavailable { message: String },
    /// Model call failed (network, server error)
    ModelFailed { message: String, detail: String },
}

impl RunOutcome {
    pub fn report(&self) -> Option<&ReconciliationReport> {
        match self {
            RunOutcome::RuleDerived { report, .. } | RunOutcome::Generated { report, .. } => {
                Some(report)
            }
            _ => None,
        }
    }

    fn report_mut(&mut self) -> Option<&mut ReconciliationReport> {
        match self {
            RunOutcome::RuleDerived { report, .. } | RunOutcome::Generated { report, .. } => {
                Some(report)
            }
            _ => None,
        }
    }
}

/// Aggregated divergence bucket for the monthly audit round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivergenceBucket {
    #[serde(rename = "tipo")]
    pub kind: DivergenceKind,
    #[serde(rename = "quantidade")]
    pub count: usize,
    #[serde(rename = "valorEstimadoTotal")]
    pub total_estimated_value: f64,
}

/// Monthly-audit aggregation attached to rodada3 runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyAudit {
    #[serde(rename = "resumoPorTipo")]
    pub buckets: Vec<DivergenceBucket>,
    #[serde(rename = "linhasFornecedorRazao")]
    pub ledger_line_count: usize,
    #[serde(rename = "linhasFornecedorContasPagar")]
    pub payable_line_count: usize,
    #[serde(rename = "linhasFornecedorPagamentos")]
    pub payment_line_count: usize,
}

/// Result of one reconciliation run
#[derive(Debug, Clone)]
pub struct ReconciliationRun {
    pub supplier: String,
    pub round: RoundKind,
    pub profile: Profile,
    pub outcome: RunOutcome,
    pub indicators: Option<BalanceIndicators>,
    pub fiscal_identifiers: Option<Vec<String>>,
    pub audit: Option<MonthlyAudit>,
}

/// Wire status discriminator of the run envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "conciliacao_gerada")]
    ConciliacaoGerada,
    #[serde(rename = "conciliacao_texto")]
    ConciliacaoTexto,
    #[serde(rename = "erro_openai")]
    ErroOpenai,
}

/// Flat wire envelope handed to callers and the export collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEnvelope {
    #[serde(rename = "fornecedor")]
    pub supplier: String,
    #[serde(rename = "rodada")]
    pub round: RoundKind,
    #[serde(rename = "perfil")]
    pub profile: Profile,
    #[serde(rename = "status")]
    pub status: RunStatus,
    #[serde(rename = "modelo", default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "mensagem", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "detalhe", default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "estrutura", default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReconciliationReport>,
    #[serde(rename = "respostaBruta", default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    #[serde(rename = "indicadores", default, skip_serializing_if = "Option::is_none")]
    pub indicators: Option<BalanceIndicators>,
    #[serde(
        rename = "identificadoresFiscais",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub fiscal_identifiers: Option<Vec<String>>,
    #[serde(rename = "auditoria", default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<MonthlyAudit>,
    #[serde(rename = "geradoEm")]
    pub generated_at: DateTime<Utc>,
}

impl ReconciliationRun {
    pub fn report(&self) -> Option<&ReconciliationReport> {
        self.outcome.report()
    }

    /// Flatten the typed outcome into the wire envelope.
    pub fn into_envelope(self) -> RunEnvelope {
        let mut envelope = RunEnvelope {
            supplier: self.supplier,
            round: self.round,
            profile: self.profile,
            status: RunStatus::ConciliacaoGerada,
            model: None,
            message: None,
            detail: None,
            report: None,
            raw_response: None,
            indicators: self.indicators,
            fiscal_identifiers: self.fiscal_identifiers,
            audit: self.audit,
            generated_at: Utc::now(),
        };

        match self.outcome {
            RunOutcome::RuleDerived { report, raw_note } => {
                envelope.status = RunStatus::ConciliacaoGerada;
                envelope.model = Some("regra_local_sem_ia".to_string());
                envelope.report = Some(report);
                envelope.raw_response = Some(raw_note);
            }
            RunOutcome::Generated {
                report,
                raw_response,
                model,
            } => {
                envelope.status = RunStatus::ConciliacaoGerada;
                envelope.model = Some(model);
                envelope.report = Some(report);
                envelope.raw_response = Some(raw_response);
            }
            RunOutcome::RawFallback {
                raw_response,
                model,
            } => {
                envelope.status = RunStatus::ConciliacaoTexto;
                envelope.model = Some(model);
                envelope.raw_response = Some(raw_response);
            }
            RunOutcome::ModelUnavailable { message } => {
                envelope.status = RunStatus::ErroOpenai;
                envelope.message = Some(message);
            }
            RunOutcome::ModelFailed { message, detail } => {
                envelope.status = RunStatus::ErroOpenai;
                envelope.message = Some(message);
                envelope.detail = Some(detail);
            }
        }

        envelope
    }
}

/// The reconciliation pipeline.
///
/// Holds an explicit, optional model-client handle (constructed once at
/// process start) plus the deterministic primitives. Stateless across
/// runs: every entity is request-scoped.
pub struct ReconciliationPipeline {
    client: Option<ModelClient>,
    config: PipelineConfig,
    matcher: FuzzyMatcher,
    builder: BalanceIndicatorBuilder,
    resolver: SubtotalResolver,
}

impl ReconciliationPipeline {
    pub fn new(client: Option<ModelClient>) -> Self {
        Self::with_config(client, PipelineConfig::default())
    }

    pub fn with_config(client: Option<ModelClient>, config: PipelineConfig) -> Self {
        let matcher = FuzzyMatcher::with_config(config.matcher);
        let builder =
            BalanceIndicatorBuilder::with_matcher(matcher.clone()).tolerance(config.balance_tolerance);
        let resolver = SubtotalResolver::with_matcher(matcher.clone());
        Self {
            client,
            config,
            matcher,
            builder,
            resolver,
        }
    }

    /// Execute one reconciliation round for a supplier.
    pub async fn run(
        &self,
        round: RoundKind,
        supplier: &str,
        documents: &[Document],
    ) -> ReconciliationRun {
        info!(supplier, round = %round, documents = documents.len(), "reconciliation run started");
        match round {
            RoundKind::Rodada1 => self.rodada1(supplier, documents).await,
            RoundKind::Rodada2 => self.rodada2(supplier, documents).await,
            RoundKind::Rodada3 => self.rodada3(supplier, documents).await,
            RoundKind::Rodada4 => self.rodada4(supplier, documents).await,
        }
    }

    /// Base procedure shared by all rounds: presence gate → indicators →
    /// model call → parse, with every failure folded into the outcome.
    async fn base(
        &self,
        supplier: &str,
        documents: &[Document],
    ) -> (Option<BalanceIndicators>, RunOutcome) {
        let supplier = supplier.trim();

        // Presence gate against the ledger. An empty ledger text gives no
        // evidence either way, so the gate only fires on actual absence.
        if let Some(ledger) = documents.iter().find(|d| d.kind == DocumentKind::Razao) {
            if !supplier.is_empty()
                && !ledger.full_text.trim().is_empty()
                && !self.matcher.is_present(supplier, &ledger.full_text)
            {
                info!(supplier, "supplier absent from ledger, model call skipped");
                return (
                    None,
                    RunOutcome::RuleDerived {
                        report: Self::not_found_report(supplier),
                        raw_note: NOT_FOUND_NOTE.to_string(),
                    },
                );
            }
        }

        let indicators = self.builder.build(supplier, documents);

        let Some(client) = self.client.as_ref() else {
            return (
                Some(indicators),
                RunOutcome::ModelUnavailable {
                    message: MODEL_UNAVAILABLE_MESSAGE.to_string(),
                },
            );
        };

        let payload = prompt::build_payload(
            supplier,
            documents,
            indicators.clone(),
            self.config.excerpt_max_chars,
        );
        let user = match prompt::user_prompt(&payload) {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "failed to assemble model payload");
                return (
                    Some(indicators),
                    RunOutcome::ModelFailed {
                        message: MODEL_FAILURE_MESSAGE.to_string(),
                        detail: err.to_string(),
                    },
                );
            }
        };

        match client.complete(prompt::system_prompt(), &user).await {
            Ok(raw) => match parsing::parse_report(&raw) {
                Ok(report) => (
                    Some(indicators),
                    RunOutcome::Generated {
                        report,
                        raw_response: raw,
                        model: client.model().to_string(),
                    },
                ),
                Err(err) => {
                    warn!(error = %err, "model output unparseable, degrading to raw text");
                    (
                        Some(indicators),
                        RunOutcome::RawFallback {
                            raw_response: raw,
                            model: client.model().to_string(),
                        },
                    )
                }
            },
            Err(err) => {
                warn!(error = %err, "model call failed");
                (
                    Some(indicators),
                    RunOutcome::ModelFailed {
                        message: MODEL_FAILURE_MESSAGE.to_string(),
                        detail: err.to_string(),
                    },
                )
            }
        }
    }

    /// Rodada 1: base procedure + subtotal override.
    async fn rodada1(&self, supplier: &str, documents: &[Document]) -> ReconciliationRun {
        let (indicators, mut outcome) = self.base(supplier, documents).await;

        if let RunOutcome::Generated { report, .. } = &mut outcome {
            self.apply_subtotal_override(supplier, documents, report);
        }

        ReconciliationRun {
            supplier: supplier.trim().to_string(),
            round: RoundKind::Rodada1,
            profile: Profile::Padrao,
            outcome,
            indicators,
            fiscal_identifiers: None,
            audit: None,
        }
    }

    /// Rodada 2: strategic supplier. Attaches fiscal identifiers found in
    /// the documents and escalates severity across every record array.
    async fn rodada2(&self, supplier: &str, documents: &[Document]) -> ReconciliationRun {
        let (indicators, mut outcome) = self.base(supplier, documents).await;

        let fiscal_identifiers = identifiers::extract_from_documents(documents);
        debug!(count = fiscal_identifiers.len(), "fiscal identifiers extracted");

        if let Some(report) = outcome.report_mut() {
            apply_strategic_profile(report);
        }

        ReconciliationRun {
            supplier: supplier.trim().to_string(),
            round: RoundKind::Rodada2,
            profile: Profile::Estrategico,
            outcome,
            indicators,
            fiscal_identifiers: Some(fiscal_identifiers),
            audit: None,
        }
    }

    /// Rodada 3: monthly audit. Re-executes rodada1 in full (subtotal
    /// override included), then aggregates divergences by kind and counts
    /// supplier lines across ledger, accounts payable and payments.
    async fn rodada3(&self, supplier: &str, documents: &[Document]) -> ReconciliationRun {
        let mut run = self.rodada1(supplier, documents).await;
        run.round = RoundKind::Rodada3;
        run.profile = Profile::AuditoriaMensal;

        let ledger_line_count = self.supplier_line_count(supplier, documents, DocumentKind::Razao);
        let payable_line_count =
            self.supplier_line_count(supplier, documents, DocumentKind::ContasPagar);
        let payment_line_count =
            self.supplier_line_count(supplier, documents, DocumentKind::Pagamentos);

        let buckets = run
            .outcome
            .report()
            .map(|report| Self::aggregate_divergences(&report.divergences))
            .unwrap_or_default();

        if let Some(report) = run.outcome.report_mut() {
            report.append_note(&format!(
                "Auditoria mensal: {} linha(s) do fornecedor na razão, {} no contas a pagar e {} no extrato de pagamentos; {} divergência(s) agrupada(s) em {} tipo(s).",
                ledger_line_count,
                payable_line_count,
                payment_line_count,
                buckets.iter().map(|b| b.count).sum::<usize>(),
                buckets.len(),
            ));
        }

        run.audit = Some(MonthlyAudit {
            buckets,
            ledger_line_count,
            payable_line_count,
            payment_line_count,
        });
        run
    }

    /// Rodada 4: invoice cross-check. Base procedure only; invoice rules
    /// are an extension point layered by callers.
    async fn rodada4(&self, supplier: &str, documents: &[Document]) -> ReconciliationRun {
        let (indicators, outcome) = self.base(supplier, documents).await;
        ReconciliationRun {
            supplier: supplier.trim().to_string(),
            round: RoundKind::Rodada4,
            profile: Profile::Padrao,
            outcome,
            indicators,
            fiscal_identifiers: None,
            audit: None,
        }
    }

    fn apply_subtotal_override(
        &self,
        supplier: &str,
        documents: &[Document],
        report: &mut ReconciliationReport,
    ) {
        let Some(payable) = documents.iter().find(|d| d.kind == DocumentKind::ContasPagar)
        else {
            return;
        };

        if let Some(subtotal) = self.resolver.resolve(&payable.full_text, supplier) {
            debug!(subtotal, "subtotal override applied to first open title");
            SubtotalResolver::apply_override(report, subtotal);
        }
    }

    fn supplier_line_count(
        &self,
        supplier: &str,
        documents: &[Document],
        kind: DocumentKind,
    ) -> usize {
        documents
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| self.matcher.matched_lines(supplier, &d.full_text).len())
            .unwrap_or(0)
    }

    fn aggregate_divergences(divergences: &[Divergence]) -> Vec<DivergenceBucket> {
        let mut by_kind: BTreeMap<DivergenceKind, (usize, f64)> = BTreeMap::new();
        for divergence in divergences {
            let entry = by_kind.entry(divergence.kind).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += divergence.estimated_value.unwrap_or(0.0);
        }

        by_kind
            .into_iter()
            .map(|(kind, (count, total_estimated_value))| DivergenceBucket {
                kind,
                count,
                total_estimated_value,
            })
            .collect()
    }

    /// Deterministic diagnosis for a supplier with no ledger entries.
    fn not_found_report(supplier: &str) -> ReconciliationReport {
        ReconciliationReport {
            summary: format!(
                "Não foram encontrados lançamentos do fornecedor \"{supplier}\" na razão enviada."
            ),
            balance_composition: vec![BalanceItem {
                source: "razao".to_string(),
                description:
                    "Razão de fornecedores analisada, porém o fornecedor informado não consta em nenhum lançamento."
                        .to_string(),
                estimated_value: Some(0.0),
                notes: Some(
                    "Verifique se o relatório de razão está filtrado corretamente para o período e empresa, ou se há erro no nome do fornecedor."
                        .to_string(),
                ),
            }],
            divergences: vec![Divergence {
                description:
                    "Fornecedor informado não aparece em nenhum lançamento da razão de fornecedores."
                        .to_string(),
                kind: DivergenceKind::FornecedorSemLancamento,
                references: vec![
                    format!("Fornecedor: {supplier}"),
                    "Relatório: Razão de Fornecedores".to_string(),
                ],
                estimated_value: Some(0.0),
                severity: Some(Severity::Alta),
            }],
            orphan_payments: Vec::new(),
            overdue_titles: Vec::new(),
            recommended_steps: vec![
                "Conferir se o nome do fornecedor está idêntico ao cadastrado no sistema/contabilidade."
                    .to_string(),
                "Validar se o relatório de razão foi emitido para o CNPJ correto e para o período desejado."
                    .to_string(),
                "Caso o fornecedor realmente devesse ter lançamentos, solicitar a emissão de um novo relatório de razão filtrado corretamente."
                    .to_string(),
            ],
            general_notes:
                "Como o fornecedor não foi encontrado na amostra do relatório de razão, não é possível prosseguir com a conciliação detalhada até que os relatórios estejam consistentes."
                    .to_string(),
        }
    }
}
