//! Concilia Core Library
//!
//! Deterministic guardrail engine for supplier reconciliation over
//! extracted Brazilian accounting documents:
//! - Text normalization and fuzzy supplier matching
//! - Brazilian-format monetary parsing
//! - Cross-document balance indicators with automatic assessment
//! - Open-items subtotal resolution and override
//! - Severity escalation by amount and supplier profile
//! - Pluggable model backends (OpenAI-compatible, mock)
//! - Four-round reconciliation pipeline with typed outcomes
//! - Flattened CSV export for the spreadsheet collaborator

pub mod ai;
pub mod balance;
pub mod error;
pub mod escalation;
pub mod export;
pub mod identifiers;
pub mod matching;
pub mod models;
pub mod money;
pub mod pipeline;
pub mod prompt;
pub mod subtotal;
pub mod text;

/// Test utilities including the mock chat-completions server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{MockBackend, ModelBackend, ModelClient, OpenAICompatibleBackend};
pub use balance::{
    Assessment, BalanceIndicator, BalanceIndicatorBuilder, BalanceIndicators,
    DEFAULT_BALANCE_TOLERANCE,
};
pub use error::{Error, Result};
pub use escalation::{apply_strategic_profile, classify_by_amount};
pub use export::{export_filename, rows_from_report, write_csv, ExportRow, RowStatus};
pub use matching::{FuzzyMatcher, MatchedLine, MatcherConfig};
pub use models::{
    Divergence, DivergenceKind, Document, DocumentKind, OrphanPayment, OverdueTitle, Profile,
    ReconciliationReport, RiskLevel, RoundKind, Severity,
};
pub use pipeline::{
    MonthlyAudit, PipelineConfig, ReconciliationPipeline, ReconciliationRun, RunEnvelope,
    RunOutcome, RunStatus,
};
pub use subtotal::SubtotalResolver;
