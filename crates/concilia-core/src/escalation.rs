//! Severity classification and strategic-profile escalation
//!
//! A supplier flagged as strategic gets every finding raised one step:
//! records without an explicit severity first receive one derived from
//! their estimated value, then the escalation applies. Escalation never
//! decreases and saturates at the highest level.

use tracing::debug;

use crate::models::{ReconciliationReport, RiskLevel, Severity};

/// Classify a monetary magnitude into a severity level.
///
/// Breakpoints: up to 1 000,00 → baixa; up to 10 000,00 → media;
/// above → alta.
pub fn classify_by_amount(value: f64) -> Severity {
    if value <= 1_000.0 {
        Severity::Baixa
    } else if value <= 10_000.0 {
        Severity::Media
    } else {
        Severity::Alta
    }
}

/// Raise severity criteria across every record array of `report` and
/// append the strategic-supplier note to the general notes.
pub fn apply_strategic_profile(report: &mut ReconciliationReport) {
    let mut touched = 0usize;

    for divergence in &mut report.divergences {
        let current = divergence
            .severity
            .unwrap_or_else(|| classify_by_amount(divergence.estimated_value.unwrap_or(0.0)));
        divergence.severity = Some(current.escalate());
        touched += 1;
    }

    for payment in &mut report.orphan_payments {
        let current = payment.risk_level.unwrap_or_else(|| {
            RiskLevel::from(classify_by_amount(payment.estimated_value.unwrap_or(0.0)))
        });
        payment.risk_level = Some(current.escalate());
        touched += 1;
    }

    for title in &mut report.overdue_titles {
        let current = title
            .severity
            .unwrap_or_else(|| classify_by_amount(title.estimated_value.unwrap_or(0.0)));
        title.severity = Some(current.escalate());
        touched += 1;
    }

    debug!(records = touched, "strategic profile escalation applied");

    report.append_note(
        "Critérios de criticidade reforçados por se tratar de fornecedor estratégico.",
    );
}
