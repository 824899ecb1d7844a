//! Flattened export rows for the spreadsheet collaborator
//!
//! Each divergence, overdue title and orphan payment becomes one row of
//! `{data, historico, documentoReferencia, status, valor, fornecedor}`.
//! Date, document reference and value are sniffed from the record's
//! description and references by independent matchers; anything the
//! matchers cannot resolve is filled with "Não localizado".

use std::io::Write;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ReconciliationReport;
use crate::money::extract_monetary_values;

/// Placeholder for any field the matchers could not resolve
pub const NOT_FOUND: &str = "Não localizado";

/// Settlement status of an exported row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    #[serde(rename = "Liquidado")]
    Settled,
    #[serde(rename = "A Liquidar")]
    Open,
    #[serde(rename = "Não localizado")]
    Unknown,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Settled => "Liquidado",
            RowStatus::Open => "A Liquidar",
            RowStatus::Unknown => NOT_FOUND,
        }
    }
}

/// One flattened row of the consolidated export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "historico")]
    pub narrative: String,
    #[serde(rename = "documentoReferencia")]
    pub document_reference: String,
    #[serde(rename = "status")]
    pub status: RowStatus,
    #[serde(rename = "valor")]
    pub value: String,
    #[serde(rename = "fornecedor")]
    pub supplier: String,
}

fn date_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"\b\d{2}/\d{2}(?:/\d{2,4})?\b").expect("valid regex"))
}

fn document_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    // NF/NFe/nota fiscal/título/boleto/duplicata followed by a number
    R.get_or_init(|| {
        Regex::new(r"(?i)\b(?:NF-?e?|nota fiscal|t[íi]tulo|boleto|duplicata|doc\.?)\s*(?:n[ºo°.]?\s*)?(\d[\d./-]*\d|\d)")
            .expect("valid regex")
    })
}

/// Find a dd/mm or dd/mm/yyyy date in the candidate texts, first hit wins.
pub fn find_date<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find_map(|text| date_re().find(text).map(|m| m.as_str().to_string()))
}

/// Find a fiscal document reference ("NF 102", "título 33", ...) in the
/// candidate texts, returning it in the normalized "NF 102" style as it
/// appeared.
pub fn find_document_reference<'a, I>(candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find_map(|text| document_re().find(text).map(|m| m.as_str().trim().to_string()))
}

/// Find a monetary value in the candidate texts. The record's own
/// estimated value takes precedence; the texts are only a fallback.
pub fn find_value<'a, I>(estimated: Option<f64>, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    if let Some(value) = estimated {
        return Some(format!("{value:.2}"));
    }

    candidates
        .into_iter()
        .find_map(|text| extract_monetary_values(text).into_iter().next())
}

fn row(
    supplier: &str,
    status: RowStatus,
    description: &str,
    references: &[String],
    estimated_value: Option<f64>,
) -> ExportRow {
    let candidates = || {
        std::iter::once(description).chain(references.iter().map(String::as_str))
    };

    ExportRow {
        date: find_date(candidates()).unwrap_or_else(|| NOT_FOUND.to_string()),
        narrative: if description.trim().is_empty() {
            NOT_FOUND.to_string()
        } else {
            description.trim().to_string()
        },
        document_reference: find_document_reference(candidates())
            .unwrap_or_else(|| NOT_FOUND.to_string()),
        status,
        value: find_value(estimated_value, candidates())
            .unwrap_or_else(|| NOT_FOUND.to_string()),
        supplier: supplier.to_string(),
    }
}

/// Flatten a report into export rows.
///
/// Divergences carry no settlement information of their own, overdue
/// titles are by definition still open, and orphan payments have already
/// left the bank account.
pub fn rows_from_report(supplier: &str, report: &ReconciliationReport) -> Vec<ExportRow> {
    let mut rows = Vec::new();

    for d in &report.divergences {
        rows.push(row(
            supplier,
            RowStatus::Unknown,
            &d.description,
            &d.references,
            d.estimated_value,
        ));
    }

    for t in &report.overdue_titles {
        rows.push(row(
            supplier,
            RowStatus::Open,
            &t.description,
            &t.references,
            t.estimated_value,
        ));
    }

    for p in &report.orphan_payments {
        rows.push(row(
            supplier,
            RowStatus::Settled,
            &p.description,
            &p.references,
            p.estimated_value,
        ));
    }

    rows
}

/// Write rows as CSV (headers in the wire field names) to `writer`.
pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["data", "historico", "documentoReferencia", "status", "valor", "fornecedor"])?;

    for r in rows {
        wtr.write_record([
            r.date.as_str(),
            r.narrative.as_str(),
            r.document_reference.as_str(),
            r.status.as_str(),
            r.value.as_str(),
            r.supplier.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Default filename for a consolidated export:
/// `consolidado_<fornecedor>_<rodada>_<timestamp>.csv`.
pub fn export_filename(supplier: &str, round: &str, now: DateTime<Utc>) -> String {
    let mut slug = String::new();
    let mut pending_sep = false;
    for c in supplier.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("fornecedor");
    }

    format!(
        "consolidado_{}_{}_{}.csv",
        slug,
        round,
        now.format("%Y-%m-%d_%H-%M-%S")
    )
}
