//! Export command: flatten a saved run envelope into consolidated CSV

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use concilia_core::export::{export_filename, rows_from_report, write_csv};
use concilia_core::pipeline::RunEnvelope;

pub fn cmd_export(input: &Path, output: Option<&Path>) -> Result<()> {
    let json = std::fs::read_to_string(input)
        .with_context(|| format!("Falha ao ler o arquivo {}", input.display()))?;
    let envelope: RunEnvelope = serde_json::from_str(&json)
        .with_context(|| format!("Envelope inválido em {}", input.display()))?;

    let report = envelope.report.as_ref().with_context(|| {
        format!(
            "O envelope tem status {:?} e não carrega estrutura para exportar",
            envelope.status
        )
    })?;

    let rows = rows_from_report(&envelope.supplier, report);

    let path: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(export_filename(
            &envelope.supplier,
            envelope.round.as_str(),
            Utc::now(),
        )),
    };

    let file = std::fs::File::create(&path)
        .with_context(|| format!("Falha ao criar {}", path.display()))?;
    write_csv(file, &rows)?;

    println!("✅ {} linha(s) exportada(s) para {}", rows.len(), path.display());
    Ok(())
}
