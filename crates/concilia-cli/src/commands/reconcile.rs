//! Reconcile command: load extracted texts, run a round, emit the envelope

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use concilia_core::ai::ModelClient;
use concilia_core::models::{Document, DocumentKind, RoundKind};
use concilia_core::pipeline::{ReconciliationPipeline, RunStatus};

/// Optional extracted-text path per document kind
#[derive(Debug, Default)]
pub struct DocumentPaths {
    pub razao: Option<PathBuf>,
    pub balancete: Option<PathBuf>,
    pub contas_pagar: Option<PathBuf>,
    pub pagamentos: Option<PathBuf>,
    pub notas_fiscais: Option<PathBuf>,
}

impl DocumentPaths {
    fn entries(&self) -> [(DocumentKind, Option<&Path>); 5] {
        [
            (DocumentKind::Razao, self.razao.as_deref()),
            (DocumentKind::Balancete, self.balancete.as_deref()),
            (DocumentKind::ContasPagar, self.contas_pagar.as_deref()),
            (DocumentKind::Pagamentos, self.pagamentos.as_deref()),
            (DocumentKind::NotasFiscais, self.notas_fiscais.as_deref()),
        ]
    }
}

/// Load every provided text file into a document. Absent paths are
/// simply skipped, mirroring the upload contract.
pub fn load_documents(paths: &DocumentPaths) -> Result<Vec<Document>> {
    let mut documents = Vec::new();

    for (kind, path) in paths.entries() {
        let Some(path) = path else { continue };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Falha ao ler o arquivo {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| kind.as_str().to_string());
        documents.push(Document::new(kind, name, text));
    }

    Ok(documents)
}

pub async fn cmd_reconcile(
    supplier: &str,
    round: &str,
    paths: DocumentPaths,
    output: Option<&Path>,
) -> Result<()> {
    let supplier = supplier.trim();
    anyhow::ensure!(
        !supplier.is_empty(),
        "Informe o nome do fornecedor no campo 'fornecedor'."
    );

    let documents = load_documents(&paths)?;
    anyhow::ensure!(
        !documents.is_empty(),
        "Envie ao menos um relatório (razão, balancete, contas a pagar, pagamentos ou notas fiscais)."
    );

    let round = RoundKind::parse_lenient(round);
    println!("🔎 Conciliação do fornecedor \"{supplier}\" ({round})...");

    let client = ModelClient::from_env();
    if client.is_none() {
        println!("   💡 Sem OPENAI_API_KEY: apenas as regras locais serão aplicadas");
    }

    let pipeline = ReconciliationPipeline::new(client);
    let run = pipeline.run(round, supplier, &documents).await;
    let envelope = run.into_envelope();
    tracing::debug!(status = ?envelope.status, "reconciliation run finished");

    match envelope.status {
        RunStatus::ConciliacaoGerada => {
            let records = envelope
                .report
                .as_ref()
                .map(|r| r.divergences.len() + r.orphan_payments.len() + r.overdue_titles.len())
                .unwrap_or(0);
            println!("✅ Conciliação gerada ({records} apontamento(s))");
        }
        RunStatus::ConciliacaoTexto => {
            println!("⚠️  Resposta do modelo fora do contrato JSON; texto bruto preservado");
        }
        RunStatus::ErroOpenai => {
            println!(
                "❌ {}",
                envelope.message.as_deref().unwrap_or("Falha na conciliação")
            );
        }
    }

    let json = serde_json::to_string_pretty(&envelope)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Falha ao gravar {}", path.display()))?;
            println!("   Envelope salvo em {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
