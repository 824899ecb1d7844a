//! CLI command tests

use std::io::Write;

use tempfile::NamedTempFile;

use crate::commands::{self, DocumentPaths};
use concilia_core::models::DocumentKind;

fn temp_text_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ========== Document Loading Tests ==========

#[test]
fn test_load_documents_skips_absent_paths() {
    let razao = temp_text_file("Fornecedor Alfa Beta 1.000,00");

    let paths = DocumentPaths {
        razao: Some(razao.path().to_path_buf()),
        ..Default::default()
    };

    let documents = commands::load_documents(&paths).unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].kind, DocumentKind::Razao);
    assert!(documents[0].full_text.contains("Alfa Beta"));
}

#[test]
fn test_load_documents_all_kinds() {
    let razao = temp_text_file("razao");
    let balancete = temp_text_file("balancete");
    let contas_pagar = temp_text_file("contas a pagar");
    let pagamentos = temp_text_file("pagamentos");
    let notas_fiscais = temp_text_file("notas");

    let paths = DocumentPaths {
        razao: Some(razao.path().to_path_buf()),
        balancete: Some(balancete.path().to_path_buf()),
        contas_pagar: Some(contas_pagar.path().to_path_buf()),
        pagamentos: Some(pagamentos.path().to_path_buf()),
        notas_fiscais: Some(notas_fiscais.path().to_path_buf()),
    };

    let documents = commands::load_documents(&paths).unwrap();
    assert_eq!(documents.len(), 5);
}

#[test]
fn test_load_documents_missing_file_errors() {
    let paths = DocumentPaths {
        razao: Some("/nonexistent/razao.txt".into()),
        ..Default::default()
    };

    assert!(commands::load_documents(&paths).is_err());
}

// ========== Check Command Tests ==========

#[test]
fn test_cmd_check_present_supplier() {
    let razao = temp_text_file("01/02 comercial rio ltda 1.234,00");
    let result = commands::cmd_check("Comercial Rio Ltda", razao.path());
    assert!(result.is_ok());
}

#[test]
fn test_cmd_check_empty_supplier_errors() {
    let razao = temp_text_file("qualquer coisa");
    let result = commands::cmd_check("  ", razao.path());
    assert!(result.is_err());
}

// ========== Reconcile Command Tests ==========

#[tokio::test]
async fn test_cmd_reconcile_requires_supplier() {
    let result =
        commands::cmd_reconcile("", "rodada1", DocumentPaths::default(), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_cmd_reconcile_requires_documents() {
    let result =
        commands::cmd_reconcile("Fornecedor X", "rodada1", DocumentPaths::default(), None).await;
    assert!(result.is_err());
}

// ========== Export Command Tests ==========

fn envelope_json() -> String {
    serde_json::json!({
        "fornecedor": "Fornecedor Alfa",
        "rodada": "rodada1",
        "perfil": "padrao",
        "status": "conciliacao_gerada",
        "modelo": "regra_local_sem_ia",
        "estrutura": {
            "resumoExecutivo": "ok",
            "titulosVencidosSemContrapartida": [
                {
                    "descricao": "NF 102 em aberto, vencimento 05/03/2024",
                    "valorEstimado": 12300.0,
                    "referencias": ["NF 102"]
                }
            ]
        },
        "geradoEm": "2024-03-05T14:30:00Z"
    })
    .to_string()
}

#[test]
fn test_cmd_export_writes_csv() {
    let input = temp_text_file(&envelope_json());
    let output = NamedTempFile::new().unwrap();

    commands::cmd_export(input.path(), Some(output.path())).unwrap();

    let csv = std::fs::read_to_string(output.path()).unwrap();
    assert!(csv.starts_with("data,historico,documentoReferencia,status,valor,fornecedor"));
    assert!(csv.contains("05/03/2024"));
    assert!(csv.contains("NF 102"));
    assert!(csv.contains("A Liquidar"));
    assert!(csv.contains("Fornecedor Alfa"));
}

#[test]
fn test_cmd_export_rejects_envelope_without_report() {
    let envelope = serde_json::json!({
        "fornecedor": "Fornecedor Alfa",
        "rodada": "rodada1",
        "perfil": "padrao",
        "status": "erro_openai",
        "mensagem": "sem chave",
        "geradoEm": "2024-03-05T14:30:00Z"
    })
    .to_string();

    let input = temp_text_file(&envelope);
    assert!(commands::cmd_export(input.path(), None).is_err());
}

#[test]
fn test_cmd_export_invalid_json_errors() {
    let input = temp_text_file("não é json");
    assert!(commands::cmd_export(input.path(), None).is_err());
}
