//! Integration tests for the OpenAI-compatible backend
//!
//! Runs the real HTTP backend against the in-process mock
//! chat-completions server.

use concilia_core::ai::{ModelBackend, ModelClient, OpenAICompatibleBackend};
use concilia_core::models::{Document, DocumentKind, RoundKind};
use concilia_core::pipeline::{ReconciliationPipeline, RunOutcome};
use concilia_core::test_utils::MockModelServer;

#[tokio::test]
async fn test_backend_health_check_against_mock_server() {
    let server = MockModelServer::start().await;
    let backend = OpenAICompatibleBackend::new(&server.url(), "test-model", Some("sk-test"));

    assert!(backend.health_check().await);
}

#[tokio::test]
async fn test_backend_health_check_unreachable_host() {
    let backend = OpenAICompatibleBackend::new("http://127.0.0.1:1", "test-model", None);
    assert!(!backend.health_check().await);
}

#[tokio::test]
async fn test_completion_round_trip() {
    let server = MockModelServer::start().await;
    let backend = OpenAICompatibleBackend::new(&server.url(), "test-model", Some("sk-test"));

    let raw = backend
        .complete("instrução", "relatórios do fornecedor \"Comercial Rio\".")
        .await
        .unwrap();

    let report = concilia_core::ai::parsing::parse_report(&raw).unwrap();
    assert!(report.summary.contains("Comercial Rio"));
}

#[tokio::test]
async fn test_full_pipeline_over_http() {
    let server = MockModelServer::start().await;
    let client = ModelClient::openai(&server.url(), "test-model", Some("sk-test"));
    let pipeline = ReconciliationPipeline::new(Some(client));

    let documents = vec![Document::new(
        DocumentKind::Razao,
        "razao.pdf",
        "01/02/2024 Comercial Rio Ltda NF 101 500,00",
    )];

    let run = pipeline
        .run(RoundKind::Rodada1, "Comercial Rio Ltda", &documents)
        .await;

    match &run.outcome {
        RunOutcome::Generated { report, model, .. } => {
            assert_eq!(model, "test-model");
            assert!(report.summary.contains("Comercial Rio Ltda"));
        }
        other => panic!("expected generated outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_becomes_model_failed() {
    // Nothing listens on this port; the HTTP error must fold into the
    // outcome instead of propagating
    let client = ModelClient::openai("http://127.0.0.1:1", "test-model", None);
    let pipeline = ReconciliationPipeline::new(Some(client));

    let documents = vec![Document::new(
        DocumentKind::Razao,
        "razao.pdf",
        "01/02/2024 Comercial Rio Ltda NF 101 500,00",
    )];

    let run = pipeline
        .run(RoundKind::Rodada1, "Comercial Rio Ltda", &documents)
        .await;

    assert!(matches!(run.outcome, RunOutcome::ModelFailed { .. }));
}
