//! Test utilities
//!
//! Provides a mock OpenAI-compatible server answering chat completions
//! with a fixed reconciliation report, for integration tests against the
//! real HTTP backend.

use axum::{
    extract::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Mock OpenAI-compatible server for testing
pub struct MockModelServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockModelServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let app = Router::new()
            .route("/v1/models", get(handle_models))
            .route("/v1/chat/completions", post(handle_chat_completions));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockModelServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Models endpoint (health check)
async fn handle_models() -> Json<ModelsResponse> {
    Json(ModelsResponse {
        data: vec![ModelEntry {
            id: "gpt-4.1-mini".to_string(),
            object: "model".to_string(),
        }],
    })
}

/// Chat completions endpoint.
///
/// Echoes the requested supplier name (sniffed from the user message)
/// into a fixed, valid reconciliation report.
async fn handle_chat_completions(
    Json(request): Json<ChatCompletionRequest>,
) -> Json<ChatCompletionResponse> {
    let user = request
        .messages
        .iter()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .unwrap_or("");

    let supplier = extract_supplier(user);

    let report = serde_json::json!({
        "resumoExecutivo": format!(
            "Fornecedor {} com um título em aberto e um pagamento sem contrapartida.",
            supplier
        ),
        "composicaoSaldo": [
            {
                "fonte": "contas_pagar",
                "descricao": "Títulos em aberto no relatório de contas a pagar.",
                "valorEstimado": 12300.00
            }
        ],
        "divergencias": [
            {
                "descricao": "Título pago no extrato sem baixa no contas a pagar.",
                "tipo": "titulo_pago_nao_baixado",
                "referencias": ["NF 101"],
                "valorEstimado": 500.00,
                "nivelCriticidade": "baixa"
            }
        ],
        "pagamentosOrfaos": [],
        "titulosVencidosSemContrapartida": [
            {
                "descricao": "NF 102 em aberto, vencimento 05/03/2024.",
                "valorEstimado": 12300.00,
                "referencias": ["NF 102"],
                "diasEmAtrasoEstimado": 15
            }
        ],
        "passosRecomendados": [
            "Confirmar a baixa da NF 101 no sistema.",
            "Cobrar posição da NF 102 junto ao financeiro."
        ],
        "observacoesGerais": "Diagnóstico gerado a partir de amostras dos relatórios."
    });

    Json(ChatCompletionResponse {
        choices: vec![ChatChoice {
            message: ChatResponseMessage {
                role: "assistant".to_string(),
                content: report.to_string(),
            },
        }],
    })
}

/// Sniff the supplier name from the user prompt ("do fornecedor \"X\"").
fn extract_supplier(user: &str) -> String {
    if let Some(start) = user.find("fornecedor \"") {
        let after = &user[start + 12..];
        if let Some(end) = after.find('"') {
            return after[..end].to_string();
        }
    }
    "desconhecido".to_string()
}

// Wire types for the mock endpoints

#[derive(Debug, Serialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: String,
    object: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    #[allow(dead_code)]
    model: String,
    messages: Vec<ChatRequestMessage>,
    #[allow(dead_code)]
    temperature: Option<f64>,
    #[allow(dead_code)]
    stream: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ChatRequestMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Serialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Serialize)]
struct ChatResponseMessage {
    role: String,
    content: String,
}
