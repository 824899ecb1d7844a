//! Mock backend for testing
//!
//! Returns queued or canned report JSON and counts every completion call,
//! so tests can assert the model was (or was not) invoked.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::ModelBackend;

/// Mock model backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    responses: Arc<Mutex<VecDeque<String>>>,
    calls: Arc<AtomicUsize>,
    /// Whether health_check should return true
    healthy: bool,
    /// When set, every completion fails (simulates a network fault)
    failing: bool,
}

impl MockBackend {
    /// Create a new mock backend (healthy, answers with a canned report)
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            healthy: true,
            failing: false,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Create a mock whose completions always fail
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    /// Queue a response; queued responses are consumed in order before
    /// the canned default kicks in.
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock response queue poisoned")
            .push_back(response.into());
    }

    /// Number of completion calls made against this mock
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Minimal valid reconciliation report JSON
    fn canned_report() -> String {
        serde_json::json!({
            "resumoExecutivo": "Fornecedor com documentação consistente na amostra analisada.",
            "composicaoSaldo": [
                {
                    "fonte": "contas_pagar",
                    "descricao": "Títulos em aberto identificados no relatório de contas a pagar.",
                    "valorEstimado": 12300.00,
                    "observacoes": "Valores conferidos contra os indicadores determinísticos."
                }
            ],
            "divergencias": [],
            "pagamentosOrfaos": [],
            "titulosVencidosSemContrapartida": [
                {
                    "descricao": "NF 102 em aberto sem pagamento correspondente.",
                    "valorEstimado": 12300.00,
                    "referencias": ["NF 102"],
                    "diasEmAtrasoEstimado": 15
                }
            ],
            "passosRecomendados": [
                "Confirmar a baixa da NF 102 junto ao financeiro."
            ],
            "observacoesGerais": "Diagnóstico gerado a partir de amostras dos relatórios."
        })
        .to_string()
    }
}

#[async_trait]
impl ModelBackend for MockBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing {
            return Err(Error::InvalidData("simulated model failure".into()));
        }

        let queued = self
            .responses
            .lock()
            .expect("mock response queue poisoned")
            .pop_front();

        Ok(queued.unwrap_or_else(Self::canned_report))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
