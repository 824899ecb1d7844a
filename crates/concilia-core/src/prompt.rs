//! Model request payload and the fixed instruction contract
//!
//! The model receives per-document summaries (never the full text, which
//! can be huge) plus the deterministic balance indicators, under a fixed
//! Portuguese instruction requiring a single JSON object in the report
//! shape and nothing else.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::balance::BalanceIndicators;
use crate::error::Result;
use crate::models::{truncate_chars, Document, DocumentKind};

/// Maximum characters of full text forwarded to the model per document
pub const EXCERPT_MAX_CHARS: usize = 8000;

/// Compact per-document summary sent to the model
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    #[serde(rename = "nomeOriginal")]
    pub original_name: String,
    #[serde(rename = "tipo")]
    pub kind: DocumentKind,
    #[serde(rename = "tamanhoTexto")]
    pub length_chars: usize,
    #[serde(rename = "preview")]
    pub preview: String,
    #[serde(rename = "trechoConteudo")]
    pub excerpt: String,
}

/// The structured payload attached to the model request
#[derive(Debug, Clone, Serialize)]
pub struct ModelRequestPayload {
    #[serde(rename = "fornecedor")]
    pub supplier: String,
    #[serde(rename = "relatorios")]
    pub documents: BTreeMap<DocumentKind, DocumentSummary>,
    #[serde(rename = "indicadores")]
    pub indicators: BalanceIndicators,
}

/// Assemble the request payload for a reconciliation run.
pub fn build_payload(
    supplier: &str,
    documents: &[Document],
    indicators: BalanceIndicators,
    excerpt_max_chars: usize,
) -> ModelRequestPayload {
    let mut summaries = BTreeMap::new();
    for doc in documents {
        summaries.insert(
            doc.kind,
            DocumentSummary {
                original_name: doc.original_name.clone(),
                kind: doc.kind,
                length_chars: doc.length_chars(),
                preview: doc.preview.clone(),
                excerpt: truncate_chars(&doc.full_text, excerpt_max_chars),
            },
        );
    }

    ModelRequestPayload {
        supplier: supplier.to_string(),
        documents: summaries,
        indicators,
    }
}

/// Fixed system instruction. The model must answer with exactly one JSON
/// object in the report shape; any extra text is a contract violation
/// handled by the raw-fallback path.
pub fn system_prompt() -> &'static str {
    r#"Você é um analista contábil brasileiro especialista em CONCILIAÇÃO DE FORNECEDORES.

Contexto:
- Você recebe RESUMOS dos relatórios do fornecedor: razão de fornecedores, balancete, contas a pagar, extrato de pagamentos e notas fiscais (quando enviados).
- Para cada relatório você recebe: nomeOriginal, tipo, tamanhoTexto, preview (primeiras linhas) e trechoConteudo (primeira parte do texto real).
- Você também recebe INDICADORES DETERMINÍSTICOS calculados pelo sistema: linhas do fornecedor encontradas em cada relatório, saldos numéricos extraídos e uma avaliação automática (saldos_iguais, saldos_diferentes ou dados_insuficientes).
- Os textos originais podem ser muito grandes, então você trabalha com AMOSTRAS.

REGRAS IMPORTANTES:
- Sempre responda em PORTUGUÊS DO BRASIL.
- Nunca invente NF ou valores específicos que não estejam claros nas amostras ou nos indicadores.
- Só aponte divergência de saldo se a avaliação automática for saldos_diferentes; se for saldos_iguais, não reporte divergência de saldo; se for dados_insuficientes, registre a limitação em observacoesGerais.
- Quando os dados forem insuficientes, deixe claro no campo observacoes da linha correspondente.
- Sua resposta DEVE SER SEMPRE um JSON VÁLIDO e NADA ALÉM DISSO (sem texto fora do JSON).

ESTRUTURA OBRIGATÓRIA DO JSON:

{
  "resumoExecutivo": "texto curto e direto sobre a situação do fornecedor",
  "composicaoSaldo": [
    {
      "fonte": "contas_pagar | balancete | razao | pagamentos | estimado",
      "descricao": "explicação da linha",
      "valorEstimado": 0,
      "observacoes": "se não der para afirmar com 100% de certeza, explique aqui"
    }
  ],
  "divergencias": [
    {
      "descricao": "explicação clara da divergência",
      "tipo": "saldo_diferente | titulo_pago_nao_baixado | titulo_sem_pagamento | fornecedor_sem_lancamento | outro",
      "referencias": ["ex: NF, data, conta contábil, fornecedor, banco etc."],
      "valorEstimado": 0,
      "nivelCriticidade": "baixa | media | alta"
    }
  ],
  "pagamentosOrfaos": [
    {
      "descricao": "pagamento que aparece no extrato mas não aparece no contas a pagar ou razão",
      "valorEstimado": 0,
      "referencias": ["dados que ajudem a localizar no sistema"],
      "nivelRisco": "baixo | medio | alto"
    }
  ],
  "titulosVencidosSemContrapartida": [
    {
      "descricao": "título que aparece aberto mas sem pagamento correspondente",
      "valorEstimado": 0,
      "referencias": ["ex: NF, fornecedor, data de vencimento"],
      "diasEmAtrasoEstimado": 0
    }
  ],
  "passosRecomendados": [
    "passo 1 em linguagem simples",
    "passo 2",
    "passo 3"
  ],
  "observacoesGerais": "comentários adicionais ou limitações dos dados"
}"#
}

/// Build the user prompt embedding the payload JSON.
pub fn user_prompt(payload: &ModelRequestPayload) -> Result<String> {
    let data = serde_json::to_string_pretty(payload)?;
    Ok(format!(
        "Você recebeu um resumo dos relatórios do fornecedor \"{}\".\n\n\
         Use esses dados para montar um DIAGNÓSTICO DE CONCILIAÇÃO, apontando:\n\
         - composição de saldo,\n\
         - divergências,\n\
         - pagamentos órfãos,\n\
         - títulos vencidos sem contrapartida,\n\
         - próximos passos.\n\n\
         DADOS DOS RELATÓRIOS (RESUMO + TRECHOS + INDICADORES):\n{}",
        payload.supplier, data
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::BalanceIndicatorBuilder;
    use crate::models::Document;

    fn sample_payload() -> ModelRequestPayload {
        let documents = vec![
            Document::new(DocumentKind::Razao, "razao.pdf", "Fornecedor Alfa Beta 1.000,00"),
            Document::new(DocumentKind::Balancete, "bal.pdf", "Fornecedor Alfa Beta 1.000,00"),
        ];
        let indicators = BalanceIndicatorBuilder::new().build("Fornecedor Alfa Beta", &documents);
        build_payload("Fornecedor Alfa Beta", &documents, indicators, EXCERPT_MAX_CHARS)
    }

    #[test]
    fn test_payload_wire_shape() {
        let payload = sample_payload();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["fornecedor"], "Fornecedor Alfa Beta");
        assert!(json["relatorios"]["razao"]["trechoConteudo"]
            .as_str()
            .unwrap()
            .contains("Alfa Beta"));
        assert_eq!(
            json["indicadores"]["avaliacaoAutomatica"]["status"],
            "saldos_iguais"
        );
    }

    #[test]
    fn test_excerpt_truncated_at_char_boundary() {
        let long_text = "ção ".repeat(5000);
        let documents = vec![Document::new(DocumentKind::Razao, "razao.pdf", long_text)];
        let indicators = BalanceIndicatorBuilder::new().build("Fornecedor X Y", &documents);
        let payload = build_payload("Fornecedor X Y", &documents, indicators, EXCERPT_MAX_CHARS);

        let excerpt = &payload.documents[&DocumentKind::Razao].excerpt;
        assert_eq!(excerpt.chars().count(), EXCERPT_MAX_CHARS);
    }

    #[test]
    fn test_user_prompt_embeds_payload() {
        let payload = sample_payload();
        let prompt = user_prompt(&payload).unwrap();
        assert!(prompt.contains("DIAGNÓSTICO DE CONCILIAÇÃO"));
        assert!(prompt.contains("\"fornecedor\": \"Fornecedor Alfa Beta\""));
    }

    #[test]
    fn test_system_prompt_demands_json_only() {
        let prompt = system_prompt();
        assert!(prompt.contains("JSON VÁLIDO"));
        assert!(prompt.contains("resumoExecutivo"));
    }
}
