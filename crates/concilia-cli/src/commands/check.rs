//! Check command: presence gate only, without calling the model

use std::path::Path;

use anyhow::{Context, Result};
use concilia_core::matching::FuzzyMatcher;

pub fn cmd_check(supplier: &str, ledger_path: &Path) -> Result<()> {
    let supplier = supplier.trim();
    anyhow::ensure!(
        !supplier.is_empty(),
        "Informe o nome do fornecedor no campo 'fornecedor'."
    );

    let text = std::fs::read_to_string(ledger_path)
        .with_context(|| format!("Falha ao ler o arquivo {}", ledger_path.display()))?;

    let matcher = FuzzyMatcher::new();
    if matcher.is_present(supplier, &text) {
        let lines = matcher.matched_lines(supplier, &text);
        println!("✅ Fornecedor \"{supplier}\" encontrado na razão");
        println!("   {} linha(s) compatível(is)", lines.len());
        for line in lines.iter().take(5) {
            println!("   {:.2}  {}", line.score, line.original_text.trim());
        }
    } else {
        println!("❌ Fornecedor \"{supplier}\" não encontrado na razão");
        println!("   Confira o nome cadastrado e o filtro do relatório");
    }

    Ok(())
}
