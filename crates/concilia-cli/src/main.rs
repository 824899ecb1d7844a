//! Concilia CLI - supplier reconciliation over extracted report text
//!
//! Usage:
//!   concilia reconcile -f "Fornecedor X" --razao razao.txt --contas-pagar cp.txt
//!   concilia check -f "Fornecedor X" --razao razao.txt
//!   concilia export -i envelope.json

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Reconcile {
            fornecedor,
            rodada,
            razao,
            balancete,
            contas_pagar,
            pagamentos,
            notas_fiscais,
            output,
        } => {
            commands::cmd_reconcile(
                &fornecedor,
                &rodada,
                commands::DocumentPaths {
                    razao,
                    balancete,
                    contas_pagar,
                    pagamentos,
                    notas_fiscais,
                },
                output.as_deref(),
            )
            .await
        }
        Commands::Check { fornecedor, razao } => commands::cmd_check(&fornecedor, &razao),
        Commands::Export { input, output } => commands::cmd_export(&input, output.as_deref()),
    }
}
