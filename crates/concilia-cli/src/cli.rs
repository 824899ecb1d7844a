//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in `commands`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Concilia - supplier reconciliation over extracted document text
#[derive(Parser)]
#[command(name = "concilia")]
#[command(about = "Conciliação de fornecedores sobre texto extraído de relatórios", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a reconciliation round for a supplier
    Reconcile {
        /// Supplier name, as printed on the reports
        #[arg(short, long)]
        fornecedor: String,

        /// Round: rodada1 (standard), rodada2 (strategic), rodada3
        /// (monthly audit), rodada4 (invoice cross-check).
        /// Unknown values fall back to rodada1.
        #[arg(short, long, default_value = "rodada1")]
        rodada: String,

        /// Extracted ledger text (razão de fornecedores)
        #[arg(long)]
        razao: Option<PathBuf>,

        /// Extracted trial balance text (balancete)
        #[arg(long)]
        balancete: Option<PathBuf>,

        /// Extracted accounts payable text (contas a pagar)
        #[arg(long)]
        contas_pagar: Option<PathBuf>,

        /// Extracted payment extract text (extrato de pagamentos)
        #[arg(long)]
        pagamentos: Option<PathBuf>,

        /// Extracted invoices text (notas fiscais)
        #[arg(long)]
        notas_fiscais: Option<PathBuf>,

        /// Write the run envelope JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check whether a supplier appears in a ledger text
    Check {
        /// Supplier name
        #[arg(short, long)]
        fornecedor: String,

        /// Extracted ledger text (razão de fornecedores)
        #[arg(long)]
        razao: PathBuf,
    },

    /// Flatten a saved run envelope into consolidated CSV rows
    Export {
        /// Run envelope JSON produced by `reconcile`
        #[arg(short, long)]
        input: PathBuf,

        /// Output CSV path (default: consolidado_<fornecedor>_<rodada>_<timestamp>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
