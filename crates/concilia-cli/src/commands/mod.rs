//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `reconcile` - Run a reconciliation round and print/save the envelope
//! - `check` - Presence gate only, no model call
//! - `export` - Flatten a saved envelope into consolidated CSV rows

pub mod check;
pub mod export;
pub mod reconcile;

// Re-export command functions for main.rs
pub use check::*;
pub use export::*;
pub use reconcile::*;
