//! Foreign key inference.
//!
//! This module provides:
//! - Extraction of declared keys and `<noun>_id` naming-convention guesses
//! - Resolution of guesses against real table names (singular or plural)
//! - Removal of guesses the schema already declares
//!
//! Guesses that match no table, or more than one, are dropped: the pipeline
//! prefers missing an edge over drawing a wrong one.

mod dedup;
mod extract;
mod resolve;

pub use dedup::dedup_against_explicit;
pub use extract::{extract_foreign_keys, potential_key_for, ExtractedKeys, CONVENTIONAL_KEY_COLUMN};
pub use resolve::{plural, resolve_potential_foreign_keys};

use crate::schema::{ForeignKey, Snapshot, Table};
use anyhow::Result;
use tracing::info;

/// Switches for the inference pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferOptions {
    /// Guess keys from column names in addition to declared ones
    pub potential_keys: bool,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            potential_keys: true,
        }
    }
}

/// Tables and relationships ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inference {
    pub tables: Vec<Table>,
    /// Keys declared by the schema
    pub foreign_keys: Vec<ForeignKey>,
    /// Resolved naming-convention keys not already declared
    pub potential_foreign_keys: Vec<ForeignKey>,
}

impl Inference {
    /// Get a table by exact name
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn relationship_count(&self) -> usize {
        self.foreign_keys.len() + self.potential_foreign_keys.len()
    }
}

/// Run extraction, resolution and deduplication over a snapshot.
///
/// Each table's `foreign_keys` and `potential_foreign_keys` receive the keys
/// whose source is that table.
pub fn infer(snapshot: &Snapshot, options: &InferOptions) -> Result<Inference> {
    let mut tables: Vec<Table> = snapshot.tables.iter().map(Table::from_snapshot).collect();

    let extracted = extract_foreign_keys(&snapshot.tables)?;
    let potential_foreign_keys = if options.potential_keys {
        let resolved = resolve_potential_foreign_keys(&tables, &extracted.potential);
        info!(
            guessed = extracted.potential.len(),
            resolved = resolved.len(),
            "resolved potential foreign keys"
        );
        dedup_against_explicit(resolved, &extracted.explicit)
    } else {
        Vec::new()
    };

    for table in &mut tables {
        table.foreign_keys.extend(
            extracted
                .explicit
                .iter()
                .filter(|k| k.src_table == table.name)
                .cloned(),
        );
        table.potential_foreign_keys.extend(
            potential_foreign_keys
                .iter()
                .filter(|k| k.src_table == table.name)
                .cloned(),
        );
    }

    Ok(Inference {
        tables,
        foreign_keys: extracted.explicit,
        potential_foreign_keys,
    })
}
