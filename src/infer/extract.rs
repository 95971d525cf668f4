//! Foreign key extraction from a schema snapshot.

use crate::schema::{ForeignKey, SnapshotTable};
use anyhow::Result;

/// Column the naming convention points at in the guessed table
pub const CONVENTIONAL_KEY_COLUMN: &str = "id";

/// Keys found by a single pass over a snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedKeys {
    /// Keys declared by the schema
    pub explicit: Vec<ForeignKey>,
    /// Keys guessed from `<noun>_id` column names, not yet resolved
    pub potential: Vec<ForeignKey>,
}

/// Walk every table and column, collecting declared and naming-convention keys.
///
/// A column can contribute to both lists. Fails on a declared target that is
/// not in `table.column` form.
pub fn extract_foreign_keys(tables: &[SnapshotTable]) -> Result<ExtractedKeys> {
    let mut keys = ExtractedKeys::default();

    for table in tables {
        for column in &table.columns {
            for reference in &column.references {
                keys.explicit.push(ForeignKey::from_reference(
                    &table.name,
                    &column.name,
                    reference,
                )?);
            }

            if let Some(potential) = potential_key_for(&table.name, &column.name) {
                keys.potential.push(potential);
            }
        }
    }

    Ok(keys)
}

/// Guess a key from a column whose last `_`-separated token is `id`.
///
/// The destination table is every token but the last, so a bare `id` column
/// guesses an empty table name.
pub fn potential_key_for(table: &str, column: &str) -> Option<ForeignKey> {
    let tokens: Vec<&str> = column.split('_').collect();
    let (last, rest) = tokens.split_last()?;
    if *last != CONVENTIONAL_KEY_COLUMN {
        return None;
    }

    Some(ForeignKey::new(
        table,
        column,
        rest.join("_"),
        CONVENTIONAL_KEY_COLUMN,
    ))
}
