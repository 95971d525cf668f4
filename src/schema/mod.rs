//! Schema model for relationship inference.
//!
//! This module provides:
//! - The snapshot types every schema source produces (tables, columns with
//!   their declared foreign-key targets, index and constraint names)
//! - The table/column/key model the inference pipeline hands to renderers
//! - DDL parsing for building snapshots from SQL dump files

mod ddl;

pub use ddl::*;

use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;

/// Column as reported by a schema source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotColumn {
    /// Column name
    pub name: String,
    /// Type descriptor exactly as the source reported it
    pub col_type: String,
    /// Declared foreign-key targets in `table.column` form
    pub references: Vec<String>,
}

impl SnapshotColumn {
    pub fn new(name: impl Into<String>, col_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            col_type: col_type.into(),
            references: Vec::new(),
        }
    }

    /// Add a declared reference to `table.column`
    pub fn references(mut self, table: &str, column: &str) -> Self {
        self.references.push(format!("{}.{}", table, column));
        self
    }
}

/// Table as reported by a schema source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotTable {
    /// Table name, case preserved
    pub name: String,
    /// Columns in declaration order
    pub columns: Vec<SnapshotColumn>,
    /// Index names
    pub indices: Vec<String>,
    /// Constraint names
    pub constraints: Vec<String>,
}

impl SnapshotTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_column(mut self, column: SnapshotColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Get a column by exact name
    pub fn column_mut(&mut self, name: &str) -> Option<&mut SnapshotColumn> {
        self.columns.iter_mut().find(|c| c.name == name)
    }
}

/// Point-in-time copy of a database schema, read once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tables: Vec<SnapshotTable>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: SnapshotTable) -> Self {
        self.tables.push(table);
        self
    }

    /// Get a table by exact name
    pub fn table(&self, name: &str) -> Option<&SnapshotTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Get a mutable table by exact name
    pub fn table_mut(&mut self, name: &str) -> Option<&mut SnapshotTable> {
        self.tables.iter_mut().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Column of a [`Table`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
}

/// Index of a [`Table`], identified by name only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub name: String,
}

/// Constraint of a [`Table`], identified by name only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Constraint {
    pub name: String,
}

/// Directed single-column relationship: `src_table.src_column` references
/// `dest_table.dest_column`.
///
/// Two keys are equal when all four fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ForeignKey {
    pub src_table: String,
    pub src_column: String,
    pub dest_table: String,
    pub dest_column: String,
}

impl ForeignKey {
    pub fn new(
        src_table: impl Into<String>,
        src_column: impl Into<String>,
        dest_table: impl Into<String>,
        dest_column: impl Into<String>,
    ) -> Self {
        Self {
            src_table: src_table.into(),
            src_column: src_column.into(),
            dest_table: dest_table.into(),
            dest_column: dest_column.into(),
        }
    }

    /// Build a key from a declared `table.column` target.
    ///
    /// The target must contain exactly one `.`.
    pub fn from_reference(src_table: &str, src_column: &str, reference: &str) -> Result<Self> {
        let mut parts = reference.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(dest_table), Some(dest_column), None) => {
                Ok(Self::new(src_table, src_column, dest_table, dest_column))
            }
            _ => bail!(
                "malformed foreign key target '{}' on {}.{}: expected table.column",
                reference,
                src_table,
                src_column
            ),
        }
    }
}

impl fmt::Display for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.src_table, self.src_column, self.dest_table, self.dest_column
        )
    }
}

/// Table with its inferred relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indices: Vec<Index>,
    pub constraints: Vec<Constraint>,
    /// Declared keys whose source is this table
    pub foreign_keys: Vec<ForeignKey>,
    /// Resolved naming-convention keys whose source is this table
    pub potential_foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Build a table from its snapshot, with empty key lists
    pub fn from_snapshot(table: &SnapshotTable) -> Self {
        Self {
            name: table.name.clone(),
            columns: table
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    col_type: c.col_type.clone(),
                })
                .collect(),
            indices: table
                .indices
                .iter()
                .map(|name| Index { name: name.clone() })
                .collect(),
            constraints: table
                .constraints
                .iter()
                .map(|name| Constraint { name: name.clone() })
                .collect(),
            foreign_keys: Vec::new(),
            potential_foreign_keys: Vec::new(),
        }
    }

    /// Get a column by exact name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}
