//! ERD (Entity-Relationship Diagram) generation module.
//!
//! This module provides:
//! - A filterable view of tables, columns and relationships
//! - Declared and inferred relationships kept apart for styling
//! - Output formats: DOT (Graphviz), Mermaid, JSON

pub mod format;
pub mod view;

pub use format::{is_rendered_extension, to_dot, to_json, to_mermaid, Layout, OutputFormat};
pub use view::{ColumnInfo, EdgeInfo, EdgeKind, GraphView, TableInfo};
