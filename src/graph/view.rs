//! Graph view with filtering for ERD generation.

use crate::infer::Inference;
use crate::schema::ForeignKey;
use ahash::{AHashMap, AHashSet};
use glob::Pattern;
use serde::Serialize;

/// Information about a column in a table
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Column type as reported by the source
    pub col_type: String,
    /// Whether the schema declares this column as a foreign key
    pub is_foreign_key: bool,
    /// Whether a naming-convention key starts at this column
    pub is_inferred_key: bool,
    /// If FK, which table it references
    pub references_table: Option<String>,
    /// If FK, which column it references
    pub references_column: Option<String>,
}

/// Information about a table for ERD rendering
#[derive(Debug, Clone)]
pub struct TableInfo {
    /// Table name
    pub name: String,
    /// All columns in order
    pub columns: Vec<ColumnInfo>,
}

/// How a relationship was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Declared by the schema
    Declared,
    /// Guessed from column naming
    Inferred,
}

/// Information about an edge (FK relationship) in the graph
#[derive(Debug, Clone)]
pub struct EdgeInfo {
    /// Source table (child with FK)
    pub from_table: String,
    /// Source column (FK column)
    pub from_column: String,
    /// Target table (parent being referenced)
    pub to_table: String,
    /// Target column
    pub to_column: String,
    pub kind: EdgeKind,
}

impl EdgeInfo {
    fn from_key(key: &ForeignKey, kind: EdgeKind) -> Self {
        Self {
            from_table: key.src_table.clone(),
            from_column: key.src_column.clone(),
            to_table: key.dest_table.clone(),
            to_column: key.dest_column.clone(),
            kind,
        }
    }
}

/// A filtered view of the inferred schema for ERD visualization
#[derive(Debug)]
pub struct GraphView {
    /// Tables included in this view with full column info
    pub tables: AHashMap<String, TableInfo>,
    /// Edges between tables, declared ones first
    pub edges: Vec<EdgeInfo>,
}

impl GraphView {
    /// Create a full view from an inference result (all tables and edges)
    pub fn from_inference(inference: &Inference) -> Self {
        let mut tables = AHashMap::new();

        for table in &inference.tables {
            let columns = table
                .columns
                .iter()
                .map(|col| {
                    let declared = table.foreign_keys.iter().find(|k| k.src_column == col.name);
                    let inferred = table
                        .potential_foreign_keys
                        .iter()
                        .find(|k| k.src_column == col.name);
                    let target = declared.or(inferred);

                    ColumnInfo {
                        name: col.name.clone(),
                        col_type: col.col_type.clone(),
                        is_foreign_key: declared.is_some(),
                        is_inferred_key: inferred.is_some(),
                        references_table: target.map(|k| k.dest_table.clone()),
                        references_column: target.map(|k| k.dest_column.clone()),
                    }
                })
                .collect();

            tables.insert(
                table.name.clone(),
                TableInfo {
                    name: table.name.clone(),
                    columns,
                },
            );
        }

        let edges = inference
            .foreign_keys
            .iter()
            .map(|k| EdgeInfo::from_key(k, EdgeKind::Declared))
            .chain(
                inference
                    .potential_foreign_keys
                    .iter()
                    .map(|k| EdgeInfo::from_key(k, EdgeKind::Inferred)),
            )
            .collect();

        Self { tables, edges }
    }

    /// Filter to include only tables matching the given patterns
    pub fn filter_tables(&mut self, patterns: &[Pattern]) {
        if patterns.is_empty() {
            return;
        }

        let matching: AHashSet<String> = self
            .tables
            .keys()
            .filter(|name| patterns.iter().any(|p| p.matches(name)))
            .cloned()
            .collect();

        self.apply_node_filter(&matching);
    }

    /// Exclude tables matching the given patterns
    pub fn exclude_tables(&mut self, patterns: &[Pattern]) {
        if patterns.is_empty() {
            return;
        }

        let remaining: AHashSet<String> = self
            .tables
            .keys()
            .filter(|name| !patterns.iter().any(|p| p.matches(name)))
            .cloned()
            .collect();

        self.apply_node_filter(&remaining);
    }

    /// Get the number of tables in the view
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Get the number of edges in the view
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of edges of one kind
    pub fn edge_count_of(&self, kind: EdgeKind) -> usize {
        self.edges.iter().filter(|e| e.kind == kind).count()
    }

    /// Check if the view is empty
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Get tables sorted alphabetically
    pub fn sorted_tables(&self) -> Vec<&TableInfo> {
        let mut tables: Vec<_> = self.tables.values().collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        tables
    }

    /// Get table info by name
    pub fn get_table(&self, name: &str) -> Option<&TableInfo> {
        self.tables.get(name)
    }

    fn apply_node_filter(&mut self, keep: &AHashSet<String>) {
        self.tables.retain(|n, _| keep.contains(n));
        self.edges
            .retain(|e| keep.contains(&e.from_table) && keep.contains(&e.to_table));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::infer::{infer, InferOptions};
    use crate::schema::{Snapshot, SnapshotColumn, SnapshotTable};

    /// users <- orders (declared), orders -> products (inferred)
    pub(crate) fn create_test_view() -> GraphView {
        let snapshot = Snapshot::new()
            .with_table(
                SnapshotTable::new("users")
                    .with_column(SnapshotColumn::new("id", "INT"))
                    .with_column(SnapshotColumn::new("email", "VARCHAR(255)")),
            )
            .with_table(
                SnapshotTable::new("orders")
                    .with_column(SnapshotColumn::new("id", "INT"))
                    .with_column(SnapshotColumn::new("user_id", "INT").references("users", "id"))
                    .with_column(SnapshotColumn::new("product_id", "INT")),
            )
            .with_table(
                SnapshotTable::new("products")
                    .with_column(SnapshotColumn::new("id", "INT"))
                    .with_column(SnapshotColumn::new("name", "TEXT")),
            );

        GraphView::from_inference(&infer(&snapshot, &InferOptions::default()).unwrap())
    }

    #[test]
    fn test_table_info() {
        let view = create_test_view();
        assert_eq!(view.table_count(), 3);

        let orders = view.get_table("orders").unwrap();
        assert_eq!(orders.columns.len(), 3);
        assert!(!orders.columns[0].is_foreign_key);
        assert!(orders.columns[1].is_foreign_key);
        assert_eq!(orders.columns[1].references_table.as_deref(), Some("users"));
        assert!(orders.columns[2].is_inferred_key);
        assert_eq!(orders.columns[2].references_table.as_deref(), Some("products"));
    }

    #[test]
    fn test_edge_info() {
        let view = create_test_view();
        assert_eq!(view.edge_count(), 2);
        assert_eq!(view.edge_count_of(EdgeKind::Declared), 1);
        assert_eq!(view.edge_count_of(EdgeKind::Inferred), 1);

        let edge = &view.edges[0];
        assert_eq!(edge.from_table, "orders");
        assert_eq!(edge.from_column, "user_id");
        assert_eq!(edge.to_table, "users");
        assert_eq!(edge.to_column, "id");
        assert_eq!(edge.kind, EdgeKind::Declared);
        assert_eq!(view.edges[1].to_table, "products");
    }

    #[test]
    fn test_filter_tables() {
        let mut view = create_test_view();
        let patterns = vec![Pattern::new("o*").unwrap(), Pattern::new("users").unwrap()];
        view.filter_tables(&patterns);

        assert_eq!(view.table_count(), 2);
        assert_eq!(view.edge_count(), 1);
        assert_eq!(view.edges[0].to_table, "users");
    }

    #[test]
    fn test_exclude_tables() {
        let mut view = create_test_view();
        let patterns = vec![Pattern::new("orders").unwrap()];
        view.exclude_tables(&patterns);

        assert!(!view.tables.contains_key("orders"));
        assert!(view.tables.contains_key("users"));
        assert_eq!(view.edge_count(), 0); // Edges removed since orders is gone
    }

    #[test]
    fn test_sorted_tables() {
        let view = create_test_view();
        let names: Vec<&str> = view.sorted_tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "products", "users"]);
    }
}
