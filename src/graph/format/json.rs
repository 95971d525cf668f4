//! JSON format output for ERD data.

use crate::graph::view::{EdgeKind, GraphView};
use serde::Serialize;

/// JSON representation of the ERD
#[derive(Debug, Serialize)]
pub struct ErdJson {
    pub tables: Vec<TableJson>,
    pub relationships: Vec<RelationshipJson>,
    pub stats: ErdStats,
}

/// JSON representation of a table with full column details
#[derive(Debug, Serialize)]
pub struct TableJson {
    pub name: String,
    pub columns: Vec<ColumnJson>,
}

/// JSON representation of a column
#[derive(Debug, Serialize)]
pub struct ColumnJson {
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
    pub is_foreign_key: bool,
    pub is_inferred_key: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references_table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references_column: Option<String>,
}

/// JSON representation of a relationship
#[derive(Debug, Serialize)]
pub struct RelationshipJson {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    pub kind: EdgeKind,
}

/// ERD statistics
#[derive(Debug, Serialize)]
pub struct ErdStats {
    pub table_count: usize,
    pub column_count: usize,
    pub declared_count: usize,
    pub inferred_count: usize,
}

/// Generate JSON output from a graph view
pub fn to_json(view: &GraphView) -> String {
    let erd = build_erd_json(view);
    serde_json::to_string_pretty(&erd).unwrap_or_else(|_| "{}".to_string())
}

/// Build the JSON structure
pub fn build_erd_json(view: &GraphView) -> ErdJson {
    let mut total_columns = 0;

    let tables: Vec<TableJson> = view
        .sorted_tables()
        .iter()
        .map(|table| {
            let columns: Vec<ColumnJson> = table
                .columns
                .iter()
                .map(|col| ColumnJson {
                    name: col.name.clone(),
                    col_type: col.col_type.clone(),
                    is_foreign_key: col.is_foreign_key,
                    is_inferred_key: col.is_inferred_key,
                    references_table: col.references_table.clone(),
                    references_column: col.references_column.clone(),
                })
                .collect();

            total_columns += columns.len();

            TableJson {
                name: table.name.clone(),
                columns,
            }
        })
        .collect();

    let relationships: Vec<RelationshipJson> = view
        .edges
        .iter()
        .map(|e| RelationshipJson {
            from_table: e.from_table.clone(),
            from_column: e.from_column.clone(),
            to_table: e.to_table.clone(),
            to_column: e.to_column.clone(),
            kind: e.kind,
        })
        .collect();

    ErdJson {
        tables,
        relationships,
        stats: ErdStats {
            table_count: view.table_count(),
            column_count: total_columns,
            declared_count: view.edge_count_of(EdgeKind::Declared),
            inferred_count: view.edge_count_of(EdgeKind::Inferred),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::view::tests::create_test_view;

    #[test]
    fn test_json_stats() {
        let view = create_test_view();
        let erd = build_erd_json(&view);

        assert_eq!(erd.stats.table_count, 3);
        assert_eq!(erd.stats.column_count, 7);
        assert_eq!(erd.stats.declared_count, 1);
        assert_eq!(erd.stats.inferred_count, 1);
    }

    #[test]
    fn test_json_output_is_valid() {
        let view = create_test_view();
        let output = to_json(&view);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["tables"][0]["name"], "orders");
        assert_eq!(parsed["tables"][0]["columns"][0]["type"], "INT");
        assert_eq!(parsed["relationships"][0]["kind"], "declared");
        assert_eq!(parsed["relationships"][1]["kind"], "inferred");
        assert!(parsed["tables"][0]["columns"][0]
            .get("references_table")
            .is_none());
    }
}
