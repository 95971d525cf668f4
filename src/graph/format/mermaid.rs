//! Mermaid erDiagram format output.

use crate::graph::view::{EdgeKind, GraphView};

/// Generate Mermaid erDiagram from a graph view.
///
/// Declared relationships use identifying lines (`--`), inferred ones
/// non-identifying dotted lines (`..`).
pub fn to_mermaid(view: &GraphView) -> String {
    let mut output = String::new();

    output.push_str("erDiagram\n");

    for table in view.sorted_tables() {
        let safe_name = escape_mermaid_id(&table.name);
        output.push_str(&format!("    {} {{\n", safe_name));

        for col in &table.columns {
            let col_type = escape_mermaid_type(&col.col_type);
            let col_name = escape_mermaid_id(&col.name);

            if col.is_foreign_key {
                output.push_str(&format!("        {} {} FK\n", col_type, col_name));
            } else if col.is_inferred_key {
                output.push_str(&format!(
                    "        {} {} FK \"inferred\"\n",
                    col_type, col_name
                ));
            } else {
                output.push_str(&format!("        {} {}\n", col_type, col_name));
            }
        }

        output.push_str("    }\n");
    }

    if !view.edges.is_empty() {
        output.push('\n');
    }

    for edge in &view.edges {
        let from = escape_mermaid_id(&edge.from_table);
        let to = escape_mermaid_id(&edge.to_table);
        let cardinality = match edge.kind {
            EdgeKind::Declared => "}o--||",
            EdgeKind::Inferred => "}o..||",
        };

        output.push_str(&format!(
            "    {} {} {} : \"{}\"\n",
            from,
            cardinality,
            to,
            escape_mermaid_label(&edge.from_column)
        ));
    }

    output
}

/// Escape a string for use as a Mermaid entity ID
fn escape_mermaid_id(s: &str) -> String {
    // Mermaid IDs should be alphanumeric with underscores
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Escape a relationship label; Mermaid has no backslash escapes inside quotes
fn escape_mermaid_label(s: &str) -> String {
    s.replace('"', "#quot;")
}

/// Escape a type string for Mermaid (no spaces, special chars)
fn escape_mermaid_type(s: &str) -> String {
    // Remove parentheses content for cleaner display
    let base = match s.find('(') {
        Some(paren_pos) => &s[..paren_pos],
        None => s,
    };
    let escaped: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if escaped.is_empty() {
        "unknown".to_string()
    } else {
        escaped
    }
}
