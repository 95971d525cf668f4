//! Graphviz DOT format output for ERD diagrams.

use crate::graph::format::Layout;
use crate::graph::view::{EdgeKind, GraphView, TableInfo};

/// Generate DOT format output with ERD-style tables showing all columns.
///
/// Declared relationships are solid, inferred ones dashed.
pub fn to_dot(view: &GraphView, layout: Layout) -> String {
    let mut output = String::new();

    // Header
    output.push_str("digraph ERD {\n");
    output.push_str("  graph [pad=\"0.5\", nodesep=\"1\", ranksep=\"1.5\"];\n");

    let rankdir = match layout {
        Layout::LR => "LR",
        Layout::TB => "TB",
    };
    output.push_str(&format!("  rankdir={};\n", rankdir));

    output.push_str("  node [shape=none, margin=0];\n");
    output.push_str("  edge [arrowhead=crow, arrowtail=none, dir=both];\n\n");

    for table in view.sorted_tables() {
        let label = generate_table_label(table);
        output.push_str(&format!(
            "  {} [label=<{}>];\n",
            escape_dot_id(&table.name),
            label
        ));
    }

    if !view.edges.is_empty() {
        output.push('\n');
    }

    for edge in &view.edges {
        let label = format!("{}→{}", edge.from_column, edge.to_column);
        let style = match edge.kind {
            EdgeKind::Declared => String::new(),
            EdgeKind::Inferred => ", style=dashed, color=\"#718096\", fontcolor=\"#718096\"".to_string(),
        };
        output.push_str(&format!(
            "  {}:{} -> {}:{} [label=\"{}\"{}];\n",
            escape_dot_id(&edge.from_table),
            port_id(&edge.from_column),
            escape_dot_id(&edge.to_table),
            port_id(&edge.to_column),
            escape_dot_string(&label),
            style
        ));
    }

    output.push_str("}\n");
    output
}

/// Generate HTML-like table label for DOT
fn generate_table_label(table: &TableInfo) -> String {
    let mut html = String::new();

    html.push_str("<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\">");

    html.push_str(&format!(
        "<TR><TD BGCOLOR=\"#4a5568\" COLSPAN=\"3\"><FONT COLOR=\"white\"><B>{}</B></FONT></TD></TR>",
        escape_html(&table.name)
    ));

    html.push_str("<TR>");
    html.push_str("<TD BGCOLOR=\"#e2e8f0\"><FONT POINT-SIZE=\"10\"><B>Column</B></FONT></TD>");
    html.push_str("<TD BGCOLOR=\"#e2e8f0\"><FONT POINT-SIZE=\"10\"><B>Type</B></FONT></TD>");
    html.push_str("<TD BGCOLOR=\"#e2e8f0\"><FONT POINT-SIZE=\"10\"><B>Key</B></FONT></TD>");
    html.push_str("</TR>");

    for col in &table.columns {
        let key_marker = if col.is_foreign_key {
            "FK"
        } else if col.is_inferred_key {
            "<FONT COLOR=\"#718096\">FK?</FONT>"
        } else {
            ""
        };

        html.push_str("<TR>");
        html.push_str(&format!(
            "<TD ALIGN=\"LEFT\" PORT=\"{}\">{}</TD>",
            port_id(&col.name),
            escape_html(&col.name)
        ));
        html.push_str(&format!(
            "<TD ALIGN=\"LEFT\"><FONT COLOR=\"#666666\">{}</FONT></TD>",
            escape_html(&col.col_type)
        ));
        html.push_str(&format!("<TD ALIGN=\"CENTER\">{}</TD>", key_marker));
        html.push_str("</TR>");
    }

    html.push_str("</TABLE>");
    html
}

/// Escape a string for use in DOT HTML labels
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape a string for use inside a quoted DOT attribute
fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Port name for a column, identical in the table cell and on edge endpoints.
///
/// Characters outside `[A-Za-z0-9_]` become `_xHH` per UTF-8 byte, so the
/// result needs no quoting on either side.
fn port_id(column: &str) -> String {
    let mut port = String::with_capacity(column.len());
    for c in column.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            port.push(c);
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                port.push_str(&format!("_x{:02X}", b));
            }
        }
    }
    port
}

/// Escape a string for use as a DOT node ID
fn escape_dot_id(s: &str) -> String {
    if s.chars().all(|c| c.is_alphanumeric() || c == '_') && !s.is_empty() {
        s.to_string()
    } else {
        format!("\"{}\"", escape_dot_string(s))
    }
}
