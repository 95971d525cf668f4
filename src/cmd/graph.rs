//! Graph command: read a schema, infer relationships, write the diagram.

use super::{Destination, GraphConfig};
use crate::graph::{to_dot, to_json, to_mermaid, EdgeKind, GraphView, OutputFormat};
use crate::infer::infer;
use crate::source::read_snapshot;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run the graph command
pub fn run(config: &GraphConfig) -> Result<()> {
    let quiet = config.destination == Destination::Stdout && config.format == OutputFormat::Json;

    if !quiet {
        eprintln!(
            "Reading schema: {} [source: {}]",
            config.source,
            config.source.kind()
        );
    }

    let snapshot = read_snapshot(&config.source, config.schema.as_deref())?;

    if snapshot.is_empty() {
        if !quiet {
            eprintln!("No tables found in the schema.");
        }
        return Ok(());
    }

    let inference = infer(&snapshot, &config.infer)?;

    let mut view = GraphView::from_inference(&inference);
    view.filter_tables(&config.tables);
    view.exclude_tables(&config.exclude);

    let output_content = match config.format {
        OutputFormat::Dot => to_dot(&view, config.layout),
        OutputFormat::Mermaid => to_mermaid(&view),
        OutputFormat::Json => to_json(&view),
    };

    match config.destination {
        Destination::Stdout => println!("{}", output_content),
        Destination::File(ref out_path) => {
            let mut file = File::create(out_path)
                .with_context(|| format!("Failed to create {}", out_path.display()))?;
            file.write_all(output_content.as_bytes())?;
            eprintln!("ERD written to: {}", out_path.display());
        }
        Destination::Image(ref out_path) => render_with_graphviz(&output_content, out_path)?,
    }

    if !quiet {
        eprintln!(
            "\nERD: {} tables, {} declared, {} inferred relationships",
            view.table_count(),
            view.edge_count_of(EdgeKind::Declared),
            view.edge_count_of(EdgeKind::Inferred)
        );
    }

    Ok(())
}

/// Render DOT to PNG/SVG/PDF using Graphviz
fn render_with_graphviz(dot_source: &str, output_path: &Path) -> Result<()> {
    let ext = output_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "svg".to_string());

    let mut command = Command::new("dot");
    command.arg(format!("-T{}", ext)).arg("-o").arg(output_path);
    pipe_to_graphviz(command, dot_source)?;

    eprintln!("Rendered to: {}", output_path.display());
    Ok(())
}

/// Feed `input` to the command's stdin and wait for it, even when the write fails
fn pipe_to_graphviz(mut command: Command, input: &str) -> Result<()> {
    let mut child = command.stdin(Stdio::piped()).spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Graphviz 'dot' command not found. Install Graphviz or write a .dot, .mmd or .json file instead."
            )
        } else {
            anyhow::anyhow!("Failed to run dot: {}", e)
        }
    })?;

    // stdin is dropped before waiting so dot sees EOF
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(input.as_bytes()),
        None => Ok(()),
    };

    let status = child.wait().context("Failed to wait for dot")?;
    if !status.success() {
        bail!("Graphviz dot command failed with status: {}", status);
    }
    written.context("Failed to send DOT source to Graphviz")?;

    Ok(())
}
