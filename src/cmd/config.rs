//! Run configuration: CLI arguments merged over an optional YAML file.

use super::Cli;
use crate::graph::{is_rendered_extension, Layout, OutputFormat};
use crate::infer::InferOptions;
use crate::source::SourceUri;
use anyhow::{bail, Context, Result};
use glob::Pattern;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings that may live in a YAML file next to the schema.
///
/// ```yaml
/// schema: sales
/// layout: tb
/// exclude: ["schema_migrations", "tmp_*"]
/// infer: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Database schema to read
    pub schema: Option<String>,
    /// Output format
    pub format: Option<OutputFormat>,
    /// Layout direction
    pub layout: Option<Layout>,
    /// Only draw tables matching these globs
    pub tables: Vec<String>,
    /// Never draw tables matching these globs
    pub exclude: Vec<String>,
    /// Guess relationships from column names
    pub infer: Option<bool>,
}

impl ConfigFile {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ConfigFile = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}

/// Where the rendered diagram goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    /// Text output written to a file
    File(PathBuf),
    /// DOT rendered to an image by Graphviz
    Image(PathBuf),
}

/// Everything one run needs, built once from the command line
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub source: SourceUri,
    pub schema: Option<String>,
    pub destination: Destination,
    pub format: OutputFormat,
    pub layout: Layout,
    pub tables: Vec<Pattern>,
    pub exclude: Vec<Pattern>,
    pub infer: InferOptions,
    pub verbose: bool,
}

impl GraphConfig {
    /// Merge CLI arguments over the optional config file; CLI wins
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let file = match cli.config {
            Some(ref path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };

        let source: SourceUri = cli.uri.parse()?;

        let cli_format = cli
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        let layout = cli
            .layout
            .as_deref()
            .map(str::parse::<Layout>)
            .transpose()
            .map_err(|e| anyhow::anyhow!("{}", e))?
            .or(file.layout)
            .unwrap_or_default();

        let extension = cli
            .out
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        let format = cli_format
            .or(file.format)
            .or_else(|| extension.as_deref().and_then(OutputFormat::from_extension))
            .unwrap_or_default();

        let destination = if cli.out.as_os_str() == "-" {
            Destination::Stdout
        } else if extension.as_deref().is_some_and(is_rendered_extension) {
            if format != OutputFormat::Dot {
                bail!(
                    "cannot render {} output to {}; use a .{} file or --format dot",
                    format,
                    cli.out.display(),
                    format.extension()
                );
            }
            Destination::Image(cli.out.clone())
        } else {
            Destination::File(cli.out.clone())
        };

        let tables = compile_patterns(split_list(cli.tables.as_deref()).unwrap_or(file.tables))?;
        let exclude =
            compile_patterns(split_list(cli.exclude.as_deref()).unwrap_or(file.exclude))?;

        let infer = InferOptions {
            potential_keys: !cli.no_infer && file.infer.unwrap_or(true),
        };

        Ok(Self {
            source,
            schema: cli.schema.or(file.schema),
            destination,
            format,
            layout,
            tables,
            exclude,
            infer,
            verbose: cli.verbose,
        })
    }
}

/// Split a comma-separated CLI list
fn split_list(list: Option<&str>) -> Option<Vec<String>> {
    list.map(|l| {
        l.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

fn compile_patterns(globs: Vec<String>) -> Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|g| Pattern::new(g).with_context(|| format!("invalid table pattern '{}'", g)))
        .collect()
}
