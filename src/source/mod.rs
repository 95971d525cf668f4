//! Schema sources: turn a connection URI into a [`Snapshot`].
//!
//! Supported URIs:
//! - `postgres://...` / `postgresql://...`: live PostgreSQL catalog
//! - `duckdb://path` or a path ending in `.duckdb` / `.ddb`: DuckDB database file
//! - `file://path` or any other path: SQL dump with DDL statements,
//!   optionally compressed (.gz, .bz2, .xz, .zst)

mod compression;
mod duckdb;
mod postgres;

pub use compression::Compression;

use crate::schema::{snapshot_from_ddl, Snapshot};
use anyhow::{bail, Context, Result};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Where the schema comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceUri {
    /// SQL dump file
    DdlFile(PathBuf),
    /// DuckDB database file
    DuckDb(PathBuf),
    /// PostgreSQL connection string, passed to the driver unchanged
    Postgres(String),
}

impl FromStr for SourceUri {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("postgres://") || s.starts_with("postgresql://") {
            return Ok(SourceUri::Postgres(s.to_string()));
        }
        if let Some(path) = s.strip_prefix("duckdb://") {
            return Ok(SourceUri::DuckDb(PathBuf::from(path)));
        }
        if let Some(path) = s.strip_prefix("file://") {
            return Ok(SourceUri::DdlFile(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = s.split_once("://") {
            bail!(
                "unsupported database URI scheme '{}://'. Supported: postgres://, postgresql://, duckdb://, file://",
                scheme
            );
        }

        let path = PathBuf::from(s);
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("duckdb" | "ddb") => Ok(SourceUri::DuckDb(path)),
            _ => Ok(SourceUri::DdlFile(path)),
        }
    }
}

impl fmt::Display for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceUri::DdlFile(path) => write!(f, "file://{}", path.display()),
            SourceUri::DuckDb(path) => write!(f, "duckdb://{}", path.display()),
            SourceUri::Postgres(uri) => write!(f, "{}", redact_password(uri)),
        }
    }
}

impl SourceUri {
    /// Short name of the backend, for status output
    pub fn kind(&self) -> &'static str {
        match self {
            SourceUri::DdlFile(_) => "sql dump",
            SourceUri::DuckDb(_) => "duckdb",
            SourceUri::Postgres(_) => "postgres",
        }
    }
}

/// Read the schema once. `schema` selects the database schema for DuckDB
/// (default `main`) and PostgreSQL (default `public`); dumps ignore it.
pub fn read_snapshot(uri: &SourceUri, schema: Option<&str>) -> Result<Snapshot> {
    let snapshot = match uri {
        SourceUri::DdlFile(path) => read_ddl_file(path)?,
        SourceUri::DuckDb(path) => duckdb::read_snapshot(path, schema.unwrap_or("main"))?,
        SourceUri::Postgres(conn) => postgres::read_snapshot(conn, schema.unwrap_or("public"))?,
    };

    info!(source = %uri, tables = snapshot.len(), "read schema snapshot");
    Ok(snapshot)
}

/// Parse the DDL statements of a (possibly compressed) SQL dump
pub fn read_ddl_file(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        bail!("input file does not exist: {}", path.display());
    }

    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let compression = Compression::from_path(path);
    let mut reader = compression.wrap_reader(Box::new(file))?;

    let mut sql = String::new();
    reader
        .read_to_string(&mut sql)
        .with_context(|| format!("Failed to read {} ({})", path.display(), compression))?;

    Ok(snapshot_from_ddl(&sql))
}

/// Hide the password of a connection URI for display
fn redact_password(uri: &str) -> String {
    let Some((scheme, rest)) = uri.split_once("://") else {
        return uri.to_string();
    };
    let Some((userinfo, host)) = rest.split_once('@') else {
        return uri.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
        None => uri.to_string(),
    }
}
