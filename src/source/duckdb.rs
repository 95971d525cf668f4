//! DuckDB catalog reader.

use crate::schema::{Snapshot, SnapshotColumn, SnapshotTable};
use anyhow::{bail, Context, Result};
use duckdb::{params, AccessMode, Config, Connection};
use std::path::Path;
use tracing::debug;

const TABLES_SQL: &str = "SELECT table_name FROM duckdb_tables() \
     WHERE schema_name = ? AND NOT temporary ORDER BY table_name";

const COLUMNS_SQL: &str = "SELECT table_name, column_name, data_type FROM duckdb_columns() \
     WHERE schema_name = ? ORDER BY table_name, column_index";

// Parallel unnest zips source and referenced columns of each constraint.
const FOREIGN_KEYS_SQL: &str = "SELECT table_name, \
        unnest(constraint_column_names), \
        referenced_table, \
        unnest(referenced_column_names) \
     FROM duckdb_constraints() \
     WHERE schema_name = ? AND constraint_type = 'FOREIGN KEY'";

const CONSTRAINTS_SQL: &str = "SELECT table_name, constraint_name FROM duckdb_constraints() \
     WHERE schema_name = ? AND constraint_type <> 'NOT NULL' AND constraint_name IS NOT NULL \
     ORDER BY table_name, constraint_index";

const INDEXES_SQL: &str = "SELECT table_name, index_name FROM duckdb_indexes() \
     WHERE schema_name = ? ORDER BY table_name, index_name";

/// Read tables, columns, declared keys, indexes and constraints of one schema
pub fn read_snapshot(path: &Path, schema: &str) -> Result<Snapshot> {
    if !path.exists() {
        bail!("DuckDB database does not exist: {}", path.display());
    }

    let config = Config::default().access_mode(AccessMode::ReadOnly)?;
    let conn = Connection::open_with_flags(path, config)
        .with_context(|| format!("Failed to open DuckDB database {}", path.display()))?;

    let mut snapshot = Snapshot::new();
    for name in query_strings(&conn, TABLES_SQL, schema)? {
        snapshot.tables.push(SnapshotTable::new(name));
    }

    for (table, column, data_type) in query_triples(&conn, COLUMNS_SQL, schema)? {
        if let Some(t) = snapshot.table_mut(&table) {
            t.columns.push(SnapshotColumn::new(column, data_type));
        }
    }

    let mut stmt = conn
        .prepare(FOREIGN_KEYS_SQL)
        .context("Failed to prepare foreign key query")?;
    let rows = stmt.query_map(params![schema], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;
    for row in rows {
        let (table, column, ref_table, ref_column) = row?;
        debug!(%table, %column, %ref_table, %ref_column, "declared foreign key");
        if let Some(c) = snapshot
            .table_mut(&table)
            .and_then(|t| t.column_mut(&column))
        {
            c.references.push(format!("{}.{}", ref_table, ref_column));
        }
    }

    for (table, constraint) in query_pairs(&conn, CONSTRAINTS_SQL, schema)? {
        if let Some(t) = snapshot.table_mut(&table) {
            t.constraints.push(constraint);
        }
    }

    for (table, index) in query_pairs(&conn, INDEXES_SQL, schema)? {
        if let Some(t) = snapshot.table_mut(&table) {
            t.indices.push(index);
        }
    }

    Ok(snapshot)
}

fn query_strings(conn: &Connection, sql: &str, schema: &str) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare query: {}", sql))?;
    let rows = stmt.query_map(params![schema], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn query_pairs(conn: &Connection, sql: &str, schema: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare query: {}", sql))?;
    let rows = stmt.query_map(params![schema], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn query_triples(
    conn: &Connection,
    sql: &str,
    schema: &str,
) -> Result<Vec<(String, String, String)>> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare query: {}", sql))?;
    let rows = stmt.query_map(params![schema], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_database(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("shop.duckdb");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name VARCHAR);
             CREATE TABLE orders (
                 id INTEGER PRIMARY KEY,
                 customer_id INTEGER REFERENCES customers(id),
                 total DECIMAL(10, 2)
             );
             CREATE INDEX orders_total_idx ON orders (total);",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_reads_tables_columns_and_keys() {
        let dir = TempDir::new().unwrap();
        let path = create_database(&dir);

        let snapshot = read_snapshot(&path, "main").unwrap();
        let names: Vec<&str> = snapshot.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["customers", "orders"]);

        let orders = snapshot.table("orders").unwrap();
        let columns: Vec<&str> = orders.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["id", "customer_id", "total"]);
        assert_eq!(orders.columns[0].col_type, "INTEGER");
        assert_eq!(orders.columns[1].references, vec!["customers.id"]);
        assert_eq!(orders.indices, vec!["orders_total_idx"]);
        assert!(!orders.constraints.is_empty());
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = read_snapshot(&dir.path().join("missing.duckdb"), "main").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
