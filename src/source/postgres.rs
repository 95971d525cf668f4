//! PostgreSQL catalog reader.
//!
//! The driver is async; reading blocks on a current-thread runtime so the rest
//! of the run stays synchronous.

use crate::schema::{Snapshot, SnapshotColumn, SnapshotTable};
use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::debug;

const TABLES_SQL: &str = r#"
SELECT c.relname::text
FROM pg_class c
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relkind IN ('r', 'p')
ORDER BY c.relname
"#;

const COLUMNS_SQL: &str = r#"
SELECT c.relname::text, a.attname::text, format_type(a.atttypid, a.atttypmod)
FROM pg_attribute a
JOIN pg_class c ON c.oid = a.attrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND c.relkind IN ('r', 'p') AND a.attnum > 0 AND NOT a.attisdropped
ORDER BY c.relname, a.attnum
"#;

const FOREIGN_KEYS_SQL: &str = r#"
SELECT src.relname::text, sa.attname::text, dst.relname::text, da.attname::text
FROM pg_constraint con
JOIN pg_class src ON src.oid = con.conrelid
JOIN pg_namespace n ON n.oid = src.relnamespace
JOIN pg_class dst ON dst.oid = con.confrelid
CROSS JOIN LATERAL unnest(con.conkey, con.confkey) AS k(src_attnum, dst_attnum)
JOIN pg_attribute sa ON sa.attrelid = con.conrelid AND sa.attnum = k.src_attnum
JOIN pg_attribute da ON da.attrelid = con.confrelid AND da.attnum = k.dst_attnum
WHERE n.nspname = $1 AND con.contype = 'f'
ORDER BY src.relname, con.conname
"#;

const CONSTRAINTS_SQL: &str = r#"
SELECT c.relname::text, con.conname::text
FROM pg_constraint con
JOIN pg_class c ON c.oid = con.conrelid
JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = $1 AND con.contype IN ('p', 'f', 'u', 'c', 'x')
ORDER BY c.relname, con.conname
"#;

const INDEXES_SQL: &str = r#"
SELECT tablename::text, indexname::text
FROM pg_indexes
WHERE schemaname = $1
ORDER BY tablename, indexname
"#;

/// Connect, read one schema, disconnect
pub fn read_snapshot(uri: &str, schema: &str) -> Result<Snapshot> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(uri)
            .await
            .context("failed to connect to Postgres")?;

        let snapshot = read_schema(&pool, schema).await;
        pool.close().await;
        snapshot
    })
}

async fn read_schema(pool: &PgPool, schema: &str) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();

    let tables: Vec<(String,)> = sqlx::query_as(TABLES_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await
        .context("Failed to list tables")?;
    for (name,) in tables {
        snapshot.tables.push(SnapshotTable::new(name));
    }

    let columns: Vec<(String, String, String)> = sqlx::query_as(COLUMNS_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await
        .context("Failed to list columns")?;
    for (table, column, data_type) in columns {
        if let Some(t) = snapshot.table_mut(&table) {
            t.columns.push(SnapshotColumn::new(column, data_type));
        }
    }

    let foreign_keys: Vec<(String, String, String, String)> = sqlx::query_as(FOREIGN_KEYS_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await
        .context("Failed to list foreign keys")?;
    for (table, column, ref_table, ref_column) in foreign_keys {
        debug!(%table, %column, %ref_table, %ref_column, "declared foreign key");
        if let Some(c) = snapshot
            .table_mut(&table)
            .and_then(|t| t.column_mut(&column))
        {
            c.references.push(format!("{}.{}", ref_table, ref_column));
        }
    }

    let constraints: Vec<(String, String)> = sqlx::query_as(CONSTRAINTS_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await
        .context("Failed to list constraints")?;
    for (table, constraint) in constraints {
        if let Some(t) = snapshot.table_mut(&table) {
            t.constraints.push(constraint);
        }
    }

    let indexes: Vec<(String, String)> = sqlx::query_as(INDEXES_SQL)
        .bind(schema)
        .fetch_all(pool)
        .await
        .context("Failed to list indexes")?;
    for (table, index) in indexes {
        if let Some(t) = snapshot.table_mut(&table) {
            t.indices.push(index);
        }
    }

    Ok(snapshot)
}
