//! DDL parsing for building schema snapshots from SQL dump files.
//!
//! Parses CREATE TABLE, ALTER TABLE and CREATE INDEX statements to extract:
//! - Column definitions with their raw type descriptors
//! - Declared foreign keys (inline REFERENCES, table-level and ALTER TABLE)
//! - Index and constraint names

use super::{Snapshot, SnapshotColumn, SnapshotTable};
use once_cell::sync::Lazy;
use regex::Regex;

/// Regex to extract table name from CREATE TABLE
/// Supports: `table` (MySQL), "table" (PostgreSQL), [table] (MSSQL), table (SQLite/unquoted), schema.table
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

/// Regex to extract table name from ALTER TABLE
static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s]+)[\]`"]?"#).unwrap()
});

/// Regex for CREATE INDEX statement
/// Matches: CREATE [UNIQUE] [CLUSTERED|NONCLUSTERED] INDEX [CONCURRENTLY] [IF NOT EXISTS] idx_name ON [ONLY] table
static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^\s*CREATE\s+(?:UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?[\[`"]?(\w+)[\]`"]?\s+ON\s+(?:ONLY\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?(\w+)[\]`"]?"#,
    )
    .unwrap()
});

/// Regex for column definition
/// Supports: `column` (MySQL), "column" (PostgreSQL), [column] (MSSQL), column (unquoted)
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+(?:\s+(?:varying|precision))?(?:\([^)]+\))?(?:\s+with(?:out)?\s+time\s+zone)?(?:\[\])?(?:\s+unsigned)?)"#)
        .unwrap()
});

/// Regex for constraints attached to a single column definition
static INLINE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:\bCONSTRAINT\s+[\[`"]?(\w+)[\]`"]?\s+)?\b(PRIMARY\s+KEY|UNIQUE|REFERENCES|CHECK)\b"#)
        .unwrap()
});

/// Regex for the target of an inline REFERENCES clause; the column list is optional
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?(?:\s*\(([^)]+)\))?"#)
        .unwrap()
});

/// Regex for a table-level constraint, in CREATE TABLE bodies and ALTER TABLE ... ADD
static TABLE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\bADD\s+)(?:CONSTRAINT\s+[\[`"]?(\w+)[\]`"]?\s+)?(PRIMARY\s+KEY|FOREIGN\s+KEY|UNIQUE|CHECK|EXCLUDE)\b"#)
        .unwrap()
});

/// Regex telling a table-level constraint or index apart from a column definition
static TABLE_CONSTRAINT_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:CONSTRAINT\b|PRIMARY\s+KEY\b|FOREIGN\s+KEY\b|UNIQUE\b|CHECK\b|EXCLUDE\b|FULLTEXT\b|SPATIAL\b|(?:KEY|INDEX)\s+[\[`"]?\w+[\]`"]?\s*(?:USING\s+\w+\s*)?\()"#)
        .unwrap()
});

/// Regex for PRIMARY KEY column list
/// Supports MSSQL CLUSTERED/NONCLUSTERED keywords: PRIMARY KEY CLUSTERED ([col])
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

/// Regex for UNIQUE column list
static UNIQUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\s*(?:KEY\s+|INDEX\s+)?\(([^)]+)\)").unwrap());

/// Regex for FOREIGN KEY constraint
/// Supports: `name` (MySQL), "name" (PostgreSQL), [name] (MSSQL), name (unquoted)
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*(?:\(([^)]+)\))?"#,
    )
    .unwrap()
});

/// Regex for inline INDEX/KEY in CREATE TABLE
/// Matches: INDEX idx_name (col1, col2), KEY idx_name (col1), UNIQUE INDEX idx_name (col1)
static INLINE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^(?:(?:UNIQUE|FULLTEXT|SPATIAL)\s+)?(?:INDEX|KEY)\s+[\[`"]?(\w+)[\]`"]?\s*(?:USING\s+\w+\s*)?\("#)
        .unwrap()
});

/// Regex for COPY ... FROM stdin, whose data block follows the statement
static COPY_FROM_STDIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*COPY\b.*\bFROM\s+stdin\b").unwrap());

/// A declared reference waiting for its target table to be known
#[derive(Debug, Clone)]
struct PendingReference {
    table: String,
    column: String,
    ref_table: String,
    /// None when the DDL referenced the target's primary key implicitly
    ref_column: Option<String>,
}

/// Builder for constructing a [`Snapshot`] from DDL statements
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: Snapshot,
    /// Primary key columns per table, in table order
    primary_keys: Vec<(String, Vec<String>)>,
    references: Vec<PendingReference>,
}

impl SnapshotBuilder {
    /// Create a new snapshot builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole DDL script
    pub fn parse_script(&mut self, sql: &str) {
        for stmt in split_statements(sql) {
            self.parse_statement(&stmt);
        }
    }

    /// Parse a single statement, ignoring anything that is not schema DDL
    pub fn parse_statement(&mut self, stmt: &str) {
        if CREATE_TABLE_NAME_RE.is_match(stmt) {
            self.parse_create_table(stmt);
        } else if ALTER_TABLE_NAME_RE.is_match(stmt) {
            self.parse_alter_table(stmt);
        } else if CREATE_INDEX_RE.is_match(stmt) {
            self.parse_create_index(stmt);
        }
    }

    /// Parse a CREATE TABLE statement and add it to the snapshot.
    ///
    /// Returns false when the statement was not a usable CREATE TABLE or the
    /// table was already defined.
    pub fn parse_create_table(&mut self, stmt: &str) -> bool {
        let Some(table_name) = extract_create_table_name(stmt) else {
            return false;
        };

        if self.snapshot.table(&table_name).is_some() {
            return false;
        }

        let mut table = SnapshotTable::new(table_name);
        let mut primary_key = Vec::new();

        if let Some(body) = extract_table_body(stmt) {
            for part in split_table_body(&body) {
                if is_table_constraint(&part) {
                    self.parse_table_constraint(&part, &mut table, &mut primary_key);
                } else {
                    self.parse_column_def(&part, &mut table, &mut primary_key);
                }
            }
        }

        self.primary_keys.push((table.name.clone(), primary_key));
        self.snapshot.tables.push(table);
        true
    }

    /// Parse an ALTER TABLE statement and update an existing table.
    ///
    /// Only ADD [CONSTRAINT] clauses are considered.
    pub fn parse_alter_table(&mut self, stmt: &str) -> bool {
        let Some(table_name) = extract_alter_table_name(stmt) else {
            return false;
        };
        let Some(pos) = self
            .snapshot
            .tables
            .iter()
            .position(|t| t.name == table_name)
        else {
            return false;
        };

        let mut table = std::mem::take(&mut self.snapshot.tables[pos]);
        let mut primary_key = self.take_primary_key(&table_name);

        for clause in split_table_body(stmt) {
            if TABLE_CONSTRAINT_RE.is_match(&clause) {
                self.parse_table_constraint(&clause, &mut table, &mut primary_key);
            }
        }

        self.primary_keys.push((table_name, primary_key));
        self.snapshot.tables[pos] = table;
        true
    }

    /// Parse a CREATE INDEX statement and add the index to its table
    pub fn parse_create_index(&mut self, stmt: &str) -> bool {
        let Some(caps) = CREATE_INDEX_RE.captures(stmt) else {
            return false;
        };
        let index_name = caps[1].to_string();
        let table_name = &caps[2];

        match self.snapshot.table_mut(table_name) {
            Some(table) => {
                table.indices.push(index_name);
                true
            }
            None => false,
        }
    }

    /// Finalize the snapshot, attaching every declared reference to its column
    pub fn build(mut self) -> Snapshot {
        for pending in std::mem::take(&mut self.references) {
            let ref_column = pending
                .ref_column
                .clone()
                .or_else(|| self.single_primary_key(&pending.ref_table))
                .unwrap_or_else(|| "id".to_string());

            if let Some(column) = self
                .snapshot
                .table_mut(&pending.table)
                .and_then(|t| t.column_mut(&pending.column))
            {
                column
                    .references
                    .push(format!("{}.{}", pending.ref_table, ref_column));
            }
        }

        self.snapshot
    }

    /// Get current snapshot (for inspection during building)
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn parse_column_def(
        &mut self,
        def: &str,
        table: &mut SnapshotTable,
        primary_key: &mut Vec<String>,
    ) {
        let Some(caps) = COLUMN_DEF_RE.captures(def) else {
            return;
        };
        let name = caps[1].to_string();
        let col_type = caps[2].to_string();
        let rest = &def[caps.get(0).map(|m| m.end()).unwrap_or(def.len())..];

        for constraint in INLINE_CONSTRAINT_RE.captures_iter(rest) {
            let explicit_name = constraint.get(1).map(|m| m.as_str().to_string());
            let kind = constraint[2].to_uppercase();

            let generated = if kind.starts_with("PRIMARY") {
                primary_key.push(name.clone());
                format!("{}_pkey", table.name)
            } else if kind == "UNIQUE" {
                format!("{}_{}_key", table.name, name)
            } else if kind == "REFERENCES" {
                format!("{}_{}_fkey", table.name, name)
            } else {
                format!("{}_{}_check", table.name, name)
            };
            table.constraints.push(explicit_name.unwrap_or(generated));
        }

        if let Some(target) = INLINE_REFERENCES_RE.captures(rest) {
            let ref_column = target
                .get(2)
                .and_then(|m| parse_column_list(m.as_str()).into_iter().next());
            self.references.push(PendingReference {
                table: table.name.clone(),
                column: name.clone(),
                ref_table: target[1].to_string(),
                ref_column,
            });
        }

        table.columns.push(SnapshotColumn {
            name,
            col_type,
            references: Vec::new(),
        });
    }

    fn parse_table_constraint(
        &mut self,
        part: &str,
        table: &mut SnapshotTable,
        primary_key: &mut Vec<String>,
    ) {
        if let Some(caps) = INLINE_INDEX_RE.captures(part.trim()) {
            table.indices.push(caps[1].to_string());
            return;
        }

        let Some(caps) = TABLE_CONSTRAINT_RE.captures(part.trim()) else {
            return;
        };
        let explicit_name = caps.get(1).map(|m| m.as_str().to_string());
        let kind = caps[2].to_uppercase();

        let generated = if kind.starts_with("PRIMARY") {
            let cols = PRIMARY_KEY_RE
                .captures(part)
                .map(|c| parse_column_list(&c[1]))
                .unwrap_or_default();
            primary_key.extend(cols);
            format!("{}_pkey", table.name)
        } else if kind.starts_with("FOREIGN") {
            let Some(fk) = FOREIGN_KEY_RE.captures(part) else {
                return;
            };
            let local_cols = parse_column_list(&fk[1]);
            let ref_table = fk[2].to_string();
            let ref_cols = fk
                .get(3)
                .map(|m| parse_column_list(m.as_str()))
                .unwrap_or_default();

            for (i, column) in local_cols.iter().enumerate() {
                self.references.push(PendingReference {
                    table: table.name.clone(),
                    column: column.clone(),
                    ref_table: ref_table.clone(),
                    ref_column: ref_cols.get(i).cloned(),
                });
            }

            let first = local_cols.first().cloned().unwrap_or_default();
            format!("{}_{}_fkey", table.name, first)
        } else if kind == "UNIQUE" {
            let first = UNIQUE_RE
                .captures(part)
                .and_then(|c| parse_column_list(&c[1]).into_iter().next())
                .unwrap_or_default();
            format!("{}_{}_key", table.name, first)
        } else if kind == "CHECK" {
            format!("{}_check", table.name)
        } else {
            format!("{}_excl", table.name)
        };

        table.constraints.push(explicit_name.unwrap_or(generated));
    }

    fn take_primary_key(&mut self, table: &str) -> Vec<String> {
        match self.primary_keys.iter().position(|(name, _)| name == table) {
            Some(pos) => self.primary_keys.remove(pos).1,
            None => Vec::new(),
        }
    }

    fn single_primary_key(&self, table: &str) -> Option<String> {
        self.primary_keys
            .iter()
            .find(|(name, _)| name == table)
            .and_then(|(_, cols)| match cols.as_slice() {
                [only] => Some(only.clone()),
                _ => None,
            })
    }
}

/// Build a snapshot from a DDL script
pub fn snapshot_from_ddl(sql: &str) -> Snapshot {
    let mut builder = SnapshotBuilder::new();
    builder.parse_script(sql);
    builder.build()
}

/// Extract table name from CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract table name from ALTER TABLE statement
pub fn extract_alter_table_name(stmt: &str) -> Option<String> {
    ALTER_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_table_constraint(part: &str) -> bool {
    TABLE_CONSTRAINT_START_RE.is_match(part.trim_start())
}

/// Split a script into statements on `;`, honouring quotes, comments and
/// PostgreSQL dollar quoting. Comments are dropped and `COPY ... FROM stdin`
/// data blocks are skipped.
pub fn split_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b'\'' | b'"' | b'`' => {
                let end = find_quote_end(bytes, i + 1, b);
                current.push_str(&sql[i..end]);
                i = end;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i = sql[i..].find('\n').map(|n| i + n).unwrap_or(bytes.len());
            }
            b'#' if current.trim().is_empty() => {
                // MySQL line comment
                i = sql[i..].find('\n').map(|n| i + n).unwrap_or(bytes.len());
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..]
                    .find("*/")
                    .map(|n| i + 2 + n + 2)
                    .unwrap_or(bytes.len());
                current.push(' ');
            }
            b'$' => match dollar_tag(&sql[i..]) {
                Some(tag) => {
                    let body_start = i + tag.len();
                    let end = sql[body_start..]
                        .find(tag)
                        .map(|n| body_start + n + tag.len())
                        .unwrap_or(bytes.len());
                    current.push_str(&sql[i..end]);
                    i = end;
                }
                None => {
                    current.push('$');
                    i += 1;
                }
            },
            b';' => {
                let stmt = current.trim().to_string();
                current.clear();
                i += 1;
                if COPY_FROM_STDIN_RE.is_match(&stmt) {
                    i = skip_copy_data(sql, i);
                }
                if !stmt.is_empty() {
                    statements.push(stmt);
                }
            }
            _ => {
                let ch_len = sql[i..].chars().next().map(char::len_utf8).unwrap_or(1);
                current.push_str(&sql[i..i + ch_len]);
                i += ch_len;
            }
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }

    statements
}

/// Index just past the closing quote; doubled quotes and backslash escapes
/// inside single-quoted strings do not close it.
fn find_quote_end(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && quote == b'\'' {
            i += 2;
            continue;
        }
        if b == quote {
            if bytes.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

/// Dollar-quote tag (`$$` or `$name$`) at the start of `s`
fn dollar_tag(s: &str) -> Option<&str> {
    let rest = &s[1..];
    let end = rest.find('$')?;
    let tag = &rest[..end];
    let valid = tag
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    valid.then(|| &s[..end + 2])
}

/// Skip a COPY data block terminated by a `\.` line
fn skip_copy_data(sql: &str, from: usize) -> usize {
    let mut pos = from;
    for line in sql[from..].split_inclusive('\n') {
        pos += line.len();
        if line.trim_end() == "\\." {
            return pos;
        }
    }
    sql.len()
}

/// Extract the body of a CREATE TABLE statement (between first ( and matching ))
fn extract_table_body(stmt: &str) -> Option<String> {
    let bytes = stmt.as_bytes();
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if b == b'\\' && in_string {
            escape_next = true;
            continue;
        }

        if b == b'\'' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if b == b'(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(stmt[s..i].to_string());
                }
            }
        }
    }

    None
}

/// Split by commas, respecting nested parentheses and string literals
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in body.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
            continue;
        }

        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}
