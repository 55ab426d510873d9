use std::path::Path;
use std::sync::{LazyLock, Mutex};

use async_trait::async_trait;
use regex::Regex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::Value;

use super::{Filter, Query, RecordStore, Row, StoreError};
use crate::models::enums::SortDirection;

static RE_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// `RecordStore` backed by a local SQLite database.
///
/// The connection sits behind a `Mutex`: each query runs to completion
/// synchronously, so the lock is never held across an await point.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open a SQLite connection to the given path and run migrations
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run raw SQL (seeding, maintenance).
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn run_query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let (sql, params) = render_sql(query)?;
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = Row::new();
            for (i, name) in columns.iter().enumerate() {
                map.insert(name.clone(), json_from_sql(row.get_ref(i)?));
            }
            out.push(map);
        }
        Ok(out)
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn query(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let rows = self.run_query(query)?;
        tracing::debug!(table = %query.table, rows = rows.len(), "sqlite query");
        Ok(rows)
    }
}

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![(
        1,
        include_str!("../../resources/migrations/001_initial.sql"),
    )];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql)
                .map_err(|e| StoreError::MigrationFailed {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, i64>(0)
    })
    .unwrap_or(0)
}

fn json_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}

fn column(name: &str) -> Result<&str, StoreError> {
    if RE_COLUMN.is_match(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidColumn(name.into()))
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn render_filter(
    filter: &Filter,
    sql: &mut String,
    params: &mut Vec<SqlValue>,
) -> Result<(), StoreError> {
    match filter {
        Filter::Eq { column: c, value } => {
            sql.push_str(&format!("{} = ?", column(c)?));
            params.push(SqlValue::Text(value.clone()));
        }
        Filter::Contains { column: c, needle } => {
            sql.push_str(&format!("LOWER({}) LIKE ? ESCAPE '\\'", column(c)?));
            params.push(SqlValue::Text(format!(
                "%{}%",
                escape_like(&needle.to_lowercase())
            )));
        }
        Filter::In { column: c, values } => {
            if values.is_empty() {
                sql.push('0');
            } else {
                let marks = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("{} IN ({marks})", column(c)?));
                params.extend(values.iter().cloned().map(SqlValue::Text));
            }
        }
        Filter::AnyOf(alternatives) => {
            if alternatives.is_empty() {
                sql.push('0');
            } else {
                sql.push('(');
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    render_filter(alt, sql, params)?;
                }
                sql.push(')');
            }
        }
    }
    Ok(())
}

/// Translate a `Query` to SQL with positional parameters.
pub fn render_sql(query: &Query) -> Result<(String, Vec<SqlValue>), StoreError> {
    let mut sql = format!("SELECT * FROM {}", query.table.as_str());
    let mut params = Vec::new();

    for (i, filter) in query.filters.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        render_filter(filter, &mut sql, &mut params)?;
    }

    if let Some(order) = &query.order {
        let direction = match order.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        sql.push_str(&format!(" ORDER BY {} {direction}", column(&order.column)?));
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params.push(SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }

    Ok((sql, params))
}
