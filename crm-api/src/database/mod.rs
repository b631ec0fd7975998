pub mod activities;
pub mod companies;
pub mod contacts;
pub mod dashboard;
pub mod deals;
pub mod migrations;
pub mod notes;
pub mod profiles;
pub mod stages;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Record not found")]
    NotFound,

    /// A referenced row is missing or belongs to someone else.
    #[error("{message}")]
    InvalidReference { field: String, message: String },

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    pub fn reference(field: &str, message: &str) -> Self {
        DbError::InvalidReference {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[derive(Clone)]
pub struct AsyncDbConnection {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl AsyncDbConnection {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn lock(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

pub struct Database {
    pub async_connection: AsyncDbConnection,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        {
            let conn = pool.get()?;
            migrations::run_migrations(&conn)?;
        }

        Ok(Database {
            async_connection: AsyncDbConnection::new(pool),
        })
    }

    pub async fn ping(&self) -> DbResult<()> {
        let conn = self.async_connection.lock().await?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `%term%` with LIKE wildcards escaped; pair with `ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Reads a TEXT column holding an enumerated value.
pub(crate) fn parse_enum<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

/// 1-based page number and the matching row offset.
pub(crate) fn page_window(page: Option<u32>) -> (u32, i64) {
    let page = page.unwrap_or(1).max(1);
    (page, ((page - 1) * shared_types::PAGE_SIZE) as i64)
}

/// Fails with a field-level error unless `id` names a row of `table` owned by `user_id`.
pub(crate) fn ensure_owned(
    conn: &Connection,
    table: &'static str,
    id: Option<&str>,
    user_id: &str,
    field: &str,
    message: &str,
) -> DbResult<()> {
    let Some(id) = id else {
        return Ok(());
    };
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {} WHERE id = ?1 AND user_id = ?2", table),
            [id, user_id],
            |_| Ok(()),
        )
        .optional()?;
    match found {
        Some(()) => Ok(()),
        None => Err(DbError::reference(field, message)),
    }
}

/// WHERE clause accumulator for list queries.
pub(crate) struct Filters {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Filters {
    /// Starts with the owner check every query carries.
    pub(crate) fn owned_by(column: &str, user_id: &str) -> Self {
        Self {
            clauses: vec![format!("{} = ?", column)],
            params: vec![Value::Text(user_id.to_string())],
        }
    }

    pub(crate) fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(format!("{} = ?", column));
        self.params.push(value.into());
        self
    }

    pub(crate) fn clause(&mut self, sql: &str, values: Vec<Value>) -> &mut Self {
        self.clauses.push(sql.to_string());
        self.params.extend(values);
        self
    }

    /// Case-insensitive substring match on any of `columns`. Blank terms are ignored.
    pub(crate) fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        let pattern = like_pattern(term);
        let ors: Vec<String> = columns
            .iter()
            .map(|column| format!("{} LIKE ? ESCAPE '\\'", column))
            .collect();
        self.clauses.push(format!("({})", ors.join(" OR ")));
        for _ in columns {
            self.params.push(Value::Text(pattern.clone()));
        }
        self
    }

    pub(crate) fn where_sql(&self) -> String {
        format!("WHERE {}", self.clauses.join(" AND "))
    }

    pub(crate) fn params(&self) -> Vec<Value> {
        self.params.clone()
    }

    /// Parameters followed by LIMIT and OFFSET values.
    pub(crate) fn params_with_page(&self, limit: i64, offset: i64) -> Vec<Value> {
        let mut params = self.params.clone();
        params.push(Value::Integer(limit));
        params.push(Value::Integer(offset));
        params
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use std::sync::Arc;

    pub(crate) struct TestDb {
        pub db: Arc<Database>,
        _dir: tempfile::TempDir,
    }

    pub(crate) fn test_db() -> TestDb {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("crm.sqlite3")).unwrap();
        TestDb {
            db: Arc::new(db),
            _dir: dir,
        }
    }
}
