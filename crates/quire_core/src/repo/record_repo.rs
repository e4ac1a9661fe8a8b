//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist immutable records idempotently, keyed by content hash.
//! - Answer filter queries with the same semantics relays apply.
//!
//! # Invariants
//! - `save` validates before writing and is a no-op for a known `id`.
//! - The row and its tag index are written in one transaction.
//! - Query results are ordered `created_at DESC, id ASC`.
//! - Read paths reject undecodable persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::filter::RecordFilter;
use crate::model::record::{Record, RecordValidationError, Tag};
use crate::search::fts::{search_records, SearchError, SearchHit, SearchQuery};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    kind,
    author,
    created_at,
    tags_json,
    content,
    sig
FROM records";

const REQUIRED_TABLES: [&str; 3] = ["records", "record_tags", "records_fts"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    Search(SearchError),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "record store is missing required table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Search(err) => Some(err),
            Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<SearchError> for RepoError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

/// Result of one idempotent save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    AlreadyPresent,
}

/// Durable keyed record storage.
pub trait RecordStore {
    /// Persists one record; saving a known `id` is not an error.
    fn save(&self, record: &Record) -> RepoResult<SaveOutcome>;
    /// Returns stored records matching `filter`, newest first.
    fn query(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>>;
    /// Full-text search over stored record bodies.
    fn search(&self, query: &SearchQuery) -> RepoResult<Vec<SearchHit>>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a migrated connection, rejecting one without the record schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn save(&self, record: &Record) -> RepoResult<SaveOutcome> {
        record.validate()?;

        let tags_json = serde_json::to_string(&record.tags)
            .map_err(|err| RepoError::InvalidData(format!("unencodable tags: {err}")))?;

        let tx = self.conn.unchecked_transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO records (
                id,
                kind,
                author,
                created_at,
                tags_json,
                content,
                sig
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                record.id.as_str(),
                record.kind,
                record.author.as_str(),
                record.created_at,
                tags_json,
                record.content.as_str(),
                record.sig.as_deref(),
            ],
        )?;

        if inserted == 0 {
            return Ok(SaveOutcome::AlreadyPresent);
        }

        for (position, tag) in record.tags.iter().enumerate() {
            let (Some(name), Some(value)) = (tag.key(), tag.value()) else {
                continue;
            };
            tx.execute(
                "INSERT INTO record_tags (record_id, position, name, value)
                 VALUES (?1, ?2, ?3, ?4);",
                params![record.id.as_str(), position as i64, name, value],
            )?;
        }

        tx.commit()?;
        Ok(SaveOutcome::Inserted)
    }

    fn query(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>> {
        let mut sql = format!("{RECORD_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !filter.ids.is_empty() {
            push_in_clause(&mut sql, "id", filter.ids.len());
            bind_values.extend(filter.ids.iter().cloned().map(Value::Text));
        }
        if !filter.kinds.is_empty() {
            push_in_clause(&mut sql, "kind", filter.kinds.len());
            bind_values.extend(
                filter
                    .kinds
                    .iter()
                    .map(|kind| Value::Integer(i64::from(*kind))),
            );
        }
        if !filter.authors.is_empty() {
            push_in_clause(&mut sql, "author", filter.authors.len());
            bind_values.extend(filter.authors.iter().cloned().map(Value::Text));
        }
        if let Some(since) = filter.since {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(since));
        }
        if let Some(until) = filter.until {
            sql.push_str(" AND created_at <= ?");
            bind_values.push(Value::Integer(until));
        }

        for (name, values) in &filter.tags {
            if values.is_empty() {
                sql.push_str(" AND 0");
                continue;
            }
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM record_tags rt
                    WHERE rt.record_id = records.id
                      AND rt.name = ?",
            );
            bind_values.push(Value::Text(name.clone()));
            push_in_clause(&mut sql, "rt.value", values.len());
            bind_values.extend(values.iter().cloned().map(Value::Text));
            sql.push(')');
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn search(&self, query: &SearchQuery) -> RepoResult<Vec<SearchHit>> {
        Ok(search_records(self.conn, query)?)
    }
}

fn push_in_clause(sql: &mut String, column: &str, count: usize) {
    let placeholders = vec!["?"; count].join(", ");
    sql.push_str(&format!(" AND {column} IN ({placeholders})"));
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<Record> {
    let id: String = row.get("id")?;
    let tags_json: String = row.get("tags_json")?;
    let tags: Vec<Tag> = serde_json::from_str(&tags_json).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags_json for record `{id}`: {err}"))
    })?;

    let record = Record {
        kind: row.get("kind")?,
        author: row.get("author")?,
        created_at: row.get("created_at")?,
        tags,
        content: row.get("content")?,
        sig: row.get("sig")?,
        id,
    };
    record.validate()?;
    Ok(record)
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type IN ('table', 'view') AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
