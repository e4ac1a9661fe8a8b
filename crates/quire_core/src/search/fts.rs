//! SQLite FTS5 search over stored record bodies.
//!
//! # Invariants
//! - Blank queries and zero limits return no hits without touching SQLite.
//! - Ordering is deterministic: rank, then `created_at DESC`, then `id ASC`.

use crate::db::DbError;
use crate::model::record::{Kind, RecordId, Timestamp};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    /// User-provided query is not valid FTS5 syntax.
    InvalidQuery { query: String, message: String },
    Db(DbError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid full-text query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full-text query options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub kind: Option<Kind>,
    pub author: Option<String>,
    pub limit: u32,
    /// Pass `text` through as a raw FTS5 expression instead of quoting terms.
    pub raw_fts_syntax: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            author: None,
            limit: DEFAULT_SEARCH_LIMIT,
            raw_fts_syntax: false,
        }
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub record_id: RecordId,
    pub kind: Kind,
    pub created_at: Timestamp,
    pub snippet: String,
}

/// Searches stored record bodies and returns ranked hits.
pub fn search_records(conn: &Connection, query: &SearchQuery) -> SearchResult<Vec<SearchHit>> {
    let Some(match_expr) = build_match_expression(query) else {
        return Ok(Vec::new());
    };
    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let mut sql = String::from(
        "SELECT
            records.id AS id,
            records.kind AS kind,
            records.created_at AS created_at,
            snippet(records_fts, 1, '[', ']', ' ... ', 10) AS snippet
         FROM records_fts
         JOIN records ON records.id = records_fts.record_id
         WHERE records_fts MATCH ?",
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(match_expr.clone())];

    if let Some(kind) = query.kind {
        sql.push_str(" AND records.kind = ?");
        bind_values.push(Value::Integer(i64::from(kind)));
    }
    if let Some(author) = query.author.as_ref() {
        sql.push_str(" AND records.author = ?");
        bind_values.push(Value::Text(author.clone()));
    }

    sql.push_str(" ORDER BY bm25(records_fts), records.created_at DESC, records.id ASC LIMIT ?");
    bind_values.push(Value::Integer(i64::from(query.limit)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt
        .query(params_from_iter(bind_values))
        .map_err(|err| map_query_error(err, &match_expr))?;

    let mut hits = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, &match_expr))?
    {
        hits.push(SearchHit {
            record_id: row.get("id")?,
            kind: row.get("kind")?,
            created_at: row.get("created_at")?,
            snippet: row.get("snippet")?,
        });
    }

    Ok(hits)
}

fn build_match_expression(query: &SearchQuery) -> Option<String> {
    let text = query.text.trim();
    if text.is_empty() {
        return None;
    }
    if query.raw_fts_syntax {
        return Some(text.to_string());
    }

    let terms = text.split_whitespace().map(escape_fts_term).collect::<Vec<_>>();
    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" AND "))
}

fn escape_fts_term(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }
    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
