//! Article and highlight projections derived from records.
//!
//! # Responsibility
//! - Project article records into render-ready `Article` values.
//! - Project highlight records into `Highlight` values with a parsed target.
//! - Derive a plain-text summary when an article carries none.
//!
//! # Invariants
//! - An `Article` always has a non-empty identifier and a valid `Address`.
//! - A `Highlight` always references an article-kind `Address`.

use crate::model::address::Address;
use crate::model::record::{
    Record, RecordId, Tag, Timestamp, KIND_ARTICLE, KIND_HIGHLIGHT, TAG_ADDRESS,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const SUMMARY_MAX_CHARS: usize = 160;

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\*_`#>~\-\[\]\(\)!]+"#).expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Projection failures for article/highlight views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleViewError {
    WrongKind { id: RecordId, kind: u32 },
    MissingIdentifier(RecordId),
    MissingTarget(RecordId),
}

impl Display for ArticleViewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongKind { id, kind } => write!(f, "record {id} has unexpected kind {kind}"),
            Self::MissingIdentifier(id) => write!(f, "article {id} has no identifier tag"),
            Self::MissingTarget(id) => write!(f, "highlight {id} references no article"),
        }
    }
}

impl Error for ArticleViewError {}

/// Render-ready view of one article record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub address: Address,
    pub id: RecordId,
    pub author: String,
    pub identifier: String,
    pub title: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub published_at: Option<Timestamp>,
    /// Topic (`t`) tag values in tag order.
    pub hashtags: Vec<String>,
    /// Body after highlight overlay.
    pub content: String,
    /// Body exactly as published.
    pub raw_content: String,
    pub tags: Vec<Tag>,
    pub created_at: Timestamp,
    /// Number of highlights whose excerpt matched the body.
    pub applied_highlights: usize,
}

impl Article {
    /// Projects an article record with its body not yet overlaid.
    pub fn from_record(record: &Record) -> Result<Self, ArticleViewError> {
        if record.kind != KIND_ARTICLE {
            return Err(ArticleViewError::WrongKind {
                id: record.id.clone(),
                kind: record.kind,
            });
        }
        let address = record
            .address()
            .ok_or_else(|| ArticleViewError::MissingIdentifier(record.id.clone()))?;

        let summary = record
            .first_tag_value("summary")
            .map(str::to_string)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| derive_summary(&record.content));

        Ok(Self {
            identifier: address.identifier.clone(),
            address,
            id: record.id.clone(),
            author: record.author.clone(),
            title: record.first_tag_value("title").unwrap_or_default().to_string(),
            summary,
            image: record.first_tag_value("image").map(str::to_string),
            published_at: record
                .first_tag_value("published_at")
                .and_then(|value| value.trim().parse().ok()),
            hashtags: record.tag_values("t").map(str::to_string).collect(),
            content: record.content.clone(),
            raw_content: record.content.clone(),
            tags: record.tags.clone(),
            created_at: record.created_at,
            applied_highlights: 0,
        })
    }
}

/// View of one highlight record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub id: RecordId,
    pub author: String,
    pub created_at: Timestamp,
    /// Exact substring of the target body this highlight covers.
    pub excerpt: String,
    pub target_address: Address,
}

impl Highlight {
    /// Projects a highlight record; the target is the first `a` tag that
    /// parses into an article-kind address.
    pub fn from_record(record: &Record) -> Result<Self, ArticleViewError> {
        if record.kind != KIND_HIGHLIGHT {
            return Err(ArticleViewError::WrongKind {
                id: record.id.clone(),
                kind: record.kind,
            });
        }
        let target_address = record
            .tag_values(TAG_ADDRESS)
            .filter_map(|value| value.parse::<Address>().ok())
            .find(|address| address.kind == KIND_ARTICLE)
            .ok_or_else(|| ArticleViewError::MissingTarget(record.id.clone()))?;

        Ok(Self {
            id: record.id.clone(),
            author: record.author.clone(),
            created_at: record.created_at,
            excerpt: record.content.clone(),
            target_address,
        })
    }
}

/// Derives a plain-text summary from markdown.
///
/// Rules:
/// - images removed, links replaced by their label;
/// - markdown symbols removed, whitespace collapsed;
/// - first 160 chars retained; `None` when nothing is left.
pub fn derive_summary(content: &str) -> Option<String> {
    let without_images = MARKDOWN_IMAGE_RE.replace_all(content, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(SUMMARY_MAX_CHARS).collect())
    }
}
