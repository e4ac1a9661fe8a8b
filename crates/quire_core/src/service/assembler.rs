//! Article assembly: canonical version selection and highlight overlay.
//!
//! # Invariants
//! - Highlights apply in `(created_at, id)` ascending order whatever order
//!   they arrive in; duplicate ids apply once.
//! - Assembly is a pure function of its inputs.
//! - For one address only the newest record is canonical; ties go to the
//!   lexically smallest id.

use crate::model::address::Address;
use crate::model::article::{Article, ArticleViewError};
use crate::model::record::{Record, KIND_HIGHLIGHT};
use crate::overlay::merge::Overlay;
use log::debug;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

/// Builds the display view of `article` with `highlights` overlaid.
pub fn assemble(article: &Record, highlights: &[Record]) -> Result<Article, ArticleViewError> {
    let mut view = Article::from_record(article)?;

    let mut overlay = Overlay::new(&article.content);
    for highlight in order_highlights(highlights) {
        if !overlay.apply(&highlight.content) {
            debug!(
                "event=highlight_skipped module=assembler article_id={} highlight_id={} reason=excerpt_not_found",
                article.id, highlight.id
            );
        }
    }

    view.content = overlay.render();
    view.applied_highlights = overlay.applied();
    Ok(view)
}

/// Deduplicates highlight-kind records by id and sorts them for application.
pub fn order_highlights(records: &[Record]) -> Vec<&Record> {
    let mut seen = BTreeSet::new();
    let mut ordered: Vec<&Record> = records
        .iter()
        .filter(|record| record.kind == KIND_HIGHLIGHT)
        .filter(|record| seen.insert(record.id.as_str()))
        .collect();
    ordered.sort_by(|left, right| {
        left.created_at
            .cmp(&right.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    ordered
}

/// Collapses article records to the canonical version per address.
///
/// Records without an identifier are dropped. Output follows address order.
pub fn canonical_articles(records: &[Record]) -> Vec<&Record> {
    let mut latest: BTreeMap<Address, &Record> = BTreeMap::new();
    for record in records {
        let Some(address) = record.address() else {
            continue;
        };
        match latest.entry(address) {
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
            Entry::Occupied(mut slot) => {
                if supersedes(record, slot.get()) {
                    slot.insert(record);
                }
            }
        }
    }
    latest.into_values().collect()
}

fn supersedes(candidate: &Record, current: &Record) -> bool {
    candidate.created_at > current.created_at
        || (candidate.created_at == current.created_at && candidate.id < current.id)
}

/// Sorts articles newest first; ties by id ascending.
pub fn sort_newest_first(articles: &mut [Article]) {
    articles.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
}
