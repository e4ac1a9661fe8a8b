//! Record query filter shared by relay dispatch and store reads.
//!
//! # Invariants
//! - Empty `ids`, `kinds` or `authors` mean "unconstrained".
//! - A tag constraint with an empty value list matches nothing.
//! - `since` and `until` are inclusive bounds on `created_at`.

use crate::model::record::{Kind, Record, RecordId, Timestamp};
use std::collections::BTreeMap;

/// Filter over records; the same value is sent to every relay and to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub ids: Vec<RecordId>,
    pub kinds: Vec<Kind>,
    pub authors: Vec<String>,
    /// Tag key -> accepted first values.
    pub tags: BTreeMap<String, Vec<String>>,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
    pub limit: Option<u32>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Adds accepted values for one tag key.
    pub fn tag<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn since(mut self, since: Timestamp) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: Timestamp) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns whether `record` satisfies every constraint except `limit`.
    pub fn matches(&self, record: &Record) -> bool {
        if !self.ids.is_empty() && !self.ids.contains(&record.id) {
            return false;
        }
        if !self.kinds.is_empty() && !self.kinds.contains(&record.kind) {
            return false;
        }
        if !self.authors.is_empty() && !self.authors.contains(&record.author) {
            return false;
        }
        if self.since.is_some_and(|since| record.created_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| record.created_at > until) {
            return false;
        }

        self.tags.iter().all(|(key, accepted)| {
            record
                .tag_values(key)
                .any(|value| accepted.iter().any(|candidate| candidate == value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RecordFilter;
    use crate::model::record::{Record, Tag, KIND_ARTICLE, KIND_HIGHLIGHT};

    fn highlight(created_at: i64, target: &str) -> Record {
        Record {
            id: "01".to_string(),
            author: "aa".to_string(),
            created_at,
            kind: KIND_HIGHLIGHT,
            tags: vec![Tag::new("a", [target])],
            content: "x".to_string(),
            sig: None,
        }
    }

    #[test]
    fn since_is_inclusive() {
        let filter = RecordFilter::new().since(100);
        assert!(filter.matches(&highlight(100, "t")));
        assert!(!filter.matches(&highlight(99, "t")));
    }

    #[test]
    fn tag_constraint_requires_exact_value() {
        let filter = RecordFilter::new()
            .kind(KIND_HIGHLIGHT)
            .tag("a", ["30023:aa:one"]);
        assert!(filter.matches(&highlight(1, "30023:aa:one")));
        assert!(!filter.matches(&highlight(1, "30023:aa:one-more")));
    }

    #[test]
    fn empty_tag_value_list_matches_nothing() {
        let filter = RecordFilter::new().tag("a", Vec::<String>::new());
        assert!(!filter.matches(&highlight(1, "30023:aa:one")));
    }

    #[test]
    fn kind_and_author_sets_constrain() {
        let filter = RecordFilter::new().kind(KIND_ARTICLE).author("aa");
        assert!(!filter.matches(&highlight(1, "t")));
        let filter = RecordFilter::new().kind(KIND_HIGHLIGHT).author("bb");
        assert!(!filter.matches(&highlight(1, "t")));
    }
}
