//! Incremental overlay merge.
//!
//! The body is kept as a run of plain and marked segments. Each excerpt is
//! matched only inside plain segments of the current state, so applying an
//! excerpt splits plain text around its occurrences and never touches text
//! an earlier excerpt already marked. Rendering joins the segments and wraps
//! marked ones in `MARK_OPEN`/`MARK_CLOSE`.

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Plain(String),
    Marked(String),
}

/// Body under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    segments: Vec<Segment>,
    applied: usize,
}

impl Overlay {
    pub fn new(content: &str) -> Self {
        let segments = if content.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Plain(content.to_string())]
        };
        Self {
            segments,
            applied: 0,
        }
    }

    /// Marks every unmarked occurrence of `excerpt`.
    ///
    /// Returns `false`, leaving the body unchanged, when the excerpt is empty
    /// or does not occur in unmarked text.
    pub fn apply(&mut self, excerpt: &str) -> bool {
        if excerpt.is_empty() {
            return false;
        }
        let found = self
            .segments
            .iter()
            .any(|segment| matches!(segment, Segment::Plain(text) if text.contains(excerpt)));
        if !found {
            return false;
        }

        let mut next = Vec::with_capacity(self.segments.len() + 2);
        for segment in self.segments.drain(..) {
            match segment {
                Segment::Plain(text) if text.contains(excerpt) => {
                    split_plain(&text, excerpt, &mut next);
                }
                other => next.push(other),
            }
        }
        self.segments = next;
        self.applied += 1;
        true
    }

    /// Number of `apply` calls that matched.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Plain(text) => out.push_str(text),
                Segment::Marked(text) => {
                    out.push_str(MARK_OPEN);
                    out.push_str(text);
                    out.push_str(MARK_CLOSE);
                }
            }
        }
        out
    }
}

/// Applies `excerpts` in order and returns the rendered body with the
/// number of excerpts that matched.
pub fn overlay_excerpts<'a, I>(content: &str, excerpts: I) -> (String, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let mut overlay = Overlay::new(content);
    for excerpt in excerpts {
        overlay.apply(excerpt);
    }
    (overlay.render(), overlay.applied())
}

fn split_plain(text: &str, excerpt: &str, out: &mut Vec<Segment>) {
    let mut rest = text;
    while let Some(position) = rest.find(excerpt) {
        if position > 0 {
            out.push(Segment::Plain(rest[..position].to_string()));
        }
        out.push(Segment::Marked(excerpt.to_string()));
        rest = &rest[position + excerpt.len()..];
    }
    if !rest.is_empty() {
        out.push(Segment::Plain(rest.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::{overlay_excerpts, Overlay};

    #[test]
    fn wraps_each_excerpt_independently() {
        let (content, applied) = overlay_excerpts("The sky is blue.", ["sky", "blue"]);
        assert_eq!(content, "The <mark>sky</mark> is <mark>blue</mark>.");
        assert_eq!(applied, 2);
    }

    #[test]
    fn wraps_every_occurrence() {
        let (content, _) = overlay_excerpts("la la land", ["la"]);
        assert_eq!(content, "<mark>la</mark> <mark>la</mark> <mark>la</mark>nd");
    }

    #[test]
    fn empty_and_missing_excerpts_are_no_ops() {
        let mut overlay = Overlay::new("unchanged text");
        assert!(!overlay.apply(""));
        assert!(!overlay.apply("absent"));
        assert_eq!(overlay.render(), "unchanged text");
        assert_eq!(overlay.applied(), 0);
    }

    #[test]
    fn marked_text_is_not_matched_again() {
        let (once, _) = overlay_excerpts("The sky is blue.", ["sky", "blue"]);
        let (twice, applied) =
            overlay_excerpts("The sky is blue.", ["sky", "blue", "sky", "blue"]);
        assert_eq!(once, twice);
        assert_eq!(applied, 2);
    }

    #[test]
    fn excerpt_spanning_prior_mark_does_not_match() {
        let (content, applied) = overlay_excerpts("The sky is blue.", ["sky", "sky is"]);
        assert_eq!(content, "The <mark>sky</mark> is blue.");
        assert_eq!(applied, 1);
    }

    #[test]
    fn excerpt_containing_marker_text_does_not_match() {
        let (content, applied) =
            overlay_excerpts("The sky is blue.", ["sky", "<mark>sky</mark>", "mark"]);
        assert_eq!(content, "The <mark>sky</mark> is blue.");
        assert_eq!(applied, 1);
    }

    #[test]
    fn later_excerpt_can_match_unmarked_remainder() {
        let (content, _) = overlay_excerpts("blue sky, bluest sea", ["bluest", "blue"]);
        assert_eq!(content, "<mark>blue</mark> sky, <mark>bluest</mark> sea");
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let (content, _) = overlay_excerpts("café crème", ["crème"]);
        assert_eq!(content, "café <mark>crème</mark>");
    }
}
