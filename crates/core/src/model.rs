//! Display-ready records produced by the aggregation pipeline.

use serde::Serialize;

/// Vote label used when no vote is recorded.
pub const NO_VOTE: &str = "-";

/// Profile summary for the requested user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Resolved VNDB user id (`u123`).
    pub id: String,
    pub username: String,
    /// Sum of the play times the user voted on, in minutes.
    pub total_play_minutes: u64,
    /// `total_play_minutes` as `"Xh Ym"`.
    pub total_play_time: String,
    pub finished_count: u32,
    pub playing_count: u32,
}

/// One visual novel on a user's list.
///
/// Scraping fills the identity, title, vote and date columns; detail
/// enrichment adds `image` and `tags`; user-list enrichment overwrites the
/// vote and dates and sets `notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListEntry {
    pub vn_id: String,
    pub alt_title: String,
    pub title: String,
    /// `"-"` or a one-decimal score such as `"8.5"`.
    pub vote: String,
    pub start_date: String,
    pub finish_date: String,
    /// Embeddable cover: a `data:` URI or a plain URL.
    pub image: Option<String>,
    pub tags: Vec<String>,
    pub notes: String,
}

impl ListEntry {
    /// An entry that knows only its id.
    pub fn new(vn_id: impl Into<String>) -> Self {
        Self {
            vn_id: vn_id.into(),
            alt_title: String::new(),
            title: String::new(),
            vote: NO_VOTE.to_string(),
            start_date: String::new(),
            finish_date: String::new(),
            image: None,
            tags: Vec::new(),
            notes: String::new(),
        }
    }
}

/// Favourites share the list entry shape.
pub type FavouriteEntry = ListEntry;

/// Everything a renderer needs for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub player: UserStats,
    pub finished_vns: Vec<ListEntry>,
    pub playing_vns: Vec<ListEntry>,
    pub favourite_vns: Vec<FavouriteEntry>,
    /// Opaque section selection passed through from configuration.
    pub sections: serde_json::Value,
}

/// Why an aggregation produced nothing to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// No user id was configured.
    NoUser,
    /// The pipeline failed; the message is the logged error.
    Failed(String),
}

/// Result of one aggregation pass.
///
/// The aggregator never returns an error: a failed pass is an
/// [`Outcome::Empty`] carrying the reason, which callers treat as
/// "nothing to show".
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ready(Box<AggregateResult>),
    Empty(EmptyReason),
}

impl Outcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }

    /// The aggregate, if the pass produced one.
    pub fn result(&self) -> Option<&AggregateResult> {
        match self {
            Outcome::Ready(result) => Some(result),
            Outcome::Empty(_) => None,
        }
    }

    pub fn into_result(self) -> Option<AggregateResult> {
        match self {
            Outcome::Ready(result) => Some(*result),
            Outcome::Empty(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_defaults() {
        let entry = ListEntry::new("v17");
        assert_eq!(entry.vn_id, "v17");
        assert_eq!(entry.vote, NO_VOTE);
        assert!(entry.image.is_none());
        assert!(entry.tags.is_empty());
    }

    #[test]
    fn test_empty_outcome_has_no_result() {
        let outcome = Outcome::Empty(EmptyReason::NoUser);
        assert!(!outcome.is_ready());
        assert!(outcome.result().is_none());
        assert!(outcome.into_result().is_none());
    }

    #[test]
    fn test_entry_serialization() {
        let mut entry = ListEntry::new("v11");
        entry.title = "Fate/stay night".to_string();
        entry.tags = vec!["Fantasy".to_string()];

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains(r#""vn_id":"v11""#));
        assert!(json.contains(r#""tags":["Fantasy"]"#));
        assert!(json.contains(r#""image":null"#));
    }
}
