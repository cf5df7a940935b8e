//! Play-history extraction from VNDB user-list pages.
//!
//! The list pages are plain server-rendered tables. Rows are pulled out with
//! a single regular expression whose capture groups are mapped onto entry
//! fields by a [`RowPattern`], so the finished and playing pages share one
//! extractor. The markup is not a versioned interface: when it changes,
//! extraction fails with [`VnshelfError::Extraction`].

use regex::Regex;
use scraper::Html;

use crate::model::{ListEntry, NO_VOTE};
use crate::{Result, VnshelfError};

/// Row markup of the `ulist` table, one capture group per column.
pub const VNDB_ROW_PATTERN: &str = concat!(
    r#"<td class="tc_vote">([^ ]*?)</td>.*?"#,
    r#"<td class="tc_title"><a href="/(.*?)".*?title="(.*?)">(.*?)</a>.*?"#,
    r#"<td class="tc_started">(.*?)</td>.*?"#,
    r#"<td class="tc_finished">(.*?)</td>.*?</td>"#,
);

/// Tab counters shown above every list page.
const SUMMARY_PATTERN: &str = r"Playing.*?\((.+?)\).*?Finished.*?\((.+?)\)";

/// Entry field filled by a capture group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowField {
    Vote,
    Id,
    AltTitle,
    Title,
    Started,
    Finished,
}

/// A row regex together with the field each of its capture groups fills.
///
/// Group `i + 1` of the regex feeds `fields[i]`.
#[derive(Debug, Clone)]
pub struct RowPattern {
    regex: Regex,
    fields: Vec<RowField>,
}

impl RowPattern {
    /// Compiles `pattern` and checks it has a capture group for every field.
    pub fn new(pattern: &str, fields: &[RowField]) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| VnshelfError::Config(format!("invalid row pattern: {e}")))?;

        let groups = regex.captures_len() - 1;
        if groups < fields.len() {
            return Err(VnshelfError::Config(format!(
                "row pattern has {groups} capture groups but {} fields were named",
                fields.len()
            )));
        }
        if !fields.contains(&RowField::Id) {
            return Err(VnshelfError::Config("row pattern must capture the VN id".to_string()));
        }

        Ok(Self { regex, fields: fields.to_vec() })
    }

    /// The pattern matching the current VNDB list table.
    pub fn vndb() -> Result<Self> {
        use RowField::*;
        Self::new(VNDB_ROW_PATTERN, &[Vote, Id, AltTitle, Title, Started, Finished])
    }
}

/// Counters from the list page's tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSummary {
    pub playing: u32,
    pub finished: u32,
}

/// Rows and counters scraped from one list page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedList {
    pub entries: Vec<ListEntry>,
    pub summary: ListSummary,
}

/// Which of the user's list pages to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// Finished titles, most recently finished first.
    Finished,
    /// Titles in progress, most recently started first.
    Playing,
}

impl ListKind {
    fn query(self) -> &'static str {
        match self {
            ListKind::Finished => "ulist?s=3q8w",
            ListKind::Playing => "ulist?l=1&s=3q7w",
        }
    }

    /// URL of this list for `user_id` on the site at `site_base`.
    pub fn page_url(self, site_base: &str, user_id: &str) -> String {
        format!("{}/{}/{}", site_base.trim_end_matches('/'), user_id, self.query())
    }
}

/// Extracts every row matching `pattern`, in document order.
pub fn extract_rows(html: &str, pattern: &RowPattern) -> Vec<ListEntry> {
    pattern
        .regex
        .captures_iter(html)
        .map(|captures| {
            let mut entry = ListEntry::new(String::new());
            for (index, field) in pattern.fields.iter().enumerate() {
                let value = captures.get(index + 1).map(|m| cell_text(m.as_str())).unwrap_or_default();
                match field {
                    RowField::Vote => entry.vote = if value.is_empty() { NO_VOTE.to_string() } else { value },
                    RowField::Id => entry.vn_id = value,
                    RowField::AltTitle => entry.alt_title = value,
                    RowField::Title => entry.title = value,
                    RowField::Started => entry.start_date = value,
                    RowField::Finished => entry.finish_date = value,
                }
            }
            entry
        })
        .collect()
}

/// Reads the `Playing (N) ... Finished (N)` counters.
///
/// A page without them is not a list page, so their absence is an error.
pub fn extract_summary(html: &str) -> Result<ListSummary> {
    let regex = Regex::new(SUMMARY_PATTERN).map_err(|e| VnshelfError::Extraction(e.to_string()))?;
    let captures = regex
        .captures(html)
        .ok_or_else(|| VnshelfError::Extraction("list summary 'Playing (N) ... Finished (N)' not found".to_string()))?;

    let counter = |index: usize| -> Result<u32> {
        let raw = captures.get(index).map(|m| m.as_str().trim()).unwrap_or_default();
        raw.parse::<u32>()
            .map_err(|_| VnshelfError::Extraction(format!("list summary counter '{raw}' is not a number")))
    };

    Ok(ListSummary { playing: counter(1)?, finished: counter(2)? })
}

/// Extracts a list page, keeping only its first `max` rows.
///
/// VNDB sorts the page by recency, so truncation keeps the latest entries.
pub fn extract_list(html: &str, pattern: &RowPattern, max: usize) -> Result<ExtractedList> {
    let summary = extract_summary(html)?;
    let mut entries = extract_rows(html, pattern);
    entries.truncate(max);

    tracing::debug!(rows = entries.len(), playing = summary.playing, finished = summary.finished, "extracted list page");
    Ok(ExtractedList { entries, summary })
}

/// Text of a captured cell with entities decoded and nested tags dropped.
fn cell_text(raw: &str) -> String {
    if !raw.contains(['<', '&']) {
        return raw.trim().to_string();
    }
    let fragment = Html::parse_fragment(raw);
    fragment.root_element().text().collect::<String>().trim().to_string()
}
