//! Conversions from raw VNDB fields to display labels.

use crate::model::NO_VOTE;

/// Formats a play time in minutes as `"Xh"` or `"Xh Ym"`.
///
/// ```rust
/// use vnshelf_core::minutes_to_label;
///
/// assert_eq!(minutes_to_label(125), "2h 5m");
/// assert_eq!(minutes_to_label(120), "2h");
/// ```
pub fn minutes_to_label(total: u64) -> String {
    let hours = total / 60;
    let minutes = total % 60;

    if minutes == 0 { format!("{hours}h") } else { format!("{hours}h {minutes}m") }
}

/// Formats a VNDB vote (10-100) on the ten-point scale with one decimal.
///
/// Missing and zero votes render as `"-"`.
pub fn score_to_label(raw: Option<u32>) -> String {
    match raw {
        None | Some(0) => NO_VOTE.to_string(),
        Some(vote) => format!("{:.1}", f64::from(vote) / 10.0),
    }
}
