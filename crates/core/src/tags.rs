//! Tag ranking for cover cards.

use serde::Deserialize;

/// A tag as returned by the VNDB `vn` endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tag {
    pub name: String,
    /// Average tag score, 0.0 to 3.0 on VNDB.
    pub rating: f64,
}

/// Returns the names of the `max` highest-rated tags.
///
/// Equal ratings keep their input order. When fewer than `max` tags exist,
/// all of them are returned.
pub fn rank_tags(tags: &[Tag], max: usize) -> Vec<String> {
    let mut ranked: Vec<&Tag> = tags.iter().collect();
    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked.into_iter().take(max).map(|tag| tag.name.clone()).collect()
}
