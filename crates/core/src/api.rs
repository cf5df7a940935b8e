//! Client for the VNDB "kana" JSON API.
//!
//! Three endpoints are used: `GET /user` for the profile, and batched
//! `POST /vn` and `POST /ulist` queries filtered by an OR over VN ids.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::fetch::{Transport, parse_url};
use crate::tags::Tag;
use crate::{Result, VnshelfError};

/// Largest page the API returns for one query.
pub const MAX_RESULTS: usize = 100;

/// VN fields needed to decorate scraped list rows.
pub const DETAIL_FIELDS: &str = "image.url, tags.name, tags.rating";

/// VN fields needed to build favourites from bare ids.
pub const FAVOURITE_FIELDS: &str = "alttitle, title, image.url, tags.name, tags.rating";

/// User-list fields carrying the user's own annotations.
pub const ULIST_FIELDS: &str = "vote, started, finished, notes";

/// Base URLs of the JSON API and the website.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub site_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self { api_base: "https://api.vndb.org/kana".to_string(), site_base: "https://vndb.org".to_string() }
    }
}

impl Endpoints {
    pub fn api(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

/// `GET /user` record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub lengthvotes_sum: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// `POST /vn` result item.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VnRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub alttitle: Option<String>,
    #[serde(default)]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// `POST /ulist` result item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UlistRecord {
    pub id: String,
    #[serde(default)]
    pub vote: Option<u32>,
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub finished: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
    #[serde(default)]
    more: bool,
}

/// Looks up a user by id (`u123`) or username.
pub async fn fetch_user(transport: &dyn Transport, endpoints: &Endpoints, user: &str) -> Result<UserRecord> {
    let mut url = parse_url(&endpoints.api("user"))?;
    url.query_pairs_mut().append_pair("q", user).append_pair("fields", "lengthvotes_sum");

    let response = transport.get_json(url.as_str()).await?;
    match response.get(user) {
        Some(record) if !record.is_null() => Ok(serde_json::from_value(record.clone())?),
        _ => Err(VnshelfError::UnknownUser(user.to_string())),
    }
}

/// Fetches `fields` for every VN in `ids`.
///
/// Duplicate ids are sent once. Ids are batched [`MAX_RESULTS`] per request,
/// so any list within that cap costs one round trip. No ids, no request.
pub async fn query_vns(
    transport: &dyn Transport, endpoints: &Endpoints, ids: &[String], fields: &str,
) -> Result<Vec<VnRecord>> {
    let url = endpoints.api("vn");
    let mut records = Vec::new();

    for batch in distinct_ids(ids).chunks(MAX_RESULTS) {
        let body = json!({ "filters": or_filter(batch), "fields": fields, "results": batch.len() });
        let page: Page<VnRecord> = serde_json::from_value(transport.post_json(&url, &body).await?)?;
        if page.more {
            tracing::warn!(requested = batch.len(), "vn query reported more results than one page");
        }
        records.extend(page.results);
    }

    Ok(records)
}

/// Fetches `user`'s own list annotations for the VNs in `ids`.
pub async fn query_ulist(
    transport: &dyn Transport, endpoints: &Endpoints, user: &str, ids: &[String],
) -> Result<Vec<UlistRecord>> {
    let url = endpoints.api("ulist");
    let mut records = Vec::new();

    for batch in distinct_ids(ids).chunks(MAX_RESULTS) {
        let body = json!({
            "user": user,
            "filters": or_filter(batch),
            "fields": ULIST_FIELDS,
            "results": MAX_RESULTS,
        });
        let page: Page<UlistRecord> = serde_json::from_value(transport.post_json(&url, &body).await?)?;
        if page.more {
            tracing::warn!(user, requested = batch.len(), "ulist query reported more results than one page");
        }
        records.extend(page.results);
    }

    Ok(records)
}

/// `["or", ["id", "=", id], ...]`
fn or_filter(ids: &[&str]) -> Value {
    let mut filter = vec![json!("or")];
    filter.extend(ids.iter().map(|id| json!(["id", "=", id])));
    Value::Array(filter)
}

fn distinct_ids(ids: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    ids.iter().map(String::as_str).filter(|id| seen.insert(*id)).collect()
}
