//! Batch enrichment of list entries.
//!
//! Each pass issues one batched query for all entries it is given and joins
//! the answers back by VN id. Entries the API does not mention come back
//! unchanged; partial enrichment is not an error.

use std::collections::{HashMap, HashSet};

use crate::Result;
use crate::api::{DETAIL_FIELDS, Endpoints, FAVOURITE_FIELDS, UlistRecord, VnRecord, query_ulist, query_vns};
use crate::cover::ImageEncoder;
use crate::fetch::Transport;
use crate::model::{FavouriteEntry, ListEntry};
use crate::tags::rank_tags;
use crate::units::score_to_label;

/// Presentation limits applied while enriching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Tags kept per entry.
    pub tag_max: usize,
    /// Cover box passed to the image encoder.
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self { tag_max: 3, image_width: 100, image_height: 140 }
    }
}

/// Runs enrichment passes against one transport.
pub struct Enricher<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
    images: &'a dyn ImageEncoder,
    options: EnrichOptions,
}

impl<'a> Enricher<'a> {
    pub fn new(
        transport: &'a dyn Transport, endpoints: &'a Endpoints, images: &'a dyn ImageEncoder, options: EnrichOptions,
    ) -> Self {
        Self { transport, endpoints, images, options }
    }

    /// Adds cover and top tags to each entry, keeping the input order.
    pub async fn with_details(&self, entries: Vec<ListEntry>) -> Result<Vec<ListEntry>> {
        if entries.is_empty() {
            return Ok(entries);
        }

        let ids: Vec<String> = entries.iter().map(|entry| entry.vn_id.clone()).collect();
        let records = query_vns(self.transport, self.endpoints, &ids, DETAIL_FIELDS).await?;
        let by_id: HashMap<&str, &VnRecord> = records.iter().map(|record| (record.id.as_str(), record)).collect();

        let mut enriched = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(record) = by_id.get(entry.vn_id.as_str()) else {
                tracing::debug!(vn_id = %entry.vn_id, "no details returned");
                enriched.push(entry);
                continue;
            };

            let cover = self.cover(record).await;
            enriched.push(ListEntry {
                image: cover.or(entry.image),
                tags: rank_tags(&record.tags, self.options.tag_max),
                ..entry
            });
        }

        Ok(enriched)
    }

    /// Replaces vote, dates and notes with the user's own list data.
    pub async fn with_user_list(&self, user_id: &str, entries: Vec<ListEntry>) -> Result<Vec<ListEntry>> {
        if entries.is_empty() {
            return Ok(entries);
        }

        let ids: Vec<String> = entries.iter().map(|entry| entry.vn_id.clone()).collect();
        let records = query_ulist(self.transport, self.endpoints, user_id, &ids).await?;
        let by_id: HashMap<&str, &UlistRecord> = records.iter().map(|record| (record.id.as_str(), record)).collect();

        Ok(entries
            .into_iter()
            .map(|entry| match by_id.get(entry.vn_id.as_str()) {
                Some(record) => apply_user_list(entry, record),
                None => entry,
            })
            .collect())
    }

    /// Builds favourite entries for `ids`, in the order given.
    ///
    /// Repeated ids appear once. Ids unknown to the API are skipped.
    pub async fn favourites(&self, ids: &[String]) -> Result<Vec<FavouriteEntry>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let records = query_vns(self.transport, self.endpoints, ids, FAVOURITE_FIELDS).await?;
        let by_id: HashMap<&str, &VnRecord> = records.iter().map(|record| (record.id.as_str(), record)).collect();

        let mut seen = HashSet::new();
        let mut favourites = Vec::with_capacity(by_id.len());
        for id in ids.iter().filter(|id| seen.insert(id.as_str())) {
            match by_id.get(id.as_str()) {
                Some(record) => favourites.push(self.favourite(record).await),
                None => tracing::warn!(vn_id = %id, "favourite not found on VNDB, skipping"),
            }
        }

        Ok(favourites)
    }

    async fn favourite(&self, record: &VnRecord) -> FavouriteEntry {
        let alt_title = record.alttitle.clone().filter(|alt| !alt.is_empty()).unwrap_or_else(|| record.title.clone());

        FavouriteEntry {
            alt_title,
            title: record.title.clone(),
            image: self.cover(record).await,
            tags: rank_tags(&record.tags, self.options.tag_max),
            ..ListEntry::new(record.id.clone())
        }
    }

    /// Encoded cover for `record`; falls back to the remote URL when encoding fails.
    async fn cover(&self, record: &VnRecord) -> Option<String> {
        let url = &record.image.as_ref()?.url;

        match self.images.encode(url, self.options.image_width, self.options.image_height).await {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(vn_id = %record.id, error = %e, "cover encoding failed, keeping remote URL");
                Some(url.clone())
            }
        }
    }
}

fn apply_user_list(entry: ListEntry, record: &UlistRecord) -> ListEntry {
    ListEntry {
        vote: score_to_label(record.vote),
        start_date: record.started.clone().unwrap_or_default(),
        finish_date: record.finished.clone().unwrap_or_default(),
        notes: record.notes.clone().unwrap_or_default(),
        ..entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cover::LinkImages;
    use crate::fetch::MemoryTransport;
    use crate::{Result as VnResult, VnshelfError};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    const VN_URL: &str = "https://api.vndb.org/kana/vn";
    const ULIST_URL: &str = "https://api.vndb.org/kana/ulist";

    fn catalog() -> Value {
        json!({ "results": [
            {
                "id": "v17", "title": "Ever17 -the out of infinity-", "alttitle": null,
                "image": { "url": "https://t.vndb.org/cv/17.jpg" },
                "tags": [
                    { "name": "Mystery", "rating": 2.8 },
                    { "name": "Sci-fi", "rating": 2.9 },
                    { "name": "Romance", "rating": 1.2 },
                    { "name": "Underwater", "rating": 2.5 }
                ]
            },
            {
                "id": "v4", "title": "CLANNAD", "alttitle": "クラナド",
                "image": { "url": "https://t.vndb.org/cv/4.jpg" },
                "tags": [{ "name": "Drama", "rating": 3.0 }]
            }
        ]})
    }

    fn transport() -> MemoryTransport {
        MemoryTransport::new().with_post(VN_URL, |_| catalog())
    }

    fn enricher<'a>(transport: &'a MemoryTransport, endpoints: &'a Endpoints) -> Enricher<'a> {
        Enricher::new(transport, endpoints, &LinkImages, EnrichOptions::default())
    }

    fn entries(ids: &[&str]) -> Vec<ListEntry> {
        ids.iter().map(|id| ListEntry::new(*id)).collect()
    }

    #[tokio::test]
    async fn test_details_empty_input_makes_no_request() {
        let transport = transport();
        let endpoints = Endpoints::default();

        let enriched = enricher(&transport, &endpoints).with_details(Vec::new()).await.unwrap();
        assert!(enriched.is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_details_join_by_id_in_input_order() {
        let transport = transport();
        let endpoints = Endpoints::default();

        let enriched = enricher(&transport, &endpoints).with_details(entries(&["v4", "v99", "v17"])).await.unwrap();

        assert_eq!(transport.calls().len(), 1);
        let ids: Vec<&str> = enriched.iter().map(|e| e.vn_id.as_str()).collect();
        assert_eq!(ids, vec!["v4", "v99", "v17"]);

        assert_eq!(enriched[0].image.as_deref(), Some("https://t.vndb.org/cv/4.jpg"));
        assert_eq!(enriched[0].tags, vec!["Drama"]);
        assert_eq!(enriched[1], ListEntry::new("v99"));
        assert_eq!(enriched[2].tags, vec!["Sci-fi", "Mystery", "Underwater"]);
    }

    #[tokio::test]
    async fn test_details_keep_scraped_fields() {
        let transport = transport();
        let endpoints = Endpoints::default();
        let mut scraped = ListEntry::new("v17");
        scraped.title = "Ever17".to_string();
        scraped.vote = "9".to_string();

        let enriched = enricher(&transport, &endpoints).with_details(vec![scraped]).await.unwrap();
        assert_eq!(enriched[0].title, "Ever17");
        assert_eq!(enriched[0].vote, "9");
    }

    #[tokio::test]
    async fn test_user_list_null_dates_and_zero_vote() {
        let transport = MemoryTransport::new().with_post(ULIST_URL, |_| {
            json!({ "results": [{ "id": "v17", "vote": 0, "started": null, "finished": "2021-01-01", "notes": "reread" }] })
        });
        let endpoints = Endpoints::default();
        let mut entry = ListEntry::new("v17");
        entry.start_date = "2020-12-01".to_string();

        let enriched = enricher(&transport, &endpoints).with_user_list("u7", vec![entry]).await.unwrap();
        assert_eq!(enriched[0].start_date, "");
        assert_eq!(enriched[0].finish_date, "2021-01-01");
        assert_eq!(enriched[0].vote, "-");
        assert_eq!(enriched[0].notes, "reread");
    }

    #[tokio::test]
    async fn test_user_list_scales_vote_and_skips_unmatched() {
        let transport = MemoryTransport::new()
            .with_post(ULIST_URL, |_| json!({ "results": [{ "id": "v4", "vote": 85, "finished": "2020-05-05" }] }));
        let endpoints = Endpoints::default();
        let mut untouched = ListEntry::new("v5");
        untouched.vote = "7".to_string();

        let enriched =
            enricher(&transport, &endpoints).with_user_list("u7", vec![ListEntry::new("v4"), untouched.clone()]).await.unwrap();
        assert_eq!(enriched[0].vote, "8.5");
        assert_eq!(enriched[0].notes, "");
        assert_eq!(enriched[1], untouched);
    }

    #[tokio::test]
    async fn test_user_list_empty_input_makes_no_request() {
        let transport = MemoryTransport::new();
        let endpoints = Endpoints::default();
        let enriched = enricher(&transport, &endpoints).with_user_list("u7", Vec::new()).await.unwrap();
        assert!(enriched.is_empty());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_favourites_follow_caller_order() {
        let transport = transport();
        let endpoints = Endpoints::default();
        let ids: Vec<String> = ["v17", "v404", "v4", "v17"].iter().map(|s| s.to_string()).collect();

        let favourites = enricher(&transport, &endpoints).favourites(&ids).await.unwrap();

        let got: Vec<&str> = favourites.iter().map(|e| e.vn_id.as_str()).collect();
        assert_eq!(got, vec!["v17", "v4"]);
        assert_eq!(favourites[0].alt_title, "Ever17 -the out of infinity-");
        assert_eq!(favourites[1].alt_title, "クラナド");
        assert_eq!(favourites[1].title, "CLANNAD");
        assert_eq!(favourites[1].vote, "-");

        let body = transport.calls()[0].body.clone().unwrap();
        assert_eq!(body["fields"], FAVOURITE_FIELDS);
        assert_eq!(body["filters"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_favourites_empty_makes_no_request() {
        let transport = transport();
        let endpoints = Endpoints::default();
        assert!(enricher(&transport, &endpoints).favourites(&[]).await.unwrap().is_empty());
        assert!(transport.calls().is_empty());
    }

    struct BrokenImages;

    #[async_trait]
    impl ImageEncoder for BrokenImages {
        async fn encode(&self, _url: &str, _width: u32, _height: u32) -> VnResult<String> {
            Err(VnshelfError::Image("decoder exploded".to_string()))
        }
    }

    #[tokio::test]
    async fn test_cover_failure_falls_back_to_url() {
        let transport = transport();
        let endpoints = Endpoints::default();
        let enricher = Enricher::new(&transport, &endpoints, &BrokenImages, EnrichOptions::default());

        let enriched = enricher.with_details(entries(&["v4"])).await.unwrap();
        assert_eq!(enriched[0].image.as_deref(), Some("https://t.vndb.org/cv/4.jpg"));
    }

    #[tokio::test]
    async fn test_tag_max_is_applied() {
        let transport = transport();
        let endpoints = Endpoints::default();
        let options = EnrichOptions { tag_max: 1, ..Default::default() };
        let enricher = Enricher::new(&transport, &endpoints, &LinkImages, options);

        let enriched = enricher.with_details(entries(&["v17"])).await.unwrap();
        assert_eq!(enriched[0].tags, vec!["Sci-fi"]);
    }
}
