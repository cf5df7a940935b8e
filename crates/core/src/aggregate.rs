//! The aggregation pass.
//!
//! [`Aggregator`] turns one [`AggregateConfig`] into an [`Outcome`]: the
//! user's profile, the latest finished and playing titles scraped from the
//! website, and the configured favourites, all enriched from the JSON API.
//!
//! # Example
//!
//! ```rust,no_run
//! use vnshelf_core::{AggregateConfig, fetch_activity};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = AggregateConfig::builder().user_id("u2").finished_limit(3).build();
//! if let Some(result) = fetch_activity(&config).await.into_result() {
//!     println!("{} finished {} titles", result.player.username, result.player.finished_count);
//! }
//! # }
//! ```

use std::sync::Arc;

use serde_json::{Value, json};

use crate::Result;
use crate::api::{Endpoints, fetch_user};
use crate::cover::{ImageEncoder, LinkImages};
use crate::enrich::{EnrichOptions, Enricher};
use crate::extract::{ExtractedList, ListKind, RowPattern, extract_list};
use crate::fetch::Transport;
use crate::model::{AggregateResult, EmptyReason, Outcome, UserStats};
use crate::units::minutes_to_label;

/// Inputs of one aggregation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateConfig {
    /// VNDB user id (`u123`) or username. Empty means nothing to render.
    pub user_id: String,
    /// Finished titles kept, most recent first (default: 5).
    pub finished_limit: usize,
    /// Playing titles kept, most recently started first (default: 5).
    pub playing_limit: usize,
    /// VN ids shown as favourites, in display order.
    pub favourite_ids: Vec<String>,
    /// Tags kept per title (default: 3).
    pub tag_max: usize,
    /// Passed through to the renderer untouched.
    pub sections: Value,
    /// Cover box in pixels (default: 100x140).
    pub image_width: u32,
    pub image_height: u32,
}

/// Sections rendered when none are configured.
pub fn default_sections() -> Value {
    json!(["player", "finished", "playing", "favourites"])
}

impl Default for AggregateConfig {
    fn default() -> Self {
        let options = EnrichOptions::default();
        Self {
            user_id: String::new(),
            finished_limit: 5,
            playing_limit: 5,
            favourite_ids: Vec::new(),
            tag_max: options.tag_max,
            sections: default_sections(),
            image_width: options.image_width,
            image_height: options.image_height,
        }
    }
}

impl AggregateConfig {
    /// Creates a new builder for AggregateConfig.
    pub fn builder() -> AggregateConfigBuilder {
        AggregateConfigBuilder::new()
    }

    fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions { tag_max: self.tag_max, image_width: self.image_width, image_height: self.image_height }
    }
}

/// Builder for AggregateConfig.
///
/// ```rust
/// use vnshelf_core::AggregateConfig;
///
/// let config = AggregateConfig::builder()
///     .user_id("u2")
///     .playing_limit(2)
///     .favourites(["v17", "v4"])
///     .build();
/// assert_eq!(config.favourite_ids.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AggregateConfigBuilder {
    config: AggregateConfig,
}

impl AggregateConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: AggregateConfig::default() }
    }

    pub fn user_id(mut self, value: impl Into<String>) -> Self {
        self.config.user_id = value.into();
        self
    }

    pub fn finished_limit(mut self, value: usize) -> Self {
        self.config.finished_limit = value;
        self
    }

    pub fn playing_limit(mut self, value: usize) -> Self {
        self.config.playing_limit = value;
        self
    }

    pub fn favourites<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.favourite_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn tag_max(mut self, value: usize) -> Self {
        self.config.tag_max = value;
        self
    }

    pub fn sections(mut self, value: Value) -> Self {
        self.config.sections = value;
        self
    }

    /// Sets the cover box passed to the image encoder.
    pub fn image_size(mut self, width: u32, height: u32) -> Self {
        self.config.image_width = width;
        self.config.image_height = height;
        self
    }

    pub fn build(self) -> AggregateConfig {
        self.config
    }
}

/// Runs aggregation passes over a transport and an image encoder.
pub struct Aggregator {
    transport: Arc<dyn Transport>,
    images: Arc<dyn ImageEncoder>,
    endpoints: Endpoints,
    row_pattern: Option<RowPattern>,
}

impl Aggregator {
    pub fn new(transport: Arc<dyn Transport>, images: Arc<dyn ImageEncoder>) -> Self {
        Self { transport, images, endpoints: Endpoints::default(), row_pattern: None }
    }

    /// Aggregator over reqwest, optionally inlining covers as data URIs.
    #[cfg(feature = "fetch")]
    pub fn over_http(fetch: &crate::fetch::FetchConfig, inline_images: bool) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(crate::fetch::HttpTransport::new(fetch.clone())?);
        let images = image_encoder(&transport, inline_images)?;
        Ok(Self::new(transport, images))
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Replaces the list-row pattern used on the website's list pages.
    pub fn with_row_pattern(mut self, pattern: RowPattern) -> Self {
        self.row_pattern = Some(pattern);
        self
    }

    /// Runs one pass. Failures are logged and reported as an empty outcome.
    pub async fn aggregate(&self, config: &AggregateConfig) -> Outcome {
        let user = config.user_id.trim();
        if user.is_empty() {
            tracing::debug!("no user configured, nothing to aggregate");
            return Outcome::Empty(EmptyReason::NoUser);
        }

        match self.run(user, config).await {
            Ok(result) => Outcome::Ready(Box::new(result)),
            Err(e) => {
                tracing::error!(user, error = %e, "aggregation failed");
                Outcome::Empty(EmptyReason::Failed(e.to_string()))
            }
        }
    }

    async fn run(&self, user: &str, config: &AggregateConfig) -> Result<AggregateResult> {
        let record = fetch_user(self.transport.as_ref(), &self.endpoints, user).await?;
        tracing::debug!(user = %record.id, username = %record.username, "resolved user");

        let pattern = match &self.row_pattern {
            Some(pattern) => pattern.clone(),
            None => RowPattern::vndb()?,
        };
        let enricher =
            Enricher::new(self.transport.as_ref(), &self.endpoints, self.images.as_ref(), config.enrich_options());

        let finished = self.read_list(ListKind::Finished, &record.id, &pattern, config.finished_limit).await?;
        let player = UserStats {
            total_play_time: minutes_to_label(record.lengthvotes_sum),
            total_play_minutes: record.lengthvotes_sum,
            finished_count: finished.summary.finished,
            playing_count: finished.summary.playing,
            id: record.id,
            username: record.username,
        };
        let finished_vns = enricher.with_details(finished.entries).await?;

        let playing = self.read_list(ListKind::Playing, &player.id, &pattern, config.playing_limit).await?;
        let playing_vns = enricher.with_details(playing.entries).await?;

        let favourites = enricher.favourites(&config.favourite_ids).await?;
        let favourite_vns = enricher.with_user_list(&player.id, favourites).await?;

        tracing::debug!(
            finished = finished_vns.len(),
            playing = playing_vns.len(),
            favourites = favourite_vns.len(),
            "aggregation complete"
        );

        Ok(AggregateResult { player, finished_vns, playing_vns, favourite_vns, sections: config.sections.clone() })
    }

    async fn read_list(&self, kind: ListKind, user_id: &str, pattern: &RowPattern, max: usize) -> Result<ExtractedList> {
        let url = kind.page_url(&self.endpoints.site_base, user_id);
        let html = self.transport.get_text(&url).await?;
        extract_list(&html, pattern, max)
    }
}

#[cfg(all(feature = "fetch", feature = "inline-images"))]
fn image_encoder(transport: &Arc<dyn Transport>, inline: bool) -> Result<Arc<dyn ImageEncoder>> {
    if inline {
        Ok(Arc::new(crate::cover::InlineImages::new(Arc::clone(transport))))
    } else {
        Ok(Arc::new(LinkImages))
    }
}

#[cfg(all(feature = "fetch", not(feature = "inline-images")))]
fn image_encoder(_transport: &Arc<dyn Transport>, inline: bool) -> Result<Arc<dyn ImageEncoder>> {
    if inline {
        Err(crate::VnshelfError::Config("built without inline image support".to_string()))
    } else {
        Ok(Arc::new(LinkImages))
    }
}

/// Fetches and aggregates activity for `config` over HTTP with default
/// settings, keeping cover URLs as links.
#[cfg(feature = "fetch")]
pub async fn fetch_activity(config: &AggregateConfig) -> Outcome {
    match Aggregator::over_http(&crate::fetch::FetchConfig::default(), false) {
        Ok(aggregator) => aggregator.aggregate(config).await,
        Err(e) => {
            tracing::error!(error = %e, "could not build HTTP client");
            Outcome::Empty(EmptyReason::Failed(e.to_string()))
        }
    }
}
