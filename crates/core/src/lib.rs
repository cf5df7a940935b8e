pub mod aggregate;
pub mod api;
pub mod config;
pub mod cover;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod formatters;
pub mod model;
pub mod tags;
pub mod units;

#[cfg(feature = "fetch")]
pub use aggregate::fetch_activity;
pub use aggregate::{AggregateConfig, AggregateConfigBuilder, Aggregator, default_sections};
pub use api::{Endpoints, UlistRecord, UserRecord, VnRecord, fetch_user, query_ulist, query_vns};
pub use config::Settings;
#[cfg(feature = "inline-images")]
pub use cover::InlineImages;
pub use cover::{ImageEncoder, LinkImages};
pub use enrich::{EnrichOptions, Enricher};
pub use error::{Result, VnshelfError};
pub use extract::{
    ExtractedList, ListKind, ListSummary, RowField, RowPattern, extract_list, extract_rows, extract_summary,
};
#[cfg(feature = "fetch")]
pub use fetch::HttpTransport;
#[cfg(feature = "test-util")]
pub use fetch::{MemoryTransport, RecordedCall};
pub use fetch::{FetchConfig, Transport};
pub use formatters::{JsonConfig, JsonFormatter, TextConfig, TextFormatter, convert_to_json, convert_to_text};
pub use model::{AggregateResult, EmptyReason, FavouriteEntry, ListEntry, Outcome, UserStats};
pub use tags::{Tag, rank_tags};
pub use units::{minutes_to_label, score_to_label};
