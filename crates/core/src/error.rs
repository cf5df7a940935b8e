//! Error types for vnshelf operations.
//!
//! This module defines the main error type [`VnshelfError`] which represents
//! everything that can go wrong while resolving configuration, talking to
//! VNDB, scraping list pages and encoding cover images.
//!
//! # Example
//!
//! ```rust
//! use vnshelf_core::{VnshelfError, Result};
//!
//! fn require_summary(html: &str) -> Result<()> {
//!     if !html.contains("Finished") {
//!         return Err(VnshelfError::Extraction("list summary not found".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Main error type for vnshelf operations.
///
/// Inside the aggregation pipeline these errors never reach the caller: the
/// aggregator logs them and reports an empty outcome instead. They surface
/// directly from the component functions and from configuration activation.
#[derive(Error, Debug)]
pub enum VnshelfError {
    /// HTTP request errors from reqwest.
    ///
    /// Wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided or built from configuration.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with a non-success status code.
    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    /// A JSON body could not be encoded or decoded.
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// A list page no longer matches the expected HTML structure.
    ///
    /// VNDB's list markup is an unversioned contract; this variant marks
    /// the scraping layer breaking rather than the network failing.
    #[error("List extraction failed: {0}")]
    Extraction(String),

    /// The user lookup returned no record for the requested user.
    #[error("Unknown VNDB user: {0}")]
    UnknownUser(String),

    /// Cover image could not be fetched or re-encoded.
    #[error("Image encoding failed: {0}")]
    Image(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The plugin is switched off in its configuration.
    #[error("vnshelf is disabled in the configuration")]
    Disabled,

    /// File I/O errors while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for VnshelfError.
pub type Result<T> = std::result::Result<T, VnshelfError>;
