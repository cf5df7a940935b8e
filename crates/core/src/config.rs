//! Configuration resolution.
//!
//! Settings come from a JSON file (by default
//! `<config dir>/vnshelf/config.json`) and are turned into an
//! [`AggregateConfig`] by [`Settings::activate`]. Activation is the only
//! place where configuration problems are reported as errors; once a pass
//! starts, failures degrade to an empty outcome instead.
//!
//! ```json
//! {
//!   "enabled": true,
//!   "user": "u2",
//!   "finished_limit": 4,
//!   "favourites": ["v17", "v4"]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::aggregate::{AggregateConfig, default_sections};
use crate::{Result, VnshelfError};

/// User-facing settings as written in the config file.
///
/// Dotted keys (`finished.games.limit`, `playing.games.limit`,
/// `favourite.games`) are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    pub user: Option<String>,
    pub sections: Option<Value>,
    #[serde(alias = "finished.games.limit")]
    pub finished_limit: usize,
    #[serde(alias = "playing.games.limit")]
    pub playing_limit: usize,
    /// Array of ids or one comma-separated string.
    #[serde(alias = "favourite.games", deserialize_with = "ids_from_list_or_csv")]
    pub favourites: Vec<String>,
    pub tag_max: usize,
    pub image_width: u32,
    pub image_height: u32,
    /// Embed covers as data URIs instead of linking them.
    pub inline_images: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = AggregateConfig::default();
        Self {
            enabled: false,
            user: None,
            sections: None,
            finished_limit: defaults.finished_limit,
            playing_limit: defaults.playing_limit,
            favourites: Vec::new(),
            tag_max: defaults.tag_max,
            image_width: defaults.image_width,
            image_height: defaults.image_height,
            inline_images: false,
        }
    }
}

impl Settings {
    /// Parses settings from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| VnshelfError::Config(format!("invalid settings: {e}")))
    }

    /// Reads settings from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VnshelfError::Config(format!("config file not found: {}", path.display())));
        }

        let text = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Self::from_json(&text)
    }

    /// `<config dir>/vnshelf/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("vnshelf").join("config.json"))
    }

    /// Reads the default config file, or returns defaults when there is none.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Checks the settings and produces the inputs of an aggregation pass.
    ///
    /// A disabled configuration or a missing `user` key is an error. An
    /// empty `user` is accepted; the pass then reports nothing to render.
    pub fn activate(&self) -> Result<AggregateConfig> {
        if !self.enabled {
            return Err(VnshelfError::Disabled);
        }
        let user = self.user.as_ref().ok_or_else(|| VnshelfError::Config("'user' is required".to_string()))?;

        Ok(AggregateConfig {
            user_id: user.trim().to_string(),
            finished_limit: self.finished_limit,
            playing_limit: self.playing_limit,
            favourite_ids: self.favourites.clone(),
            tag_max: self.tag_max,
            sections: self.sections.clone().unwrap_or_else(default_sections),
            image_width: self.image_width,
            image_height: self.image_height,
        })
    }
}

fn ids_from_list_or_csv<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Ids {
        List(Vec<String>),
        Csv(String),
    }

    let ids = match Ids::deserialize(deserializer)? {
        Ids::List(ids) => ids,
        Ids::Csv(raw) => raw.split(',').map(str::to_string).collect(),
    };

    Ok(ids.into_iter().map(|id| id.trim().to_string()).filter(|id| !id.is_empty()).collect())
}
