//! Render configuration, read from an optional JSON file.
//!
//! {
//!   "pretty": true,        // false renders readMap as an inline JSON string
//!   "with_date": false,    // local result names get a timestamp
//!   "deleted": false,      // local result names get `_deleted`
//!   "timezone": "UTC"      // used when an extract spec has none
//! }

use crate::render::paths::Destinations;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pretty: bool,
    pub timezone: String,
    #[serde(flatten)]
    pub destinations: Destinations,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pretty: true,
            timezone: DEFAULT_TIMEZONE.to_string(),
            destinations: Destinations::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config file {}", path.display()))
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            pretty: self.pretty,
        }
    }
}

/// What entity renderers need besides the entity itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub pretty: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Config::default().render_options()
    }
}
