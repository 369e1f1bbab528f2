//! Static application configuration.
//!
//! Loaded once at startup from an optional JSON file and never mutated while a
//! session runs. Built-in defaults cover the four stock modes, so the file only
//! needs the entries it wants to change.

use crate::model::Mode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SIMPLE_MODE: &str = "simple";
pub const DEFAULT_CARD_SOURCE: &str = "cards_filled.json";
pub const DEFAULT_IMAGE_BASE_PATH: &str = "imgs";
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-mode data source and text settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSettings {
    /// Source key: a path relative to the data root or base URL.
    pub source: String,
    /// Shown in the loaded status line, e.g. `隱言經(英)`.
    #[serde(default)]
    pub label: Option<String>,
    /// Prepended to the card name in text-only titles.
    #[serde(default)]
    pub title_prefix: Option<String>,
    /// Prepended to the card id when a text-only card has no name.
    #[serde(default)]
    pub id_prefix: Option<String>,
}

impl ModeSettings {
    pub fn with_source(source: &str) -> Self {
        Self {
            source: source.to_string(),
            label: None,
            title_prefix: None,
            id_prefix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub modes: BTreeMap<String, ModeSettings>,
    pub image_base_path: String,
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: Duration,
}

fn default_modes() -> BTreeMap<String, ModeSettings> {
    let mut modes = BTreeMap::new();
    modes.insert(
        SIMPLE_MODE.to_string(),
        ModeSettings::with_source(DEFAULT_CARD_SOURCE),
    );
    modes.insert(
        "divination".to_string(),
        ModeSettings::with_source(DEFAULT_CARD_SOURCE),
    );
    modes.insert(
        "hiddenen".to_string(),
        ModeSettings {
            source: "hidden_words_en.json".to_string(),
            label: Some("隱言經(英)".to_string()),
            title_prefix: Some("Hidden Word No.".to_string()),
            id_prefix: Some("No.".to_string()),
        },
    );
    modes.insert(
        "hiddenzh".to_string(),
        ModeSettings {
            source: "hidden_words_zh.json".to_string(),
            label: Some("隱言經(中)".to_string()),
            title_prefix: Some("隱言 No.".to_string()),
            id_prefix: Some("編號 ".to_string()),
        },
    );
    modes
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            modes: default_modes(),
            image_base_path: DEFAULT_IMAGE_BASE_PATH.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// `<config_dir>/card-draw/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("card-draw").join("config.json"))
    }

    /// Load a config file. Stock modes missing from the file's `modes` table
    /// are filled in from the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut cfg: AppConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        for (name, settings) in default_modes() {
            cfg.modes.entry(name).or_insert(settings);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// An explicit path must exist; the default path is used only when present.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, settings) in &self.modes {
            name.parse::<Mode>()
                .with_context(|| format!("config mode table has invalid entry {name:?}"))?;
            if settings.source.trim().is_empty() {
                anyhow::bail!("mode {name:?} has an empty source");
            }
        }
        if self.fetch_timeout.is_zero() {
            anyhow::bail!("fetch_timeout must be greater than zero");
        }
        Ok(())
    }

    pub fn settings_for(&self, mode: &Mode) -> Option<&ModeSettings> {
        self.modes.get(&mode.name())
    }

    /// Source key for `mode`, falling back to the simple mode's source when
    /// the mode has no entry.
    pub fn source_for(&self, mode: &Mode) -> &str {
        self.settings_for(mode)
            .or_else(|| self.modes.get(SIMPLE_MODE))
            .map(|s| s.source.as_str())
            .unwrap_or(DEFAULT_CARD_SOURCE)
    }

    /// Configured modes in menu order: simple, divination, then the rest by name.
    pub fn mode_order(&self) -> Vec<Mode> {
        let mut modes: Vec<Mode> = self
            .modes
            .keys()
            .filter_map(|name| name.parse().ok())
            .collect();
        modes.sort_by_key(|m| match m {
            Mode::Simple => (0, String::new()),
            Mode::Divination => (1, String::new()),
            Mode::HiddenText(lang) => (2, lang.clone()),
        });
        modes
    }

    pub fn image_url(&self, image: &str) -> String {
        let base = self.image_base_path.trim_end_matches('/');
        if base.is_empty() {
            image.to_string()
        } else {
            format!("{base}/{image}")
        }
    }
}
