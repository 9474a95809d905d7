//! Screen registry document
//!
//! The registry maps every screen identifier to the resources that screen needs:
//! an optional stylesheet, an optional hit-region document and an optional
//! controller identifier. It is read once at startup and never mutated.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::fetch::{ResourceFetcher, is_http};

/// Start screen used when the registry does not name one
pub const DEFAULT_START_SCREEN: &str = "menu";

/// Resources attached to a single screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDescriptor {
    /// Stylesheet URL, inserted once per run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,

    /// Hit-region document URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hitboxes: Option<String>,

    /// Controller identifier, resolved through the controller registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
}

/// The full registry document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    #[serde(default)]
    pub start_screen: String,

    #[serde(default)]
    pub screens: BTreeMap<String, ScreenDescriptor>,
}

impl Registry {
    /// Parse a registry from its JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse screen registry")
    }

    /// Load a registry document from disk
    pub async fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading screen registry from: {:?}", path);
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read screen registry: {:?}", path))?;
        Self::from_json(&text)
    }

    /// Load a registry through `fetcher`
    pub async fn fetch(source: &str, fetcher: &dyn ResourceFetcher) -> Result<Self> {
        log::debug!("Fetching screen registry from: {}", source);
        let response = fetcher
            .fetch(source)
            .await
            .with_context(|| format!("Failed to fetch screen registry: {}", source))?;
        if !response.is_success() {
            bail!("Screen registry {} answered with status {}", source, response.status);
        }
        Self::from_json(&response.body)
    }

    /// Load from an `http(s)://` URL through `fetcher`, or from a local path
    pub async fn open(source: &str, fetcher: &dyn ResourceFetcher) -> Result<Self> {
        if is_http(source) {
            Self::fetch(source, fetcher).await
        } else {
            Self::load(Path::new(source)).await
        }
    }

    /// Start screen, falling back to `menu` when the document leaves it blank
    pub fn start_screen(&self) -> &str {
        let start = self.start_screen.trim();
        if start.is_empty() { DEFAULT_START_SCREEN } else { start }
    }

    pub fn get(&self, screen_id: &str) -> Option<&ScreenDescriptor> {
        self.screens.get(screen_id)
    }

    pub fn contains(&self, screen_id: &str) -> bool {
        self.screens.contains_key(screen_id)
    }

    /// Screen identifiers in registry order
    pub fn screen_ids(&self) -> impl Iterator<Item = &str> {
        self.screens.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_registry() {
        let registry = Registry::from_json(r#"{
            "start_screen": "menu",
            "screens": {
                "menu": { "css": "styles/menu.css", "hitboxes": "hitboxes/menu.json" },
                "hunt": { "controller": "hunt" },
                "play": {}
            }
        }"#).unwrap();

        assert_eq!(registry.start_screen(), "menu");
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get("menu").unwrap().css.as_deref(), Some("styles/menu.css"));
        assert_eq!(registry.get("hunt").unwrap().controller.as_deref(), Some("hunt"));
        assert_eq!(registry.get("play").unwrap(), &ScreenDescriptor::default());
        assert!(!registry.contains("nope"));
    }

    #[test]
    fn test_blank_start_screen_falls_back_to_menu() {
        let registry = Registry::from_json(r#"{ "start_screen": "  ", "screens": {} }"#).unwrap();
        assert_eq!(registry.start_screen(), DEFAULT_START_SCREEN);

        let registry = Registry::from_json(r#"{ "screens": {} }"#).unwrap();
        assert_eq!(registry.start_screen(), DEFAULT_START_SCREEN);
    }

    #[test]
    fn test_rejects_non_object_document() {
        assert!(Registry::from_json("[1, 2, 3]").is_err());
    }

    #[tokio::test]
    async fn test_fetch_through_fetcher() {
        let fetcher = crate::fetch::MemoryFetcher::new();
        fetcher.insert("https://cdn.example.com/screens.json", r#"{ "screens": { "menu": {} } }"#);

        let registry = Registry::open("https://cdn.example.com/screens.json", &fetcher).await.unwrap();
        assert!(registry.contains("menu"));
        assert!(Registry::fetch("https://cdn.example.com/missing.json", &fetcher).await.is_err());
    }
}
