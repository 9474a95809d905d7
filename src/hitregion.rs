//! Hit-region documents: loading, injection and read-back
//!
//! A hit-region document looks like
//! `{ "hitboxes": [ { "id", "label", "action", "x", "y", "w", "h" } ] }`
//! with rectangles in percent of the screen container. Loading never fails:
//! every problem degrades the screen to "no regions" and is logged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::document::{Document, NodeId};
use crate::fetch::ResourceFetcher;

pub const LAYER_CLASS: &str = "hitbox-layer";
pub const REGION_CLASS: &str = "vc-hitbox";
pub const ACTION_ATTR: &str = "data-action";
pub const LABEL_ATTR: &str = "aria-label";
pub const REGION_ID_ATTR: &str = "data-hitbox-id";

/// Accessible name used when a region has neither label nor id
const FALLBACK_LABEL: &str = "hitbox";

/// A percentage-positioned interactive rectangle mapped to an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRegion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub action: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl HitRegion {
    pub fn new(action: impl Into<String>, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            id: None,
            label: None,
            action: action.into(),
            x: clamp_percent(x),
            y: clamp_percent(y),
            w: clamp_percent(w),
            h: clamp_percent(h),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label, else id, else a generic name
    pub fn accessible_name(&self) -> &str {
        [self.label.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(FALLBACK_LABEL)
    }

    /// Whether a point (in percent of the container) falls inside the region
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    /// Build a region from one entry of the `hitboxes` list.
    /// Non-object entries yield `None`.
    fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        Some(Self {
            id: text_field(entry.get("id")),
            label: text_field(entry.get("label")),
            action: text_field(entry.get("action")).unwrap_or_default(),
            x: percent_field(entry.get("x")),
            y: percent_field(entry.get("y")),
            w: percent_field(entry.get("w")),
            h: percent_field(entry.get("h")),
        })
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, 100.0) } else { 0.0 }
}

fn percent_field(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    clamp_percent(raw)
}

fn text_field(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Why a screen ended up with no regions from its document
#[derive(Debug, Clone, PartialEq)]
pub enum LoadIssue {
    /// The fetch itself failed (network error, timeout, unreadable file)
    Transport(String),
    /// Non-2xx status
    Status(u16),
    /// An HTML page came back where JSON was expected
    HtmlBody,
    /// Body is not JSON
    Malformed(String),
    /// JSON without a `hitboxes` list
    MissingList,
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadIssue::Transport(e) => write!(f, "fetch failed: {}", e),
            LoadIssue::Status(status) => write!(f, "status {}", status),
            LoadIssue::HtmlBody => write!(f, "returned HTML instead of JSON"),
            LoadIssue::Malformed(e) => write!(f, "invalid JSON: {}", e),
            LoadIssue::MissingList => write!(f, "no hitboxes list"),
        }
    }
}

/// Outcome of loading one hit-region document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadReport {
    pub regions: Vec<HitRegion>,
    /// Entries of the list that were not objects
    pub skipped: usize,
    pub issue: Option<LoadIssue>,
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(16).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Parse a hit-region document body
pub fn parse_document(body: &str) -> Result<(Vec<HitRegion>, usize), LoadIssue> {
    if looks_like_html(body) {
        return Err(LoadIssue::HtmlBody);
    }

    let document: Value = serde_json::from_str(body).map_err(|e| LoadIssue::Malformed(e.to_string()))?;
    let Some(entries) = document.get("hitboxes").and_then(Value::as_array) else {
        return Err(LoadIssue::MissingList);
    };

    let regions: Vec<HitRegion> = entries.iter().filter_map(HitRegion::from_value).collect();
    let skipped = entries.len() - regions.len();
    Ok((regions, skipped))
}

/// Fetches and parses hit-region documents
#[derive(Clone)]
pub struct HitRegionLoader {
    fetcher: Arc<dyn ResourceFetcher>,
}

impl HitRegionLoader {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Regions for `url`; empty on any failure
    pub async fn load(&self, url: Option<&str>) -> Vec<HitRegion> {
        self.load_report(url).await.regions
    }

    /// Regions for `url` along with the reason they are missing, if any
    pub async fn load_report(&self, url: Option<&str>) -> LoadReport {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return LoadReport::default();
        };

        let response = match self.fetcher.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Hitbox fetch failed: {} ({:#})", url, e);
                return LoadReport { issue: Some(LoadIssue::Transport(format!("{:#}", e))), ..Default::default() };
            }
        };

        if !response.is_success() {
            log::warn!("Hitboxes missing: {} (status {})", url, response.status);
            return LoadReport { issue: Some(LoadIssue::Status(response.status)), ..Default::default() };
        }

        match parse_document(&response.body) {
            Ok((regions, skipped)) => {
                if skipped > 0 {
                    log::warn!("Skipped {} malformed hitbox entries in {}", skipped, url);
                }
                log::debug!("Loaded {} hitboxes from {}", regions.len(), url);
                LoadReport { regions, skipped, issue: None }
            }
            Err(issue) => {
                log::warn!("Hitboxes unusable: {} ({})", url, issue);
                LoadReport { issue: Some(issue), ..Default::default() }
            }
        }
    }
}

pub(crate) fn format_percent(value: f64) -> String {
    format!("{}%", value)
}

fn parse_percent(value: Option<&str>) -> f64 {
    value
        .map(|v| v.trim().trim_end_matches('%').trim())
        .and_then(|v| v.parse::<f64>().ok())
        .map(clamp_percent)
        .unwrap_or(0.0)
}

/// The container's overlay layer, created on first use.
///
/// The layer itself never takes pointer events so sparse regions do not cover
/// the screen with an invisible blocking pane.
pub fn ensure_layer(doc: &mut Document, container: NodeId) -> NodeId {
    if let Some(layer) = doc.query_class(container, LAYER_CLASS) {
        return layer;
    }

    let layer = doc.create_element("div");
    doc.add_class(layer, LAYER_CLASS);
    doc.set_attr(layer, "data-vc-created", "1");
    doc.set_style(layer, "position", "absolute");
    doc.set_style(layer, "inset", "0");
    doc.set_style(layer, "z-index", "9999");
    doc.set_style(layer, "pointer-events", "none");
    doc.append_child(container, layer);
    layer
}

/// Remove every injected region from the container, keeping the layer
pub fn clear_regions(doc: &mut Document, container: NodeId) {
    if let Some(layer) = doc.query_class(container, LAYER_CLASS) {
        doc.clear_children(layer);
    }
}

/// Replace the container's regions with `regions`; returns how many were injected
pub fn inject_regions(doc: &mut Document, container: NodeId, regions: &[HitRegion]) -> usize {
    let layer = ensure_layer(doc, container);
    doc.clear_children(layer);

    for region in regions {
        let button = doc.create_element("button");
        doc.set_attr(button, "type", "button");
        doc.add_class(button, REGION_CLASS);
        doc.set_attr(button, LABEL_ATTR, region.accessible_name());
        doc.set_attr(button, ACTION_ATTR, region.action.trim());
        if let Some(id) = region.id.as_deref() {
            doc.set_attr(button, REGION_ID_ATTR, id);
        }

        doc.set_style(button, "position", "absolute");
        doc.set_style(button, "left", format_percent(region.x));
        doc.set_style(button, "top", format_percent(region.y));
        doc.set_style(button, "width", format_percent(region.w));
        doc.set_style(button, "height", format_percent(region.h));
        doc.set_style(button, "pointer-events", "auto");

        doc.append_child(layer, button);
    }

    regions.len()
}

/// Reconstruct a region from an injected element
pub fn region_from_element(doc: &Document, node: NodeId) -> Option<HitRegion> {
    if !doc.has_class(node, REGION_CLASS) {
        return None;
    }
    let label = doc.attr(node, LABEL_ATTR).map(str::to_string);
    Some(HitRegion {
        id: doc.attr(node, REGION_ID_ATTR).map(str::to_string),
        label,
        action: doc.attr(node, ACTION_ATTR).unwrap_or_default().to_string(),
        x: parse_percent(doc.style(node, "left")),
        y: parse_percent(doc.style(node, "top")),
        w: parse_percent(doc.style(node, "width")),
        h: parse_percent(doc.style(node, "height")),
    })
}

/// Injected regions of a container, in injection order
pub fn read_regions(doc: &Document, container: NodeId) -> Vec<(NodeId, HitRegion)> {
    doc.query_all_class(container, REGION_CLASS)
        .into_iter()
        .filter_map(|node| region_from_element(doc, node).map(|r| (node, r)))
        .collect()
}

/// Topmost region of the container under a point given in percent
pub fn region_at(doc: &Document, container: NodeId, x: f64, y: f64) -> Option<NodeId> {
    // Later regions are drawn on top, so search back to front
    read_regions(doc, container)
        .into_iter()
        .rev()
        .find(|(_, region)| region.contains(x, y))
        .map(|(node, _)| node)
}

/// Move an injected region element to new percentages without touching its action
pub fn restyle_region(doc: &mut Document, node: NodeId, x: f64, y: f64, w: f64, h: f64) {
    doc.set_style(node, "left", format_percent(clamp_percent(x)));
    doc.set_style(node, "top", format_percent(clamp_percent(y)));
    doc.set_style(node, "width", format_percent(clamp_percent(w)));
    doc.set_style(node, "height", format_percent(clamp_percent(h)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient_fields() {
        let (regions, skipped) = parse_document(r#"{
            "hitboxes": [
                { "id": "start", "label": "Start", "action": " go:play ", "x": 10, "y": "12.5", "w": 20, "h": 10 },
                { "action": "go:menu", "x": "left", "w": 140 },
                42,
                null
            ]
        }"#).unwrap();

        assert_eq!(skipped, 2);
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].action, "go:play");
        assert_eq!(regions[0].y, 12.5);
        assert_eq!(regions[1].x, 0.0);
        assert_eq!(regions[1].y, 0.0);
        assert_eq!(regions[1].w, 100.0);
        assert_eq!(regions[1].accessible_name(), "hitbox");
    }

    #[test]
    fn test_parse_rejects_html_and_garbage() {
        assert_eq!(parse_document("  <!DOCTYPE html><html></html>"), Err(LoadIssue::HtmlBody));
        assert_eq!(parse_document("<html><body>404</body></html>"), Err(LoadIssue::HtmlBody));
        assert!(matches!(parse_document("{ nope"), Err(LoadIssue::Malformed(_))));
        assert_eq!(parse_document(r#"{ "hitboxes": "many" }"#), Err(LoadIssue::MissingList));
        assert_eq!(parse_document(r#"{}"#), Err(LoadIssue::MissingList));
    }

    #[test]
    fn test_inject_replaces_previous_regions() {
        let mut doc = Document::with_screens(["play"]);
        let container = doc.screens()[0].1;

        let first = vec![
            HitRegion::new("go:a", 0.0, 0.0, 10.0, 10.0),
            HitRegion::new("go:b", 50.0, 50.0, 10.0, 10.0),
        ];
        assert_eq!(inject_regions(&mut doc, container, &first), 2);

        let second = vec![HitRegion::new("go:c", 10.0, 10.0, 20.0, 10.0).with_id("start")];
        inject_regions(&mut doc, container, &second);

        let regions = read_regions(&doc, container);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].1, HitRegion::new("go:c", 10.0, 10.0, 20.0, 10.0).with_id("start").with_label("start"));
        assert_eq!(doc.query_all_class(container, LAYER_CLASS).len(), 1);
    }

    #[test]
    fn test_layer_is_inert_and_regions_are_interactive() {
        let mut doc = Document::with_screens(["play"]);
        let container = doc.screens()[0].1;
        inject_regions(&mut doc, container, &[HitRegion::new("go:menu", 10.0, 10.0, 20.0, 10.0)]);

        let layer = doc.query_class(container, LAYER_CLASS).unwrap();
        assert_eq!(doc.style(layer, "pointer-events"), Some("none"));

        let button = doc.query_class(container, REGION_CLASS).unwrap();
        assert_eq!(doc.style(button, "pointer-events"), Some("auto"));
        assert_eq!(doc.style(button, "left"), Some("10%"));
        assert_eq!(doc.style(button, "width"), Some("20%"));
        assert_eq!(doc.attr(button, ACTION_ATTR), Some("go:menu"));
    }

    #[test]
    fn test_region_at_prefers_topmost() {
        let mut doc = Document::with_screens(["play"]);
        let container = doc.screens()[0].1;
        inject_regions(&mut doc, container, &[
            HitRegion::new("go:under", 0.0, 0.0, 50.0, 50.0),
            HitRegion::new("go:over", 10.0, 10.0, 10.0, 10.0),
        ]);

        let hit = region_at(&doc, container, 15.0, 15.0).unwrap();
        assert_eq!(doc.attr(hit, ACTION_ATTR), Some("go:over"));

        let hit = region_at(&doc, container, 40.0, 40.0).unwrap();
        assert_eq!(doc.attr(hit, ACTION_ATTR), Some("go:under"));

        assert!(region_at(&doc, container, 90.0, 90.0).is_none());
    }

    #[test]
    fn test_clear_keeps_layer() {
        let mut doc = Document::with_screens(["play"]);
        let container = doc.screens()[0].1;
        inject_regions(&mut doc, container, &[HitRegion::new("go:menu", 0.0, 0.0, 5.0, 5.0)]);

        clear_regions(&mut doc, container);
        assert!(read_regions(&doc, container).is_empty());
        assert!(doc.query_class(container, LAYER_CLASS).is_some());
    }
}
