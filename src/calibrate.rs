//! Hit-region calibrator
//!
//! Developer overlay for authoring region documents: drag a rectangle over the
//! active screen, read it back in percent, preview it on an existing region and
//! export a JSON entry ready to paste into the screen's hitboxes file. The host
//! feeds pointer positions in its own units together with the screen rectangle.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::document::{NodeId, lock_document};
use crate::events::{ListenerHandle, ScreenTransition};
use crate::hitregion::{self, HitRegion, LABEL_ATTR};
use crate::screen::ScreenManager;

pub const DEFAULT_SNIPPET_ID: &str = "new_hitbox";
pub const DEFAULT_SNIPPET_ACTION: &str = "go:TARGET_SCREEN";

/// Rectangle in host units (terminal cells, pixels, ...)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }
}

/// Rectangle in percent of the screen
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Percent {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clamp_round(value: f64) -> f64 {
    if value.is_finite() { round2(value.clamp(0.0, 100.0)) } else { 0.0 }
}

/// Convert `rect` to percentages of `screen`, clamped to 0..=100 and rounded to
/// two decimals
pub fn rect_to_percent(rect: Rect, screen: Rect) -> Percent {
    if screen.width <= 0.0 || screen.height <= 0.0 {
        return Percent::default();
    }
    Percent {
        x: clamp_round((rect.left - screen.left) / screen.width * 100.0),
        y: clamp_round((rect.top - screen.top) / screen.height * 100.0),
        w: clamp_round(rect.width / screen.width * 100.0),
        h: clamp_round(rect.height / screen.height * 100.0),
    }
}

/// One entry of a hitboxes document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snippet {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub action: String,
    pub label: String,
}

impl Snippet {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Region of the active screen the calibrator can select
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTarget {
    pub node: NodeId,
    /// Hitbox id, else its label
    pub key: String,
    pub label: Option<String>,
    pub region: HitRegion,
}

pub struct Calibrator {
    manager: Arc<ScreenManager>,
    draw_mode: bool,
    drag_start: Option<(f64, f64)>,
    drawn: Option<Rect>,
    last: Percent,
    targets: Vec<CalibrationTarget>,
    selected: Option<usize>,
    note: String,
    transitions: mpsc::UnboundedReceiver<ScreenTransition>,
    _subscription: ListenerHandle,
}

impl Calibrator {
    pub fn new(manager: Arc<ScreenManager>) -> Self {
        let (subscription, transitions) = manager.transitions().subscribe_channel();
        let mut calibrator = Self {
            manager,
            draw_mode: false,
            drag_start: None,
            drawn: None,
            last: Percent::default(),
            targets: Vec::new(),
            selected: None,
            note: "Turn draw mode on and drag a rectangle on the screen.".to_string(),
            transitions,
            _subscription: subscription,
        };
        calibrator.refresh();
        calibrator
    }

    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    pub fn set_draw_mode(&mut self, on: bool) {
        self.draw_mode = on;
        if !on {
            self.drag_start = None;
        }
        self.note = if on { "Draw mode on." } else { "Draw mode off." }.to_string();
    }

    pub fn toggle_draw(&mut self) {
        self.set_draw_mode(!self.draw_mode);
    }

    /// Start a drag. Ignored outside draw mode or outside the screen.
    pub fn pointer_down(&mut self, x: f64, y: f64, screen: Rect) -> bool {
        if !self.draw_mode || !screen.contains(x, y) {
            return false;
        }
        self.drag_start = Some((x, y));
        true
    }

    /// Extend the current drag; the pointer is clamped to the screen
    pub fn pointer_move(&mut self, x: f64, y: f64, screen: Rect) -> Option<Percent> {
        if !self.draw_mode {
            return None;
        }
        let (sx, sy) = self.drag_start?;
        let cx = x.clamp(screen.left, screen.right());
        let cy = y.clamp(screen.top, screen.bottom());

        let rect = Rect::new(sx.min(cx), sy.min(cy), (cx - sx).abs(), (cy - sy).abs());
        self.drawn = Some(rect);
        self.last = rect_to_percent(rect, screen);
        Some(self.last)
    }

    pub fn pointer_up(&mut self) -> bool {
        self.draw_mode && self.drag_start.take().is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_start.is_some()
    }

    /// Last drawn rectangle in host units
    pub fn drawn(&self) -> Option<Rect> {
        self.drawn
    }

    pub fn percent(&self) -> Percent {
        self.last
    }

    pub fn clear(&mut self) {
        self.drawn = None;
        self.drag_start = None;
        self.last = Percent::default();
        self.note = "Cleared. Turn draw mode on and drag a new rectangle.".to_string();
    }

    /// Re-read the active screen's regions, keeping the selection when it still exists
    pub fn refresh(&mut self) {
        let selected_key = self.selected_target().map(|t| t.key.clone());
        self.targets = self.read_targets();
        self.selected = selected_key.and_then(|key| self.targets.iter().position(|t| t.key == key));
    }

    /// Apply pending transitions; true when the region list was refreshed
    pub fn poll_transitions(&mut self) -> bool {
        let mut changed = false;
        while let Ok(transition) = self.transitions.try_recv() {
            log::debug!("Calibrator refreshing for '{}'", transition.screen_id);
            changed = true;
        }
        if changed {
            self.refresh();
            self.note = "Refreshed hitbox list for the active screen.".to_string();
        }
        changed
    }

    fn read_targets(&self) -> Vec<CalibrationTarget> {
        let Some(container) = self.manager.get_active().and_then(|id| self.manager.container(&id)) else {
            return Vec::new();
        };
        let doc = lock_document(self.manager.document());
        hitregion::read_regions(&doc, container)
            .into_iter()
            .map(|(node, region)| {
                let label = doc.attr(node, LABEL_ATTR).map(str::to_string);
                let key = region
                    .id
                    .clone()
                    .or_else(|| label.clone())
                    .map(|k| k.trim().to_string())
                    .unwrap_or_default();
                CalibrationTarget { node, key, label, region }
            })
            .collect()
    }

    pub fn targets(&self) -> &[CalibrationTarget] {
        &self.targets
    }

    pub fn selected_target(&self) -> Option<&CalibrationTarget> {
        self.selected.and_then(|i| self.targets.get(i))
    }

    /// Select a region by id (or label); an empty key clears the selection
    pub fn select(&mut self, key: &str) -> bool {
        let key = key.trim();
        self.selected = if key.is_empty() {
            None
        } else {
            self.targets.iter().position(|t| t.key == key)
        };
        self.note = self.selection_note();
        self.selected.is_some()
    }

    /// Move the selection to the next region, wrapping through "none"
    pub fn select_next(&mut self) {
        self.selected = match self.selected {
            None if !self.targets.is_empty() => Some(0),
            Some(i) if i + 1 < self.targets.len() => Some(i + 1),
            _ => None,
        };
        self.note = self.selection_note();
    }

    fn selection_note(&self) -> String {
        match self.selected_target() {
            Some(t) => format!(
                "Selected hitbox \"{}\". Current: x={}, y={}, w={}, h={}.",
                t.key,
                round2(t.region.x),
                round2(t.region.y),
                round2(t.region.w),
                round2(t.region.h)
            ),
            None => "No hitbox selected.".to_string(),
        }
    }

    /// Restyle the selected region with the drawn percentages. Visual only;
    /// the region document is untouched.
    pub fn preview(&mut self) -> bool {
        let Some(node) = self.selected_target().map(|t| t.node) else {
            self.note = "Select a hitbox first, then preview.".to_string();
            return false;
        };
        if self.drawn.is_none() {
            self.note = "Draw a rectangle first, then preview.".to_string();
            return false;
        }

        let p = self.last;
        hitregion::restyle_region(&mut lock_document(self.manager.document()), node, p.x, p.y, p.w, p.h);
        self.refresh();
        self.note = "Preview applied to selected hitbox (visual only). Copy JSON to persist.".to_string();
        true
    }

    /// Entry for the drawn rectangle, named after the selected region if any
    pub fn snippet(&mut self) -> Option<Snippet> {
        if self.drawn.is_none() {
            self.note = "Draw a rectangle first, then copy JSON.".to_string();
            return None;
        }

        let selected = self.selected_target();
        let id = selected
            .map(|t| t.key.clone())
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| DEFAULT_SNIPPET_ID.to_string());
        let action = selected
            .map(|t| t.region.action.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_SNIPPET_ACTION.to_string());
        let label = selected
            .and_then(|t| t.label.clone())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| id.clone());

        let p = self.last;
        self.note = "Copied JSON. Paste it into the screen's hitboxes file.".to_string();
        Some(Snippet { id, x: p.x, y: p.y, w: p.w, h: p.h, action, label })
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}
