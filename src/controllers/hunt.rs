//! Hunt screen controller
//!
//! Runs a [`TargetRunner`] while its screen is active and tears it down as soon
//! as any other screen is shown. Targets are mirrored into the document as
//! elements on a dedicated layer; clicks that miss every hit-region are offered
//! to the runner as shots.

use anyhow::{Result, bail};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::target_runner::{DEFAULT_SPAWN_EVERY_MS, RunnerEvent, TargetRunner};
use crate::controller::{Controller, ControllerContext};
use crate::document::{ACTIVE_CLASS, Document, NodeId, SharedDocument, lock_document};
use crate::events::ListenerHandle;
use crate::hitregion::format_percent;
use crate::sync::lock;

pub const TARGETS_LAYER_CLASS: &str = "layer-targets";
pub const TARGET_CLASS: &str = "hunt-target";
pub const KIND_ATTR: &str = "data-kind";

const DEFAULT_TICK: Duration = Duration::from_millis(16);

/// A target element as found in the document
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMarker {
    pub node: NodeId,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl TargetMarker {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.size / 2.0, self.y + self.size / 2.0)
    }
}

/// Target elements inside `container`. Positions may lie outside 0..=100 while
/// a target enters or leaves the screen.
pub fn read_targets(doc: &Document, container: NodeId) -> Vec<TargetMarker> {
    let number = |node, property| {
        doc.style(node, property)
            .and_then(|v| v.trim_end_matches('%').parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    doc.query_all_class(container, TARGET_CLASS)
        .into_iter()
        .map(|node| TargetMarker {
            node,
            kind: doc.attr(node, KIND_ATTR).unwrap_or_default().to_string(),
            x: number(node, "left"),
            y: number(node, "top"),
            size: number(node, "width"),
        })
        .collect()
}

fn ensure_targets_layer(doc: &mut Document, container: NodeId) -> NodeId {
    if let Some(layer) = doc.query_class(container, TARGETS_LAYER_CLASS) {
        return layer;
    }
    let layer = doc.create_element("div");
    doc.add_class(layer, "layer");
    doc.add_class(layer, TARGETS_LAYER_CLASS);
    doc.set_attr(layer, "data-vc-created", "1");
    doc.set_style(layer, "position", "absolute");
    doc.set_style(layer, "inset", "0");
    doc.set_style(layer, "pointer-events", "none");
    doc.append_child(container, layer);
    layer
}

pub struct HuntController {
    tick: Duration,
    spawn_every_ms: u64,
    seed: Option<u64>,
    hunt: OnceCell<Arc<Hunt>>,
    handles: Mutex<Vec<ListenerHandle>>,
}

impl Default for HuntController {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            spawn_every_ms: DEFAULT_SPAWN_EVERY_MS,
            seed: None,
            hunt: OnceCell::new(),
            handles: Mutex::new(Vec::new()),
        }
    }
}

impl HuntController {
    pub const ID: &'static str = "hunt";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn with_spawn_every(mut self, ms: u64) -> Self {
        self.spawn_every_ms = ms;
        self
    }

    /// Fix the runner's random source
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn is_running(&self) -> bool {
        self.hunt.get().is_some_and(|h| h.is_running())
    }

    /// Hits and misses over the whole run
    pub fn tally(&self) -> (u32, u32) {
        self.hunt.get().map(|h| h.tally()).unwrap_or_default()
    }
}

#[async_trait]
impl Controller for HuntController {
    async fn init(&self, ctx: ControllerContext) -> Result<()> {
        let (layer, active) = {
            let mut doc = lock_document(&ctx.document);
            (ensure_targets_layer(&mut doc, ctx.container), doc.has_class(ctx.container, ACTIVE_CLASS))
        };

        let hunt = Arc::new(Hunt {
            screen_id: ctx.screen_id.clone(),
            layer,
            document: Arc::clone(&ctx.document),
            tick: self.tick,
            spawn_every_ms: self.spawn_every_ms,
            seed: self.seed,
            play: Mutex::new(Play::default()),
        });
        if self.hunt.set(Arc::clone(&hunt)).is_err() {
            bail!("hunt controller for '{}' initialized twice", ctx.screen_id);
        }

        let on_transition = {
            let hunt = Arc::downgrade(&hunt);
            ctx.transitions.subscribe(move |transition| {
                let Some(hunt) = hunt.upgrade() else { return };
                if transition.screen_id == hunt.screen_id {
                    hunt.start();
                } else {
                    hunt.stop();
                }
            })
        };
        let on_pointer = {
            let hunt = Arc::downgrade(&hunt);
            ctx.pointer.register(move |point| {
                hunt.upgrade()
                    .is_some_and(|h| point.screen_id == h.screen_id && h.shoot(point.x, point.y))
            })
        };
        lock(&self.handles).extend([on_transition, on_pointer]);

        if active {
            hunt.start();
        }
        Ok(())
    }
}

impl Drop for HuntController {
    fn drop(&mut self) {
        if let Some(hunt) = self.hunt.get() {
            hunt.stop();
        }
    }
}

#[derive(Default)]
struct Play {
    runner: Option<TargetRunner>,
    ticker: Option<JoinHandle<()>>,
    sprite: Option<NodeId>,
    hits: u32,
    misses: u32,
}

/// State shared between the controller, its listeners and the ticker task.
/// Lock order: `play`, then the document.
struct Hunt {
    screen_id: String,
    layer: NodeId,
    document: SharedDocument,
    tick: Duration,
    spawn_every_ms: u64,
    seed: Option<u64>,
    play: Mutex<Play>,
}

impl Hunt {
    fn is_running(&self) -> bool {
        lock(&self.play).runner.is_some()
    }

    fn tally(&self) -> (u32, u32) {
        let play = lock(&self.play);
        (play.hits, play.misses)
    }

    fn start(self: &Arc<Self>) {
        let mut play = lock(&self.play);
        if play.runner.is_some() {
            return;
        }

        let mut runner = match self.seed {
            Some(seed) => TargetRunner::seeded(seed),
            None => TargetRunner::new(),
        };
        runner.set_spawn_every(self.spawn_every_ms);
        play.runner = Some(runner);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => play.ticker = Some(handle.spawn(Self::run(Arc::downgrade(self), self.tick))),
            Err(_) => log::warn!("No async runtime; hunt on '{}' will not tick", self.screen_id),
        }
        log::info!("Hunt started on '{}'", self.screen_id);
    }

    fn stop(&self) {
        let mut play = lock(&self.play);
        if play.runner.take().is_none() {
            return;
        }
        if let Some(ticker) = play.ticker.take() {
            ticker.abort();
        }
        if let Some(sprite) = play.sprite.take() {
            lock_document(&self.document).remove(sprite);
        }
        log::info!("Hunt stopped on '{}' ({} hits, {} misses)", self.screen_id, play.hits, play.misses);
    }

    async fn run(weak: Weak<Hunt>, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = Instant::now();

        loop {
            interval.tick().await;
            let Some(hunt) = weak.upgrade() else { break };
            let now = Instant::now();
            if !hunt.step(now - last) {
                break;
            }
            last = now;
        }
    }

    /// Advance one frame; false once the hunt is no longer running
    fn step(&self, elapsed: Duration) -> bool {
        let mut play = lock(&self.play);
        let Some(runner) = play.runner.as_mut() else {
            return false;
        };

        match runner.tick(elapsed) {
            Some(RunnerEvent::Spawned(kind)) => log::debug!("[hunt] {} spawned", kind),
            Some(RunnerEvent::Missed(kind)) => {
                log::info!("[hunt] miss ({})", kind);
                play.misses += 1;
            }
            _ => {}
        }
        self.sync_sprite(&mut play);
        true
    }

    /// Shot at a point of the hunt screen; true when it hit the live target
    fn shoot(&self, x: f64, y: f64) -> bool {
        let mut play = lock(&self.play);
        let Some(RunnerEvent::Hit(kind)) = play.runner.as_mut().and_then(|r| r.hit(x, y)) else {
            return false;
        };
        play.hits += 1;
        log::info!("[hunt] score +1 ({})", kind);
        self.sync_sprite(&mut play);
        true
    }

    /// Mirror the runner's live target into the document
    fn sync_sprite(&self, play: &mut Play) {
        let Play { runner, sprite, .. } = play;
        let mut doc = lock_document(&self.document);

        let Some(target) = runner.as_ref().and_then(TargetRunner::target) else {
            if let Some(node) = sprite.take() {
                doc.remove(node);
            }
            return;
        };

        let node = *sprite.get_or_insert_with(|| {
            let node = doc.create_element("img");
            doc.add_class(node, TARGET_CLASS);
            doc.set_attr(node, "alt", "");
            doc.set_style(node, "position", "absolute");
            doc.set_style(node, "pointer-events", "auto");
            doc.append_child(self.layer, node);
            node
        });
        doc.set_attr(node, KIND_ATTR, target.kind.as_str());
        doc.set_attr(node, "src", target.sprite());
        doc.set_style(node, "left", format_percent(target.x));
        doc.set_style(node, "top", format_percent(target.y));
        doc.set_style(node, "width", format_percent(target.size));
        doc.set_style(node, "height", format_percent(target.size));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunt(doc: &SharedDocument, container: NodeId) -> Arc<Hunt> {
        let layer = ensure_targets_layer(&mut lock_document(doc), container);
        Arc::new(Hunt {
            screen_id: "hunt".to_string(),
            layer,
            document: Arc::clone(doc),
            tick: DEFAULT_TICK,
            spawn_every_ms: 200,
            seed: Some(9),
            play: Mutex::new(Play::default()),
        })
    }

    fn frames(hunt: &Hunt, n: usize) {
        for _ in 0..n {
            hunt.step(Duration::from_millis(50));
        }
    }

    #[test]
    fn test_targets_layer_is_reused() {
        let mut doc = Document::with_screens(["hunt"]);
        let container = doc.screens()[0].1;
        let first = ensure_targets_layer(&mut doc, container);
        assert_eq!(ensure_targets_layer(&mut doc, container), first);
        assert_eq!(doc.style(first, "pointer-events"), Some("none"));
    }

    #[test]
    fn test_sprite_follows_runner() {
        let doc = Document::with_screens(["hunt"]).into_shared();
        let container = lock_document(&doc).screens()[0].1;
        let hunt = hunt(&doc, container);

        hunt.start();
        assert!(hunt.is_running());
        frames(&hunt, 4);

        let targets = read_targets(&lock_document(&doc), container);
        assert_eq!(targets.len(), 1);
        assert!(!targets[0].kind.is_empty());

        hunt.stop();
        assert!(!hunt.is_running());
        assert!(read_targets(&lock_document(&doc), container).is_empty());
    }

    #[test]
    fn test_shoot_hits_live_target() {
        let doc = Document::with_screens(["hunt"]).into_shared();
        let container = lock_document(&doc).screens()[0].1;
        let hunt = hunt(&doc, container);

        hunt.start();
        frames(&hunt, 4);
        let (x, y) = read_targets(&lock_document(&doc), container)[0].center();

        assert!(!hunt.shoot(-40.0, -40.0));
        assert!(hunt.shoot(x, y));
        assert_eq!(hunt.tally(), (1, 0));
        assert!(read_targets(&lock_document(&doc), container).is_empty());
    }

    #[test]
    fn test_stopped_hunt_ignores_shots_and_ticks() {
        let doc = Document::with_screens(["hunt"]).into_shared();
        let container = lock_document(&doc).screens()[0].1;
        let hunt = hunt(&doc, container);

        assert!(!hunt.step(Duration::from_millis(50)));
        assert!(!hunt.shoot(50.0, 50.0));
    }
}
