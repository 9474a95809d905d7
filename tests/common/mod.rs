//! Shared fixtures: a small game with a menu, a play screen and a settings
//! screen served from memory

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use hitscreen::fetch::MemoryFetcher;
use hitscreen::{Controller, ControllerContext, ControllerRegistry, Registry, Session};

pub const REGISTRY: &str = r#"{
    "start_screen": "menu",
    "screens": {
        "menu": { "css": "styles/menu.css", "hitboxes": "hitboxes/menu.json" },
        "play": { "css": "styles/play.css", "hitboxes": "hitboxes/play.json", "controller": "recorder" },
        "settings": { "css": "styles/menu.css" },
        "broken": { "hitboxes": "hitboxes/broken.json", "controller": "missing" }
    }
}"#;

/// Menu regions: play (10,10), settings (10,40), a malformed action (60,10)
/// and a link to an unknown screen (60,40), each 30x20
pub const MENU_HITBOXES: &str = r#"{
    "hitboxes": [
        { "id": "play", "label": "Play", "action": "go:play", "x": 10, "y": 10, "w": 30, "h": 20 },
        { "id": "settings", "action": "go:settings", "x": 10, "y": 40, "w": 30, "h": 20 },
        { "id": "broken", "action": "go:", "x": 60, "y": 10, "w": 30, "h": 20 },
        { "id": "lost", "action": "go:nowhere", "x": 60, "y": 40, "w": 30, "h": 20 }
    ]
}"#;

pub const PLAY_HITBOXES: &str = r#"{
    "hitboxes": [
        { "id": "back", "action": "go:menu", "x": 0, "y": 0, "w": 20, "h": 20 },
        { "id": "again", "action": "go:play", "x": 80, "y": 0, "w": 20, "h": 20 }
    ]
}"#;

pub fn fetcher() -> Arc<MemoryFetcher> {
    let fetcher = MemoryFetcher::new();
    fetcher
        .insert("hitboxes/menu.json", MENU_HITBOXES)
        .insert("hitboxes/play.json", PLAY_HITBOXES)
        .insert("hitboxes/broken.json", "<!doctype html><title>404</title>");
    Arc::new(fetcher)
}

/// Records how often it was started and for which screen
#[derive(Clone, Default)]
pub struct Recorder {
    pub inits: Arc<AtomicUsize>,
    pub screens: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Controller for Recorder {
    async fn init(&self, ctx: ControllerContext) -> anyhow::Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        self.screens.lock().unwrap().push(ctx.screen_id);
        Ok(())
    }
}

pub fn controllers(recorder: &Recorder) -> ControllerRegistry {
    let mut controllers = ControllerRegistry::with_builtin();
    let recorder = recorder.clone();
    controllers.register_fn("recorder", move || Box::new(recorder.clone()));
    controllers
}

pub fn session_with(fetcher: Arc<MemoryFetcher>, recorder: &Recorder) -> Session {
    let registry = Registry::from_json(REGISTRY).unwrap();
    Session::boot(registry, fetcher, controllers(recorder))
}

pub fn session() -> (Session, Recorder) {
    let recorder = Recorder::default();
    (session_with(fetcher(), &recorder), recorder)
}
