//! Startup wiring
//!
//! A [`Session`] owns one document with a container per registered screen and
//! the runtime built on top of it. Hosts keep the session for the lifetime of
//! the program and feed it navigation requests and pointer events.

use std::sync::Arc;

use crate::cache::ResourceCache;
use crate::controller::ControllerRegistry;
use crate::document::{Document, SharedDocument};
use crate::events::TransitionBus;
use crate::fetch::ResourceFetcher;
use crate::input::{Dispatch, InputDispatcher, PointerHooks, PointerKind};
use crate::registry::Registry;
use crate::router::{RouteOutcome, Router};
use crate::screen::ScreenManager;

pub struct Session {
    manager: Arc<ScreenManager>,
    router: Arc<Router>,
    input: InputDispatcher,
}

impl Session {
    pub fn boot(registry: Registry, fetcher: Arc<dyn ResourceFetcher>, controllers: ControllerRegistry) -> Self {
        let document = Document::with_screens(registry.screen_ids()).into_shared();
        log::info!("Booting with {} screens, start screen '{}'", registry.len(), registry.start_screen());

        let manager = Arc::new(
            ScreenManager::builder(Arc::new(registry), document, fetcher)
                .cache(Arc::new(ResourceCache::new()))
                .controllers(Arc::new(controllers))
                .transitions(TransitionBus::new())
                .pointer_hooks(PointerHooks::new())
                .build(),
        );
        let router = Arc::new(Router::new(Arc::clone(&manager)));
        let input = InputDispatcher::new(Arc::clone(&router));

        Self { manager, router, input }
    }

    /// Navigate to the registry's start screen
    pub async fn start(&self) -> RouteOutcome {
        let start = self.manager.registry().start_screen().to_string();
        self.router.go(&start).await
    }

    pub async fn go(&self, screen_id: &str) -> RouteOutcome {
        self.router.go(screen_id).await
    }

    /// Pointer-down then click at a point of the active screen, like a tap.
    /// Returns what the click did.
    pub async fn tap(&self, x: f64, y: f64) -> Dispatch {
        for kind in [PointerKind::Down, PointerKind::Click] {
            let Some(mut event) = self.input.pointer_at(kind, x, y) else {
                return Dispatch::Ignored;
            };
            let dispatch = self.input.handle(&mut event).await;
            if kind == PointerKind::Click {
                return dispatch;
            }
        }
        Dispatch::Ignored
    }

    pub fn active_screen(&self) -> Option<String> {
        self.manager.get_active()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.manager.registry()
    }

    pub fn document(&self) -> &SharedDocument {
        self.manager.document()
    }

    pub fn manager(&self) -> &Arc<ScreenManager> {
        &self.manager
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn input(&self) -> &InputDispatcher {
        &self.input
    }

    pub fn transitions(&self) -> &TransitionBus {
        self.manager.transitions()
    }
}
