//! Screen manager: the navigation state machine
//!
//! `show` runs the whole transition for one screen:
//! 1. resolve descriptor and container (missing either aborts, nothing changes)
//! 2. deactivate the current screen and clear its regions
//! 3. insert the screen's stylesheet once per run
//! 4. mark the new container active and record it
//! 5. load and inject hit-regions
//! 6. start the screen's controller on the first visit
//! 7. broadcast the transition
//!
//! Steps 1-4 run under one lock with no suspension, so the document never shows
//! two active screens. Steps 5-7 are skipped by a navigation that was overtaken
//! by a newer `show` while it was loading.

use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use crate::cache::ResourceCache;
use crate::controller::{Controller, ControllerContext, ControllerRegistry};
use crate::document::{ACTIVE_CLASS, NodeId, SharedDocument, lock_document};
use crate::events::{ScreenTransition, TransitionBus};
use crate::fetch::ResourceFetcher;
use crate::hitregion::{self, HitRegionLoader};
use crate::input::PointerHooks;
use crate::registry::Registry;
use crate::sync::lock;

/// Result of a single `show` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShowOutcome {
    /// The screen is active with `regions` hit-regions injected
    Shown { screen_id: String, regions: usize },
    /// No registry entry or no container; state untouched
    Missing(String),
    /// A newer navigation started while this one was loading
    Superseded(String),
}

impl ShowOutcome {
    pub fn is_shown(&self) -> bool {
        matches!(self, ShowOutcome::Shown { .. })
    }
}

#[derive(Debug, Default)]
struct NavigationState {
    active: Option<String>,
    /// Bumped by every `show` that gets past validation
    generation: u64,
}

/// Owns the active screen and drives transitions
pub struct ScreenManager {
    registry: Arc<Registry>,
    document: SharedDocument,
    containers: HashMap<String, NodeId>,
    cache: Arc<ResourceCache>,
    loader: HitRegionLoader,
    controllers: Arc<ControllerRegistry>,
    transitions: TransitionBus,
    pointer: PointerHooks,
    state: Mutex<NavigationState>,
    /// Controllers started by this manager, kept alive for the run
    attached: Mutex<Vec<Arc<dyn Controller>>>,
}

/// Builder for [`ScreenManager`]
pub struct ScreenManagerBuilder {
    registry: Arc<Registry>,
    document: SharedDocument,
    fetcher: Arc<dyn ResourceFetcher>,
    cache: Option<Arc<ResourceCache>>,
    controllers: Option<Arc<ControllerRegistry>>,
    transitions: Option<TransitionBus>,
    pointer: Option<PointerHooks>,
}

impl ScreenManagerBuilder {
    /// Share a cache with other managers; a fresh one is created otherwise
    pub fn cache(mut self, cache: Arc<ResourceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn controllers(mut self, controllers: Arc<ControllerRegistry>) -> Self {
        self.controllers = Some(controllers);
        self
    }

    pub fn transitions(mut self, transitions: TransitionBus) -> Self {
        self.transitions = Some(transitions);
        self
    }

    pub fn pointer_hooks(mut self, pointer: PointerHooks) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn build(self) -> ScreenManager {
        let containers: HashMap<String, NodeId> = lock_document(&self.document).screens().into_iter().collect();

        for id in self.registry.screen_ids() {
            if !containers.contains_key(id) {
                log::warn!("Screen '{}' is registered but has no container", id);
            }
        }
        for id in containers.keys() {
            if !self.registry.contains(id) {
                log::debug!("Container '{}' has no registry entry", id);
            }
        }
        log::debug!("Screen manager bound {} containers", containers.len());

        ScreenManager {
            registry: self.registry,
            document: self.document,
            containers,
            cache: self.cache.unwrap_or_default(),
            loader: HitRegionLoader::new(self.fetcher),
            controllers: self.controllers.unwrap_or_default(),
            transitions: self.transitions.unwrap_or_default(),
            pointer: self.pointer.unwrap_or_default(),
            state: Mutex::new(NavigationState::default()),
            attached: Mutex::new(Vec::new()),
        }
    }
}

impl ScreenManager {
    pub fn builder(
        registry: Arc<Registry>,
        document: SharedDocument,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> ScreenManagerBuilder {
        ScreenManagerBuilder {
            registry,
            document,
            fetcher,
            cache: None,
            controllers: None,
            transitions: None,
            pointer: None,
        }
    }

    /// Show `screen_id`. Never fails; problems are logged and degrade the screen.
    pub async fn show(&self, screen_id: &str) -> ShowOutcome {
        let id = screen_id.trim();
        let (Some(descriptor), Some(&container)) = (self.registry.get(id), self.containers.get(id)) else {
            log::warn!("Missing screen: '{}'", id);
            return ShowOutcome::Missing(id.to_string());
        };

        let (generation, previous) = {
            let mut state = lock(&self.state);
            let mut doc = lock_document(&self.document);

            if let Some(&old) = state.active.as_deref().and_then(|old| self.containers.get(old)) {
                doc.remove_class(old, ACTIVE_CLASS);
                hitregion::clear_regions(&mut doc, old);
            }

            if let Some(href) = descriptor.css.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
                if self.cache.insert_stylesheet(href) {
                    doc.insert_stylesheet(href);
                    log::debug!("Inserted stylesheet {}", href);
                } else {
                    log::debug!("Stylesheet {} already loaded", href);
                }
            }

            doc.add_class(container, ACTIVE_CLASS);
            state.generation += 1;
            (state.generation, state.active.replace(id.to_string()))
        };

        let regions = self.loader.load(descriptor.hitboxes.as_deref()).await;

        let injected = {
            let state = lock(&self.state);
            if state.generation != generation {
                log::info!("Navigation to '{}' superseded while loading hitboxes", id);
                return ShowOutcome::Superseded(id.to_string());
            }
            let mut doc = lock_document(&self.document);
            hitregion::inject_regions(&mut doc, container, &regions)
        };
        log::debug!("Injected {} hitboxes into '{}'", injected, id);

        if let Some(controller_id) = descriptor.controller.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            self.attach_controller(controller_id, id, container).await;
        }

        if self.is_superseded(generation) {
            log::info!("Navigation to '{}' superseded while starting its controller", id);
            return ShowOutcome::Superseded(id.to_string());
        }

        log::info!("Showing screen '{}' ({} hitboxes)", id, injected);
        self.transitions.emit(&ScreenTransition {
            screen_id: id.to_string(),
            previous,
        });

        ShowOutcome::Shown {
            screen_id: id.to_string(),
            regions: injected,
        }
    }

    fn is_superseded(&self, generation: u64) -> bool {
        lock(&self.state).generation != generation
    }

    /// Start the controller on its first visit. It counts as loaded whatever the
    /// outcome, so a broken controller is reported once rather than on every visit.
    async fn attach_controller(&self, controller_id: &str, screen_id: &str, container: NodeId) {
        if !self.cache.mark_controller(controller_id) {
            log::debug!("Controller '{}' already loaded", controller_id);
            return;
        }

        let Some(controller) = self.controllers.create(controller_id) else {
            log::warn!("Unknown controller '{}' for screen '{}'", controller_id, screen_id);
            return;
        };
        let controller: Arc<dyn Controller> = Arc::from(controller);

        let ctx = ControllerContext {
            container,
            screen_id: screen_id.to_string(),
            registry: Arc::clone(&self.registry),
            document: Arc::clone(&self.document),
            transitions: self.transitions.clone(),
            pointer: self.pointer.clone(),
        };

        match AssertUnwindSafe(controller.init(ctx)).catch_unwind().await {
            Ok(Ok(())) => log::info!("Controller '{}' started for '{}'", controller_id, screen_id),
            Ok(Err(e)) => log::warn!("Controller '{}' failed to start: {:#}", controller_id, e),
            Err(_) => log::error!("Controller '{}' panicked during init", controller_id),
        }

        lock(&self.attached).push(controller);
    }

    /// Currently active screen
    pub fn get_active(&self) -> Option<String> {
        lock(&self.state).active.clone()
    }

    /// Container element of `screen_id`
    pub fn container(&self, screen_id: &str) -> Option<NodeId> {
        self.containers.get(screen_id).copied()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    pub fn transitions(&self) -> &TransitionBus {
        &self.transitions
    }

    pub fn pointer_hooks(&self) -> &PointerHooks {
        &self.pointer
    }

    /// Number of controllers started so far
    pub fn attached_controllers(&self) -> usize {
        lock(&self.attached).len()
    }
}
