//! Delegated pointer handling over the root container
//!
//! Hosts translate their native input into [`PointerEvent`]s aimed at an
//! element and hand them to the [`InputDispatcher`]. A tap arrives as a
//! pointer-down followed by a click; the pointer-down on a hit-region is only
//! suppressed, the click carries out the action, so one tap navigates once.

use std::sync::Arc;

use crate::action::{Action, ActionError};
use crate::document::{NodeId, lock_document};
use crate::events::{ListenerHandle, ListenerSet};
use crate::hitregion::{self, ACTION_ATTR, REGION_CLASS};
use crate::router::{RouteOutcome, Router};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Click,
}

/// A pointer activation aimed at an element
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub target: NodeId,
    /// Point in percent of the active screen, when the host knows it
    pub position: Option<(f64, f64)>,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl PointerEvent {
    pub fn new(kind: PointerKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            position: None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Some((x, y));
        self
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Click that landed on the active screen without hitting a region
#[derive(Debug, Clone, PartialEq)]
pub struct PointerPoint {
    pub screen_id: String,
    pub x: f64,
    pub y: f64,
}

pub type PointerHook = dyn Fn(&PointerPoint) -> bool + Send + Sync;

/// Listeners offered clicks that missed every hit-region.
/// The first hook returning true claims the click.
#[derive(Clone, Default)]
pub struct PointerHooks {
    hooks: ListenerSet<PointerHook>,
}

impl PointerHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, hook: F) -> ListenerHandle
    where
        F: Fn(&PointerPoint) -> bool + Send + Sync + 'static,
    {
        self.hooks.add(Arc::new(hook))
    }

    /// Offer `point` to each hook in registration order until one claims it
    pub fn offer(&self, point: &PointerPoint) -> bool {
        self.hooks.snapshot().iter().any(|hook| hook(point))
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// What the dispatcher did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not on a hit-region (or outside the root)
    Ignored,
    /// Pointer-down on a hit-region; the click that follows acts
    Suppressed,
    /// Hit-region action was malformed or used an unknown verb
    Invalid(ActionError),
    /// Hit-region navigation went to the router
    Routed(RouteOutcome),
    /// A controller pointer hook took the click
    Claimed,
}

/// The single delegated listener over the root container
#[derive(Clone)]
pub struct InputDispatcher {
    router: Arc<Router>,
}

impl InputDispatcher {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Element under a point of the active screen: the topmost hit-region there,
    /// else the screen container itself
    pub fn locate(&self, x: f64, y: f64) -> Option<NodeId> {
        let manager = self.router.manager();
        let container = manager.get_active().and_then(|id| manager.container(&id))?;
        let doc = lock_document(manager.document());
        Some(hitregion::region_at(&doc, container, x, y).unwrap_or(container))
    }

    /// Build an event for a point of the active screen
    pub fn pointer_at(&self, kind: PointerKind, x: f64, y: f64) -> Option<PointerEvent> {
        self.locate(x, y).map(|target| PointerEvent::new(kind, target).at(x, y))
    }

    pub async fn handle(&self, event: &mut PointerEvent) -> Dispatch {
        let action = {
            let doc = lock_document(self.router.manager().document());
            if !doc.contains(doc.root(), event.target) {
                return Dispatch::Ignored;
            }
            doc.closest(event.target, REGION_CLASS)
                .map(|region| doc.attr(region, ACTION_ATTR).unwrap_or_default().to_string())
        };

        let Some(action) = action else {
            return self.offer_miss(event);
        };

        event.prevent_default();
        event.stop_propagation();

        if event.kind == PointerKind::Down {
            return Dispatch::Suppressed;
        }

        match Action::parse(&action) {
            Ok(Action::Go(target)) => Dispatch::Routed(self.router.go(&target).await),
            Err(e) => {
                log::warn!("Ignoring hitbox action '{}': {}", action, e);
                Dispatch::Invalid(e)
            }
        }
    }

    fn offer_miss(&self, event: &mut PointerEvent) -> Dispatch {
        let (PointerKind::Click, Some((x, y))) = (event.kind, event.position) else {
            return Dispatch::Ignored;
        };
        let manager = self.router.manager();
        let Some(screen_id) = manager.get_active() else {
            return Dispatch::Ignored;
        };

        if manager.pointer_hooks().offer(&PointerPoint { screen_id, x, y }) {
            event.prevent_default();
            Dispatch::Claimed
        } else {
            Dispatch::Ignored
        }
    }
}
