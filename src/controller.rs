//! Per-screen controller contract and the factory registry
//!
//! A registry entry names a controller by identifier; the identifier is looked
//! up in a [`ControllerRegistry`] populated at startup. Controllers are created
//! and started at most once per run, on the first visit to their screen, and
//! are expected to manage their own teardown through the transition broadcast.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::controllers::HuntController;
use crate::document::{NodeId, SharedDocument};
use crate::events::TransitionBus;
use crate::input::PointerHooks;
use crate::registry::Registry;

/// Everything a controller receives when it is started
#[derive(Clone)]
pub struct ControllerContext {
    /// Container element of the controller's screen
    pub container: NodeId,
    pub screen_id: String,
    pub registry: Arc<Registry>,
    pub document: SharedDocument,
    /// Subscribe here to learn when the screen stops being active
    pub transitions: TransitionBus,
    /// Clicks that miss every hit-region are offered here
    pub pointer: PointerHooks,
}

/// Behavior attached to a screen
#[async_trait]
pub trait Controller: Send + Sync {
    /// Entry point, invoked once per run. Errors are logged and never retried.
    async fn init(&self, ctx: ControllerContext) -> Result<()>;
}

/// Creates controller instances (factory pattern for lazy creation)
pub trait ControllerFactory: Send + Sync {
    fn create(&self) -> Box<dyn Controller>;
}

impl<C: Controller + Default + 'static> ControllerFactory for PhantomData<C> {
    fn create(&self) -> Box<dyn Controller> {
        Box::new(C::default())
    }
}

struct FnFactory<F>(F);

impl<F> ControllerFactory for FnFactory<F>
where
    F: Fn() -> Box<dyn Controller> + Send + Sync,
{
    fn create(&self) -> Box<dyn Controller> {
        (self.0)()
    }
}

/// Maps controller identifiers to factories
#[derive(Default)]
pub struct ControllerRegistry {
    factories: HashMap<String, Box<dyn ControllerFactory>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every controller shipped in this crate
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register::<HuntController>(HuntController::ID);
        registry
    }

    /// Register a default-constructible controller type
    pub fn register<C: Controller + Default + 'static>(&mut self, id: &str) -> &mut Self {
        self.insert(id, Box::new(PhantomData::<C>))
    }

    /// Register a closure that builds the controller
    pub fn register_fn<F>(&mut self, id: &str, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Controller> + Send + Sync + 'static,
    {
        self.insert(id, Box::new(FnFactory(factory)))
    }

    fn insert(&mut self, id: &str, factory: Box<dyn ControllerFactory>) -> &mut Self {
        if self.factories.insert(id.to_string(), factory).is_some() {
            log::warn!("Controller '{}' registered twice; keeping the last factory", id);
        }
        self
    }

    /// Fresh controller instance for `id`
    pub fn create(&self, id: &str) -> Option<Box<dyn Controller>> {
        self.factories.get(id).map(|factory| factory.create())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
