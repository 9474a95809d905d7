//! Screen navigation and hit-region runtime
//!
//! Full-viewport screens listed in a [`registry::Registry`] are shown one at a
//! time by the [`screen::ScreenManager`]. Each screen can carry a stylesheet,
//! a document of percentage-sized hit-regions mapped to `go:<screen>` actions,
//! and a controller started on the first visit. Navigation requests go through
//! the [`router::Router`]; pointer input goes through the
//! [`input::InputDispatcher`].

pub mod action;
pub mod cache;
pub mod calibrate;
pub mod config;
pub mod controller;
pub mod controllers;
pub mod document;
pub mod events;
pub mod fetch;
pub mod hitregion;
pub mod input;
pub mod registry;
pub mod router;
pub mod screen;
pub mod session;
mod sync;

pub use action::{Action, ActionError};
pub use controller::{Controller, ControllerContext, ControllerRegistry};
pub use events::{ListenerHandle, ScreenTransition, TransitionBus};
pub use hitregion::HitRegion;
pub use registry::{Registry, ScreenDescriptor};
pub use router::{RouteOutcome, RouteRejection, Router};
pub use screen::{ScreenManager, ShowOutcome};
pub use session::Session;
