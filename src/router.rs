use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::screen::{ScreenManager, ShowOutcome};

/// Why the router refused a navigation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRejection {
    Empty,
    UnknownScreen(String),
}

/// Result of [`Router::go`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Rejected(RouteRejection),
    Delegated(ShowOutcome),
}

impl RouteOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, RouteOutcome::Rejected(_))
    }
}

/// Validation gate in front of the screen manager.
///
/// The router never touches the document or fires events; it only makes sure
/// malformed or unknown screen ids never reach the stateful manager.
#[derive(Clone)]
pub struct Router {
    manager: Arc<ScreenManager>,
}

impl Router {
    pub fn new(manager: Arc<ScreenManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ScreenManager> {
        &self.manager
    }

    /// Trimmed screen id if the registry knows it
    pub fn validate(&self, screen_id: &str) -> Result<String, RouteRejection> {
        let id = screen_id.trim();
        if id.is_empty() {
            log::warn!("Ignoring navigation to an empty screen id");
            return Err(RouteRejection::Empty);
        }
        if !self.manager.registry().contains(id) {
            log::warn!("Ignoring navigation to unknown screen '{}'", id);
            return Err(RouteRejection::UnknownScreen(id.to_string()));
        }
        Ok(id.to_string())
    }

    /// Validate and show `screen_id`, waiting for the navigation to settle
    pub async fn go(&self, screen_id: &str) -> RouteOutcome {
        match self.validate(screen_id) {
            Ok(id) => RouteOutcome::Delegated(self.manager.show(&id).await),
            Err(rejection) => RouteOutcome::Rejected(rejection),
        }
    }

    /// Validate now and run the navigation in the background
    pub fn spawn_go(&self, screen_id: &str) -> Result<JoinHandle<ShowOutcome>, RouteRejection> {
        let id = self.validate(screen_id)?;
        let manager = Arc::clone(&self.manager);
        Ok(tokio::spawn(async move { manager.show(&id).await }))
    }
}
