use std::collections::HashSet;
use std::sync::Mutex;

use crate::sync::lock;

/// Tracks stylesheets and controllers that were already loaded this run.
///
/// Append-only: entries are never evicted, so loading stays idempotent for the
/// lifetime of the cache. One cache is shared by every navigation of a session.
#[derive(Debug, Default)]
pub struct ResourceCache {
    stylesheets: Mutex<HashSet<String>>,
    controllers: Mutex<HashSet<String>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stylesheet URL. Returns true only the first time it is seen.
    pub fn insert_stylesheet(&self, href: &str) -> bool {
        lock(&self.stylesheets).insert(href.to_string())
    }

    pub fn has_stylesheet(&self, href: &str) -> bool {
        lock(&self.stylesheets).contains(href)
    }

    /// Record a controller as loaded. Returns true only the first time.
    pub fn mark_controller(&self, controller: &str) -> bool {
        lock(&self.controllers).insert(controller.to_string())
    }

    pub fn controller_loaded(&self, controller: &str) -> bool {
        lock(&self.controllers).contains(controller)
    }

    pub fn stylesheet_count(&self) -> usize {
        lock(&self.stylesheets).len()
    }

    pub fn controller_count(&self) -> usize {
        lock(&self.controllers).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stylesheet_recorded_once() {
        let cache = ResourceCache::new();
        assert!(cache.insert_stylesheet("menu.css"));
        assert!(!cache.insert_stylesheet("menu.css"));
        assert!(cache.has_stylesheet("menu.css"));
        assert_eq!(cache.stylesheet_count(), 1);
    }

    #[test]
    fn test_controller_recorded_once() {
        let cache = ResourceCache::new();
        assert!(!cache.controller_loaded("hunt"));
        assert!(cache.mark_controller("hunt"));
        assert!(!cache.mark_controller("hunt"));
        assert!(cache.controller_loaded("hunt"));
        assert_eq!(cache.controller_count(), 1);
    }
}
