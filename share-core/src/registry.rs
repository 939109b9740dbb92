use std::collections::HashMap;
use std::sync::Arc;

use crate::ShareService;

/// Maps service names to service instances.
pub struct ShareServiceRegistry<R, P = ()> {
    services: HashMap<String, Arc<dyn ShareService<R, P>>>,
}

impl<R, P> ShareServiceRegistry<R, P> {
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Register a service; a later registration under the same name wins.
    pub fn register<S>(&mut self, name: S, service: Arc<dyn ShareService<R, P>>)
    where
        S: Into<String>,
    {
        self.services.insert(name.into(), service);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ShareService<R, P>>> {
        self.services.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(|s| s.as_str())
    }
}

impl<R, P> Default for ShareServiceRegistry<R, P> {
    fn default() -> Self {
        Self::new()
    }
}
