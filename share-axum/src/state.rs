use std::sync::Arc;

use share_core::ShareApp;

/// Router state for a mounted service: the app plus the service name.
pub struct ShareAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: Arc<ShareApp<R, P>>,
    pub service: Arc<String>,
}

impl<R, P> Clone for ShareAxumState<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            service: Arc::clone(&self.service),
        }
    }
}
