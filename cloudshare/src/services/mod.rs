use std::sync::Arc;

use serde_json::Value;
use share_core::{ShareApp, ShareService};

pub mod adapters;
pub mod submissions;
pub mod types;

pub use types::{CloudShareState, ShareParams};

pub struct CloudShareServices {
    pub submissions: Arc<dyn ShareService<Value, ShareParams>>,
}

/// Services are registered when they are mounted; see [`register_hooks`].
pub fn configure(state: Arc<CloudShareState>) -> CloudShareServices {
    let submissions: Arc<dyn ShareService<Value, ShareParams>> =
        Arc::new(submissions::SubmissionsService::new(state));
    CloudShareServices { submissions }
}

/// Runs after mounting, since hooks attach to registered services.
pub fn register_hooks(app: &ShareApp<Value, ShareParams>) -> anyhow::Result<()> {
    submissions::submissions_shared::register_hooks(app)
}
