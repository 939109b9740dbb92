use anyhow::Result;
use serde_json::Value;
use share_axum::{axum, AxumApp};
use share_core::ShareApp;

use crate::services::ShareParams;

/// App configured from the process environment.
pub fn cloudshare_app() -> Result<AxumApp<Value, ShareParams>> {
    let share_app: ShareApp<Value, ShareParams> = ShareApp::new();
    crate::config::config(&share_app)?;
    crate::hooks::global_hooks(&share_app);
    Ok(axum(share_app))
}

/// App configured from `lookup` alone, without `CLOUDSHARE__*` overrides.
pub fn cloudshare_app_from<F>(lookup: F) -> AxumApp<Value, ShareParams>
where
    F: Fn(&str) -> Option<String>,
{
    let share_app: ShareApp<Value, ShareParams> = ShareApp::new();
    crate::config::config_from(&share_app, lookup);
    crate::hooks::global_hooks(&share_app);
    axum(share_app)
}
