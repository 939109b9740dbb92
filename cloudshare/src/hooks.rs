use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use share_core::{HookContext, ShareAfterHook, ShareApp, ShareBeforeHook, ShareError, ShareErrorHook};

use crate::services::ShareParams;

pub struct LogBefore;

#[async_trait]
impl ShareBeforeHook<Value, ShareParams> for LogBefore {
    async fn run(&self, ctx: &mut HookContext<Value, ShareParams>) -> Result<()> {
        tracing::debug!(
            service = %ctx.service,
            method = ctx.method.as_str(),
            http_method = %ctx.params.method,
            path = %ctx.params.path,
            provider = %ctx.params.provider,
            "service call"
        );
        Ok(())
    }
}

pub struct LogAfter;

#[async_trait]
impl ShareAfterHook<Value, ShareParams> for LogAfter {
    async fn run(&self, ctx: &mut HookContext<Value, ShareParams>) -> Result<()> {
        tracing::info!(service = %ctx.service, method = ctx.method.as_str(), id = ?ctx.id, "service call ok");
        Ok(())
    }
}

pub struct LogError;

#[async_trait]
impl ShareErrorHook<Value, ShareParams> for LogError {
    async fn run(&self, ctx: &mut HookContext<Value, ShareParams>) -> Result<()> {
        if let Some(err) = &ctx.error {
            let code = ShareError::from_anyhow(err).map_or(500, ShareError::code);
            if code >= 500 {
                tracing::error!(service = %ctx.service, method = ctx.method.as_str(), code, error = %err, "service call failed");
            } else {
                tracing::info!(service = %ctx.service, method = ctx.method.as_str(), code, error = %err, "service call rejected");
            }
        }
        Ok(())
    }
}

pub fn global_hooks(app: &ShareApp<Value, ShareParams>) {
    app.hooks(|h| {
        h.before_all(Arc::new(LogBefore));
        h.after_all(Arc::new(LogAfter));
        h.error_all(Arc::new(LogError));
    });
}
