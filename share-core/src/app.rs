use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::RwLock;

use crate::hooks::collect_method_hooks;
use crate::{
    HookContext, HookResult, ServiceHooks, ServiceMethodKind, ShareAfterHook, ShareBeforeHook,
    ShareConfig, ShareConfigSnapshot, ShareError, ShareErrorHook, ShareService,
    ShareServiceRegistry,
};

struct ShareAppInner<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    registry: RwLock<ShareServiceRegistry<R, P>>,
    global_hooks: RwLock<ServiceHooks<R, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, P>>>,
    config: RwLock<ShareConfig>,
}

/// Central application container.
///
/// Framework-agnostic. Holds:
/// - service registry
/// - app hooks
/// - per-service hooks
/// - config
pub struct ShareApp<R, P = ()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    inner: Arc<ShareAppInner<R, P>>,
}

struct HooksForMethod<R, P> {
    before: Vec<Arc<dyn ShareBeforeHook<R, P>>>,
    after: Vec<Arc<dyn ShareAfterHook<R, P>>>,
    error: Vec<Arc<dyn ShareErrorHook<R, P>>>,
}

impl<R, P> Default for ShareApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> Clone for ShareApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> ShareApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShareAppInner {
                registry: RwLock::new(ShareServiceRegistry::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(ShareConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn ShareService<R, P>>)
    where
        S: Into<String>,
    {
        self.inner.registry.write().register(name, service);
    }

    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.registry.read().names().map(str::to_string).collect();
        names.sort();
        names
    }

    /// Feathers: `app.hooks({ ... })`
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut g = self.inner.global_hooks.write();
        f(&mut g);
    }

    fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut map = self.inner.service_hooks.write();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    /// Feathers: `app.service("name")`
    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        let svc = self
            .inner
            .registry
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ShareError::not_found(format!("Service not found: {name}")).into_anyhow())?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    /// Feathers: `app.set(key, value)`
    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    /// Feathers: `app.get(key)`
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    /// Apply `PREFIX__A__B` environment overrides on top of the current config.
    pub fn load_env(&self, prefix: &str) -> usize {
        self.inner.config.write().load_env(prefix)
    }

    pub fn config_snapshot(&self) -> ShareConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

/// A named service bound to its app, calling through the hook pipeline.
pub struct ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    app: ShareApp<R, P>,
    name: String,
    service: Arc<dyn ShareService<R, P>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    /// Feathers: `app.service("x").hooks({ ... })`
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &Arc<dyn ShareService<R, P>> {
        &self.service
    }

    /// Global hooks first, then the service's own.
    fn collect_hooks_for_method(&self, method: &ServiceMethodKind) -> HooksForMethod<R, P> {
        let g = self.app.inner.global_hooks.read();
        let map = self.app.inner.service_hooks.read();

        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = map.get(&self.name) {
            before.extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            after.extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            error.extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        HooksForMethod { before, after, error }
    }

    fn context(&self, method: ServiceMethodKind, params: P) -> HookContext<R, P> {
        HookContext::new(self.name.clone(), method, params, self.app.config_snapshot())
    }

    /// before → service → after; error hooks run when any stage fails.
    async fn run_pipeline(&self, mut ctx: HookContext<R, P>) -> Result<HookContext<R, P>> {
        let hooks = self.collect_hooks_for_method(&ctx.method);

        if let Err(e) = self.run_stages(&hooks, &mut ctx).await {
            ctx.error = Some(e);

            for h in &hooks.error {
                let _ = h.run(&mut ctx).await;
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    async fn run_stages(&self, hooks: &HooksForMethod<R, P>, ctx: &mut HookContext<R, P>) -> Result<()> {
        for h in &hooks.before {
            h.run(ctx).await?;
        }

        // A before hook may answer the call itself by setting a result.
        if ctx.result.is_none() {
            self.dispatch(ctx).await?;
        }

        for h in &hooks.after {
            h.run(ctx).await?;
        }

        Ok(())
    }

    async fn dispatch(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        match ctx.method {
            ServiceMethodKind::Find => {
                let records = self.service.find(ctx.params.clone()).await?;
                ctx.result = Some(HookResult::Many(records));
            }
            ServiceMethodKind::Get => {
                let id = ctx.id.clone().ok_or_else(|| anyhow!("get() requires an id"))?;
                let record = self.service.get(&id, ctx.params.clone()).await?;
                ctx.result = Some(HookResult::One(record));
            }
            ServiceMethodKind::Create => {
                let data = ctx.data.take().ok_or_else(|| anyhow!("create() requires ctx.data"))?;
                let created = self.service.create(data, ctx.params.clone()).await?;
                ctx.result = Some(HookResult::One(created));
            }
            ServiceMethodKind::Remove => {
                let id = ctx.id.clone();
                let removed = self.service.remove(id.as_deref(), ctx.params.clone()).await?;
                ctx.result = Some(HookResult::One(removed));
            }
        }
        Ok(())
    }

    pub async fn find(&self, params: P) -> Result<Vec<R>> {
        let ctx = self.context(ServiceMethodKind::Find, params);
        let ctx = self.run_pipeline(ctx).await?;

        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(v)) => Ok(vec![v]),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Get, params);
        ctx.id = Some(id.to_string());
        let ctx = self.run_pipeline(ctx).await?;
        one_result("get", ctx.result)
    }

    pub async fn create(&self, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Create, params);
        ctx.data = Some(data);
        let ctx = self.run_pipeline(ctx).await?;
        one_result("create", ctx.result)
    }

    pub async fn remove(&self, id: Option<&str>, params: P) -> Result<R> {
        let mut ctx = self.context(ServiceMethodKind::Remove, params);
        ctx.id = id.map(str::to_string);
        let ctx = self.run_pipeline(ctx).await?;
        one_result("remove", ctx.result)
    }
}

fn one_result<R>(method: &str, result: Option<HookResult<R>>) -> Result<R> {
    match result {
        Some(HookResult::One(v)) => Ok(v),
        Some(HookResult::Many(_)) => Err(anyhow!("{method}() produced HookResult::Many unexpectedly")),
        None => Err(anyhow!("{method}() produced no result")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    struct Echo;

    #[async_trait]
    impl ShareService<Value, ()> for Echo {
        async fn find(&self, _params: ()) -> Result<Vec<Value>> {
            Ok(vec![json!({"n": 1}), json!({"n": 2})])
        }

        async fn create(&self, data: Value, _params: ()) -> Result<Value> {
            Ok(data)
        }

        async fn remove(&self, id: Option<&str>, _params: ()) -> Result<Value> {
            match id {
                Some("missing") => Err(ShareError::not_found("No record").into_anyhow()),
                Some(id) => Ok(json!({"id": id})),
                None => Err(ShareError::bad_request("id required").into_anyhow()),
            }
        }
    }

    struct Trace {
        label: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ShareBeforeHook<Value, ()> for Trace {
        async fn run(&self, ctx: &mut HookContext<Value, ()>) -> Result<()> {
            self.seen.lock().unwrap().push(format!("before:{}:{}", self.label, ctx.method.as_str()));
            Ok(())
        }
    }

    #[async_trait]
    impl ShareAfterHook<Value, ()> for Trace {
        async fn run(&self, ctx: &mut HookContext<Value, ()>) -> Result<()> {
            self.seen.lock().unwrap().push(format!("after:{}:{}", self.label, ctx.method.as_str()));
            Ok(())
        }
    }

    struct RecoverNotFound;

    #[async_trait]
    impl ShareErrorHook<Value, ()> for RecoverNotFound {
        async fn run(&self, ctx: &mut HookContext<Value, ()>) -> Result<()> {
            let is_not_found = ctx
                .error
                .as_ref()
                .and_then(ShareError::from_anyhow)
                .is_some_and(|e| e.kind == crate::ErrorKind::NotFound);
            if is_not_found {
                ctx.error = None;
                ctx.result = Some(HookResult::One(json!({"recovered": true})));
            }
            Ok(())
        }
    }

    struct RejectCreate;

    #[async_trait]
    impl ShareBeforeHook<Value, ()> for RejectCreate {
        async fn run(&self, _ctx: &mut HookContext<Value, ()>) -> Result<()> {
            Err(ShareError::bad_request("rejected").into_anyhow())
        }
    }

    fn app_with_echo() -> ShareApp<Value, ()> {
        let app: ShareApp<Value, ()> = ShareApp::new();
        app.register_service("echo", Arc::new(Echo));
        app
    }

    #[tokio::test]
    async fn global_hooks_run_before_service_hooks() {
        let app = app_with_echo();
        let seen = Arc::new(Mutex::new(Vec::new()));

        app.hooks(|h| {
            h.before_all(Arc::new(Trace { label: "global", seen: Arc::clone(&seen) }));
            h.after_all(Arc::new(Trace { label: "global", seen: Arc::clone(&seen) }));
        });
        app.service("echo").unwrap().hooks(|h| {
            h.before(ServiceMethodKind::Find, Arc::new(Trace { label: "echo", seen: Arc::clone(&seen) }));
        });

        let records = app.service("echo").unwrap().find(()).await.unwrap();
        assert_eq!(records.len(), 2);

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec!["before:global:find", "before:echo:find", "after:global:find"]);
    }

    #[tokio::test]
    async fn failing_before_hook_skips_the_service() {
        let app = app_with_echo();
        let seen = Arc::new(Mutex::new(Vec::new()));
        app.service("echo").unwrap().hooks(|h| {
            h.before_create(Arc::new(RejectCreate));
            h.after_all(Arc::new(Trace { label: "echo", seen: Arc::clone(&seen) }));
        });

        let err = app.service("echo").unwrap().create(json!({"a": 1}), ()).await.unwrap_err();
        assert_eq!(ShareError::from_anyhow(&err).unwrap().message, "rejected");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_hooks_can_recover() {
        let app = app_with_echo();
        app.service("echo").unwrap().hooks(|h| {
            h.error(ServiceMethodKind::Remove, Arc::new(RecoverNotFound));
        });

        let svc = app.service("echo").unwrap();
        assert_eq!(svc.remove(Some("missing"), ()).await.unwrap(), json!({"recovered": true}));
        assert_eq!(svc.remove(Some("a1"), ()).await.unwrap(), json!({"id": "a1"}));
        assert!(svc.remove(None, ()).await.is_err());
    }

    #[tokio::test]
    async fn unimplemented_methods_and_unknown_services_error() {
        let app = app_with_echo();
        let err = app.service("echo").unwrap().get("x", ()).await.unwrap_err();
        assert_eq!(ShareError::from_anyhow(&err).unwrap().code(), 501);

        let err = app.service("nope").err().unwrap();
        assert_eq!(ShareError::from_anyhow(&err).unwrap().code(), 404);
    }
}
