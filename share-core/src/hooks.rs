use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::{ServiceMethodKind, ShareConfigSnapshot};

/// Output of a service call as seen by after hooks.
#[derive(Debug, Clone)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
}

/// Context passed to hooks.
///
/// R = record type
/// P = params type (provider, headers, query, ...)
pub struct HookContext<R, P> {
    pub service: String,
    pub method: ServiceMethodKind,
    pub id: Option<String>,
    pub params: P,
    /// Input payload (create).
    pub data: Option<R>,
    /// Output, filled by the service before after hooks run.
    pub result: Option<HookResult<R>>,
    /// Failure, visible to error hooks. Clearing it (and setting `result`)
    /// recovers the call.
    pub error: Option<anyhow::Error>,
    pub config: ShareConfigSnapshot,
}

impl<R, P> HookContext<R, P> {
    pub fn new(
        service: impl Into<String>,
        method: ServiceMethodKind,
        params: P,
        config: ShareConfigSnapshot,
    ) -> Self {
        Self {
            service: service.into(),
            method,
            id: None,
            params,
            data: None,
            result: None,
            error: None,
            config,
        }
    }
}

#[async_trait]
pub trait ShareBeforeHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait ShareAfterHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait ShareErrorHook<R, P>: Send + Sync {
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

type ByMethod<T> = HashMap<ServiceMethodKind, Vec<T>>;

/// Hook registrations for the whole app or for one service.
pub struct ServiceHooks<R, P> {
    pub before_all: Vec<Arc<dyn ShareBeforeHook<R, P>>>,
    pub before_by_method: ByMethod<Arc<dyn ShareBeforeHook<R, P>>>,
    pub after_all: Vec<Arc<dyn ShareAfterHook<R, P>>>,
    pub after_by_method: ByMethod<Arc<dyn ShareAfterHook<R, P>>>,
    pub error_all: Vec<Arc<dyn ShareErrorHook<R, P>>>,
    pub error_by_method: ByMethod<Arc<dyn ShareErrorHook<R, P>>>,
}

impl<R, P> Default for ServiceHooks<R, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> ServiceHooks<R, P> {
    pub fn new() -> Self {
        Self {
            before_all: Vec::new(),
            before_by_method: HashMap::new(),
            after_all: Vec::new(),
            after_by_method: HashMap::new(),
            error_all: Vec::new(),
            error_by_method: HashMap::new(),
        }
    }

    pub fn before_all(&mut self, hook: Arc<dyn ShareBeforeHook<R, P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn ShareBeforeHook<R, P>>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_create(&mut self, hook: Arc<dyn ShareBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Create, hook)
    }

    pub fn before_remove(&mut self, hook: Arc<dyn ShareBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Remove, hook)
    }

    pub fn after_all(&mut self, hook: Arc<dyn ShareAfterHook<R, P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: Arc<dyn ShareAfterHook<R, P>>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after_find(&mut self, hook: Arc<dyn ShareAfterHook<R, P>>) -> &mut Self {
        self.after(ServiceMethodKind::Find, hook)
    }

    pub fn error_all(&mut self, hook: Arc<dyn ShareErrorHook<R, P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn error(&mut self, method: ServiceMethodKind, hook: Arc<dyn ShareErrorHook<R, P>>) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }
}

/// `*_all` hooks first, then the ones registered for `method`.
pub(crate) fn collect_method_hooks<T: Clone>(
    all: &[T],
    by_method: &ByMethod<T>,
    method: &ServiceMethodKind,
) -> Vec<T> {
    let mut out = all.to_vec();
    if let Some(specific) = by_method.get(method) {
        out.extend(specific.iter().cloned());
    }
    out
}
