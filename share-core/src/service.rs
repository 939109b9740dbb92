use anyhow::Result;
use async_trait::async_trait;

use crate::errors::ShareError;

/// Standard service methods, Feathers style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// Capabilities describe which methods a service exposes to the outside
/// world. Transport adapters mount only these.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    pub fn all() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Remove],
        }
    }

    pub fn read_only() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }
}

fn not_implemented(method: ServiceMethodKind) -> anyhow::Error {
    ShareError::not_implemented(format!("Method not implemented: {}", method.as_str())).into_anyhow()
}

/// Core service trait:
///
/// - `find`   → list many
/// - `get`    → fetch one by id
/// - `create` → create one
/// - `remove` → delete one
///
/// Every method defaults to a `NotImplemented` error, so a service only
/// overrides what it supports.
#[async_trait]
pub trait ShareService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::all()
    }

    async fn find(&self, _params: P) -> Result<Vec<R>> {
        Err(not_implemented(ServiceMethodKind::Find))
    }

    async fn get(&self, _id: &str, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Get))
    }

    async fn create(&self, _data: R, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Create))
    }

    /// `id` is `None` when the caller addressed the collection itself;
    /// services that only delete single records should reject that.
    async fn remove(&self, _id: Option<&str>, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Remove))
    }
}
