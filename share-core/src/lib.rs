//! share-core: transport-agnostic service layer for CloudShare.
//!
//! Services are registered on a [`ShareApp`] under a name and called through a
//! [`ServiceHandle`], which runs the before/after/error hook pipeline around
//! every call.

pub mod app;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod registry;
pub mod service;

pub use app::{ServiceHandle, ShareApp};
pub use config::{ShareConfig, ShareConfigSnapshot};
pub use errors::{ErrorKind, ShareError, ShareResult};
pub use hooks::{
    HookContext, HookResult, ServiceHooks, ShareAfterHook, ShareBeforeHook, ShareErrorHook,
};
pub use registry::ShareServiceRegistry;
pub use service::{ServiceCapabilities, ServiceMethodKind, ShareService};
