//! share-axum: Axum adapter for share-core.
//!
//! Mounts share-core services as REST routes and carries the HTTP plumbing
//! shared by every router of the app (request ids, tracing, CORS, error
//! responses, multipart bodies).

pub mod app;
pub mod middlewares;
pub mod params;
pub mod rest;
pub mod state;
mod error;
pub use error::ShareAxumError;
pub use state::ShareAxumState;

pub use app::{axum, AxumApp};
