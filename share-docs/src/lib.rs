//! share-docs: document store clients.
//!
//! [`DocumentStore`] is the create/list/get/delete surface the app needs from
//! a hosted schemaless database. [`FirestoreStore`] talks to the Firestore
//! REST API; [`MemoryDocumentStore`] keeps everything in process.

mod document;
mod error;
mod firestore;
mod memory;
mod store;
pub mod value;

pub use document::{Document, NewDocument};
pub use error::{DocumentError, DocumentResult};
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::MemoryDocumentStore;
pub use store::DocumentStore;
