//! # share-media
//!
//! Clients for the hosted media store that keeps submitted files.
//!
//! - [`MediaStore`]: upload bytes, get back a durable `secure_url`; destroy by public id
//! - [`CloudinaryStore`]: Cloudinary-style REST implementation over `reqwest`
//! - [`MemoryMediaStore`]: in-process implementation for local runs and tests

mod cloudinary;
mod config;
mod error;
mod memory;
mod store;

pub use cloudinary::{sign_params, CloudinaryStore};
pub use config::CloudinaryConfig;
pub use error::{MediaError, MediaResult};
pub use memory::MemoryMediaStore;
pub use store::{MediaStore, MediaUpload, UploadReceipt};
