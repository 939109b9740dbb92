pub mod submissions_hooks;
pub mod submissions_service;
pub mod submissions_shared;

pub use submissions_service::SubmissionsService;
