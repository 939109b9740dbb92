pub mod chat;
pub mod dashboard;
pub mod form;
pub mod submission;

pub use chat::{ChatMessage, ChatRelay, LanguageModel, Sender};
pub use dashboard::{Dashboard, DashboardEntry};
pub use form::SubmissionForm;
pub use submission::{FileInput, SubmissionError, SubmissionInput, SubmissionWorkflow};
