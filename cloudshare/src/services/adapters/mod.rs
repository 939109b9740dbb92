pub mod gemini_adapter;

pub use gemini_adapter::{GeminiAdapter, GeminiConfig};
