use thiserror::Error;

/// Result type for media operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while talking to the media store
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Media store is not configured for this operation: {message}")]
    NotConfigured { message: String },

    #[error("Upload response did not include a secure_url")]
    MissingUrl,

    #[error("Media store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Media store request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Media store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl MediaError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn not_configured<S: Into<String>>(message: S) -> Self {
        Self::NotConfigured {
            message: message.into(),
        }
    }

    pub fn rejected<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}
