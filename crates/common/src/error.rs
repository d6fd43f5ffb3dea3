//! Error types shared across touchdv crates.

/// Top-level error type for touchdv operations.
#[derive(Debug, thiserror::Error)]
pub enum TouchdvError {
    #[error("Touch device error: {message}")]
    Device { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error(transparent)]
    InvalidConfig(#[from] touchdv_touch_model::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using TouchdvError.
pub type TouchdvResult<T> = Result<T, TouchdvError>;

impl TouchdvError {
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device {
            message: msg.into(),
        }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: msg.into(),
        }
    }
}
