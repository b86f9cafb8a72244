use thiserror::Error;

/// All error types for grawk
#[derive(Error, Debug)]
pub enum Error {
    #[error("regex error at byte {position}: {message}")]
    Regex { message: String, position: usize },

    #[error("pattern too long: {len} bytes (limit {limit})")]
    PatternTooLong { len: usize, limit: usize },

    #[error("field separator too long: {len} bytes (limit {limit})")]
    FieldSepTooLong { len: usize, limit: usize },

    #[error("input too large for GPU dispatch: {size} bytes (limit {limit})")]
    InputTooLarge { size: usize, limit: usize },

    #[error("GPU unavailable: {message}")]
    GpuUnavailable { message: String },

    #[error("GPU dispatch failed: {message}")]
    GpuDispatch { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn regex(message: impl Into<String>, position: usize) -> Self {
        Self::Regex {
            message: message.into(),
            position,
        }
    }

    pub fn gpu_unavailable(message: impl Into<String>) -> Self {
        Self::GpuUnavailable {
            message: message.into(),
        }
    }

    pub fn gpu_dispatch(message: impl Into<String>) -> Self {
        Self::GpuDispatch {
            message: message.into(),
        }
    }
}

/// Result type alias for grawk operations
pub type Result<T> = std::result::Result<T, Error>;
