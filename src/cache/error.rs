use thiserror::Error;

/// Failure talking to the key-value store.
///
/// Callers in this crate never surface these to clients; a failing cache
/// degrades to a miss on reads and to a skipped write on writes.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation `{op}` timed out")]
    Timeout { op: &'static str },
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl CacheError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;
