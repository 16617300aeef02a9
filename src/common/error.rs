use thiserror::Error;

use super::types::{FrameId, PageId};

/// Buffer pool core error type.
#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Buffer pool is full, no evictable frames available")]
    PoolExhausted,

    #[error("Invalid page ID: {0}")]
    InvalidPageId(PageId),

    #[error("Invalid frame ID: {0}")]
    InvalidFrameId(FrameId),

    #[error("Page {0} is still pinned")]
    PageStillPinned(PageId),

    #[error("Invariant violated: {0}")]
    InvariantViolation(&'static str),

    #[error("Disk scheduler error: {0}")]
    DiskScheduler(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BufferPoolError>;
