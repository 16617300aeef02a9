use super::types::{FrameId, PageId};

/// Size of a page in bytes (4 KB).
pub const PAGE_SIZE: usize = 4096;

/// Invalid page ID constant.
pub const INVALID_PAGE_ID: PageId = PageId::new(u32::MAX);

/// Invalid frame ID constant.
pub const INVALID_FRAME_ID: FrameId = FrameId::new(u32::MAX);

/// Default K value for LRU-K replacement policy.
pub const DEFAULT_LRUK_K: usize = 2;

/// Default buffer pool size (number of frames).
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 64;

/// Runtime-tunable parameters for a [`crate::buffer::BufferPoolManager`].
///
/// Constructible directly, or via [`BufferPoolConfig::from_env`] using the
/// `PAGEFRAME_*` environment variable prefix, mirroring the lightweight
/// env-driven configuration surface other embedded storage crates expose
/// without pulling in a full config/file-format layer this core doesn't need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Number of frames in the buffer pool.
    pub pool_size: usize,
    /// K value for the LRU-K replacement policy.
    pub lru_k: usize,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_BUFFER_POOL_SIZE,
            lru_k: DEFAULT_LRUK_K,
        }
    }
}

impl BufferPoolConfig {
    pub fn new(pool_size: usize, lru_k: usize) -> Self {
        Self { pool_size, lru_k }
    }

    /// Builds a config from `PAGEFRAME_POOL_SIZE` / `PAGEFRAME_LRU_K`,
    /// falling back to defaults for any variable that is unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let pool_size = std::env::var("PAGEFRAME_POOL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.pool_size);
        let lru_k = std::env::var("PAGEFRAME_LRU_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.lru_k);
        Self { pool_size, lru_k }
    }
}
