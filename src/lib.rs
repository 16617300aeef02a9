//! pageframe - the buffer pool core of a disk-oriented storage engine.
//!
//! This crate provides the memory-management layer that sits between a
//! higher-level storage engine and raw disk I/O: a fixed-size pool of
//! in-memory page frames, an LRU-K policy deciding which frame to evict
//! when the pool is full, and move-only RAII guards that pin a page for as
//! long as a caller holds one.
//!
//! # Architecture
//!
//! - **Storage layer** (`storage`): disk I/O collaborators this core
//!   depends on but does not implement the contents of.
//!   - `DiskManager`: reads and writes fixed-size pages to/from a file
//!   - `DiskScheduler`: serializes disk I/O through a background worker
//!   - `LogManager`: minimal durability hook reserved for a future WAL
//!
//! - **Buffer pool** (`buffer`): the core this crate exists to provide.
//!   - `BufferPoolManager`: fetches pages from disk and caches them in memory
//!   - `LruKReplacer`: LRU-K page replacement policy
//!   - `FrameHeader`: per-frame metadata and data storage
//!   - `BasicPageGuard`/`ReadPageGuard`/`WritePageGuard`: RAII guards for
//!     pinned page access
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pageframe::buffer::BufferPoolManager;
//! use pageframe::storage::disk::DiskManager;
//!
//! let disk_manager = Arc::new(DiskManager::new("test.db").unwrap());
//!
//! // 100 frames, LRU-2 replacement.
//! let bpm = BufferPoolManager::new(100, 2, disk_manager);
//!
//! let page_id = bpm.new_page().unwrap();
//!
//! {
//!     let mut guard = bpm.checked_write_page(page_id).unwrap().unwrap();
//!     guard.data_mut()[0..5].copy_from_slice(b"hello");
//! }
//!
//! bpm.flush_page(page_id).unwrap();
//! # std::fs::remove_file("test.db").ok();
//! ```

pub mod buffer;
pub mod common;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{AccessType, BufferPoolConfig, BufferPoolError, PageId, Result};
