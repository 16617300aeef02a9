use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::common::{Lsn, Result};

/// Minimal write-ahead-log collaborator.
///
/// The buffer pool core only needs a place to hand off "this page changed"
/// records and a way to guarantee they are durable before a dirty page is
/// evicted; it does not need to replay or interpret the log itself. Nothing
/// in this crate requires a `LogManager` to exist at all — the buffer pool
/// manager is constructible with `log_manager: None` and behaves as if
/// logging were disabled.
pub struct LogManager {
    buffer: Mutex<Vec<u8>>,
    next_lsn: AtomicU64,
    persistent_lsn: AtomicU64,
}

impl LogManager {
    pub fn new() -> Self {
        Self {
            buffer: Mutex::new(Vec::new()),
            next_lsn: AtomicU64::new(1),
            persistent_lsn: AtomicU64::new(0),
        }
    }

    /// Appends a record to the in-memory log buffer and returns the LSN
    /// assigned to it. The record is not guaranteed durable until `flush`.
    pub fn append(&self, record: &[u8]) -> Lsn {
        let lsn = self.next_lsn.fetch_add(1, Ordering::SeqCst);
        let mut buffer = self.buffer.lock();
        buffer.extend_from_slice(&lsn.to_le_bytes());
        buffer.extend_from_slice(&(record.len() as u32).to_le_bytes());
        buffer.extend_from_slice(record);
        lsn
    }

    /// Forces all buffered records to become durable, advancing the
    /// persistent LSN watermark. A real write-ahead log would fsync an
    /// append-only file here; this core has no such file to flush to, so it
    /// only drains the buffer and tracks the watermark other components can
    /// check against.
    pub fn flush(&self) -> Result<()> {
        let mut buffer = self.buffer.lock();
        let flushed_up_to = self.next_lsn.load(Ordering::SeqCst) - 1;
        buffer.clear();
        self.persistent_lsn.store(flushed_up_to, Ordering::SeqCst);
        tracing::debug!(lsn = flushed_up_to, "log flushed");
        Ok(())
    }

    /// The highest LSN known to be durable.
    pub fn persistent_lsn(&self) -> Lsn {
        self.persistent_lsn.load(Ordering::SeqCst)
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_manager_append_assigns_increasing_lsn() {
        let lm = LogManager::new();
        let a = lm.append(b"first");
        let b = lm.append(b"second");
        assert!(b > a);
    }

    #[test]
    fn test_log_manager_flush_advances_persistent_lsn() {
        let lm = LogManager::new();
        assert_eq!(lm.persistent_lsn(), 0);
        let lsn = lm.append(b"record");
        lm.flush().unwrap();
        assert_eq!(lm.persistent_lsn(), lsn);
    }
}
