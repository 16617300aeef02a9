use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{PageId, PAGE_SIZE};

use super::FrameHeader;

/// Callback invoked exactly once when a guard releases its pin, reporting
/// whether the page was written through this guard.
type ReleaseCallback = Box<dyn FnOnce(PageId, bool) + Send + Sync>;

/// Shared bookkeeping for the three guard flavors below. Holds the frame
/// alive via `Arc` for the guard's lifetime and guarantees the release
/// callback fires at most once even across repeated `drop`s.
struct PageGuardBase {
    page_id: PageId,
    frame: Arc<FrameHeader>,
    release_callback: Option<ReleaseCallback>,
    is_dirty: bool,
}

impl PageGuardBase {
    fn new(page_id: PageId, frame: Arc<FrameHeader>, release_callback: ReleaseCallback) -> Self {
        Self {
            page_id,
            frame,
            release_callback: Some(release_callback),
            is_dirty: false,
        }
    }

    fn drop_impl(&mut self) {
        if let Some(callback) = self.release_callback.take() {
            callback(self.page_id, self.is_dirty);
        }
    }
}

/// RAII guard holding a page pinned without taking either data lock.
///
/// Useful when a caller only needs to keep a page resident (e.g. to pass it
/// to another thread for later access) without committing to read or write
/// access up front. Move-only: it cannot be cloned, and dropping it unpins
/// the page exactly once. Call [`BasicPageGuard::into_read`] or
/// [`BasicPageGuard::into_write`] to acquire the corresponding data lock.
pub struct BasicPageGuard {
    base: PageGuardBase,
}

impl BasicPageGuard {
    /// Creates a new BasicPageGuard.
    /// # Safety
    /// The caller must ensure that the frame outlives this guard.
    pub(crate) unsafe fn new(
        page_id: PageId,
        frame: Arc<FrameHeader>,
        release_callback: ReleaseCallback,
    ) -> Self {
        Self {
            base: PageGuardBase::new(page_id, frame, release_callback),
        }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.base.page_id
    }

    /// Returns whether this guard has recorded the page as dirty.
    pub fn is_dirty(&self) -> bool {
        self.base.is_dirty
    }

    /// Marks the page dirty without going through a `WritePageGuard`.
    pub fn set_dirty(&mut self, dirty: bool) {
        self.base.is_dirty = dirty;
    }

    /// Consumes this guard and acquires the frame's read lock, transferring
    /// the pin to the returned [`ReadPageGuard`] without an intermediate
    /// unpin/re-pin.
    pub fn into_read(mut self) -> ReadPageGuard {
        let page_id = self.base.page_id;
        let frame = self.base.frame.clone();
        let callback = self
            .base
            .release_callback
            .take()
            .expect("guard released twice");
        // Safety: `frame` is kept alive by the Arc held in the new guard.
        unsafe { ReadPageGuard::new(page_id, frame, callback) }
    }

    /// Consumes this guard and acquires the frame's write lock, transferring
    /// the pin to the returned [`WritePageGuard`] without an intermediate
    /// unpin/re-pin.
    pub fn into_write(mut self) -> WritePageGuard {
        let page_id = self.base.page_id;
        let frame = self.base.frame.clone();
        let callback = self
            .base
            .release_callback
            .take()
            .expect("guard released twice");
        // Safety: `frame` is kept alive by the Arc held in the new guard.
        unsafe { WritePageGuard::new(page_id, frame, callback) }
    }

    /// Drops this guard, releasing the page. Equivalent to letting it go
    /// out of scope; spelled out for callers that want the release visible
    /// at the call site.
    pub fn drop_guard(self) {
        drop(self);
    }
}

impl Drop for BasicPageGuard {
    fn drop(&mut self) {
        self.base.drop_impl();
    }
}

/// RAII guard for read-only access to a page.
/// Automatically unpins the page when dropped.
pub struct ReadPageGuard {
    base: PageGuardBase,
    /// Read lock on the page data
    _data_guard: RwLockReadGuard<'static, Box<[u8; PAGE_SIZE]>>,
}

impl ReadPageGuard {
    /// Creates a new ReadPageGuard.
    /// # Safety
    /// The caller must ensure that the frame outlives this guard.
    pub(crate) unsafe fn new(
        page_id: PageId,
        frame: Arc<FrameHeader>,
        release_callback: ReleaseCallback,
    ) -> Self {
        // Acquire the read lock
        let data_guard = frame.data.read();
        // Transmute to static lifetime - the frame is kept alive via Arc
        let data_guard: RwLockReadGuard<'static, Box<[u8; PAGE_SIZE]>> =
            std::mem::transmute(data_guard);

        Self {
            base: PageGuardBase::new(page_id, frame, release_callback),
            _data_guard: data_guard,
        }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.base.page_id
    }

    /// Returns a reference to the page data.
    pub fn data(&self) -> &[u8] {
        &self._data_guard[..]
    }

    /// Drops this guard, releasing the page.
    pub fn drop_guard(self) {
        drop(self);
    }
}

impl Deref for ReadPageGuard {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl Drop for ReadPageGuard {
    fn drop(&mut self) {
        self.base.drop_impl();
    }
}

/// RAII guard for read-write access to a page.
/// Automatically marks the page as dirty and unpins it when dropped.
pub struct WritePageGuard {
    base: PageGuardBase,
    /// Write lock on the page data
    data_guard: Option<RwLockWriteGuard<'static, Box<[u8; PAGE_SIZE]>>>,
}

impl WritePageGuard {
    /// Creates a new WritePageGuard.
    /// # Safety
    /// The caller must ensure that the frame outlives this guard.
    pub(crate) unsafe fn new(
        page_id: PageId,
        frame: Arc<FrameHeader>,
        release_callback: ReleaseCallback,
    ) -> Self {
        // Acquire the write lock
        let data_guard = frame.data.write();
        // Transmute to static lifetime - the frame is kept alive via Arc
        let data_guard: RwLockWriteGuard<'static, Box<[u8; PAGE_SIZE]>> =
            std::mem::transmute(data_guard);

        Self {
            base: PageGuardBase::new(page_id, frame, release_callback),
            data_guard: Some(data_guard),
        }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.base.page_id
    }

    /// Returns a reference to the page data.
    pub fn data(&self) -> &[u8] {
        &self.data_guard.as_ref().unwrap()[..]
    }

    /// Returns a mutable reference to the page data.
    /// Automatically marks the page as dirty.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.base.is_dirty = true;
        &mut self.data_guard.as_mut().unwrap()[..]
    }

    /// Drops this guard, releasing the page.
    pub fn drop_guard(self) {
        drop(self);
    }
}

impl Deref for WritePageGuard {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl DerefMut for WritePageGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data_mut()
    }
}

impl Drop for WritePageGuard {
    fn drop(&mut self) {
        // Drop the data guard first to release the lock
        self.data_guard.take();
        // Then call the release callback
        self.base.drop_impl();
    }
}
