use std::collections::{HashMap, LinkedList};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{
    AccessType, BufferPoolConfig, BufferPoolError, FrameId, PageId, Result, PAGE_SIZE,
};
use crate::storage::disk::{DiskManager, DiskScheduler, LogManager};

use super::{BasicPageGuard, FrameHeader, LruKReplacer, ReadPageGuard, WritePageGuard};

struct BufferPoolState {
    frames: Vec<Arc<FrameHeader>>,
    page_table: Mutex<HashMap<PageId, FrameId>>,
    free_list: Mutex<LinkedList<FrameId>>,
    replacer: LruKReplacer,
}

/// Fetches database pages from disk and caches them in memory.
///
/// Manages a fixed number of frames and uses the LRU-K replacement policy to
/// decide which cached page to evict when a new one is needed and no frame
/// is free. Concurrent access is protected by per-concern locks (the page
/// table, the free list, and each frame's own pin count and data lock)
/// rather than one coarse mutex, so unrelated pages never contend with each
/// other.
pub struct BufferPoolManager {
    pool_size: usize,
    state: Arc<BufferPoolState>,
    disk_scheduler: DiskScheduler,
    log_manager: Option<Arc<LogManager>>,
}

impl BufferPoolManager {
    /// Creates a new BufferPoolManager with the given pool size, k value for
    /// LRU-K, and disk manager. Constructed without a log manager; attach
    /// one with [`BufferPoolManager::with_log_manager`].
    pub fn new(pool_size: usize, k: usize, disk_manager: Arc<DiskManager>) -> Self {
        let mut frames = Vec::with_capacity(pool_size);
        let mut free_list = LinkedList::new();

        for i in 0..pool_size {
            let frame_id = FrameId::new(i as u32);
            frames.push(Arc::new(FrameHeader::new(frame_id)));
            free_list.push_back(frame_id);
        }

        let state = Arc::new(BufferPoolState {
            frames,
            page_table: Mutex::new(HashMap::new()),
            free_list: Mutex::new(free_list),
            replacer: LruKReplacer::new(k, pool_size),
        });

        Self {
            pool_size,
            state,
            disk_scheduler: DiskScheduler::new(disk_manager),
            log_manager: None,
        }
    }

    /// Creates a new BufferPoolManager from a [`BufferPoolConfig`].
    pub fn from_config(config: BufferPoolConfig, disk_manager: Arc<DiskManager>) -> Self {
        Self::new(config.pool_size, config.lru_k, disk_manager)
    }

    /// Attaches a log manager, used to force log records durable before a
    /// dirty page is evicted or flushed (write-ahead logging).
    pub fn with_log_manager(mut self, log_manager: Arc<LogManager>) -> Self {
        self.log_manager = Some(log_manager);
        self
    }

    /// Creates a new page in the buffer pool, evictable immediately.
    /// Returns the page ID of the new page. Prefer
    /// [`BufferPoolManager::new_page_guarded`] when the caller wants to
    /// write to the page right away, since it pins the page before any
    /// other thread can observe and evict it.
    pub fn new_page(&self) -> Result<PageId> {
        let frame_id = self.get_free_frame()?;
        let frame = &self.state.frames[frame_id.as_usize()];

        let page_id = self.disk_scheduler.disk_manager().allocate_page()?;

        frame.reset();
        frame.set_page_id(page_id);

        self.state.page_table.lock().insert(page_id, frame_id);

        self.state
            .replacer
            .record_access(frame_id, AccessType::Unknown)?;
        self.state.replacer.set_evictable(frame_id, true)?;

        Ok(page_id)
    }

    /// Creates a new page and returns it pinned behind a [`BasicPageGuard`],
    /// so the page cannot be evicted before the caller has a chance to
    /// populate it.
    pub fn new_page_guarded(&self, access_type: AccessType) -> Result<BasicPageGuard> {
        let frame_id = self.get_free_frame()?;
        let frame_arc = Arc::clone(&self.state.frames[frame_id.as_usize()]);

        let page_id = self.disk_scheduler.disk_manager().allocate_page()?;

        frame_arc.reset();
        frame_arc.set_page_id(page_id);
        frame_arc.pin();

        self.state.page_table.lock().insert(page_id, frame_id);
        self.state.replacer.record_access(frame_id, access_type)?;
        self.state.replacer.set_evictable(frame_id, false)?;

        Ok(self.make_basic_guard(page_id, frame_arc))
    }

    /// Deletes a page from the buffer pool and disk.
    /// Returns `Ok(true)` if the page existed and was deleted, `Ok(false)`
    /// if it did not exist, or `Err(PageStillPinned)` if it is currently
    /// pinned by another guard.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut page_table = self.state.page_table.lock();

        if let Some(frame_id) = page_table.remove(&page_id) {
            let frame = &self.state.frames[frame_id.as_usize()];

            if frame.pin_count() > 0 {
                page_table.insert(page_id, frame_id);
                tracing::debug!(%page_id, "refused to delete pinned page");
                return Err(BufferPoolError::PageStillPinned(page_id));
            }

            frame.reset();
            self.state.replacer.remove(frame_id)?;
            self.state.free_list.lock().push_back(frame_id);

            self.disk_scheduler
                .disk_manager()
                .deallocate_page(page_id)?;

            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Fetches a page pinned behind a [`BasicPageGuard`], without taking
    /// either data lock. Upgrade with [`BasicPageGuard::into_read`] or
    /// [`BasicPageGuard::into_write`].
    pub fn fetch_page_basic(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Result<BasicPageGuard> {
        if !page_id.is_valid() {
            return Err(BufferPoolError::InvalidPageId(page_id));
        }

        let frame_id = self.fetch_page(page_id, access_type)?;
        let frame = Arc::clone(&self.state.frames[frame_id.as_usize()]);
        Ok(self.make_basic_guard(page_id, frame))
    }

    /// Fetches a page for read access.
    pub fn fetch_page_read(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Result<ReadPageGuard> {
        Ok(self.fetch_page_basic(page_id, access_type)?.into_read())
    }

    /// Fetches a page for write access.
    pub fn fetch_page_write(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Result<WritePageGuard> {
        Ok(self.fetch_page_basic(page_id, access_type)?.into_write())
    }

    /// Fetches a page for read access, treating all accesses as
    /// [`AccessType::Unknown`].
    pub fn checked_read_page(&self, page_id: PageId) -> Result<Option<ReadPageGuard>> {
        match self.fetch_page_read(page_id, AccessType::Unknown) {
            Ok(guard) => Ok(Some(guard)),
            Err(BufferPoolError::PoolExhausted) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetches a page for write access, treating all accesses as
    /// [`AccessType::Unknown`].
    pub fn checked_write_page(&self, page_id: PageId) -> Result<Option<WritePageGuard>> {
        match self.fetch_page_write(page_id, AccessType::Unknown) {
            Ok(guard) => Ok(Some(guard)),
            Err(BufferPoolError::PoolExhausted) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Flushes a specific page to disk unconditionally, whether or not it
    /// is currently marked dirty. Returns `Ok(false)` if the page is not in
    /// the buffer pool.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        if !page_id.is_valid() {
            return Err(BufferPoolError::InvalidPageId(page_id));
        }

        let page_table = self.state.page_table.lock();

        if let Some(&frame_id) = page_table.get(&page_id) {
            let frame = &self.state.frames[frame_id.as_usize()];

            if let Some(log_manager) = &self.log_manager {
                log_manager.flush()?;
            }

            let mut data = [0u8; PAGE_SIZE];
            frame.copy_to(&mut data);

            self.disk_scheduler.schedule_write_sync(page_id, &data)?;
            frame.set_dirty(false);
            tracing::debug!(%page_id, "flushed page");

            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Flushes every page currently in the buffer pool to disk, dirty or
    /// not, clearing each frame's dirty flag as it goes.
    pub fn flush_all_pages(&self) -> Result<()> {
        let page_table = self.state.page_table.lock();

        if let Some(log_manager) = &self.log_manager {
            log_manager.flush()?;
        }

        for (&page_id, &frame_id) in page_table.iter() {
            let frame = &self.state.frames[frame_id.as_usize()];
            let mut data = [0u8; PAGE_SIZE];
            frame.copy_to(&mut data);
            self.disk_scheduler.schedule_write_sync(page_id, &data)?;
            frame.set_dirty(false);
        }

        Ok(())
    }

    /// Returns the pin count for a page, or `None` if it is not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let page_table = self.state.page_table.lock();

        page_table
            .get(&page_id)
            .map(|&frame_id| self.state.frames[frame_id.as_usize()].pin_count())
    }

    /// Returns the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Returns the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.state.free_list.lock().len()
    }

    /// Builds the release callback every guard flavor fires on drop: the
    /// unpin-page operation, inlined here rather than exposed as a
    /// standalone method since guards are the only caller and the teacher's
    /// own guard design keeps this logic guard-side.
    fn make_basic_guard(&self, page_id: PageId, frame: Arc<FrameHeader>) -> BasicPageGuard {
        let state = Arc::clone(&self.state);

        // Safety: `frame` and `state` are both kept alive by the Arcs
        // captured here for as long as the guard exists.
        unsafe {
            BasicPageGuard::new(
                page_id,
                frame,
                Box::new(move |pid, is_dirty| {
                    let page_table = state.page_table.lock();
                    if let Some(&fid) = page_table.get(&pid) {
                        let frm = &state.frames[fid.as_usize()];
                        if is_dirty {
                            frm.set_dirty(true);
                        }
                        if let Some(0) = frm.unpin() {
                            let _ = state.replacer.set_evictable(fid, true);
                        }
                    }
                }),
            )
        }
    }

    /// Fetches a page into the buffer pool and returns its frame ID,
    /// pinning it. If the page is already resident, returns its current
    /// frame; otherwise evicts a frame if necessary and reads the page from
    /// disk.
    fn fetch_page(&self, page_id: PageId, access_type: AccessType) -> Result<FrameId> {
        {
            let page_table = self.state.page_table.lock();
            if let Some(&frame_id) = page_table.get(&page_id) {
                let frame = &self.state.frames[frame_id.as_usize()];
                frame.pin();
                self.state.replacer.record_access(frame_id, access_type)?;
                self.state.replacer.set_evictable(frame_id, false)?;
                return Ok(frame_id);
            }
        }

        let frame_id = self.get_free_frame()?;
        let frame = &self.state.frames[frame_id.as_usize()];

        let mut data = [0u8; PAGE_SIZE];
        self.disk_scheduler.schedule_read_sync(page_id, &mut data)?;

        frame.set_page_id(page_id);
        frame.copy_from(&data);
        frame.set_dirty(false);
        frame.pin();

        self.state.page_table.lock().insert(page_id, frame_id);

        self.state.replacer.record_access(frame_id, access_type)?;
        self.state.replacer.set_evictable(frame_id, false)?;

        Ok(frame_id)
    }

    /// Gets a free frame, either from the free list or by evicting a page.
    fn get_free_frame(&self) -> Result<FrameId> {
        {
            let mut free_list = self.state.free_list.lock();
            if let Some(frame_id) = free_list.pop_front() {
                return Ok(frame_id);
            }
        }

        if let Some(frame_id) = self.state.replacer.evict() {
            let frame = &self.state.frames[frame_id.as_usize()];
            let old_page_id = frame.page_id();

            if frame.is_dirty() {
                tracing::debug!(page_id = %old_page_id, ?frame_id, "writing back dirty frame before eviction");
                let mut data = [0u8; PAGE_SIZE];
                frame.copy_to(&mut data);
                self.disk_scheduler
                    .schedule_write_sync(old_page_id, &data)?;
            }

            self.state.page_table.lock().remove(&old_page_id);
            frame.reset();

            Ok(frame_id)
        } else {
            tracing::debug!("buffer pool exhausted, no evictable frame");
            Err(BufferPoolError::PoolExhausted)
        }
    }
}
