use std::fmt::Display;
use std::vec::Vec;

use log::{debug, info, trace, warn};
use serde_derive::{Deserialize, Serialize};

use crate::common::{FrameID, PageID};
use crate::config::BufferPoolConfig;
use crate::error::{Error, Result};
use crate::storage::disk::{File, FileRef};
use crate::storage::page::page::Page;

use super::buf_desc::{BufDesc, FrameInfo};
use super::buf_hash_table::BufHashTbl;

/// Counters kept by the buffer pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BufStats {
    /// Page requests served, hits and misses alike.
    pub accesses: u64,
    /// Pages read from files.
    pub disk_reads: u64,
    /// Pages written back to files.
    pub disk_writes: u64,
}

impl BufStats {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Caches a fixed number of pages from any number of files and replaces them
/// with the clock algorithm.
pub struct BufferPoolManager {
    num_bufs: usize,
    clock_hand: FrameID,
    flush_on_drop: bool,

    buf_desc_table: Vec<BufDesc>,
    buf_pool: Vec<Page>,
    hash_table: BufHashTbl,
    buf_stats: BufStats,
}

impl BufferPoolManager {
    /// Creates a pool of `pool_size` frames. Panics if `pool_size` is zero.
    pub fn new(pool_size: usize) -> Self {
        assert!(pool_size > 0, "buffer pool needs at least one frame");
        Self {
            num_bufs: pool_size,
            clock_hand: pool_size - 1,
            flush_on_drop: true,
            buf_desc_table: (0..pool_size).map(BufDesc::new).collect(),
            buf_pool: vec![Page::new(); pool_size],
            hash_table: BufHashTbl::new(pool_size),
            buf_stats: BufStats::default(),
        }
    }

    pub fn from_config(config: &BufferPoolConfig) -> Result<Self> {
        config.validate()?;
        let mut this = Self::new(config.pool_size);
        this.flush_on_drop = config.flush_on_drop;
        info!("Created buffer pool with {} frames", config.pool_size);
        Ok(this)
    }

    pub fn num_bufs(&self) -> usize {
        self.num_bufs
    }

    fn advance_clock(&mut self) {
        self.clock_hand = (self.clock_hand + 1) % self.num_bufs;
    }

    /// Picks a free frame with the clock algorithm.
    ///
    /// Each step advances the hand by one frame. Invalid frames are taken at once.
    /// A valid frame with its refbit set gets a second chance: the bit is cleared
    /// and the scan moves on. A pinned frame is skipped. The first unpinned frame
    /// without a refbit is evicted: written back if dirty, unmapped, and cleared.
    ///
    /// `pinned` counts consecutive pinned observations and any other observation
    /// resets it. Once it reaches `num_bufs` every frame was found pinned in a
    /// single sweep and the call fails with `Error::BufferExceeded`.
    fn alloc_buf(&mut self) -> Result<FrameID> {
        let mut pinned = 0;
        while pinned < self.num_bufs {
            self.advance_clock();
            let frame_no = self.clock_hand;
            let desc = &mut self.buf_desc_table[frame_no];

            if !desc.is_valid() {
                return Ok(frame_no);
            }
            if desc.refbit() {
                desc.clear_refbit();
                pinned = 0;
                continue;
            }
            if desc.pin_cnt() > 0 {
                pinned += 1;
                continue;
            }
            self.evict(frame_no)?;
            return Ok(frame_no);
        }

        warn!("All {} buffer frames are pinned", self.num_bufs);
        Err(Error::BufferExceeded)
    }

    /// Writes back a valid, unpinned frame if dirty, then unmaps and clears it.
    fn evict(&mut self, frame_no: FrameID) -> Result<()> {
        let file = self.mapped_file(frame_no)?;
        let page_no = self.buf_desc_table[frame_no].page_no();

        if self.buf_desc_table[frame_no].is_dirty() {
            self.write_back(&file, frame_no)?;
        }
        self.hash_table.remove(file.as_ref(), page_no)?;
        self.buf_desc_table[frame_no].clear();

        debug!("Evicted page {} of {} from frame {}", page_no, file, frame_no);
        Ok(())
    }

    /// Returns the file of a valid frame whose descriptor and identity index agree,
    /// or `Error::BadBuffer` if they do not.
    fn mapped_file(&self, frame_no: FrameID) -> Result<FileRef> {
        let desc = &self.buf_desc_table[frame_no];
        match desc.file() {
            Some(file)
                if desc.is_valid()
                    && self.hash_table.lookup(file.as_ref(), desc.page_no()) == Some(frame_no) =>
            {
                Ok(file.clone())
            }
            _ => Err(self.bad_buffer(frame_no)),
        }
    }

    /// Writes a frame to `file` under the page number its descriptor records and
    /// marks it clean. Callers may have overwritten the number inside the pooled page.
    fn write_back(&mut self, file: &FileRef, frame_no: FrameID) -> Result<()> {
        let page_no = self.buf_desc_table[frame_no].page_no();
        let page = &mut self.buf_pool[frame_no];
        page.set_page_number(page_no);
        file.write_page(page)?;
        self.buf_stats.disk_writes += 1;
        self.buf_desc_table[frame_no].mark_clean();
        Ok(())
    }

    /// Maps `page` into the free frame `frame_no` and pins it once.
    fn install(&mut self, file: &FileRef, page: Page, frame_no: FrameID) -> Result<&mut Page> {
        let page_no = page.page_number();
        self.hash_table.insert(file.as_ref(), page_no, frame_no)?;
        self.buf_desc_table[frame_no].set(file.clone(), page_no);
        self.buf_pool[frame_no] = page;
        trace!("Loaded page {} of {} into frame {}", page_no, file, frame_no);
        Ok(&mut self.buf_pool[frame_no])
    }

    /// Fetches page `page_no` of `file` and pins it.
    ///
    /// If the page is resident its refbit is set and its pin count incremented.
    /// Otherwise the page is read from the file, a frame is picked by the clock
    /// algorithm, and the page is installed there with a pin count of one. The
    /// page is read before any frame is evicted, so a failed read leaves the pool
    /// untouched. When every frame is pinned the read has already happened but is
    /// not counted in `disk_reads`, which only counts pages that were loaded.
    ///
    /// Every successful call acquires exactly one pin, which the caller must
    /// release with `unpin_page`.
    pub fn fetch_page(&mut self, file: &FileRef, page_no: PageID) -> Result<&mut Page> {
        self.buf_stats.accesses += 1;

        if let Some(frame_no) = self.hash_table.lookup(file.as_ref(), page_no) {
            self.buf_desc_table[frame_no].pin();
            return Ok(&mut self.buf_pool[frame_no]);
        }

        let page = file.read_page(page_no)?;
        let frame_no = self.alloc_buf()?;
        self.buf_stats.disk_reads += 1;
        self.install(file, page, frame_no)
    }

    /// Releases one pin on a resident page, marking it dirty if `dirty` is set.
    /// The dirty bit is sticky: unpinning with `dirty == false` never clears it.
    ///
    /// Unpinning a page that is not resident does nothing. Unpinning a resident
    /// page with no pins fails with `Error::PageNotPinned`.
    pub fn unpin_page(&mut self, file: &FileRef, page_no: PageID, dirty: bool) -> Result<()> {
        let frame_no = match self.hash_table.lookup(file.as_ref(), page_no) {
            Some(frame_no) => frame_no,
            None => {
                debug!("Ignoring unpin of non-resident page {} of {}", page_no, file);
                return Ok(());
            }
        };

        let desc = &mut self.buf_desc_table[frame_no];
        if !desc.unpin() {
            warn!("Page {} of {} unpinned more often than pinned", page_no, file);
            return Err(Error::PageNotPinned { file: file.filename(), page_no, frame_no });
        }
        if dirty {
            desc.mark_dirty();
        }
        Ok(())
    }

    /// Allocates a new page in `file` and returns its number together with the
    /// page, pinned once in the pool.
    ///
    /// The frame is chosen before the file grows. If the file then fails to
    /// allocate, the frame stays free.
    pub fn alloc_page(&mut self, file: &FileRef) -> Result<(PageID, &mut Page)> {
        let frame_no = self.alloc_buf()?;
        let page = file.allocate_page()?;
        self.buf_stats.accesses += 1;
        let page_no = page.page_number();
        let page = self.install(file, page, frame_no)?;
        Ok((page_no, page))
    }

    /// Removes a resident, unpinned page from the pool and deletes it from `file`.
    /// Dirty contents are discarded.
    ///
    /// Fails with `Error::HashNotFound` if the page is not resident and with
    /// `Error::PagePinned` if it is pinned; neither case changes anything.
    pub fn dispose_page(&mut self, file: &FileRef, page_no: PageID) -> Result<()> {
        let frame_no = self
            .hash_table
            .lookup(file.as_ref(), page_no)
            .ok_or_else(|| Error::HashNotFound { file: file.filename(), page_no })?;

        if self.buf_desc_table[frame_no].pin_cnt() > 0 {
            return Err(Error::PagePinned { file: file.filename(), page_no, frame_no });
        }

        self.buf_desc_table[frame_no].clear();
        self.hash_table.remove(file.as_ref(), page_no)?;
        file.delete_page(page_no)?;
        debug!("Disposed page {} of {} from frame {}", page_no, file, frame_no);
        Ok(())
    }

    /// Writes back every dirty page of `file` and drops all of its pages from the pool.
    ///
    /// All frames of the file are checked before anything changes: a pinned frame
    /// fails the call with `Error::PagePinned`, and a frame whose descriptor and
    /// identity index disagree (including an index entry pointing at an invalid
    /// frame) fails it with `Error::BadBuffer`, leaving every frame as it was.
    pub fn flush_file(&mut self, file: &FileRef) -> Result<()> {
        let file_id = file.id();
        let frames: Vec<FrameID> = self
            .buf_desc_table
            .iter()
            .filter(|desc| desc.file_id() == Some(file_id))
            .map(|desc| desc.frame_no())
            .collect();

        for &frame_no in &frames {
            let desc = &self.buf_desc_table[frame_no];
            if desc.pin_cnt() > 0 {
                return Err(Error::PagePinned { file: file.filename(), page_no: desc.page_no(), frame_no });
            }
            self.mapped_file(frame_no)?;
        }
        for (page_no, frame_no) in self.hash_table.entries_of(file_id) {
            let desc = &self.buf_desc_table[frame_no];
            if !desc.is_valid() || desc.file_id() != Some(file_id) || desc.page_no() != page_no {
                return Err(self.bad_buffer(frame_no));
            }
        }

        for &frame_no in &frames {
            let page_no = self.buf_desc_table[frame_no].page_no();
            if self.buf_desc_table[frame_no].is_dirty() {
                self.write_back(file, frame_no)?;
            }
            self.hash_table.remove(file.as_ref(), page_no)?;
            self.buf_desc_table[frame_no].clear();
        }

        debug!("Flushed {} pages of {}", frames.len(), file);
        Ok(())
    }

    /// Writes back every dirty page in the pool. Pages stay resident and pinned.
    pub fn flush_all(&mut self) -> Result<()> {
        for frame_no in 0..self.num_bufs {
            let desc = &self.buf_desc_table[frame_no];
            if !desc.is_valid() || !desc.is_dirty() {
                continue;
            }
            let file = self.mapped_file(frame_no)?;
            self.write_back(&file, frame_no)?;
        }
        Ok(())
    }

    /// Returns the frame holding a page, if it is resident.
    pub fn frame_of(&self, file: &FileRef, page_no: PageID) -> Option<FrameID> {
        self.hash_table.lookup(file.as_ref(), page_no)
    }

    /// Snapshot of every frame descriptor, in frame order.
    pub fn frames(&self) -> Vec<FrameInfo> {
        self.buf_desc_table.iter().map(BufDesc::info).collect()
    }

    pub fn num_valid_frames(&self) -> usize {
        self.buf_desc_table.iter().filter(|desc| desc.is_valid()).count()
    }

    pub fn stats(&self) -> &BufStats {
        &self.buf_stats
    }

    pub fn clear_stats(&mut self) {
        self.buf_stats.clear();
    }

    /// Logs the state of every frame.
    pub fn print_self(&self) {
        info!("{}", self);
    }

    fn bad_buffer(&self, frame_no: FrameID) -> Error {
        let desc = &self.buf_desc_table[frame_no];
        Error::BadBuffer {
            frame_no,
            dirty: desc.is_dirty(),
            valid: desc.is_valid(),
            refbit: desc.refbit(),
        }
    }
}

impl Display for BufferPoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, desc) in self.buf_desc_table.iter().enumerate() {
            writeln!(f, "FrameNo:{} {}", i, desc)?;
        }
        write!(f, "Total Number of Valid Frames:{}", self.num_valid_frames())
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        if !self.flush_on_drop {
            return;
        }
        if let Err(err) = self.flush_all() {
            warn!("Failed to flush buffer pool on drop: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::disk::MemFile;

    fn setup(pages: usize) -> (FileRef, BufferPoolManager) {
        let mem = MemFile::new("bad");
        for _ in 0..pages {
            mem.allocate_page().unwrap();
        }
        let file: FileRef = Arc::new(mem);
        (file, BufferPoolManager::new(1))
    }

    #[test]
    fn eviction_of_unmapped_frame_is_bad_buffer() {
        let (file, mut bpm) = setup(2);
        bpm.fetch_page(&file, 1).unwrap();
        bpm.unpin_page(&file, 1, true).unwrap();
        bpm.hash_table.remove(file.as_ref(), 1).unwrap();

        assert_eq!(
            bpm.fetch_page(&file, 2).err(),
            Some(Error::BadBuffer { frame_no: 0, dirty: true, valid: true, refbit: false })
        );
        assert!(bpm.buf_desc_table[0].is_valid());
    }

    #[test]
    fn flush_file_reports_index_pointing_at_invalid_frame() {
        let (file, mut bpm) = setup(1);
        bpm.fetch_page(&file, 1).unwrap();
        bpm.unpin_page(&file, 1, true).unwrap();
        bpm.buf_desc_table[0].clear();

        assert_eq!(
            bpm.flush_file(&file),
            Err(Error::BadBuffer { frame_no: 0, dirty: false, valid: false, refbit: false })
        );
        assert_eq!(bpm.frame_of(&file, 1), Some(0));
    }

    #[test]
    fn flush_file_reports_frame_missing_from_index() {
        let (file, mut bpm) = setup(1);
        bpm.fetch_page(&file, 1).unwrap();
        bpm.unpin_page(&file, 1, true).unwrap();
        bpm.hash_table.remove(file.as_ref(), 1).unwrap();

        assert!(matches!(bpm.flush_file(&file), Err(Error::BadBuffer { frame_no: 0, valid: true, .. })));
        assert!(bpm.buf_desc_table[0].is_dirty());
        assert!(bpm.flush_all().is_err());
        bpm.flush_on_drop = false;
    }
}
