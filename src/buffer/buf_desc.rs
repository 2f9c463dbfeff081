use std::fmt::Display;

use serde_derive::{Deserialize, Serialize};

use crate::common::{FileId, FrameID, PageID, INVALID_PAGE_ID};
use crate::storage::disk::FileRef;

/// Bookkeeping for one buffer frame: which page it holds and the state bits the
/// clock algorithm and the pin protocol work on.
pub struct BufDesc {
    file: Option<FileRef>,
    page_no: PageID,
    frame_no: FrameID,
    pin_cnt: u32,
    dirty: bool,
    valid: bool,
    refbit: bool,
}

impl BufDesc {
    pub fn new(frame_no: FrameID) -> Self {
        Self {
            file: None,
            page_no: INVALID_PAGE_ID,
            frame_no,
            pin_cnt: 0,
            dirty: false,
            valid: false,
            refbit: false,
        }
    }

    /// Publishes the frame as holding `page_no` of `file`, pinned once and recently used.
    pub fn set(&mut self, file: FileRef, page_no: PageID) {
        self.file = Some(file);
        self.page_no = page_no;
        self.pin_cnt = 1;
        self.dirty = false;
        self.valid = true;
        self.refbit = true;
    }

    /// Returns the frame to the invalid state.
    pub fn clear(&mut self) {
        self.file = None;
        self.page_no = INVALID_PAGE_ID;
        self.pin_cnt = 0;
        self.dirty = false;
        self.valid = false;
        self.refbit = false;
    }

    pub fn file(&self) -> Option<&FileRef> {
        self.file.as_ref()
    }

    pub fn file_id(&self) -> Option<FileId> {
        self.file.as_ref().map(|file| file.id())
    }

    pub fn page_no(&self) -> PageID {
        self.page_no
    }

    pub fn frame_no(&self) -> FrameID {
        self.frame_no
    }

    pub fn pin_cnt(&self) -> u32 {
        self.pin_cnt
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn refbit(&self) -> bool {
        self.refbit
    }

    pub(crate) fn pin(&mut self) {
        self.pin_cnt += 1;
        self.refbit = true;
    }

    /// Drops one pin. Returns false if the frame was not pinned.
    pub(crate) fn unpin(&mut self) -> bool {
        match self.pin_cnt.checked_sub(1) {
            Some(pin_cnt) => {
                self.pin_cnt = pin_cnt;
                true
            }
            None => false,
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn clear_refbit(&mut self) {
        self.refbit = false;
    }

    /// Snapshot of the descriptor for diagnostics.
    pub fn info(&self) -> FrameInfo {
        FrameInfo {
            frame_no: self.frame_no,
            file: self.file.as_ref().map(|file| file.filename()),
            page_no: self.page_no,
            pin_cnt: self.pin_cnt,
            dirty: self.dirty,
            valid: self.valid,
            refbit: self.refbit,
        }
    }
}

impl Display for BufDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "file:{} pageNo:{} ", file.filename(), self.page_no)?,
            None => write!(f, "file:NULL ")?,
        }
        write!(
            f,
            "valid:{} pinCnt:{} dirty:{} refbit:{}",
            self.valid, self.pin_cnt, self.dirty, self.refbit
        )
    }
}

/// Serializable copy of a frame descriptor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub frame_no: FrameID,
    pub file: Option<String>,
    pub page_no: PageID,
    pub pin_cnt: u32,
    pub dirty: bool,
    pub valid: bool,
    pub refbit: bool,
}
