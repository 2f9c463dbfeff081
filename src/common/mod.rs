use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_derive::{Deserialize, Serialize};

pub type FrameID = usize;  // frame id type
pub type PageID = u32;     // page id type

pub const PAGE_SIZE: usize = 4096;
pub const INVALID_PAGE_ID: PageID = 0;

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an open file, used as part of the buffer pool's page key.
/// Every file handed out by a `File` implementation gets a fresh one.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(u64);

impl FileId {
    /// Allocates a new, process-unique file id.
    pub fn next() -> Self {
        Self(NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "file#{}", self.0)
    }
}
