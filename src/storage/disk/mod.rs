pub mod memory;
pub mod page_file;

pub use memory::MemFile;
pub use page_file::PageFile;

use std::fmt::Display;
use std::sync::Arc;

use crate::common::{FileId, PageID};
use crate::error::Result;
use crate::storage::page::page::Page;

/// A persistent file of fixed-size pages. The buffer pool reads, writes, allocates
/// and deletes pages through this trait but never owns the file's lifetime.
pub trait File: Display + Send + Sync {
    /// Stable identity of this file, used to key cached pages.
    fn id(&self) -> FileId;

    /// Human readable name, used in error messages.
    fn filename(&self) -> String;

    /// Reads an existing page. Fails with `Error::InvalidPage` if it does not exist.
    fn read_page(&self, page_no: PageID) -> Result<Page>;

    /// Overwrites the persisted contents of `page.page_number()`.
    fn write_page(&self, page: &Page) -> Result<()>;

    /// Creates a new zeroed page and returns it.
    fn allocate_page(&self) -> Result<Page>;

    /// Deletes a page. Callers holding a buffer pool must dispose through the pool instead.
    fn delete_page(&self, page_no: PageID) -> Result<()>;
}

/// Shared handle to a file, as held by the buffer pool's frame descriptors.
pub type FileRef = Arc<dyn File>;
