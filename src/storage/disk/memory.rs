use std::collections::HashMap;
use std::fmt::Display;
use std::sync::RwLock;

use log::trace;

use crate::common::{FileId, PageID, INVALID_PAGE_ID};
use crate::error::{Error, Result};
use crate::storage::page::page::Page;
use super::File;

/// An in-memory page file. Useful for embedding and testing: it counts reads and
/// writes and lets callers inspect what was actually persisted.
pub struct MemFile {
    id: FileId,
    name: String,
    inner: RwLock<Inner>,
}

struct Inner {
    pages: HashMap<PageID, Page>,
    next_page_no: PageID,
    reads: u64,
    writes: u64,
}

impl MemFile {
    /// Creates a new, empty in-memory file.
    pub fn new(name: &str) -> Self {
        Self {
            id: FileId::next(),
            name: name.to_string(),
            inner: RwLock::new(Inner {
                pages: HashMap::new(),
                next_page_no: INVALID_PAGE_ID + 1,
                reads: 0,
                writes: 0,
            }),
        }
    }

    /// Number of pages read from the file.
    pub fn reads(&self) -> u64 {
        self.inner.read().map(|inner| inner.reads).unwrap_or_default()
    }

    /// Number of pages written to the file.
    pub fn writes(&self) -> u64 {
        self.inner.read().map(|inner| inner.writes).unwrap_or_default()
    }

    /// Returns the persisted copy of a page, bypassing any cache.
    pub fn persisted(&self, page_no: PageID) -> Option<Page> {
        self.inner.read().ok()?.pages.get(&page_no).cloned()
    }

    /// Number of live pages.
    pub fn num_pages(&self) -> usize {
        self.inner.read().map(|inner| inner.pages.len()).unwrap_or_default()
    }

    fn invalid_page(&self, page_no: PageID) -> Error {
        Error::InvalidPage { file: self.name.clone(), page_no }
    }
}

impl Display for MemFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "memory:{}", self.name)
    }
}

impl File for MemFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn filename(&self) -> String {
        self.name.clone()
    }

    fn read_page(&self, page_no: PageID) -> Result<Page> {
        let mut inner = self.inner.write()?;
        let page = inner.pages.get(&page_no).cloned().ok_or_else(|| self.invalid_page(page_no))?;
        inner.reads += 1;
        Ok(page)
    }

    fn write_page(&self, page: &Page) -> Result<()> {
        let mut inner = self.inner.write()?;
        let page_no = page.page_number();
        match inner.pages.get_mut(&page_no) {
            Some(stored) => *stored = page.clone(),
            None => return Err(self.invalid_page(page_no)),
        }
        inner.writes += 1;
        trace!("{}: wrote page {}", self, page_no);
        Ok(())
    }

    fn allocate_page(&self) -> Result<Page> {
        let mut inner = self.inner.write()?;
        let page_no = inner.next_page_no;
        inner.next_page_no += 1;
        let page = Page::with_number(page_no);
        inner.pages.insert(page_no, page.clone());
        Ok(page)
    }

    fn delete_page(&self, page_no: PageID) -> Result<()> {
        let mut inner = self.inner.write()?;
        match inner.pages.remove(&page_no) {
            Some(_) => Ok(()),
            None => Err(self.invalid_page(page_no)),
        }
    }
}
