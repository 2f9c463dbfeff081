use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, trace};
use serde_derive::{Deserialize, Serialize};

use crate::common::{FileId, PageID, PAGE_SIZE, INVALID_PAGE_ID};
use crate::error::{Error, Result};
use crate::storage::page::page::Page;
use super::File;

const MAGIC: u32 = 0x4642_5046;

/// Deleted page numbers that fit in the header page next to the other fields.
const MAX_FREE_PAGES: usize = (PAGE_SIZE - 32) / 4;

/// Header stored in page 0 of every page file.
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    magic: u32,
    /// Highest page number ever handed out.
    num_pages: PageID,
    /// Deleted pages, reused by `allocate_page` before the file grows.
    free_list: Vec<PageID>,
}

/// A page file on disk. Page `n` is stored at byte offset `n * PAGE_SIZE`; page 0
/// holds the header.
pub struct PageFile {
    id: FileId,
    path: PathBuf,
    inner: Mutex<Inner>,
}

struct Inner {
    file: fs::File,
    header: Header,
}

impl PageFile {
    /// Creates a new page file, failing if one already exists at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).create_new(true).open(&path)?;
        let mut inner = Inner {
            file,
            header: Header { magic: MAGIC, num_pages: INVALID_PAGE_ID, free_list: Vec::new() },
        };
        inner.write_header()?;
        debug!("Created page file {}", path.display());
        Ok(Self { id: FileId::next(), path, inner: Mutex::new(inner) })
    }

    /// Opens an existing page file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let mut buf = vec![0u8; PAGE_SIZE];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut buf)?;
        let header: Header = bincode::deserialize(&buf)?;
        if header.magic != MAGIC {
            return Err(Error::Internal(format!("{} is not a page file", path.display())));
        }
        debug!("Opened page file {} with {} pages", path.display(), header.num_pages);
        Ok(Self { id: FileId::next(), path, inner: Mutex::new(Inner { file, header }) })
    }

    /// Deletes the page file at `path`.
    pub fn remove<P: AsRef<Path>>(path: P) -> Result<()> {
        Ok(fs::remove_file(path)?)
    }

    /// Highest page number handed out so far.
    pub fn num_pages(&self) -> Result<PageID> {
        Ok(self.inner.lock()?.header.num_pages)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_page(&self, header: &Header, page_no: PageID) -> Result<()> {
        if page_no == INVALID_PAGE_ID
            || page_no > header.num_pages
            || header.free_list.contains(&page_no)
        {
            return Err(Error::InvalidPage { file: self.filename(), page_no });
        }
        Ok(())
    }
}

impl Inner {
    fn write_header(&mut self) -> Result<()> {
        let bytes = bincode::serialize(&self.header)?;
        if bytes.len() > PAGE_SIZE {
            return Err(Error::Internal("Page file header exceeds a page".into()));
        }
        let mut buf = vec![0u8; PAGE_SIZE];
        buf[..bytes.len()].copy_from_slice(&bytes);
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    fn write_raw(&mut self, page_no: PageID, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(page_no as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(data)?;
        Ok(())
    }
}

impl Display for PageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl File for PageFile {
    fn id(&self) -> FileId {
        self.id
    }

    fn filename(&self) -> String {
        self.path.display().to_string()
    }

    fn read_page(&self, page_no: PageID) -> Result<Page> {
        let mut inner = self.inner.lock()?;
        self.check_page(&inner.header, page_no)?;
        let mut page = Page::with_number(page_no);
        inner.file.seek(SeekFrom::Start(page_no as u64 * PAGE_SIZE as u64))?;
        inner.file.read_exact(page.data_mut())?;
        trace!("{}: read page {}", self, page_no);
        Ok(page)
    }

    fn write_page(&self, page: &Page) -> Result<()> {
        let mut inner = self.inner.lock()?;
        self.check_page(&inner.header, page.page_number())?;
        inner.write_raw(page.page_number(), page.data())?;
        trace!("{}: wrote page {}", self, page.page_number());
        Ok(())
    }

    fn allocate_page(&self) -> Result<Page> {
        let mut inner = self.inner.lock()?;
        let page_no = match inner.header.free_list.pop() {
            Some(page_no) => page_no,
            None => {
                inner.header.num_pages += 1;
                inner.header.num_pages
            }
        };
        let page = Page::with_number(page_no);
        inner.write_raw(page_no, page.data())?;
        inner.write_header()?;
        Ok(page)
    }

    fn delete_page(&self, page_no: PageID) -> Result<()> {
        let mut inner = self.inner.lock()?;
        self.check_page(&inner.header, page_no)?;
        if page_no == inner.header.num_pages {
            inner.header.num_pages -= 1;
            let len = (inner.header.num_pages as u64 + 1) * PAGE_SIZE as u64;
            inner.file.set_len(len)?;
        } else if inner.header.free_list.len() < MAX_FREE_PAGES {
            inner.header.free_list.push(page_no);
        } else {
            return Err(Error::Internal(format!("Free list of {} is full", self)));
        }
        inner.write_header()?;
        debug!("{}: deleted page {}", self, page_no);
        Ok(())
    }
}
