use crate::common::{PageID, PAGE_SIZE, INVALID_PAGE_ID};
use crate::error::{Error, Result};

/// A fixed-size block of bytes together with the number of the page it holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    data: [u8; PAGE_SIZE],
    page_no: PageID,
}

impl Page {
    pub fn new() -> Self {
        Self {
            data: [u8::default(); PAGE_SIZE],
            page_no: INVALID_PAGE_ID,
        }
    }

    /// Creates a zeroed page carrying the given number.
    pub fn with_number(page_no: PageID) -> Self {
        Self { data: [u8::default(); PAGE_SIZE], page_no }
    }

    pub fn page_number(&self) -> PageID {
        self.page_no
    }

    pub(crate) fn set_page_number(&mut self, page_no: PageID) {
        self.page_no = page_no;
    }

    pub fn data(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8; PAGE_SIZE] {
        &mut self.data
    }

    pub fn reset_memory(&mut self) {
        self.data = [u8::default(); PAGE_SIZE];
    }

    /// Copies `bytes` into the page starting at `offset`.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = Self::check_range(offset, bytes.len())?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Returns `len` bytes of the page starting at `offset`.
    pub fn read_at(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = Self::check_range(offset, len)?;
        Ok(&self.data[offset..end])
    }

    fn check_range(offset: usize, len: usize) -> Result<usize> {
        match offset.checked_add(len) {
            Some(end) if end <= PAGE_SIZE => Ok(end),
            _ => Err(Error::Internal(format!(
                "Byte range {}+{} is outside of a {} byte page",
                offset, len, PAGE_SIZE
            ))),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_range() {
        let mut page = Page::with_number(7);
        page.write_at(10, b"hello").unwrap();
        assert_eq!(page.read_at(10, 5).unwrap(), b"hello");
        assert_eq!(page.page_number(), 7);

        page.reset_memory();
        assert_eq!(page.read_at(10, 5).unwrap(), &[0u8; 5]);
    }

    #[test]
    fn out_of_bounds_range_is_rejected() {
        let mut page = Page::new();
        assert!(page.write_at(PAGE_SIZE - 2, b"abc").is_err());
        assert!(page.read_at(usize::MAX, 2).is_err());
        assert!(page.write_at(PAGE_SIZE - 3, b"abc").is_ok());
    }
}
