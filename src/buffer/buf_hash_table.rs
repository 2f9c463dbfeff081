use std::collections::HashMap;

use crate::common::{FileId, FrameID, PageID};
use crate::error::{Error, Result};
use crate::storage::disk::File;

/// Maps a resident page, identified by (file, page number), to its buffer frame.
pub struct BufHashTbl {
    table: HashMap<(FileId, PageID), FrameID>,
}

impl BufHashTbl {
    /// Creates a table sized for a pool of `bufs` frames.
    pub fn new(bufs: usize) -> Self {
        let htsize = (bufs as f64 * 1.2) as usize + 1;
        Self { table: HashMap::with_capacity(htsize) }
    }

    /// Maps `(file, page_no)` to `frame_no`. A page may be mapped only once.
    pub fn insert(&mut self, file: &dyn File, page_no: PageID, frame_no: FrameID) -> Result<()> {
        let key = (file.id(), page_no);
        if let Some(existing) = self.table.get(&key) {
            return Err(Error::HashAlreadyPresent {
                file: file.filename(),
                page_no,
                frame_no: *existing,
            });
        }
        self.table.insert(key, frame_no);
        Ok(())
    }

    /// Returns the frame holding `(file, page_no)`, or None if the page is not resident.
    pub fn lookup(&self, file: &dyn File, page_no: PageID) -> Option<FrameID> {
        self.table.get(&(file.id(), page_no)).copied()
    }

    /// Unmaps `(file, page_no)`.
    pub fn remove(&mut self, file: &dyn File, page_no: PageID) -> Result<FrameID> {
        self.table
            .remove(&(file.id(), page_no))
            .ok_or_else(|| Error::HashNotFound { file: file.filename(), page_no })
    }

    /// Resident pages of one file, as (page number, frame) pairs.
    pub fn entries_of(&self, file_id: FileId) -> impl Iterator<Item = (PageID, FrameID)> + '_ {
        self.table
            .iter()
            .filter(move |((id, _), _)| *id == file_id)
            .map(|(&(_, page_no), &frame_no)| (page_no, frame_no))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::disk::MemFile;

    #[test]
    fn insert_lookup_remove() {
        let a = MemFile::new("a");
        let b = MemFile::new("b");
        let mut table = BufHashTbl::new(4);

        table.insert(&a, 1, 0).unwrap();
        table.insert(&b, 1, 1).unwrap();
        assert_eq!(table.lookup(&a, 1), Some(0));
        assert_eq!(table.lookup(&b, 1), Some(1));
        assert_eq!(table.lookup(&a, 2), None);

        assert_eq!(table.remove(&a, 1).unwrap(), 0);
        assert_eq!(table.lookup(&a, 1), None);
        assert_eq!(table.entries_of(b.id()).collect::<Vec<_>>(), vec![(1, 1)]);
        assert_eq!(table.entries_of(a.id()).count(), 0);
        assert!(matches!(table.remove(&a, 1), Err(Error::HashNotFound { page_no: 1, .. })));
    }

    #[test]
    fn duplicate_insert_fails() {
        let a = MemFile::new("a");
        let mut table = BufHashTbl::new(2);
        table.insert(&a, 5, 0).unwrap();
        assert_eq!(
            table.insert(&a, 5, 1),
            Err(Error::HashAlreadyPresent { file: "a".into(), page_no: 5, frame_no: 0 })
        );
        assert_eq!(table.lookup(&a, 5), Some(0));
    }
}
