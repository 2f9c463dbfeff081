use std::sync::Arc;

use tempfile::tempdir;
use featherbuf::buffer::BufferPoolManager;
use featherbuf::common::PAGE_SIZE;
use featherbuf::error::Error;
use featherbuf::storage::{File, FileRef, PageFile};

#[test]
fn test_write_then_read_page() {
    let dir = tempdir().unwrap();
    let file = PageFile::create(dir.path().join("pages.db")).unwrap();

    let mut page = file.allocate_page().unwrap();
    assert_eq!(page.page_number(), 1);
    assert_eq!(page.data(), &[0u8; PAGE_SIZE]);

    page.write_at(0, "hello, world!".as_bytes()).unwrap();
    file.write_page(&page).unwrap();

    let read = file.read_page(1).unwrap();
    let content = std::str::from_utf8(read.read_at(0, 13).unwrap()).expect("convert failed");
    assert_eq!(content, "hello, world!");
}

#[test]
fn test_reopen_keeps_pages() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pages.db");
    {
        let file = PageFile::create(&path).unwrap();
        for i in 0..3u8 {
            let mut page = file.allocate_page().unwrap();
            page.write_at(0, &[i + 1; 8]).unwrap();
            file.write_page(&page).unwrap();
        }
        file.delete_page(2).unwrap();
    }

    let file = PageFile::open(&path).unwrap();
    assert_eq!(file.num_pages().unwrap(), 3);
    assert_eq!(file.read_page(1).unwrap().read_at(0, 8).unwrap(), &[1u8; 8]);
    assert_eq!(file.read_page(3).unwrap().read_at(0, 8).unwrap(), &[3u8; 8]);
    assert!(matches!(file.read_page(2), Err(Error::InvalidPage { page_no: 2, .. })));

    // Deleted page numbers are handed out again, zeroed.
    let page = file.allocate_page().unwrap();
    assert_eq!(page.page_number(), 2);
    assert_eq!(file.read_page(2).unwrap().read_at(0, 8).unwrap(), &[0u8; 8]);
    assert_eq!(file.allocate_page().unwrap().page_number(), 4);
}

#[test]
fn test_invalid_pages() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pages.db");
    let file = PageFile::create(&path).unwrap();

    assert!(matches!(file.read_page(0), Err(Error::InvalidPage { page_no: 0, .. })));
    assert!(matches!(file.read_page(1), Err(Error::InvalidPage { page_no: 1, .. })));
    assert!(matches!(file.delete_page(1), Err(Error::InvalidPage { .. })));

    let page = file.allocate_page().unwrap();
    file.delete_page(page.page_number()).unwrap();
    assert_eq!(file.num_pages().unwrap(), 0);
    assert!(matches!(file.write_page(&page), Err(Error::InvalidPage { .. })));

    // Creating over an existing file fails, and so does opening a missing one.
    assert!(matches!(PageFile::create(&path), Err(Error::Io(_))));
    drop(file);
    PageFile::remove(&path).unwrap();
    assert!(matches!(PageFile::open(&path), Err(Error::Io(_))));
}

#[test]
fn test_open_rejects_foreign_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.db");
    std::fs::write(&path, vec![0xabu8; PAGE_SIZE]).unwrap();

    assert!(PageFile::open(&path).is_err());
}

#[test]
fn test_buffer_pool_over_page_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pool.db");
    let file: FileRef = Arc::new(PageFile::create(&path).unwrap());
    let mut page_ids = Vec::new();
    {
        let mut bpm = BufferPoolManager::new(2);
        for i in 0..5u32 {
            let (page_no, page) = bpm.alloc_page(&file).unwrap();
            page.write_at(0, &i.to_le_bytes()).unwrap();
            bpm.unpin_page(&file, page_no, true).unwrap();
            page_ids.push(page_no);
        }
        // Everything was evicted or is flushed here, so the file holds it all.
        bpm.flush_file(&file).unwrap();
        assert_eq!(bpm.num_valid_frames(), 0);
    }
    drop(file);

    let file: FileRef = Arc::new(PageFile::open(&path).unwrap());
    let mut bpm = BufferPoolManager::new(2);
    for (i, &page_no) in page_ids.iter().enumerate() {
        let page = bpm.fetch_page(&file, page_no).unwrap();
        assert_eq!(page.read_at(0, 4).unwrap(), &(i as u32).to_le_bytes());
        bpm.unpin_page(&file, page_no, false).unwrap();
    }

    bpm.dispose_page(&file, page_ids[4]).unwrap();
    assert!(matches!(file.read_page(page_ids[4]), Err(Error::InvalidPage { .. })));
}
