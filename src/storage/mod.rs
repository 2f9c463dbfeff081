pub mod disk;
pub mod page;

pub use disk::{File, FileRef, MemFile, PageFile};
pub use page::page::Page;
