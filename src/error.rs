use std::fmt::Display;

use serde_derive::{Deserialize, Serialize};

use crate::common::{FrameID, PageID};

/// Result returning Error
pub type Result<T> = std::result::Result<T, Error>;

/// featherbuf errors. Internal, BadBuffer and HashAlreadyPresent indicate a broken
/// invariant; the rest are caused by the caller or the underlying file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// Every frame was pinned during a full clock sweep.
    BufferExceeded,
    /// Unpin of a resident page whose pin count is already zero.
    PageNotPinned { file: String, page_no: PageID, frame_no: FrameID },
    /// Dispose or flush of a page that is still pinned.
    PagePinned { file: String, page_no: PageID, frame_no: FrameID },
    /// A frame expected to hold a page is not valid.
    BadBuffer { frame_no: FrameID, dirty: bool, valid: bool, refbit: bool },
    /// The page is not resident in the buffer pool.
    HashNotFound { file: String, page_no: PageID },
    /// The page is already mapped to a frame.
    HashAlreadyPresent { file: String, page_no: PageID, frame_no: FrameID },
    /// The page does not exist in the file.
    InvalidPage { file: String, page_no: PageID },
    Config(String),
    Internal(String),
    Io(String),
    Serialization,
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::BufferExceeded => write!(f, "Exceeded the buffer pool capacity"),
            Error::PageNotPinned { file, page_no, frame_no } => write!(
                f,
                "This page is not already pinned. file:  {} page: {} frame: {}",
                file, page_no, frame_no
            ),
            Error::PagePinned { file, page_no, frame_no } => write!(
                f,
                "This page is already pinned. file:  {} page: {} frame: {}",
                file, page_no, frame_no
            ),
            Error::BadBuffer { frame_no, dirty, valid, refbit } => write!(
                f,
                "This buffer is bad: {} dirty: {} valid: {} refbit: {}",
                frame_no, dirty, valid, refbit
            ),
            Error::HashNotFound { file, page_no } => {
                write!(f, "The hash value is not present in the hash table for file: {} page: {}", file, page_no)
            }
            Error::HashAlreadyPresent { file, page_no, frame_no } => write!(
                f,
                "Entry corresponding to the hash value of file: {} page: {} is already present in the hash table (frame {})",
                file, page_no, frame_no
            ),
            Error::InvalidPage { file, page_no } => {
                write!(f, "Request made for an invalid page. file: {} page: {}", file, page_no)
            }
            Error::Config(s) | Error::Internal(s) | Error::Io(s) => write!(f, "{}", s),
            Error::Serialization => write!(f, "Serialization failure"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for Error {
    fn from(_: Box<bincode::ErrorKind>) -> Self {
        Error::Serialization
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::Internal(err.to_string())
    }
}
