pub mod buffer;
pub mod common;
pub mod config;
pub mod error;
pub mod storage;

pub use crate::buffer::buffer_pool_manager::BufferPoolManager;
pub use crate::config::BufferPoolConfig;
