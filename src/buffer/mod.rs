pub mod buf_desc;
pub mod buf_hash_table;
pub mod buffer_pool_manager;

pub use buf_desc::{BufDesc, FrameInfo};
pub use buffer_pool_manager::{BufStats, BufferPoolManager};
