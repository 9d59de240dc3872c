pub mod frame;
pub mod stream_info;
pub mod unique_path;
