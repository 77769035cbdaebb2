pub mod config;
pub mod init;
pub mod render;
pub mod sync;
