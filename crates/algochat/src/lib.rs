pub mod client;
pub mod config;
pub mod conversation;
pub mod errors;
pub mod file_index;
pub mod formatter;
pub mod linker;
pub mod models;
pub mod session;
pub mod streaming;
