//! examforge-loaders — Question set loaders.
//!
//! Implements the `QuestionSetLoader` trait for local files, HTTP servers and
//! in-memory fixtures, plus the configuration that selects between them.

pub mod config;
pub mod filesystem;
pub mod http;
pub mod memory;

pub use config::{create_loader, load_config, ExamforgeConfig, LoaderConfig};
pub use examforge_core::error::LoadError;
pub use filesystem::FileSystemLoader;
pub use http::HttpLoader;
pub use memory::InMemoryLoader;
