pub mod ai;
pub mod config;
pub mod error;
pub mod feed;
pub mod jobs;
pub mod storage;
pub mod summary;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{Error, Result};
