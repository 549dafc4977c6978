use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to append to event log {}: {source}", .path.display())]
    Append { path: PathBuf, source: io::Error },

    #[error("Failed to read event log {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
}
