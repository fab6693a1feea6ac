use std::io;

use rusqlite;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("database connection poisoned")]
    ConnectionPoisoned,
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
