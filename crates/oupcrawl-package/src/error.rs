use std::path::PathBuf;

use thiserror::Error;

/// Failures of a remote transfer session. All of them end the run.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("cannot connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    #[error("login as {user} failed: {reason}")]
    Login { user: String, reason: String },

    #[error("cannot list {path}: {reason}")]
    List { path: String, reason: String },

    #[error("cannot download {path}: {reason}")]
    Download { path: String, reason: String },

    #[error("transfer session already closed")]
    SessionClosed,

    #[error("transfer task failed: {0}")]
    Join(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("credentials error: {0}")]
    Credentials(String),

    #[error("bad bundle {path}: {reason}")]
    Zip { path: PathBuf, reason: String },

    #[error("unpack task failed: {0}")]
    Join(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PackageError>;
