// Errors for credential loading and hashing
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to read passwd file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid passwd entry on line {line}: {reason}")]
    InvalidEntry { line: usize, reason: String },

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}
