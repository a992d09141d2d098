// Errors raised while resolving client paths against the served root
use crate::helpers::Reply;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Access denied: {0:?} is outside the served root")]
    Escape(PathBuf),

    #[error("Root directory is unusable: {0}")]
    InvalidRoot(String),

    #[error("Failed to inspect {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SandboxError {
    pub fn to_ftp_response(&self) -> Reply {
        match self {
            SandboxError::Escape(_) => Reply::new(550, "Access denied."),
            _ => Reply::new(550, "Requested path unavailable."),
        }
    }
}
