// Failures a command handler can report to the dispatcher
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    /// Writing to the control connection failed; the session is over.
    #[error("control connection failed: {0}")]
    Control(#[from] std::io::Error),

    /// Anything else. Answered with 500 and the session carries on.
    #[error("internal error: {0}")]
    Internal(String),
}
