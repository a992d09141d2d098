// Path containment for everything a client can name
pub mod error;
pub mod sandbox;

pub use error::SandboxError;
pub use sandbox::{PathSandbox, VirtualPath};
