pub mod core_auth;
pub mod error;
pub mod helper;
pub mod store;

pub use error::AuthError;
pub use store::{CredentialStore, PasswdStore};
