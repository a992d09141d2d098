// Here's the list of the FTP commands implemented
pub mod cwd;
pub mod help;
pub mod list;
pub mod noop;
pub mod pass;
pub mod pwd;
pub mod quit;
pub mod retr;
pub mod stor;
pub mod user;

// Parsing, dispatch and the shared error type
pub mod error;
pub mod ftpcommand;
pub mod handlers;
