// src/constants.rs

pub const USERNAME_REGEX: &str = r"^[a-zA-Z0-9_.-]{1,32}$";

// Copy buffer for data-connection streaming
pub const DATA_BUFFER_SIZE: usize = 8192;

// Lowest port a client may advertise with PORT
pub const MIN_DATA_PORT: u64 = 1024;
pub const MAX_DATA_PORT: u64 = 65535;

pub const EMPTY_LISTING_LINE: &str = "(empty directory)";

// Accounts used when no passwd file is configured
pub const DEMO_USERS: &[(&str, &str)] = &[("alice", "123456"), ("bob", "abcdef")];

// Longest control line accepted, terminator included
pub const MAX_COMMAND_LINE: u64 = 4096;

// Pause before retrying after a failed accept()
pub const ACCEPT_ERROR_BACKOFF: std::time::Duration = std::time::Duration::from_millis(100);
