use crate::constants::USERNAME_REGEX;
use crate::core_auth::AuthError;
use regex::Regex;
use std::sync::OnceLock;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(USERNAME_REGEX).expect("USERNAME_REGEX is a valid pattern"))
}

pub fn is_valid_username(username: &str) -> bool {
    username_regex().is_match(username)
}

/// One `username:bcrypt_hash` line of the passwd file.
#[derive(Debug, Clone)]
pub struct PasswdEntry {
    username: String,
    hashed_password: String,
}

impl PasswdEntry {
    pub fn new(username: &str, hashed_password: &str) -> Self {
        Self {
            username: username.to_string(),
            hashed_password: hashed_password.to_string(),
        }
    }

    /// Parses one line. Blank lines and `#` comments yield `Ok(None)`.
    pub fn from_line(line: &str, line_no: usize) -> Result<Option<Self>, AuthError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (username, hashed_password) =
            line.split_once(':').ok_or_else(|| AuthError::InvalidEntry {
                line: line_no,
                reason: "expected username:hash".to_string(),
            })?;

        if !is_valid_username(username) {
            return Err(AuthError::InvalidEntry {
                line: line_no,
                reason: format!("invalid username {:?}", username),
            });
        }
        if !hashed_password.starts_with('$') {
            return Err(AuthError::InvalidEntry {
                line: line_no,
                reason: format!("password for {} is not a bcrypt hash", username),
            });
        }

        Ok(Some(PasswdEntry::new(username, hashed_password)))
    }

    pub fn get_hashed_password(&self) -> &str {
        &self.hashed_password
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }
}
