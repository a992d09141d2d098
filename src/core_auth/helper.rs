use crate::core_auth::core_auth::PasswdEntry;
use crate::core_auth::AuthError;
use bcrypt::{hash, verify};
use log::info;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(hash(password, cost)?)
}

pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    verify(password, hashed_password).unwrap_or(false)
}

/// Reads cost from a `$2b$NN$...` hash.
pub fn hash_cost(hashed_password: &str) -> Option<u32> {
    hashed_password.split('$').nth(2)?.parse().ok()
}

pub fn load_passwd_file(path: &Path) -> Result<HashMap<String, PasswdEntry>, AuthError> {
    let content = fs::read_to_string(path).map_err(|source| AuthError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut passwd_map = HashMap::new();
    for (index, line) in content.lines().enumerate() {
        if let Some(entry) = PasswdEntry::from_line(line, index + 1)? {
            passwd_map.insert(entry.get_username().to_string(), entry);
        }
    }

    info!("Loaded {} account(s) from {:?}", passwd_map.len(), path);
    Ok(passwd_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("s3cret", 4).unwrap();
        assert_eq!(hash_cost(&hashed), Some(4));
        assert!(verify_password("s3cret", &hashed));
        assert!(!verify_password("S3cret", &hashed));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }

    #[test]
    fn test_load_passwd_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let hashed = hash_password("pw", 4).unwrap();
        writeln!(file, "# accounts").unwrap();
        writeln!(file, "carol:{}", hashed).unwrap();
        writeln!(file).unwrap();

        let map = load_passwd_file(file.path()).unwrap();
        assert_eq!(map.len(), 1);
        assert!(verify_password("pw", map["carol"].get_hashed_password()));
    }

    #[test]
    fn test_load_passwd_file_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# accounts").unwrap();
        writeln!(file, "dave").unwrap();
        assert!(matches!(
            load_passwd_file(file.path()),
            Err(AuthError::InvalidEntry { line: 2, .. })
        ));
    }
}
