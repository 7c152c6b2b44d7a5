//! Reading of optional input files.

use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::CableCheckError;

/// Reads an optional input file.
///
/// An absent or unreadable file is not an error for the run: it is logged
/// and contributes nothing.
pub fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            let err = CableCheckError::missing_input(path, e);
            warn!(error = %err, "Continuing without input file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_existing_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "leaf01").unwrap();
        file.flush().unwrap();
        assert_eq!(read_optional(file.path()).as_deref(), Some("leaf01"));
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_optional(Path::new("/nonexistent/hosts.ini")).is_none());
    }
}
