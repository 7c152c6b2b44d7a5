//! Error types for cablecheck operations.
//!
//! Most conditions in this crate are absorbed where they happen: a missing
//! inventory file or a malformed dump section degrades to an empty
//! contribution and is only logged. The variants below still carry those
//! conditions so they can be logged and tested uniformly.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for cablecheck operations.
pub type Result<T> = std::result::Result<T, CableCheckError>;

/// Errors that can occur while reconciling or classifying the fabric.
#[derive(Debug, Error)]
pub enum CableCheckError {
    /// An optional input file (inventory, host list, expected topology,
    /// category table) could not be read.
    #[error("Input file {} unavailable: {source}", path.display())]
    MissingInputFile {
        /// Path that was read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The discovery dump directory is absent or unreadable.
    #[error("LLDP dump directory {} unavailable: {source}", path.display())]
    DumpDirectory {
        /// Directory that was listed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A dump section lacked an interface or a port identifier.
    #[error("Malformed LLDP section on {device}: {reason}")]
    MalformedSection {
        /// Device whose dump contained the section.
        device: String,
        /// What was missing.
        reason: String,
    },

    /// An output artifact could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    WriteFailure {
        /// Destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Configuration could not be parsed or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CableCheckError {
    /// Creates a missing input file error.
    pub fn missing_input(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::MissingInputFile {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a dump directory error.
    pub fn dump_directory(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::DumpDirectory {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a malformed section error.
    pub fn malformed_section(device: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSection {
            device: device.into(),
            reason: reason.into(),
        }
    }

    /// Creates a write failure error.
    pub fn write_failure(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::WriteFailure {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Returns true if this error must halt the run before any artifact
    /// is written.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CableCheckError::DumpDirectory { .. } | CableCheckError::Config(_)
        )
    }

    /// Process exit code for a fatal error.
    pub fn exit_code(&self) -> u8 {
        match self {
            CableCheckError::DumpDirectory { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "No such file or directory")
    }

    #[test]
    fn test_error_display() {
        let err = CableCheckError::malformed_section("leaf01", "no PortID or PortDescr");
        assert_eq!(
            err.to_string(),
            "Malformed LLDP section on leaf01: no PortID or PortDescr"
        );
    }

    #[test]
    fn test_missing_input_display() {
        let err = CableCheckError::missing_input("assets.ini", not_found());
        assert!(err.to_string().contains("assets.ini"));
        assert!(err.to_string().contains("No such file"));
    }

    #[test]
    fn test_is_fatal() {
        assert!(CableCheckError::dump_directory("lldp-results", not_found()).is_fatal());
        assert!(CableCheckError::Config("bad".to_string()).is_fatal());
        assert!(!CableCheckError::missing_input("hosts.ini", not_found()).is_fatal());
        assert!(!CableCheckError::write_failure("/x/topology.js", not_found()).is_fatal());
        assert!(!CableCheckError::malformed_section("a", "b").is_fatal());
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let dir = CableCheckError::dump_directory("lldp-results", not_found());
        let cfg = CableCheckError::Config("bad".to_string());
        assert_eq!(dir.exit_code(), 2);
        assert_eq!(cfg.exit_code(), 1);
    }
}
