//! Core types for the shredbox engine.

use std::path::PathBuf;
use thiserror::Error;
use zeroize::Zeroizing;

/// Error types for shred operations.
///
/// Errors localised to a single file never abort the walk; they are logged
/// and folded into the process-wide fatal flag (see [`crate::report`]).
#[derive(Error, Debug)]
pub enum ShredError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    BadArgument(String),

    #[error("'{}' is not a valid file or directory", .0.display())]
    NotRegular(PathBuf),

    #[error("failed to retrieve permissions for '{}': {detail}", .path.display())]
    PermissionRetrieval { path: PathBuf, detail: String },

    #[error("no {access} permissions for '{}'", .path.display())]
    PermissionDenied { path: PathBuf, access: &'static str },

    #[error("Failed to open file '{}' after {attempts} attempts", .path.display())]
    Open { path: PathBuf, attempts: u32 },

    #[error("write failed on '{}' at offset {offset}: {source}", .path.display())]
    Write {
        path: PathBuf,
        offset: u64,
        source: std::io::Error,
    },

    #[error("Overwrite verification failed for '{}'", .0.display())]
    VerificationMismatch(PathBuf),

    #[error("Failed to delete file '{}'", .0.display())]
    Unlink(PathBuf),

    #[error("metadata scrub failed for '{}': {detail}", .path.display())]
    MetadataScrub { path: PathBuf, detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for shredbox operations.
pub type Result<T> = std::result::Result<T, ShredError>;

impl From<nix::errno::Errno> for ShredError {
    fn from(err: nix::errno::Errno) -> Self {
        ShredError::Io(std::io::Error::from_raw_os_error(err as i32))
    }
}

/// Per-file working record. Created when the walker hands a regular file to
/// the engine, dropped when the engine returns. The `last_written` buffer is
/// sized exactly to the file's size at start-of-shred and is zeroized on
/// release.
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub last_written: Option<Zeroizing<Vec<u8>>>,
    pub verification_failed: bool,
}

impl FileRecord {
    pub fn new(path: PathBuf, size: u64, track_writes: bool) -> Self {
        let last_written = if track_writes {
            Some(Zeroizing::new(vec![0u8; size as usize]))
        } else {
            None
        };
        Self {
            path,
            size,
            last_written,
            verification_failed: false,
        }
    }
}

/// Terminal states of the per-file engine.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShredOutcome {
    /// All configured passes ran; the file was deleted or kept per config.
    Done,
    /// Size-zero file removed without overwriting.
    UnlinkedEmpty,
    /// Dry-run: the file was only reported.
    DryRun,
    /// Symlink skipped because follow mode is off.
    SkippedSymlink,
    /// Dangling symlink; nothing to do.
    Skipped,
    /// Unrecoverable per-file failure; the fatal flag has been set.
    Fail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_path() {
        let err = ShredError::PermissionDenied {
            path: PathBuf::from("/tmp/x"),
            access: "write",
        };
        assert_eq!(err.to_string(), "no write permissions for '/tmp/x'");
    }

    #[test]
    fn file_record_sizes_buffer_to_file() {
        let rec = FileRecord::new(PathBuf::from("a"), 10, true);
        assert_eq!(rec.last_written.as_ref().unwrap().len(), 10);

        let rec = FileRecord::new(PathBuf::from("a"), 10, false);
        assert!(rec.last_written.is_none());
    }
}
