//! Run-wide configuration record.
//!
//! All fields are populated once by the CLI layer and shared read-only with
//! every component for the remainder of the process.

/// Shred run configuration.
#[derive(Clone, Debug)]
pub struct ShredConfig {
    /// Number of top-level overwrite passes (minimum 1).
    pub passes: u32,
    /// Descend into directories.
    pub recursive: bool,
    /// Overwrite but do not unlink.
    pub keep_files: bool,
    /// Emit INFO-level events.
    pub verbose: bool,
    /// Follow symbolic links instead of skipping them.
    pub follow_symlinks: bool,
    /// Use the fixed-pattern schedule in the overwrite kernel.
    pub secure: bool,
    /// Simulate without mutating anything.
    pub dry_run: bool,
    /// Verify after each pass.
    pub verify: bool,
    /// Attempt permission elevation when read or write is denied.
    pub force: bool,
    /// Emit diagnostic events and confirm interactively before starting.
    pub internal: bool,
}

impl Default for ShredConfig {
    fn default() -> Self {
        Self {
            passes: 3,
            recursive: false,
            keep_files: false,
            verbose: false,
            follow_symlinks: false,
            secure: false,
            dry_run: false,
            verify: true,
            force: false,
            internal: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_behavior() {
        let cfg = ShredConfig::default();
        assert_eq!(cfg.passes, 3);
        assert!(cfg.verify);
        assert!(!cfg.recursive);
        assert!(!cfg.secure);
        assert!(!cfg.force);
    }
}
