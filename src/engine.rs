//! Per-file shred engine.
//!
//! Sequences permission discovery, optional elevation, the overwrite loop,
//! verification, metadata scrubbing, and the rename-and-unlink step for one
//! file. A file is unlinked only when every configured pass completed,
//! verification did not fail, and keep mode is off.

use crate::config::ShredConfig;
use crate::logging;
use crate::overwrite::OverwriteKernel;
use crate::permissions;
use crate::platform;
use crate::random::RandomSource;
use crate::report;
use crate::types::{FileRecord, Result, ShredError, ShredOutcome};
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

const OPEN_ATTEMPTS: u32 = 10;
const OPEN_RETRY_DELAY: Duration = Duration::from_millis(500);
const METADATA_SETTLE: Duration = Duration::from_millis(50);
const OBFUSCATED_NAME_LEN: usize = 32;

/// Serialises chmod -> rename -> scrub -> unlink so concurrent engines never
/// collide on the same temp-directory name.
static RENAME_LOCK: Mutex<()> = Mutex::new(());

/// Shred one file. Unrecoverable failures are logged, set the process fatal
/// flag, and yield [`ShredOutcome::Fail`]; they never abort the walk.
pub fn shred_file(path: &Path, config: &ShredConfig) -> ShredOutcome {
    match run(path, config) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            report::set_fatal();
            ShredOutcome::Fail
        }
    }
}

fn run(path: &Path, config: &ShredConfig) -> Result<ShredOutcome> {
    let mut path = path.to_path_buf();

    let meta = std::fs::symlink_metadata(&path)?;
    if meta.file_type().is_symlink() {
        if !config.follow_symlinks {
            if config.dry_run {
                info!(
                    target: logging::DRY_RUN,
                    "Symlink file '{}' would not be shredded.",
                    path.display()
                );
                return Ok(ShredOutcome::DryRun);
            }
            warn!("Skipping symlink '{}'", path.display());
            return Ok(ShredOutcome::SkippedSymlink);
        }
        match std::fs::canonicalize(&path) {
            Ok(target) => path = target,
            Err(_) => {
                warn!("Dangling symlink (not followed): '{}'", path.display());
                return Ok(ShredOutcome::Skipped);
            }
        }
    }

    if config.dry_run {
        info!(
            target: logging::DRY_RUN,
            "Simulating shredding file '{}'.",
            path.display()
        );
        return Ok(ShredOutcome::DryRun);
    }

    if !gate_permissions(&path, config) {
        return Ok(ShredOutcome::Fail);
    }

    let size = std::fs::metadata(&path)?.len();
    if size == 0 {
        return unlink_empty(&path, config);
    }

    let Some(mut file) = open_with_retries(&path) else {
        let err = ShredError::Open {
            path: path.clone(),
            attempts: OPEN_ATTEMPTS,
        };
        error!("{}. Skipping.", err);
        report::set_fatal();
        return Ok(ShredOutcome::Fail);
    };

    let kernel = OverwriteKernel::new(config);
    let mut record = FileRecord::new(path.clone(), size, config.verify);
    let mut rng = RandomSource::new();

    for pass in 0..config.passes {
        if let Err(e) = kernel.run_pass(&mut file, &mut record, &mut rng, pass) {
            error!("{}", e);
            record.verification_failed = true;
            break;
        }
        match kernel.verify_pass(&mut file, &record) {
            Ok(true) => {}
            Ok(false) => record.verification_failed = true,
            Err(e) => {
                error!("{}", e);
                record.verification_failed = true;
            }
        }
        info!(
            "Completed overwrite pass {} for file '{}'.",
            pass + 1,
            path.display()
        );
        print!(
            "Progress: {:.1}%\r",
            (pass + 1) as f64 / config.passes as f64 * 100.0
        );
        let _ = std::io::stdout().flush();
    }

    drop(file);
    platform::sync_file(&path);

    if record.verification_failed {
        warn!(
            "{}. Skipping deletion.",
            ShredError::VerificationMismatch(path.clone())
        );
    }
    if config.keep_files || record.verification_failed {
        info!("File '{}' overwritten without deletion.", path.display());
        return Ok(ShredOutcome::Done);
    }

    match scrub_and_unlink(&path, &mut rng) {
        Ok(()) => {
            if config.verify {
                info!(
                    "File '{}' shredded, verified, and deleted.",
                    path.display()
                );
            } else {
                info!(
                    "File '{}' shredded and deleted without verification.",
                    path.display()
                );
            }
            Ok(ShredOutcome::Done)
        }
        Err(e) => {
            error!("{}.", e);
            report::set_fatal();
            Ok(ShredOutcome::Fail)
        }
    }
}

/// Discover, and under force elevate, access rights. Returns `false` (with
/// the fatal flag set) when the file must be skipped.
fn gate_permissions(path: &Path, config: &ShredConfig) -> bool {
    let rights = permissions::discover(path);
    if rights.retrieval_failed {
        error!(
            "Failed to retrieve permissions for '{}'. Skipping.",
            path.display()
        );
        report::set_fatal();
        return false;
    }
    if rights.read && rights.write {
        return true;
    }

    if !config.force {
        let access = if rights.write { "read" } else { "write" };
        error!(
            "{}.",
            ShredError::PermissionDenied {
                path: path.to_path_buf(),
                access,
            }
        );
        report::set_fatal();
        return false;
    }

    match permissions::elevate(path) {
        Ok(elevated) if elevated.read && elevated.write => true,
        Ok(_) => {
            error!(
                "'{}': permission elevation did not grant access.",
                path.display()
            );
            report::set_fatal();
            false
        }
        Err(e) => {
            error!(
                "'{}': permission elevation failed: {}",
                path.display(),
                e
            );
            report::set_fatal();
            false
        }
    }
}

fn unlink_empty(path: &Path, config: &ShredConfig) -> Result<ShredOutcome> {
    if config.keep_files {
        warn!(
            "File '{}' is empty and will not be overwritten.",
            path.display()
        );
        return Ok(ShredOutcome::Done);
    }
    info!(
        "File '{}' is empty and will be deleted without overwriting.",
        path.display()
    );
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Empty file '{}' successfully deleted.", path.display());
            Ok(ShredOutcome::UnlinkedEmpty)
        }
        Err(_) => {
            error!("Failed to delete empty file '{}'.", path.display());
            report::set_fatal();
            Ok(ShredOutcome::Fail)
        }
    }
}

fn open_with_retries(path: &Path) -> Option<std::fs::File> {
    for attempt in 1..=OPEN_ATTEMPTS {
        match OpenOptions::new().read(true).write(true).open(path) {
            Ok(file) => return Some(file),
            Err(_) => {
                warn!("Failed to open file '{}' for overwriting.", path.display());
                if attempt < OPEN_ATTEMPTS {
                    std::thread::sleep(OPEN_RETRY_DELAY);
                }
            }
        }
    }
    None
}

/// Revoke permissions, move the file under a random name in the temp
/// directory, scrub its extended metadata, and unlink it. Scrub steps are
/// best-effort; only the final unlink decides success. On unlink failure the
/// file is moved back and its mode restored so no orphan is left behind.
fn scrub_and_unlink(path: &Path, rng: &mut RandomSource) -> Result<()> {
    let _guard = RENAME_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let original_mode = std::fs::metadata(path)
        .map(|m| m.permissions().mode())
        .unwrap_or(0o644);
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o000)) {
        warn!(
            "Failed to revoke permissions on '{}': {}",
            path.display(),
            e
        );
    }

    let temp_dir = std::env::temp_dir();
    let mut obfuscated = temp_dir.join(rng.random_name(OBFUSCATED_NAME_LEN));
    while obfuscated.exists() {
        obfuscated = temp_dir.join(rng.random_name(OBFUSCATED_NAME_LEN));
    }

    let unlink_target: PathBuf = match std::fs::rename(path, &obfuscated) {
        Ok(()) => obfuscated,
        Err(e) => {
            warn!(
                "Failed to obfuscate name of '{}' before deletion: {}",
                path.display(),
                e
            );
            path.to_path_buf()
        }
    };

    std::thread::sleep(METADATA_SETTLE);
    if let Err(e) = permissions::clear_xattrs(&unlink_target) {
        warn!(
            "An error has occurred while obfuscating metadata on the file '{}': {}",
            path.display(),
            e
        );
    }
    std::thread::sleep(METADATA_SETTLE);

    match std::fs::remove_file(&unlink_target) {
        Ok(()) => Ok(()),
        Err(_) => {
            if unlink_target != path {
                let _ = std::fs::rename(&unlink_target, path);
            }
            let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(original_mode));
            Err(ShredError::Unlink(path.to_path_buf()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ShredConfig {
        ShredConfig {
            passes: 1,
            ..ShredConfig::default()
        }
    }

    #[test]
    fn shred_deletes_a_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("victim");
        std::fs::write(&path, vec![0x41u8; 10]).unwrap();

        let outcome = shred_file(&path, &test_config());
        assert_eq!(outcome, ShredOutcome::Done);
        assert!(!path.exists());
    }

    #[test]
    fn keep_mode_preserves_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kept");
        let original = vec![0x42u8; 4096];
        std::fs::write(&path, &original).unwrap();

        let config = ShredConfig {
            passes: 2,
            keep_files: true,
            ..ShredConfig::default()
        };
        let outcome = shred_file(&path, &config);
        assert_eq!(outcome, ShredOutcome::Done);
        assert!(path.exists());
        let after = std::fs::read(&path).unwrap();
        assert_eq!(after.len(), original.len());
        assert_ne!(after, original);
    }

    #[test]
    fn empty_file_is_unlinked_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let outcome = shred_file(&path, &test_config());
        assert_eq!(outcome, ShredOutcome::UnlinkedEmpty);
        assert!(!path.exists());
    }

    #[test]
    fn empty_file_is_kept_with_keep_flag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty-kept");
        std::fs::write(&path, b"").unwrap();

        let config = ShredConfig {
            keep_files: true,
            ..test_config()
        };
        let outcome = shred_file(&path, &config);
        assert_eq!(outcome, ShredOutcome::Done);
        assert!(path.exists());
    }

    #[test]
    fn dry_run_leaves_contents_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dry");
        std::fs::write(&path, b"untouched").unwrap();

        let config = ShredConfig {
            dry_run: true,
            ..test_config()
        };
        let outcome = shred_file(&path, &config);
        assert_eq!(outcome, ShredOutcome::DryRun);
        assert_eq!(std::fs::read(&path).unwrap(), b"untouched");
    }

    #[test]
    fn symlink_is_skipped_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::write(&target, b"real data").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let outcome = shred_file(&link, &test_config());
        assert_eq!(outcome, ShredOutcome::SkippedSymlink);
        assert_eq!(std::fs::read(&target).unwrap(), b"real data");
    }

    #[test]
    fn dangling_symlink_is_skipped_when_following() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();

        let config = ShredConfig {
            follow_symlinks: true,
            ..test_config()
        };
        let outcome = shred_file(&link, &config);
        assert_eq!(outcome, ShredOutcome::Skipped);
    }

    #[test]
    fn followed_symlink_shreds_the_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("followed");
        std::fs::write(&target, vec![1u8; 64]).unwrap();
        let link = dir.path().join("ptr");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let config = ShredConfig {
            follow_symlinks: true,
            ..test_config()
        };
        let outcome = shred_file(&link, &config);
        assert_eq!(outcome, ShredOutcome::Done);
        assert!(!target.exists());
    }

    #[test]
    fn readonly_file_fails_without_force() {
        if platform::effective_user() == 0 {
            return; // root bypasses the permission gate
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readonly");
        std::fs::write(&path, b"locked contents").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o400)).unwrap();

        let outcome = shred_file(&path, &test_config());
        assert_eq!(outcome, ShredOutcome::Fail);
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"locked contents");
    }

    #[test]
    fn readonly_file_is_shredded_with_force() {
        if platform::effective_user() == 0 {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forced");
        std::fs::write(&path, b"locked contents").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o400)).unwrap();

        let config = ShredConfig {
            force: true,
            ..test_config()
        };
        let outcome = shred_file(&path, &config);
        assert_eq!(outcome, ShredOutcome::Done);
        assert!(!path.exists());
    }
}
