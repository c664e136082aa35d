//! Path walker: feeds regular files to the shred engine.
//!
//! Each user-supplied path is handled independently; a failure on one never
//! stops the walk. Directories require recursive mode and are removed after
//! descent when they end up empty.

use crate::config::ShredConfig;
use crate::engine;
use crate::logging;
use crate::report;
use crate::types::ShredError;
use log::{error, info, warn};
use std::path::Path;

/// Process one user-supplied path: symlink policy, directory descent, or a
/// single engine invocation.
pub fn process_path(path: &Path, config: &ShredConfig) {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => {
            error!("{}.", ShredError::NotRegular(path.to_path_buf()));
            report::set_fatal();
            return;
        }
    };

    let mut resolved = path.to_path_buf();
    if meta.file_type().is_symlink() {
        if !config.follow_symlinks {
            warn!("Skipping symlink '{}'", path.display());
            return;
        }
        match std::fs::canonicalize(path) {
            Ok(target) => resolved = target,
            Err(_) => {
                warn!("Dangling symlink (not followed): '{}'", path.display());
                return;
            }
        }
    }

    let meta = match std::fs::metadata(&resolved) {
        Ok(meta) => meta,
        Err(_) => {
            error!("{}.", ShredError::NotRegular(path.to_path_buf()));
            report::set_fatal();
            return;
        }
    };

    if meta.is_dir() {
        if !config.recursive {
            warn!(
                "'{}' is a directory. Use -r for recursive shredding.",
                path.display()
            );
            return;
        }
        info!("Entering directory '{}'...", resolved.display());
        descend(&resolved, config);
        finish_directory(&resolved, config);
    } else if meta.is_file() {
        engine::shred_file(&resolved, config);
    } else {
        error!("{}.", ShredError::NotRegular(path.to_path_buf()));
        report::set_fatal();
    }
}

/// Recursive descent: shred every regular file, recurse into directories,
/// and hand symlinks to the engine's symlink policy.
fn descend(dir: &Path, config: &ShredConfig) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read directory '{}': {}", dir.display(), e);
            report::set_fatal();
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!("Failed to read entry under '{}': {}", dir.display(), e);
                report::set_fatal();
                continue;
            }
        };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            error!("{}.", ShredError::NotRegular(path.clone()));
            report::set_fatal();
            continue;
        };

        if file_type.is_symlink() {
            if config.follow_symlinks {
                match std::fs::metadata(&path) {
                    Ok(target) if target.is_dir() => {
                        // Descend through the link but never remove a
                        // directory reached only via a symlink.
                        info!("Entering directory '{}'...", path.display());
                        descend(&path, config);
                    }
                    Ok(_) => {
                        engine::shred_file(&path, config);
                    }
                    Err(_) => {
                        warn!("Dangling symlink (not followed): '{}'", path.display());
                    }
                }
            } else if config.dry_run {
                info!(
                    target: logging::DRY_RUN,
                    "Symlink file '{}' would not be shredded.",
                    path.display()
                );
            } else {
                warn!("Skipping symlink '{}'", path.display());
            }
        } else if file_type.is_dir() {
            descend(&path, config);
            finish_directory(&path, config);
        } else if file_type.is_file() {
            engine::shred_file(&path, config);
        }
        // Special files (devices, sockets, FIFOs) are never touched.
    }
}

/// Remove the directory after descent when allowed and empty; explain why
/// when it is left in place.
fn finish_directory(dir: &Path, config: &ShredConfig) {
    let is_empty = std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);

    if !config.keep_files && is_empty && !config.dry_run {
        match std::fs::remove_dir(dir) {
            Ok(()) => info!("Directory '{}' successfully deleted.", dir.display()),
            Err(_) => {
                error!("Failed to delete directory '{}'.", dir.display());
                report::set_fatal();
            }
        }
    } else if config.keep_files {
        warn!(
            "Directory '{}' was not deleted (keep_files flag).",
            dir.display()
        );
    } else if config.dry_run {
        info!(
            target: logging::DRY_RUN,
            "Directory '{}' would be shredded.",
            dir.display()
        );
    } else {
        warn!(
            "Directory '{}' is not empty. Skipping deletion.",
            dir.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recursive_config() -> ShredConfig {
        ShredConfig {
            passes: 1,
            recursive: true,
            ..ShredConfig::default()
        }
    }

    #[test]
    fn non_recursive_directory_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("dir1");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("x"), b"xx").unwrap();
        std::fs::write(sub.join("y"), b"yy").unwrap();

        let config = ShredConfig {
            passes: 1,
            ..ShredConfig::default()
        };
        process_path(&sub, &config);

        assert!(sub.exists());
        assert_eq!(std::fs::read(sub.join("x")).unwrap(), b"xx");
        assert_eq!(std::fs::read(sub.join("y")).unwrap(), b"yy");
    }

    #[test]
    fn recursive_walk_shreds_files_and_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("dir2");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("a"), vec![1u8; 100]).unwrap();
        std::fs::write(sub.join("b"), vec![2u8; 100]).unwrap();

        process_path(&sub, &recursive_config());
        assert!(!sub.exists());
    }

    #[test]
    fn recursive_walk_descends_into_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let nested = root.join("inner");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("deep"), vec![3u8; 50]).unwrap();

        process_path(&root, &recursive_config());
        assert!(!root.exists());
    }

    #[test]
    fn dry_run_keeps_directory_tree_intact() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("sim");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("f"), b"data").unwrap();

        let config = ShredConfig {
            dry_run: true,
            ..recursive_config()
        };
        process_path(&root, &config);

        assert!(root.exists());
        assert_eq!(std::fs::read(root.join("f")).unwrap(), b"data");
    }

    #[test]
    fn keep_files_leaves_directory_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("kept");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("f"), vec![7u8; 32]).unwrap();

        let config = ShredConfig {
            keep_files: true,
            ..recursive_config()
        };
        process_path(&root, &config);

        assert!(root.exists());
        assert!(root.join("f").exists());
    }

    #[test]
    fn symlinked_file_inside_directory_is_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("outside");
        std::fs::write(&outside, b"keep me").unwrap();
        let root = dir.path().join("tree");
        std::fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        process_path(&root, &recursive_config());

        assert_eq!(std::fs::read(&outside).unwrap(), b"keep me");
        // The symlink itself is skipped, so the directory is not empty.
        assert!(root.exists());
    }
}
