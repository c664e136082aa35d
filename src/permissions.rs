//! Permission discovery and optional elevation.
//!
//! Discovery maps the mode triple matching the caller's relation to the file
//! (owner / group / other) into read and write bits, bypassed when running
//! as uid 0. Elevation, only under `--force`, widens the mode, clears the
//! read-only attribute and extended attributes, and re-probes effective
//! access. It never escalates to another principal and never touches
//! root-owned files unless the invoker is root.

use crate::platform;
use crate::types::{Result, ShredError};
use log::{info, warn};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Clone, Copy, Debug, Default)]
pub struct AccessRights {
    pub read: bool,
    pub write: bool,
    pub retrieval_failed: bool,
}

impl AccessRights {
    fn retrieval_failure() -> Self {
        Self {
            read: false,
            write: false,
            retrieval_failed: true,
        }
    }
}

/// Retrieve the caller's effective read/write rights on the path.
pub fn discover(path: &Path) -> AccessRights {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(_) => return AccessRights::retrieval_failure(),
    };

    if platform::effective_user() == 0 {
        return AccessRights {
            read: true,
            write: true,
            retrieval_failed: false,
        };
    }

    let mode = meta.permissions().mode();
    let shift = if meta.uid() == platform::effective_user() {
        6
    } else if meta.gid() == platform::effective_group() {
        3
    } else {
        0
    };
    let triple = (mode >> shift) & 0o7;
    AccessRights {
        read: triple & 0o4 != 0,
        write: triple & 0o2 != 0,
        retrieval_failed: false,
    }
}

/// Widen permissions on the file and clear blocking metadata, then re-probe.
///
/// The mode becomes `rw-rw-rw-`, or `rwxrwxrwx` if any execute bit was set.
pub fn elevate(path: &Path) -> Result<AccessRights> {
    let owner = platform::owner_of(path).map_err(|e| ShredError::PermissionRetrieval {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    if owner == 0 && platform::effective_user() != 0 {
        return Err(ShredError::PermissionDenied {
            path: path.to_path_buf(),
            access: "elevation",
        });
    }

    platform::set_readonly_attribute(path, false)?;

    let mode = std::fs::metadata(path)?.permissions().mode();
    let target = if mode & 0o111 != 0 { 0o777 } else { 0o666 };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(target))?;
    info!(
        "Widened permissions on '{}' to {:o}.",
        path.display(),
        target
    );

    if let Err(e) = clear_xattrs(path) {
        warn!(
            "Failed to clear extended attributes on '{}': {}",
            path.display(),
            e
        );
    }

    Ok(AccessRights {
        read: platform::check_access(path, true, false),
        write: platform::check_access(path, false, true),
        retrieval_failed: false,
    })
}

/// Remove every extended attribute from the file. Uses the native API first
/// and falls back to spawning the platform's `xattr`/`attr` tool with stderr
/// discarded.
pub fn clear_xattrs(path: &Path) -> Result<()> {
    match clear_xattrs_native(path) {
        Ok(()) => Ok(()),
        Err(native_err) => clear_xattrs_shell(path).map_err(|_| native_err),
    }
}

fn clear_xattrs_native(path: &Path) -> Result<()> {
    for name in platform::list_xattrs(path)? {
        platform::remove_xattr(path, &name)?;
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn clear_xattrs_shell(path: &Path) -> Result<()> {
    let status = Command::new("xattr")
        .arg("-c")
        .arg(path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(ShredError::MetadataScrub {
            path: path.to_path_buf(),
            detail: format!("xattr exited with {}", status),
        })
    }
}

#[cfg(target_os = "linux")]
fn clear_xattrs_shell(path: &Path) -> Result<()> {
    let listing = Command::new("attr")
        .args(["-q", "-l"])
        .arg(path)
        .stderr(Stdio::null())
        .output()?;
    for name in String::from_utf8_lossy(&listing.stdout)
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        let _ = Command::new("attr")
            .args(["-q", "-r", name])
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    Ok(())
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn clear_xattrs_shell(_path: &Path) -> Result<()> {
    Ok(())
}
