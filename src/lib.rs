//! shredbox: secure file and directory erasure.
//!
//! Overwrites file contents with multi-pass patterns so the previous
//! contents cannot be recovered from the medium, optionally verifies each
//! pass, obfuscates names and extended metadata, and unlinks the files.

pub mod cli;
pub mod config;
pub mod engine;
#[cfg(feature = "hash-verify")]
pub mod hasher;
pub mod logging;
pub mod overwrite;
pub mod permissions;
pub mod platform;
pub mod random;
pub mod report;
pub mod types;
pub mod walker;
