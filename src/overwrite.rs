//! Overwrite kernel: pattern schedule, pass execution, verification.
//!
//! One kernel is created per file; it queries the filesystem block size once
//! and uses that buffer size for every pass. A plain pass writes fresh random
//! data over the whole file. A secure pass walks the file block-by-block,
//! applying the fixed pattern schedule with random fills interleaved after
//! every odd sub-pass, then the three DoD 5220.22-M writes (zeros, ones,
//! random). The final random write of a pass is what verification compares
//! against.

use crate::config::ShredConfig;
use crate::logging;
use crate::platform;
use crate::random::RandomSource;
use crate::types::{FileRecord, Result, ShredError};
use log::info;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

#[cfg(feature = "hash-verify")]
use crate::hasher;

/// Fixed byte-fill schedule for secure-mode sub-passes. Compile-time fixed,
/// never shortened at runtime.
pub const PATTERN_SCHEDULE: [u8; 8] = [0x00, 0xFF, 0xAA, 0x55, 0x3D, 0xC2, 0x8E, 0x4E];

/// One write step applied to a block region.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockWrite {
    /// Fill the region with a single byte value.
    Fill(u8),
    /// Fill the region with fresh random data.
    Random,
}

/// The per-block write sequence of one secure-mode pass: the eight scheduled
/// patterns with a random fill after each odd sub-pass, then the DoD trio.
/// The last step is always `Random`; it is the recorded write.
pub fn secure_write_plan() -> Vec<BlockWrite> {
    let mut plan = Vec::with_capacity(PATTERN_SCHEDULE.len() + PATTERN_SCHEDULE.len() / 2 + 3);
    for (sub_pass, &pattern) in PATTERN_SCHEDULE.iter().enumerate() {
        plan.push(BlockWrite::Fill(pattern));
        if sub_pass % 2 == 1 {
            plan.push(BlockWrite::Random);
        }
    }
    plan.extend([
        BlockWrite::Fill(0x00),
        BlockWrite::Fill(0xFF),
        BlockWrite::Random,
    ]);
    plan
}

pub struct OverwriteKernel {
    block_size: usize,
    secure: bool,
    verify: bool,
    plan: Vec<BlockWrite>,
}

impl OverwriteKernel {
    /// Build the kernel for one file. The block size is queried here, once.
    pub fn new(config: &ShredConfig) -> Self {
        Self {
            block_size: platform::block_size() as usize,
            secure: config.secure,
            verify: config.verify,
            plan: if config.secure {
                secure_write_plan()
            } else {
                vec![BlockWrite::Random]
            },
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Execute one top-level overwrite pass over the whole file.
    pub fn run_pass(
        &self,
        file: &mut File,
        record: &mut FileRecord,
        rng: &mut RandomSource,
        pass: u32,
    ) -> Result<()> {
        let mut buf = vec![0u8; self.block_size];
        let last_step = self.plan.len() - 1;

        let mut offset = 0u64;
        while offset < record.size {
            let len = (record.size - offset).min(self.block_size as u64) as usize;

            for (step, write) in self.plan.iter().enumerate() {
                match *write {
                    BlockWrite::Fill(byte) => buf[..len].fill(byte),
                    BlockWrite::Random => {
                        rng.reseed(((pass as u64) << 8) | step as u64, offset);
                        rng.fill(&mut buf[..len]);
                    }
                }
                write_region(file, &record.path, offset, &buf[..len])?;

                if step == last_step {
                    if let Some(last_written) = record.last_written.as_mut() {
                        last_written[offset as usize..offset as usize + len]
                            .copy_from_slice(&buf[..len]);
                    }
                }
            }

            if self.secure {
                info!(
                    target: logging::INTERNAL,
                    "Successfully wrote all DoD passes to block"
                );
            }
            offset += len as u64;
        }

        info!(target: logging::INTERNAL, "Blocksize: {}", self.block_size);
        file.sync_data()
            .map_err(|source| ShredError::Write {
                path: record.path.clone(),
                offset: record.size,
                source,
            })?;
        Ok(())
    }

    /// Compare on-disk contents with the last recorded write. Returns `true`
    /// when the pass verified. Hash comparison is preferred when built in;
    /// if the file cannot be reopened for hashing the check degrades to a
    /// block-wise byte comparison on the open handle.
    pub fn verify_pass(&self, file: &mut File, record: &FileRecord) -> Result<bool> {
        if !self.verify {
            return Ok(true);
        }
        let Some(expected) = record.last_written.as_deref() else {
            return Ok(true);
        };

        #[cfg(feature = "hash-verify")]
        match hasher::digest_file(&record.path, self.block_size) {
            Ok(on_disk) => {
                return if on_disk == hasher::digest(expected) {
                    info!(
                        "Successfully verified file hash for '{}'",
                        record.path.display()
                    );
                    Ok(true)
                } else {
                    log::warn!("Hash mismatch for '{}'", record.path.display());
                    Ok(false)
                };
            }
            Err(_) => {
                info!(
                    target: logging::INTERNAL,
                    "File failed to open for hashing; falling back to byte comparison"
                );
            }
        }

        self.byte_compare(file, record, expected)
    }

    fn byte_compare(&self, file: &mut File, record: &FileRecord, expected: &[u8]) -> Result<bool> {
        file.seek(SeekFrom::Start(0))?;
        let mut buf = vec![0u8; self.block_size];
        let mut offset = 0usize;
        while (offset as u64) < record.size {
            let len = (record.size as usize - offset).min(self.block_size);
            file.read_exact(&mut buf[..len])?;
            if buf[..len] != expected[offset..offset + len] {
                info!("Verification failed at offset: {}", offset);
                return Ok(false);
            }
            offset += len;
        }
        Ok(true)
    }
}

fn write_region(file: &mut File, path: &std::path::Path, offset: u64, data: &[u8]) -> Result<()> {
    file.seek(SeekFrom::Start(offset))
        .and_then(|_| file.write_all(data))
        .map_err(|source| ShredError::Write {
            path: path.to_path_buf(),
            offset,
            source,
        })
}
