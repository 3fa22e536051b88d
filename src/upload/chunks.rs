//! Splitting a file into multipart chunks
//!
//! A plan is pure arithmetic over the total size and the configured part
//! size. Every part is `part_size` bytes except the last, which may be
//! shorter. A file smaller than one part still yields exactly one part.

use crate::error::{Result, UploadError};
use std::ops::Range;

/// Number of parts needed for `total_size` bytes
///
/// # Errors
///
/// Returns an error if either size is zero
pub fn part_count(total_size: u64, part_size: u64) -> Result<usize> {
    if total_size == 0 {
        return Err(UploadError::invalid_parameter(
            "total_size",
            "File size must be greater than 0",
        ));
    }

    if part_size == 0 {
        return Err(UploadError::invalid_parameter(
            "part_size",
            "Part size must be greater than 0",
        ));
    }

    Ok(total_size.div_ceil(part_size) as usize)
}

/// Part boundaries for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    total_size: u64,
    part_size: u64,
    count: usize,
}

impl ChunkPlan {
    pub fn new(total_size: u64, part_size: u64) -> Result<Self> {
        let count = part_count(total_size, part_size)?;
        Ok(Self {
            total_size,
            part_size,
            count,
        })
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn part_size(&self) -> u64 {
        self.part_size
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Byte range of part `index`, or None past the last part
    pub fn range(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.count {
            return None;
        }

        let start = index as u64 * self.part_size;
        let end = (start + self.part_size).min(self.total_size);
        Some(start as usize..end as usize)
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.count).filter_map(move |index| self.range(index))
    }
}
