// partitions.rs - Gene partition offsets within a concatenated alignment

use std::ops::Range;

use crate::error::{MsaError, Result};

/// Ordered partition end offsets.
///
/// Offsets are 0-based exclusive ends, which is the same number as the
/// 1-based position of each partition's last column. Partition `k` spans
/// `[end[k-1], end[k])` with the first starting at column 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionList {
    ends: Vec<usize>,
}

impl PartitionList {
    /// Create a partition list; offsets must be non-decreasing.
    ///
    /// A repeated offset (or a leading 0) is a partition without columns, as
    /// left behind when filtering removes all of a partition's columns.
    pub fn new(ends: Vec<usize>) -> Result<Self> {
        if ends.is_empty() {
            return Err(MsaError::invalid_partitions("No partition offsets supplied"));
        }
        for (k, pair) in ends.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(MsaError::invalid_partitions(format!(
                    "Partition offsets must not decrease: offset {} ({}) follows {}",
                    k + 2,
                    pair[1],
                    pair[0]
                )));
            }
        }
        Ok(Self { ends })
    }

    /// Parse a comma separated list of offsets, e.g. "300,912,1500"
    pub fn parse(text: &str) -> Result<Self> {
        let ends = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<usize>().map_err(|e| {
                    MsaError::invalid_partitions(format!("Invalid partition offset '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(ends)
    }

    pub fn ends(&self) -> &[usize] {
        &self.ends
    }

    pub fn len(&self) -> usize {
        self.ends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Check that every partition fits in an alignment of `alignment_len` columns
    pub fn validate_against(&self, alignment_len: usize) -> Result<()> {
        if let Some(&last) = self.ends.last() {
            if last > alignment_len {
                return Err(MsaError::invalid_partitions(format!(
                    "Last partition ends at {} but the alignment has {} columns",
                    last, alignment_len
                )));
            }
        }
        Ok(())
    }

    /// Column ranges of every partition, in order
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let starts = std::iter::once(0).chain(self.ends.iter().copied());
        starts.zip(self.ends.iter().copied()).map(|(s, e)| s..e)
    }

    /// Shift every offset left by the number of removed columns before it.
    ///
    /// `removed` flags each column of the alignment the offsets currently
    /// refer to. A partition that loses all of its columns keeps a zero-width
    /// range, so the result may repeat an offset.
    pub(crate) fn remap(&mut self, removed: &[bool]) {
        let mut removed_before = Vec::with_capacity(removed.len() + 1);
        let mut count = 0;
        removed_before.push(0);
        for &flag in removed {
            if flag {
                count += 1;
            }
            removed_before.push(count);
        }
        for end in self.ends.iter_mut() {
            *end -= removed_before[*end];
        }
    }
}

/// Convert 1-based inclusive ranges to 0-based inclusive ranges.
///
/// Fails on mismatched list lengths or a zero position.
pub fn ranges_from_one_based(starts: &[usize], ends: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
    if starts.len() != ends.len() {
        return Err(MsaError::invalid_partitions(format!(
            "The start positions and the end positions are not equal size ({} vs {})",
            starts.len(),
            ends.len()
        )));
    }
    let convert = |values: &[usize]| -> Result<Vec<usize>> {
        values
            .iter()
            .map(|&v| {
                v.checked_sub(1).ok_or_else(|| {
                    MsaError::invalid_partitions("1-based positions must be greater than 0")
                })
            })
            .collect()
    };
    Ok((convert(starts)?, convert(ends)?))
}
