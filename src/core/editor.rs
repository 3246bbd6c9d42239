// editor.rs - In-place column removal on alignments

use rayon::prelude::*;

use crate::core::cancel::CancelToken;
use crate::core::column::{evaluate_columns, ColumnFilter};
use crate::core::symbols::GAP;
use crate::data::{Alignment, PartitionList};
use crate::error::{MsaError, Result};

/// Outcome of a column filtering pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterReport {
    pub retained: usize,
    pub removed: usize,
}

/// Remove every column that has a gap in at least one row.
/// Returns the number of removed columns.
pub fn remove_gap_columns(alignment: &mut Alignment, cancel: &CancelToken) -> Result<usize> {
    let keep: Vec<bool> = (0..alignment.len())
        .into_par_iter()
        .map(|index| -> Result<bool> {
            cancel.check()?;
            Ok(alignment.column(index).all(|symbol| symbol != GAP))
        })
        .collect::<Result<_>>()?;

    apply_keep_mask(alignment, &keep, cancel)
}

/// Keep only the columns retained by `filter`, remapping `partitions` to the
/// shrunk alignment when supplied.
///
/// Partitions are checked against the current length before anything is
/// changed. A partition end `e` moves to `e` minus the removed columns in
/// `[0, e)`.
pub fn filter_columns(
    alignment: &mut Alignment,
    filter: &ColumnFilter,
    partitions: Option<&mut PartitionList>,
    cancel: &CancelToken,
) -> Result<FilterReport> {
    if let Some(partitions) = partitions.as_deref() {
        partitions.validate_against(alignment.len())?;
    }

    let keep = evaluate_columns(alignment, filter, cancel)?;
    let removed = apply_keep_mask(alignment, &keep, cancel)?;

    if let Some(partitions) = partitions {
        let removed_flags: Vec<bool> = keep.iter().map(|&k| !k).collect();
        partitions.remap(&removed_flags);
    }

    Ok(FilterReport {
        retained: keep.len() - removed,
        removed,
    })
}

/// Delete inclusive 0-based column ranges `[starts[i], ends[i]]` from every row.
///
/// Ranges refer to the alignment as it is before the call. They must be
/// ascending and non-overlapping; all of them are validated before any row
/// changes. Returns the number of removed columns.
pub fn delete_partitions(
    alignment: &mut Alignment,
    starts: &[usize],
    ends: &[usize],
    cancel: &CancelToken,
) -> Result<usize> {
    validate_ranges(starts, ends, alignment.len())?;

    let mut keep = vec![true; alignment.len()];
    for (&start, &end) in starts.iter().zip(ends.iter()) {
        keep[start..=end].iter_mut().for_each(|k| *k = false);
    }

    apply_keep_mask(alignment, &keep, cancel)
}

fn validate_ranges(starts: &[usize], ends: &[usize], alignment_len: usize) -> Result<()> {
    if starts.len() != ends.len() {
        return Err(MsaError::invalid_partitions(format!(
            "The start positions and the end positions are not equal size ({} vs {})",
            starts.len(),
            ends.len()
        )));
    }

    let mut previous_end: Option<usize> = None;
    for (&start, &end) in starts.iter().zip(ends.iter()) {
        if start > end {
            return Err(MsaError::invalid_partitions(format!(
                "Range start {} is after its end {}",
                start, end
            )));
        }
        if end >= alignment_len {
            return Err(MsaError::invalid_partitions(format!(
                "Range end {} is outside the alignment ({} columns)",
                end, alignment_len
            )));
        }
        if let Some(prev) = previous_end {
            if start <= prev {
                return Err(MsaError::invalid_partitions(format!(
                    "Range starting at {} overlaps or precedes the range ending at {}",
                    start, prev
                )));
            }
        }
        previous_end = Some(end);
    }
    Ok(())
}

/// Rebuild every row from the kept columns and swap the rows in at once.
/// Returns the number of dropped columns.
fn apply_keep_mask(alignment: &mut Alignment, keep: &[bool], cancel: &CancelToken) -> Result<usize> {
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed == 0 {
        return Ok(0);
    }

    let rows: Vec<Vec<u8>> = alignment
        .rows()
        .par_iter()
        .map(|row| -> Result<Vec<u8>> {
            cancel.check()?;
            Ok(row
                .iter()
                .zip(keep.iter())
                .filter_map(|(&symbol, &k)| k.then_some(symbol))
                .collect())
        })
        .collect::<Result<_>>()?;

    alignment.replace_rows(rows);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column::DiversityPolicy;

    fn example() -> Alignment {
        Alignment::from_strs(&["AC-GT", "AC-GA", "TC-GA"]).unwrap()
    }

    fn as_strings(alignment: &Alignment) -> Vec<String> {
        alignment
            .rows()
            .iter()
            .map(|r| String::from_utf8(r.clone()).unwrap())
            .collect()
    }

    #[test]
    fn test_remove_gap_columns() {
        let mut alignment = Alignment::from_strs(&["AC-GT", "A-CGA", "TCAGA"]).unwrap();
        let removed = remove_gap_columns(&mut alignment, &CancelToken::new()).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(as_strings(&alignment), vec!["AGT", "AGA", "TGA"]);
    }

    #[test]
    fn test_remove_gap_columns_without_gaps_is_noop() {
        let original = Alignment::from_strs(&["ACGT", "ACGA", "TCGA"]).unwrap();
        let mut alignment = original.clone();
        let removed = remove_gap_columns(&mut alignment, &CancelToken::new()).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(alignment, original);
    }

    #[test]
    fn test_filter_columns_is_idempotent() {
        let mut alignment = Alignment::from_strs(&["AC-GTAA", "AC-GAAT", "TCAGAAA", "TC-GAAA"]).unwrap();
        let filter = ColumnFilter::new(0.3, 1, DiversityPolicy::MinorAlleles).unwrap();
        let cancel = CancelToken::new();

        let first = filter_columns(&mut alignment, &filter, None, &cancel).unwrap();
        assert!(first.removed > 0);
        let snapshot = alignment.clone();

        let second = filter_columns(&mut alignment, &filter, None, &cancel).unwrap();
        assert_eq!(second.removed, 0);
        assert_eq!(second.retained, first.retained);
        assert_eq!(alignment, snapshot);
    }

    #[test]
    fn test_filter_columns_remaps_partitions() {
        let mut alignment = example();
        let mut partitions = PartitionList::new(vec![3, 5]).unwrap();
        let filter = ColumnFilter::new(0.0, 1, DiversityPolicy::MinorAlleles).unwrap();

        let report = filter_columns(&mut alignment, &filter, Some(&mut partitions), &CancelToken::new()).unwrap();
        // columns 0 and 4 survive
        assert_eq!(report, FilterReport { retained: 2, removed: 3 });
        assert_eq!(as_strings(&alignment), vec!["AT", "AA", "TA"]);
        assert_eq!(partitions.ends(), &[1, 2]);
    }

    #[test]
    fn test_filter_rejects_partitions_before_mutation() {
        let original = example();
        let mut alignment = original.clone();
        let mut partitions = PartitionList::new(vec![3, 9]).unwrap();
        let result = filter_columns(
            &mut alignment,
            &ColumnFilter::core_genome(),
            Some(&mut partitions),
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(MsaError::InvalidPartitions { .. })));
        assert_eq!(alignment, original);
        assert_eq!(partitions.ends(), &[3, 9]);
    }

    #[test]
    fn test_delete_partitions() {
        let mut alignment = Alignment::from_strs(&["ABCDEFGH", "abcdefgh"]).unwrap();
        // ranges are in the coordinates of the untouched alignment
        let removed = delete_partitions(&mut alignment, &[1, 5], &[2, 6], &CancelToken::new()).unwrap();
        assert_eq!(removed, 4);
        assert_eq!(as_strings(&alignment), vec!["ADEH", "ADEH"]);
    }

    #[test]
    fn test_delete_everything_leaves_empty_rows() {
        let mut alignment = example();
        delete_partitions(&mut alignment, &[0, 3], &[2, 4], &CancelToken::new()).unwrap();
        assert_eq!(alignment.num_rows(), 3);
        assert!(alignment.rows().iter().all(|row| row.is_empty()));
    }

    #[test]
    fn test_delete_partitions_validation() {
        let original = example();
        let cancel = CancelToken::new();
        let cases: [(&[usize], &[usize]); 5] = [
            (&[0, 2], &[1]),
            (&[3], &[1]),
            (&[0], &[5]),
            (&[2, 0], &[3, 1]),
            (&[0, 1], &[2, 3]),
        ];
        for (starts, ends) in cases {
            let mut alignment = original.clone();
            let result = delete_partitions(&mut alignment, starts, ends, &cancel);
            assert!(matches!(result, Err(MsaError::InvalidPartitions { .. })));
            assert_eq!(alignment, original);
        }
    }

    #[test]
    fn test_cancel_leaves_alignment_unchanged() {
        let original = example();
        let mut alignment = original.clone();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(remove_gap_columns(&mut alignment, &cancel).unwrap_err().is_cancelled());
        assert_eq!(alignment, original);
    }
}
