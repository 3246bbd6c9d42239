// column.rs - Per-column statistics used to decide column retention

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::core::cancel::CancelToken;
use crate::core::symbols::GAP;
use crate::data::Alignment;
use crate::error::{MsaError, Result};

/// How column diversity is measured against `min_substitutions`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiversityPolicy {
    /// Rows carrying a non-gap symbol other than the most frequent one
    #[default]
    MinorAlleles,
    /// Number of distinct non-gap symbols
    DistinctSymbols,
}

impl FromStr for DiversityPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minor-alleles" | "minor" => Ok(DiversityPolicy::MinorAlleles),
            "distinct-symbols" | "distinct" => Ok(DiversityPolicy::DistinctSymbols),
            _ => Err(format!(
                "Invalid diversity policy: {}. Use: minor-alleles, distinct-symbols",
                s
            )),
        }
    }
}

/// Column retention thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    /// Largest tolerated fraction of gap rows (inclusive)
    pub max_gap_fraction: f64,
    /// Smallest diversity value for a column to be kept
    pub min_substitutions: usize,
    pub policy: DiversityPolicy,
}

impl Default for ColumnFilter {
    fn default() -> Self {
        Self {
            max_gap_fraction: 0.01,
            min_substitutions: 0,
            policy: DiversityPolicy::MinorAlleles,
        }
    }
}

impl ColumnFilter {
    pub fn new(max_gap_fraction: f64, min_substitutions: usize, policy: DiversityPolicy) -> Result<Self> {
        if !(0.0..=1.0).contains(&max_gap_fraction) {
            return Err(MsaError::invalid_input(format!(
                "Gap fraction must be between 0.0 and 1.0, got {}",
                max_gap_fraction
            )));
        }
        Ok(Self {
            max_gap_fraction,
            min_substitutions,
            policy,
        })
    }

    /// Filter that keeps only gap-free columns with at least one substitution
    pub fn core_genome() -> Self {
        Self {
            max_gap_fraction: 0.0,
            min_substitutions: 1,
            policy: DiversityPolicy::MinorAlleles,
        }
    }
}

/// Symbol counts and retention flags for one alignment column
#[derive(Debug, Clone)]
pub struct AlignmentColumn {
    pub index: usize,
    counts: BTreeMap<u8, usize>,
    num_rows: usize,
    gap_acceptable: bool,
    sufficient_diversity: bool,
}

impl AlignmentColumn {
    /// Count the symbols at column `index` and evaluate `filter`
    pub fn compute(alignment: &Alignment, index: usize, filter: &ColumnFilter) -> Self {
        let mut counts = BTreeMap::new();
        for symbol in alignment.column(index) {
            *counts.entry(symbol).or_insert(0) += 1;
        }
        let num_rows = alignment.num_rows();

        let gap_acceptable = match counts.get(&GAP) {
            None => true,
            Some(&gaps) => gaps as f64 / num_rows as f64 <= filter.max_gap_fraction,
        };

        let mut column = Self {
            index,
            counts,
            num_rows,
            gap_acceptable,
            sufficient_diversity: false,
        };
        column.sufficient_diversity = column.diversity(filter.policy) >= filter.min_substitutions;
        column
    }

    pub fn counts(&self) -> &BTreeMap<u8, usize> {
        &self.counts
    }

    pub fn gap_count(&self) -> usize {
        self.counts.get(&GAP).copied().unwrap_or(0)
    }

    pub fn gap_fraction(&self) -> f64 {
        self.gap_count() as f64 / self.num_rows as f64
    }

    /// Rows carrying a non-gap symbol that is not the most frequent one
    pub fn minor_allele_count(&self) -> usize {
        if self.counts.len() == 1 {
            return 0;
        }
        let mut residues = 0;
        let mut major = 0;
        for (&symbol, &count) in &self.counts {
            if symbol != GAP {
                residues += count;
                major = major.max(count);
            }
        }
        residues - major
    }

    pub fn distinct_symbol_count(&self) -> usize {
        self.counts.keys().filter(|&&s| s != GAP).count()
    }

    pub fn diversity(&self, policy: DiversityPolicy) -> usize {
        match policy {
            DiversityPolicy::MinorAlleles => self.minor_allele_count(),
            DiversityPolicy::DistinctSymbols => self.distinct_symbol_count(),
        }
    }

    pub fn gap_acceptable(&self) -> bool {
        self.gap_acceptable
    }

    pub fn sufficient_diversity(&self) -> bool {
        self.sufficient_diversity
    }

    pub fn is_retained(&self) -> bool {
        self.gap_acceptable && self.sufficient_diversity
    }
}

/// Evaluate `filter` on every column in parallel; `true` means keep.
pub fn evaluate_columns(alignment: &Alignment, filter: &ColumnFilter, cancel: &CancelToken) -> Result<Vec<bool>> {
    (0..alignment.len())
        .into_par_iter()
        .map(|index| -> Result<bool> {
            cancel.check()?;
            Ok(AlignmentColumn::compute(alignment, index, filter).is_retained())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Alignment {
        Alignment::from_strs(&["AC-GT", "AC-GA", "TC-GA"]).unwrap()
    }

    #[test]
    fn test_all_gap_column_needs_full_gap_fraction() {
        let alignment = example();
        for threshold in [0usize, 1, 5] {
            let strict = ColumnFilter::new(0.99, threshold, DiversityPolicy::MinorAlleles).unwrap();
            assert!(!AlignmentColumn::compute(&alignment, 2, &strict).gap_acceptable());

            let lenient = ColumnFilter::new(1.0, threshold, DiversityPolicy::MinorAlleles).unwrap();
            assert!(AlignmentColumn::compute(&alignment, 2, &lenient).gap_acceptable());
        }
    }

    #[test]
    fn test_gap_free_column_always_acceptable() {
        let alignment = example();
        let filter = ColumnFilter::new(0.0, 0, DiversityPolicy::MinorAlleles).unwrap();
        let column = AlignmentColumn::compute(&alignment, 1, &filter);
        assert!(column.gap_acceptable());
        assert!(column.sufficient_diversity());
        assert!(column.is_retained());
    }

    #[test]
    fn test_minor_allele_count() {
        let alignment = example();
        let filter = ColumnFilter::default();
        // column 0: A, A, T
        assert_eq!(AlignmentColumn::compute(&alignment, 0, &filter).minor_allele_count(), 1);
        // column 1: C, C, C
        assert_eq!(AlignmentColumn::compute(&alignment, 1, &filter).minor_allele_count(), 0);
        // column 2: only gaps
        assert_eq!(AlignmentColumn::compute(&alignment, 2, &filter).minor_allele_count(), 0);
    }

    #[test]
    fn test_minor_alleles_ignore_gaps() {
        let alignment = Alignment::from_strs(&["A", "A", "-", "G", "G", "T"]).unwrap();
        let column = AlignmentColumn::compute(&alignment, 0, &ColumnFilter::default());
        assert_eq!(column.minor_allele_count(), 3);
        assert_eq!(column.distinct_symbol_count(), 3);
        assert_eq!(column.gap_count(), 1);
    }

    #[test]
    fn test_diversity_policies() {
        let alignment = example();
        let minor = ColumnFilter::new(1.0, 2, DiversityPolicy::MinorAlleles).unwrap();
        let distinct = ColumnFilter::new(1.0, 2, DiversityPolicy::DistinctSymbols).unwrap();
        // column 0 has one minor allele but two distinct symbols
        assert!(!AlignmentColumn::compute(&alignment, 0, &minor).sufficient_diversity());
        assert!(AlignmentColumn::compute(&alignment, 0, &distinct).sufficient_diversity());
    }

    #[test]
    fn test_evaluate_columns() {
        let alignment = example();
        let filter = ColumnFilter::new(0.0, 1, DiversityPolicy::MinorAlleles).unwrap();
        let keep = evaluate_columns(&alignment, &filter, &CancelToken::new()).unwrap();
        assert_eq!(keep, vec![true, false, false, false, true]);
    }

    #[test]
    fn test_invalid_gap_fraction() {
        assert!(ColumnFilter::new(1.5, 0, DiversityPolicy::MinorAlleles).is_err());
        assert!(ColumnFilter::new(-0.1, 0, DiversityPolicy::MinorAlleles).is_err());
    }

    #[test]
    fn test_evaluate_columns_cancelled() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = evaluate_columns(&example(), &ColumnFilter::default(), &cancel);
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("minor".parse::<DiversityPolicy>().unwrap(), DiversityPolicy::MinorAlleles);
        assert_eq!(
            "distinct-symbols".parse::<DiversityPolicy>().unwrap(),
            DiversityPolicy::DistinctSymbols
        );
        assert!("other".parse::<DiversityPolicy>().is_err());
    }
}
