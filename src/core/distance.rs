// distance.rs - Pairwise distance engine over alignment rows

use std::str::FromStr;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::cancel::CancelToken;
use crate::core::column::ColumnFilter;
use crate::core::editor::filter_columns;
use crate::core::substitution::{MatrixState, SubstitutionModel};
use crate::core::symbols::Alphabet;
use crate::data::Alignment;
use crate::error::{MsaError, Result};

/// Distance function applied to every pair of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceKind {
    /// Differing comparable columns
    Raw,
    /// Raw distance divided by the number of comparable columns
    Shared,
    /// Sum of `-ln p` substitution scores over differing columns
    NormalizedProbability,
    /// Sum of log-odds scores over every comparable column
    LogLikelihood,
}

impl DistanceKind {
    pub const VALID_NAMES: &'static str = "raw, shared, normalizedProbability, logLikelihood";

    /// Parse a distance name, failing with the list of supported names
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "raw" => Ok(DistanceKind::Raw),
            "shared" => Ok(DistanceKind::Shared),
            "normalizedProbability" | "normProb" => Ok(DistanceKind::NormalizedProbability),
            "logLikelihood" | "logLike" => Ok(DistanceKind::LogLikelihood),
            _ => Err(MsaError::UnsupportedDistance {
                name: name.to_string(),
                valid: Self::VALID_NAMES.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DistanceKind::Raw => "raw",
            DistanceKind::Shared => "shared",
            DistanceKind::NormalizedProbability => "normalizedProbability",
            DistanceKind::LogLikelihood => "logLikelihood",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            DistanceKind::Raw => "Raw substitution count",
            DistanceKind::Shared => "Substitutions per shared site",
            DistanceKind::NormalizedProbability => "Normalized substitution probability",
            DistanceKind::LogLikelihood => "Substitution log-likelihood",
        }
    }

    /// Whether the distance needs a primed substitution model
    pub fn needs_model(&self) -> bool {
        matches!(self, DistanceKind::NormalizedProbability | DistanceKind::LogLikelihood)
    }

    fn model_state(&self) -> Option<MatrixState> {
        match self {
            DistanceKind::NormalizedProbability => Some(MatrixState::NormalizedScore),
            DistanceKind::LogLikelihood => Some(MatrixState::LogLikelihood),
            _ => None,
        }
    }
}

impl FromStr for DistanceKind {
    type Err = MsaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Square, symmetric, zero-diagonal matrix labelled by row ids
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    labels: Vec<String>,
    kind: DistanceKind,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// All-zero matrix (used for partitions with no columns)
    pub fn zeros(labels: Vec<String>, kind: DistanceKind) -> Self {
        let n = labels.len();
        Self {
            labels,
            kind,
            values: vec![0.0; n * n],
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn kind(&self) -> DistanceKind {
        self.kind
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.len() + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.len();
        &self.values[i * n..(i + 1) * n]
    }

    /// Smallest off-diagonal value, `None` with fewer than two rows
    pub fn min_off_diagonal(&self) -> Option<f64> {
        let n = self.len();
        (0..n)
            .flat_map(|i| (0..i).map(move |j| (i, j)))
            .map(|(i, j)| self.get(i, j))
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn is_symmetric(&self) -> bool {
        let n = self.len();
        (0..n).all(|i| self.get(i, i) == 0.0 && (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// Computes distance matrices for one distance kind.
///
/// Kinds that score substitutions need a model primed on the alignment
/// (see [`prime`](Self::prime)) before any matrix is computed.
#[derive(Debug, Clone)]
pub struct DistanceEngine {
    kind: DistanceKind,
    alphabet: Alphabet,
    model: Option<SubstitutionModel>,
    block_size: Option<usize>,
    show_progress: bool,
}

impl DistanceEngine {
    pub fn new(kind: DistanceKind, alphabet: Alphabet) -> Self {
        Self {
            kind,
            alphabet,
            model: None,
            block_size: None,
            show_progress: false,
        }
    }

    /// Show a progress bar and timing summary while computing
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fix the number of rows each parallel work unit owns
    pub fn with_block_size(mut self, rows: usize) -> Self {
        self.block_size = Some(rows.max(1));
        self
    }

    /// Use a substitution model primed elsewhere. Its state must match the
    /// transform the distance kind expects.
    pub fn with_model(mut self, model: SubstitutionModel) -> Result<Self> {
        if self.kind.model_state() != Some(model.state()) {
            return Err(MsaError::invalid_state(format!(
                "{} distance cannot use a model in state {:?}",
                self.kind.name(),
                model.state()
            )));
        }
        self.model = Some(model);
        Ok(self)
    }

    pub fn kind(&self) -> DistanceKind {
        self.kind
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    pub fn model(&self) -> Option<&SubstitutionModel> {
        self.model.as_ref()
    }

    pub fn is_primed(&self) -> bool {
        !self.kind.needs_model() || self.model.is_some()
    }

    /// Build the substitution model from `alignment` if the kind needs one
    pub fn prime(&mut self, alignment: &Alignment, cancel: &CancelToken) -> Result<()> {
        let Some(state) = self.kind.model_state() else {
            return Ok(());
        };

        let mut model = SubstitutionModel::new(self.alphabet);
        model.accumulate_with_cancel(alignment, cancel)?;
        match state {
            MatrixState::NormalizedScore => model.to_normalized_score()?,
            _ => model.to_log_likelihood()?,
        }
        self.model = Some(model);
        Ok(())
    }

    /// Distance between two rows of equal length
    pub fn pair_distance(&self, reference: &[u8], query: &[u8]) -> f64 {
        let alphabet = self.alphabet;
        let comparable = reference
            .iter()
            .zip(query.iter())
            .filter(|(&r, &q)| alphabet.is_comparable(r, q));

        match self.kind {
            DistanceKind::Raw => comparable.filter(|(r, q)| r != q).count() as f64,
            DistanceKind::Shared => {
                let mut mutations = 0usize;
                let mut sites = 0usize;
                for (r, q) in comparable {
                    sites += 1;
                    if r != q {
                        mutations += 1;
                    }
                }
                if sites == 0 {
                    0.0
                } else {
                    mutations as f64 / sites as f64
                }
            }
            DistanceKind::NormalizedProbability => match &self.model {
                Some(model) => comparable
                    .filter(|(r, q)| r != q)
                    .map(|(&r, &q)| model.lookup(r, q))
                    .sum(),
                None => 0.0,
            },
            DistanceKind::LogLikelihood => match &self.model {
                Some(model) => comparable.map(|(&r, &q)| model.lookup(r, q)).sum(),
                None => 0.0,
            },
        }
    }

    /// All-pairs distance matrix over the rows of `alignment`.
    ///
    /// Rows are split into blocks; each block owns a disjoint slice of the
    /// output and fills cells (i, j) with j < i. The upper triangle is
    /// mirrored once every block has finished, so the result does not depend
    /// on scheduling.
    pub fn compute_distance_matrix(&self, alignment: &Alignment, cancel: &CancelToken) -> Result<DistanceMatrix> {
        if !self.is_primed() {
            return Err(MsaError::invalid_state(format!(
                "{} distance requires a primed substitution model",
                self.kind.name()
            )));
        }

        let n = alignment.num_rows();
        let rows = alignment.rows();
        let mut values = vec![0.0; n * n];
        let start = Instant::now();

        let block = self.block_size.unwrap_or_else(|| default_block_size(n));
        let num_blocks = n.div_ceil(block);

        let pb = if self.show_progress {
            println!(
                "🔄 Computing {} distance matrix ({} × {} = {} comparisons)...",
                self.kind.name(),
                n,
                n,
                n * n.saturating_sub(1) / 2
            );
            let pb = ProgressBar::new(num_blocks as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} row blocks ({percent}%) ETA: {eta}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        if n > 0 {
            values
                .par_chunks_mut(block * n)
                .enumerate()
                .try_for_each(|(b, chunk)| -> Result<()> {
                    cancel.check()?;
                    let first_row = b * block;
                    for (offset, out) in chunk.chunks_mut(n).enumerate() {
                        let i = first_row + offset;
                        for j in 0..i {
                            out[j] = self.pair_distance(&rows[i], &rows[j]);
                        }
                    }
                    pb.inc(1);
                    Ok(())
                })?;
        }

        for i in 0..n {
            for j in 0..i {
                values[j * n + i] = values[i * n + j];
            }
        }

        if self.show_progress {
            pb.finish_with_message("✅ Distance matrix computation completed!");
            println!("✅ Distance matrix computed in {:.2}s", start.elapsed().as_secs_f64());
        }

        Ok(DistanceMatrix {
            labels: alignment.ids().to_vec(),
            kind: self.kind,
            values,
        })
    }
}

/// Rows per work unit: roughly four blocks per worker thread
fn default_block_size(n: usize) -> usize {
    let units = rayon::current_num_threads() * 4;
    n.div_ceil(units).max(1)
}

/// Build, prime and run an engine in one call
pub fn compute_distance_matrix(
    alignment: &Alignment,
    kind: DistanceKind,
    alphabet: Alphabet,
    cancel: &CancelToken,
) -> Result<DistanceMatrix> {
    let mut engine = DistanceEngine::new(kind, alphabet);
    engine.prime(alignment, cancel)?;
    engine.compute_distance_matrix(alignment, cancel)
}

/// `shared` distances over the gap-free columns that carry at least one substitution
pub fn core_genome_distance_matrix(
    alignment: &Alignment,
    alphabet: Alphabet,
    cancel: &CancelToken,
) -> Result<DistanceMatrix> {
    let mut core = alignment.clone();
    let report = filter_columns(&mut core, &ColumnFilter::core_genome(), None, cancel)?;
    if report.retained == 0 {
        return Ok(DistanceMatrix::zeros(alignment.ids().to_vec(), DistanceKind::Shared));
    }
    compute_distance_matrix(&core, DistanceKind::Shared, alphabet, cancel)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Alignment {
        Alignment::from_strs(&["AC-GT", "AC-GA", "TC-GA"]).unwrap()
    }

    fn engine(kind: DistanceKind) -> DistanceEngine {
        DistanceEngine::new(kind, Alphabet::Nucleotide)
    }

    #[test]
    fn test_parse_distance_kind() {
        assert_eq!(DistanceKind::parse("raw").unwrap(), DistanceKind::Raw);
        assert_eq!(DistanceKind::parse("normProb").unwrap(), DistanceKind::NormalizedProbability);
        assert_eq!("logLike".parse::<DistanceKind>().unwrap(), DistanceKind::LogLikelihood);

        let err = DistanceKind::parse("euclidean").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("euclidean"));
        assert!(message.contains("shared"));
        assert!(message.contains("logLikelihood"));
    }

    #[test]
    fn test_raw_distance_example() {
        let alignment = example();
        let raw = engine(DistanceKind::Raw);
        assert_eq!(raw.pair_distance(alignment.row(0), alignment.row(1)), 1.0);
        assert_eq!(raw.pair_distance(alignment.row(1), alignment.row(2)), 1.0);
        assert_eq!(raw.pair_distance(alignment.row(0), alignment.row(2)), 2.0);
    }

    #[test]
    fn test_raw_distance_extremes() {
        let raw = engine(DistanceKind::Raw);
        assert_eq!(raw.pair_distance(b"ACGTAC", b"ACGTAC"), 0.0);
        assert_eq!(raw.pair_distance(b"AC-GN", b"GT-CA"), 3.0);
    }

    #[test]
    fn test_shared_distance() {
        let shared = engine(DistanceKind::Shared);
        // 4 comparable columns, 1 difference
        assert_eq!(shared.pair_distance(b"AC-GT", b"AC-GA"), 0.25);
        assert_eq!(shared.pair_distance(b"ACNGT", b"ACNGT"), 0.0);
    }

    #[test]
    fn test_protein_n_is_skipped() {
        let raw = DistanceEngine::new(DistanceKind::Raw, Alphabet::Protein);
        assert_eq!(raw.pair_distance(b"ANDK", b"ADDK"), 0.0);
        let shared = DistanceEngine::new(DistanceKind::Shared, Alphabet::Protein);
        // 3 comparable columns once N is dropped
        assert_eq!(shared.pair_distance(b"ANDK", b"ADEK"), 1.0 / 3.0);
    }

    #[test]
    fn test_shared_distance_without_shared_sites_is_zero() {
        let shared = engine(DistanceKind::Shared);
        let d = shared.pair_distance(b"AC--", b"--GT");
        assert_eq!(d, 0.0);
        assert!(!d.is_nan());
    }

    #[test]
    fn test_matrix_symmetric_with_zero_diagonal() {
        let alignment = Alignment::from_strs(&["ACGTAC", "ACGTTC", "AGGTTA", "TCGNAC", "A-GTAC"]).unwrap();
        let matrix = engine(DistanceKind::Raw)
            .compute_distance_matrix(&alignment, &CancelToken::new())
            .unwrap();
        assert_eq!(matrix.len(), 5);
        assert!(matrix.is_symmetric());
        assert_eq!(matrix.labels(), alignment.ids());
        assert_eq!(matrix.get(0, 1), 1.0);
        assert_eq!(matrix.get(1, 0), 1.0);
    }

    #[test]
    fn test_block_size_does_not_change_result() {
        let alignment = Alignment::from_strs(&[
            "ACGTACGTAA", "ACGTTCGTAA", "AGGTTAGTCA", "TCGNACGTAA", "A-GTACGTTT", "CCGTACGAAA", "ACGTACGTAC",
        ])
        .unwrap();
        let cancel = CancelToken::new();
        let reference = engine(DistanceKind::Shared)
            .with_block_size(1)
            .compute_distance_matrix(&alignment, &cancel)
            .unwrap();
        for block in [2, 3, 7, 100] {
            let other = engine(DistanceKind::Shared)
                .with_block_size(block)
                .compute_distance_matrix(&alignment, &cancel)
                .unwrap();
            assert_eq!(reference, other);
        }
    }

    #[test]
    fn test_unprimed_model_distance_is_rejected() {
        let alignment = example();
        let result = engine(DistanceKind::LogLikelihood).compute_distance_matrix(&alignment, &CancelToken::new());
        assert!(matches!(result, Err(MsaError::InvalidState { .. })));
    }

    #[test]
    fn test_normalized_probability_sums_differing_columns() {
        let alignment = Alignment::from_strs(&["ACDK", "ACEK", "GCEK"]).unwrap();
        let cancel = CancelToken::new();
        let mut engine = DistanceEngine::new(DistanceKind::NormalizedProbability, Alphabet::Protein);
        engine.prime(&alignment, &cancel).unwrap();
        let model = engine.model().unwrap().clone();

        let d = engine.pair_distance(alignment.row(0), alignment.row(2));
        let expected = model.lookup(b'A', b'G') + model.lookup(b'D', b'E');
        assert!((d - expected).abs() < 1e-12);
        assert!(d > 0.0);
    }

    #[test]
    fn test_log_likelihood_includes_matches() {
        let alignment = Alignment::from_strs(&["ACDK", "ACEK", "GCEK"]).unwrap();
        let cancel = CancelToken::new();
        let mut engine = DistanceEngine::new(DistanceKind::LogLikelihood, Alphabet::Protein);
        engine.prime(&alignment, &cancel).unwrap();
        let model = engine.model().unwrap().clone();

        let d = engine.pair_distance(alignment.row(0), alignment.row(1));
        let expected = model.lookup(b'A', b'A')
            + model.lookup(b'C', b'C')
            + model.lookup(b'D', b'E')
            + model.lookup(b'K', b'K');
        assert!((d - expected).abs() < 1e-12);
    }

    #[test]
    fn test_with_model_checks_state() {
        let model = SubstitutionModel::new(Alphabet::Protein);
        assert!(DistanceEngine::new(DistanceKind::LogLikelihood, Alphabet::Protein)
            .with_model(model.clone())
            .is_err());

        let mut scored = model;
        scored.to_normalized_score().unwrap();
        assert!(DistanceEngine::new(DistanceKind::NormalizedProbability, Alphabet::Protein)
            .with_model(scored)
            .is_ok());
    }

    #[test]
    fn test_cancelled_matrix_returns_nothing() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = engine(DistanceKind::Raw).compute_distance_matrix(&example(), &cancel);
        assert!(result.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_min_off_diagonal() {
        let matrix = engine(DistanceKind::Raw)
            .compute_distance_matrix(&example(), &CancelToken::new())
            .unwrap();
        assert_eq!(matrix.min_off_diagonal(), Some(1.0));

        let single = Alignment::from_strs(&["ACGT"]).unwrap();
        let matrix = engine(DistanceKind::Raw)
            .compute_distance_matrix(&single, &CancelToken::new())
            .unwrap();
        assert_eq!(matrix.min_off_diagonal(), None);
    }

    #[test]
    fn test_core_genome_distance_matrix() {
        // core columns: 0 (A/A/T) and 4 (T/A/A)
        let matrix = core_genome_distance_matrix(&example(), Alphabet::Nucleotide, &CancelToken::new()).unwrap();
        assert_eq!(matrix.kind(), DistanceKind::Shared);
        assert_eq!(matrix.get(0, 1), 0.5);
        assert_eq!(matrix.get(0, 2), 1.0);
        assert_eq!(matrix.get(1, 2), 0.5);
    }
}
