// substitution.rs - Empirical amino-acid substitution matrix

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::cancel::CancelToken;
use crate::core::symbols::Alphabet;
use crate::data::Alignment;
use crate::error::{MsaError, Result};

/// Row/column order of the substitution matrix
pub const AMINO_ACIDS: [u8; 20] = [
    b'A', b'C', b'D', b'E', b'F', b'G', b'H', b'I', b'K', b'L',
    b'M', b'N', b'P', b'Q', b'R', b'S', b'T', b'V', b'W', b'Y',
];

const NUM_SYMBOLS: usize = AMINO_ACIDS.len();
const NOT_IN_ALPHABET: u8 = u8::MAX;

const SYMBOL_INDEX: [u8; 256] = build_symbol_index();

const fn build_symbol_index() -> [u8; 256] {
    let mut table = [NOT_IN_ALPHABET; 256];
    let mut i = 0;
    while i < NUM_SYMBOLS {
        table[AMINO_ACIDS[i] as usize] = i as u8;
        i += 1;
    }
    table
}

#[inline]
fn symbol_index(symbol: u8) -> Option<usize> {
    match SYMBOL_INDEX[symbol as usize] {
        NOT_IN_ALPHABET => None,
        idx => Some(idx as usize),
    }
}

type Cells = [[f64; NUM_SYMBOLS]; NUM_SYMBOLS];

/// What the matrix cells currently hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatrixState {
    Counts,
    Probabilities,
    LogLikelihood,
    NormalizedScore,
}

/// Transform applied once accumulation is finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubstitutionTransform {
    Counts,
    Probability,
    LogLikelihood,
    NormalizedScore,
}

impl FromStr for SubstitutionTransform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counts" => Ok(SubstitutionTransform::Counts),
            "probability" | "prob" => Ok(SubstitutionTransform::Probability),
            "log-likelihood" | "loglike" | "loglikelihood" => Ok(SubstitutionTransform::LogLikelihood),
            "normalized-score" | "normprob" | "normalized" => Ok(SubstitutionTransform::NormalizedScore),
            _ => Err(format!(
                "Invalid substitution transform: {}. Use: counts, probability, log-likelihood, normalized-score",
                s
            )),
        }
    }
}

/// Substitution counts between the 20 amino acids, accumulated over all
/// row pairs of one or more alignments, plus marginal symbol counts.
#[derive(Debug, Clone)]
pub struct SubstitutionModel {
    cells: Cells,
    marginals: [u64; NUM_SYMBOLS],
    alphabet: Alphabet,
    state: MatrixState,
}

impl Default for SubstitutionModel {
    fn default() -> Self {
        Self::new(Alphabet::Protein)
    }
}

impl SubstitutionModel {
    /// Empty model. `alphabet` decides which symbols count as unknown.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            cells: [[0.0; NUM_SYMBOLS]; NUM_SYMBOLS],
            marginals: [0; NUM_SYMBOLS],
            alphabet,
            state: MatrixState::Counts,
        }
    }

    pub fn state(&self) -> MatrixState {
        self.state
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn cells(&self) -> &[[f64; 20]; 20] {
        &self.cells
    }

    pub fn marginals(&self) -> &[u64; 20] {
        &self.marginals
    }

    /// Sum of all matrix cells
    pub fn total(&self) -> f64 {
        self.cells.iter().flat_map(|row| row.iter()).sum()
    }

    /// Add the substitutions observed between every pair of rows
    pub fn accumulate(&mut self, alignment: &Alignment) -> Result<()> {
        self.accumulate_with_cancel(alignment, &CancelToken::new())
    }

    /// Like [`accumulate`](Self::accumulate), checking `cancel` once per row.
    /// A cancelled pass leaves the model unchanged.
    pub fn accumulate_with_cancel(&mut self, alignment: &Alignment, cancel: &CancelToken) -> Result<()> {
        if self.state != MatrixState::Counts {
            return Err(MsaError::invalid_state(format!(
                "cannot accumulate into a matrix already transformed to {:?}",
                self.state
            )));
        }

        let alphabet = self.alphabet;
        let rows = alignment.rows();

        let (cells, marginals) = (0..rows.len())
            .into_par_iter()
            .map(|i| -> Result<(Cells, [u64; NUM_SYMBOLS])> {
                cancel.check()?;
                let mut cells = [[0.0; NUM_SYMBOLS]; NUM_SYMBOLS];
                let mut marginals = [0u64; NUM_SYMBOLS];

                for &symbol in &rows[i] {
                    if let Some(idx) = symbol_index(symbol) {
                        marginals[idx] += 1;
                    }
                }

                for other in &rows[i + 1..] {
                    count_substitutions(&rows[i], other, alphabet, &mut cells);
                }
                Ok((cells, marginals))
            })
            .try_reduce(
                || ([[0.0; NUM_SYMBOLS]; NUM_SYMBOLS], [0u64; NUM_SYMBOLS]),
                |(mut cells_a, mut marg_a), (cells_b, marg_b)| {
                    for r in 0..NUM_SYMBOLS {
                        for c in 0..NUM_SYMBOLS {
                            cells_a[r][c] += cells_b[r][c];
                        }
                        marg_a[r] += marg_b[r];
                    }
                    Ok((cells_a, marg_a))
                },
            )?;

        for r in 0..NUM_SYMBOLS {
            for c in 0..NUM_SYMBOLS {
                self.cells[r][c] += cells[r][c];
            }
            self.marginals[r] += marginals[r];
        }
        Ok(())
    }

    /// Divide every cell by the grand total. A model with no counts stays zero.
    pub fn to_probabilities(&mut self) -> Result<()> {
        self.require_counts()?;
        self.normalize();
        self.state = MatrixState::Probabilities;
        Ok(())
    }

    /// `ln(p_ij / (f_i * f_j))` for every nonzero cell; zero cells stay zero
    pub fn to_log_likelihood(&mut self) -> Result<()> {
        self.require_counts()?;
        self.normalize();

        let marginal_total: u64 = self.marginals.iter().sum();
        if marginal_total > 0 {
            let freqs: Vec<f64> = self
                .marginals
                .iter()
                .map(|&count| count as f64 / marginal_total as f64)
                .collect();

            for (i, row) in self.cells.iter_mut().enumerate() {
                for (j, cell) in row.iter_mut().enumerate() {
                    let expected = freqs[i] * freqs[j];
                    if *cell != 0.0 && expected > 0.0 {
                        *cell = (*cell / expected).ln();
                    }
                }
            }
        }

        self.state = MatrixState::LogLikelihood;
        Ok(())
    }

    /// `-ln(p_ij)` for every nonzero cell: rarer substitutions score higher
    pub fn to_normalized_score(&mut self) -> Result<()> {
        self.require_counts()?;
        self.normalize();
        for cell in self.cells.iter_mut().flat_map(|row| row.iter_mut()) {
            if *cell != 0.0 {
                *cell = -cell.ln();
            }
        }
        self.state = MatrixState::NormalizedScore;
        Ok(())
    }

    /// Apply a transform chosen at runtime
    pub fn apply(&mut self, transform: SubstitutionTransform) -> Result<()> {
        match transform {
            SubstitutionTransform::Counts => self.require_counts(),
            SubstitutionTransform::Probability => self.to_probabilities(),
            SubstitutionTransform::LogLikelihood => self.to_log_likelihood(),
            SubstitutionTransform::NormalizedScore => self.to_normalized_score(),
        }
    }

    /// Current cell value for two symbols, 0 outside the alphabet
    #[inline]
    pub fn lookup(&self, a: u8, b: u8) -> f64 {
        match (symbol_index(a), symbol_index(b)) {
            (Some(i), Some(j)) => self.cells[i][j],
            _ => 0.0,
        }
    }

    fn require_counts(&self) -> Result<()> {
        if self.state != MatrixState::Counts {
            return Err(MsaError::invalid_state(format!(
                "matrix has already been transformed to {:?}",
                self.state
            )));
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let total = self.total();
        if total == 0.0 {
            return;
        }
        for cell in self.cells.iter_mut().flat_map(|row| row.iter_mut()) {
            if *cell != 0.0 {
                *cell /= total;
            }
        }
    }
}

/// Count substitutions between two rows into `cells`, symmetric
fn count_substitutions(reference: &[u8], query: &[u8], alphabet: Alphabet, cells: &mut Cells) {
    for (&r, &q) in reference.iter().zip(query.iter()) {
        if !alphabet.is_comparable(r, q) {
            continue;
        }
        if let (Some(ri), Some(qi)) = (symbol_index(r), symbol_index(q)) {
            cells[ri][qi] += 1.0;
            cells[qi][ri] += 1.0;
        }
    }
}

/// Accumulate substitutions over several alignments and apply one transform
pub fn build_substitution_matrix(
    alignments: &[Alignment],
    transform: SubstitutionTransform,
    alphabet: Alphabet,
    cancel: &CancelToken,
) -> Result<SubstitutionModel> {
    let mut model = SubstitutionModel::new(alphabet);
    for alignment in alignments {
        cancel.check()?;
        model.accumulate_with_cancel(alignment, cancel)?;
    }
    if model.total() == 0.0 {
        eprintln!("⚠️  Warning: no substitutions observed, the matrix is all zeros");
    }
    model.apply(transform)?;
    Ok(model)
}
