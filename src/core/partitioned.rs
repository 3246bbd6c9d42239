// partitioned.rs - Distances over gene partitions and sliding windows

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::ops::Range;

use crate::core::cancel::CancelToken;
use crate::core::distance::{DistanceEngine, DistanceMatrix};
use crate::data::{Alignment, PartitionList};
use crate::error::{MsaError, Result};

/// Minimum pairwise distance inside one window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowScore {
    pub start: usize,
    pub end: usize,
    pub min_distance: f64,
}

/// One distance matrix per partition, in partition order.
///
/// A model-based engine that is not yet primed is primed once on the full
/// alignment. A partition left without columns (after filtering) yields an
/// all-zero matrix.
pub fn distances_per_partition(
    alignment: &Alignment,
    engine: &mut DistanceEngine,
    partitions: &PartitionList,
    cancel: &CancelToken,
) -> Result<Vec<DistanceMatrix>> {
    partitions.validate_against(alignment.len())?;
    if !engine.is_primed() {
        engine.prime(alignment, cancel)?;
    }

    let ranges: Vec<Range<usize>> = partitions.ranges().collect();
    let pb = progress_bar(engine.show_progress(), ranges.len(), "partitions");
    let inner = engine.clone().with_progress(false);

    let matrices = ranges
        .par_iter()
        .map(|range| -> Result<DistanceMatrix> {
            cancel.check()?;
            let matrix = if range.is_empty() {
                DistanceMatrix::zeros(alignment.ids().to_vec(), inner.kind())
            } else {
                let sub = alignment.sub_alignment(range.clone())?;
                inner.compute_distance_matrix(&sub, cancel)?
            };
            pb.inc(1);
            Ok(matrix)
        })
        .collect::<Result<Vec<_>>>()?;

    pb.finish_and_clear();
    Ok(matrices)
}

/// Minimum off-diagonal distance of every `window`-column window, starting at
/// column 0 and advancing by `step` while the window fits in the alignment.
pub fn sliding_window_quality(
    alignment: &Alignment,
    engine: &mut DistanceEngine,
    step: usize,
    window: usize,
    cancel: &CancelToken,
) -> Result<Vec<WindowScore>> {
    if step == 0 || window == 0 {
        return Err(MsaError::invalid_input(format!(
            "Step size and window size must be greater than 0 (got step {}, window {})",
            step, window
        )));
    }
    if alignment.num_rows() < 2 {
        return Err(MsaError::invalid_input(
            "Window quality scores need at least two sequences",
        ));
    }
    if !engine.is_primed() {
        engine.prime(alignment, cancel)?;
    }

    let length = alignment.len();
    let starts: Vec<usize> = (0..length)
        .step_by(step)
        .take_while(|&start| start + window <= length)
        .collect();

    let pb = progress_bar(engine.show_progress(), starts.len(), "windows");
    let inner = engine.clone().with_progress(false);

    let scores = starts
        .par_iter()
        .map(|&start| -> Result<WindowScore> {
            cancel.check()?;
            let end = start + window;
            let sub = alignment.sub_alignment(start..end)?;
            let matrix = inner.compute_distance_matrix(&sub, cancel)?;
            let min_distance = matrix
                .min_off_diagonal()
                .ok_or_else(|| MsaError::invalid_input("Window has fewer than two sequences"))?;
            pb.inc(1);
            Ok(WindowScore {
                start,
                end,
                min_distance,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    pb.finish_and_clear();
    Ok(scores)
}

fn progress_bar(visible: bool, len: usize, unit: &str) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) ETA: {{eta}}",
                unit
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}
