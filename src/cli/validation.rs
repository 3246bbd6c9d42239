// validation.rs - Input validation utilities

use regex::Regex;
use std::str::FromStr;

use crate::cli::args::Args;
use crate::core::{Alphabet, ColumnFilter, DistanceKind, DiversityPolicy, SubstitutionTransform};
use crate::data::{ranges_from_one_based, PartitionList};

/// What the binary should do with the alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Distance,
    Filter,
    RemoveGaps,
    DeletePartitions,
    PartitionDistances,
    QualityScores,
    SubstitutionMatrix,
    Identical,
    Concatenate,
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "distance" => Ok(Task::Distance),
            "filter" => Ok(Task::Filter),
            "remove-gaps" => Ok(Task::RemoveGaps),
            "delete-partitions" => Ok(Task::DeletePartitions),
            "partition-distances" => Ok(Task::PartitionDistances),
            "quality-scores" => Ok(Task::QualityScores),
            "substitution-matrix" => Ok(Task::SubstitutionMatrix),
            "identical" => Ok(Task::Identical),
            "concatenate" => Ok(Task::Concatenate),
            _ => Err(format!(
                "Invalid task: {}. Use: distance, filter, remove-gaps, delete-partitions, partition-distances, quality-scores, substitution-matrix, identical, concatenate",
                s
            )),
        }
    }
}

impl Task {
    pub fn description(&self) -> &str {
        match self {
            Task::Distance => "Pairwise distance matrix",
            Task::Filter => "Column filtering",
            Task::RemoveGaps => "Gap column removal",
            Task::DeletePartitions => "Partition deletion",
            Task::PartitionDistances => "Distance matrix per partition",
            Task::QualityScores => "Sliding window quality scores",
            Task::SubstitutionMatrix => "Empirical substitution matrix",
            Task::Identical => "Identical sequence groups",
            Task::Concatenate => "Alignment concatenation",
        }
    }

    /// Tasks that read several alignments through `--alignments`
    pub fn uses_alignment_list(&self) -> bool {
        matches!(self, Task::SubstitutionMatrix | Task::Concatenate)
    }
}

pub struct ValidationResult {
    pub task: Task,
    pub distance_kind: DistanceKind,
    pub alphabet: Alphabet,
    pub column_filter: ColumnFilter,
    pub transform: SubstitutionTransform,
    pub alignment_paths: Vec<String>,
    pub include_regex: Option<Regex>,
    pub exclude_regex: Option<Regex>,
    pub partitions: Option<PartitionList>,
    /// 0-based inclusive ranges to delete
    pub delete_ranges: Option<(Vec<usize>, Vec<usize>)>,
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    let task = Task::from_str(&args.task)?;
    let distance_kind = DistanceKind::from_str(&args.distance).map_err(|e| e.to_string())?;
    let alphabet = Alphabet::from_str(&args.alphabet)?;
    let transform = SubstitutionTransform::from_str(&args.transform)?;
    let policy = DiversityPolicy::from_str(&args.diversity)?;

    // Validate thresholds
    let column_filter = if args.core {
        ColumnFilter::core_genome()
    } else {
        ColumnFilter::new(args.max_gap_fraction, args.min_substitutions, policy).map_err(|e| e.to_string())?
    };

    if distance_kind.needs_model() && alphabet != Alphabet::Protein {
        eprintln!(
            "⚠️  Warning: {} distance scores amino acid substitutions; nucleotide symbols outside the 20-letter alphabet score 0",
            distance_kind.name()
        );
    }

    if args.core && task == Task::Distance && distance_kind != DistanceKind::Shared {
        eprintln!(
            "⚠️  Warning: --core computes shared distances; ignoring --distance {}",
            distance_kind.name()
        );
    }

    // Input files
    let alignment_paths = if task.uses_alignment_list() {
        match (&args.alignments, &args.alignment) {
            (Some(list), _) => split_list(list),
            (None, Some(single)) => vec![single.clone()],
            (None, None) => return Err("--alignments (or --alignment) is required for this task".to_string()),
        }
    } else {
        vec![args.alignment.clone().ok_or("--alignment is required")?]
    };
    if alignment_paths.is_empty() {
        return Err("No alignment files given".to_string());
    }

    if args.output.is_none() && task != Task::Identical {
        return Err("--output is required".to_string());
    }

    // Compile regex patterns
    let include_regex = if let Some(pattern) = &args.include_seqs {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid include_seqs regex: {}", e))?)
    } else {
        None
    };

    let exclude_regex = if let Some(pattern) = &args.exclude_seqs {
        Some(Regex::new(pattern).map_err(|e| format!("Invalid exclude_seqs regex: {}", e))?)
    } else {
        None
    };

    // Partitions
    let partitions = match &args.partitions {
        Some(text) => Some(PartitionList::parse(text).map_err(|e| e.to_string())?),
        None => None,
    };
    if task == Task::PartitionDistances && partitions.is_none() {
        return Err("--partitions is required for partition-distances".to_string());
    }

    // Deletion ranges
    let delete_ranges = match (&args.delete_starts, &args.delete_ends) {
        (Some(starts), Some(ends)) => {
            let starts = parse_positions(starts, "--delete-starts")?;
            let ends = parse_positions(ends, "--delete-ends")?;
            Some(ranges_from_one_based(&starts, &ends).map_err(|e| e.to_string())?)
        }
        (None, None) => None,
        _ => return Err("--delete-starts and --delete-ends must be given together".to_string()),
    };
    if task == Task::DeletePartitions && delete_ranges.is_none() {
        return Err("--delete-starts and --delete-ends are required for delete-partitions".to_string());
    }

    if task == Task::QualityScores && (args.step == 0 || args.window == 0) {
        return Err("--step and --window must be greater than 0".to_string());
    }

    Ok(ValidationResult {
        task,
        distance_kind,
        alphabet,
        column_filter,
        transform,
        alignment_paths,
        include_regex,
        exclude_regex,
        partitions,
        delete_ranges,
    })
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a comma-separated list of positions
fn parse_positions(text: &str, flag: &str) -> Result<Vec<usize>, String> {
    split_list(text)
        .iter()
        .map(|value| {
            value
                .parse::<usize>()
                .map_err(|e| format!("Invalid position '{}' in {}: {}", value, flag, e))
        })
        .collect()
}
