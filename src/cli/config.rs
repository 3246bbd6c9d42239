// config.rs - Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    // Input/Output
    pub alignment: Option<String>,
    pub alignments: Option<String>,
    pub output: Option<String>,
    pub format: Option<String>,

    // Core settings
    pub task: Option<String>,
    pub distance: Option<String>,
    pub alphabet: Option<String>,
    pub transform: Option<String>,

    // Performance
    pub threads: Option<usize>,

    // Column filtering
    pub max_gap_fraction: Option<f64>,
    pub min_substitutions: Option<usize>,
    pub diversity: Option<String>,
    pub core: Option<bool>,

    // Partitions and windows
    pub partitions: Option<String>,
    pub delete_starts: Option<String>,
    pub delete_ends: Option<String>,
    pub step: Option<usize>,
    pub window: Option<usize>,

    // Sequence filtering
    pub include_seqs: Option<String>,
    pub exclude_seqs: Option<String>,

    // Flags
    pub no_progress: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        println!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        println!("📄 Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# msadist.toml - Configuration file for msadist
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# FASTA alignment (all sequences must have the same length)
alignment = "/path/to/alignment.fasta"

# Comma-separated alignments for the substitution-matrix and concatenate tasks
# alignments = "gene1.fasta,gene2.fasta"

# Output file
output = "distances.tsv"

# Distance matrix format: tsv, csv, phylip, nexus, json
format = "tsv"

# =============================================================================
# CORE SETTINGS
# =============================================================================

# Task: distance, filter, remove-gaps, delete-partitions, partition-distances,
#       quality-scores, substitution-matrix, identical, concatenate
task = "distance"

# Distance function: raw, shared, normalizedProbability, logLikelihood
distance = "raw"

# Residue alphabet: nucleotide or protein (N and X are unknown in both)
alphabet = "nucleotide"

# Substitution matrix transform: counts, probability, log-likelihood, normalized-score
transform = "normalized-score"

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
threads = 8

# =============================================================================
# COLUMN FILTERING
# =============================================================================

# Largest tolerated fraction of gap rows per column (0.0-1.0)
max_gap_fraction = 0.01

# Minimum column diversity to keep a column
min_substitutions = 1

# Diversity policy: minor-alleles, distinct-symbols
diversity = "minor-alleles"

# Compute distances on gap-free columns that carry substitutions
core = false

# =============================================================================
# PARTITIONS AND WINDOWS
# =============================================================================

# Partition end offsets of a concatenated alignment
# partitions = "300,750,1200"

# 1-based inclusive ranges to delete
# delete_starts = "1,501"
# delete_ends = "100,600"

# Sliding window quality scores
step = 10
window = 100

# =============================================================================
# SEQUENCE FILTERING
# =============================================================================

# Include only sequences whose id matches regex pattern
# include_seqs = "^GCF_.*"

# Exclude sequences whose id matches regex pattern
# exclude_seqs = "outgroup.*"

# =============================================================================
# FLAGS
# =============================================================================

# Hide progress bars
no_progress = false

# Validate inputs without computation (dry run)
dry_run = false
"#
        .to_string()
    }
}
