// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs, Debug)]
/// msadist - Multiple sequence alignment distances, filtering and quality scores
pub struct Args {
    /// path to the FASTA alignment
    #[argh(option)]
    pub alignment: Option<String>,

    /// comma-separated FASTA alignments (substitution-matrix and concatenate tasks)
    #[argh(option)]
    pub alignments: Option<String>,

    /// task: distance, filter, remove-gaps, delete-partitions, partition-distances, quality-scores, substitution-matrix, identical, concatenate (default: distance)
    #[argh(option, default = "String::from(\"distance\")")]
    pub task: String,

    /// distance function: raw, shared, normalizedProbability, logLikelihood (default: raw)
    #[argh(option, default = "String::from(\"raw\")")]
    pub distance: String,

    /// residue alphabet: nucleotide, protein (default: nucleotide)
    #[argh(option, default = "String::from(\"nucleotide\")")]
    pub alphabet: String,

    /// output file (matrix, FASTA or table depending on the task)
    #[argh(option)]
    pub output: Option<String>,

    /// distance matrix format: tsv, csv, phylip, nexus, json (default: tsv)
    #[argh(option, default = "String::from(\"tsv\")")]
    pub format: String,

    /// comma-separated partition end offsets, e.g. 300,750,1200
    #[argh(option)]
    pub partitions: Option<String>,

    /// comma-separated 1-based start positions of ranges to delete
    #[argh(option)]
    pub delete_starts: Option<String>,

    /// comma-separated 1-based end positions (inclusive) of ranges to delete
    #[argh(option)]
    pub delete_ends: Option<String>,

    /// largest tolerated fraction of gap rows per column (0.0-1.0, default: 0.01)
    #[argh(option, default = "0.01")]
    pub max_gap_fraction: f64,

    /// minimum column diversity to keep a column (default: 0)
    #[argh(option, default = "0")]
    pub min_substitutions: usize,

    /// column diversity policy: minor-alleles, distinct-symbols (default: minor-alleles)
    #[argh(option, default = "String::from(\"minor-alleles\")")]
    pub diversity: String,

    /// compute distances on the core genome (gap-free columns with substitutions)
    #[argh(switch)]
    pub core: bool,

    /// sliding window step size (default: 10)
    #[argh(option, default = "10")]
    pub step: usize,

    /// sliding window size in columns (default: 100)
    #[argh(option, default = "100")]
    pub window: usize,

    /// substitution matrix transform: counts, probability, log-likelihood, normalized-score (default: normalized-score)
    #[argh(option, default = "String::from(\"normalized-score\")")]
    pub transform: String,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// include only sequences whose id matches regex pattern
    #[argh(option)]
    pub include_seqs: Option<String>,

    /// exclude sequences whose id matches regex pattern
    #[argh(option)]
    pub exclude_seqs: Option<String>,

    /// hide progress bars
    #[argh(switch)]
    pub no_progress: bool,

    /// validate inputs without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
