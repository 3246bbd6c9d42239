// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};

/// Replace `current` with the config value while it still holds the CLI default
fn override_default<T: PartialEq>(current: &mut T, default: T, configured: Option<T>) {
    if *current == default {
        if let Some(value) = configured {
            *current = value;
        }
    }
}

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.alignment.is_none() {
            self.alignment = config.alignment;
        }
        if self.alignments.is_none() {
            self.alignments = config.alignments;
        }
        if self.output.is_none() {
            self.output = config.output;
        }

        // Core settings (only override defaults, not explicit CLI values)
        override_default(&mut self.format, "tsv".to_string(), config.format);
        override_default(&mut self.task, "distance".to_string(), config.task);
        override_default(&mut self.distance, "raw".to_string(), config.distance);
        override_default(&mut self.alphabet, "nucleotide".to_string(), config.alphabet);
        override_default(&mut self.transform, "normalized-score".to_string(), config.transform);

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Column filtering
        override_default(&mut self.max_gap_fraction, 0.01, config.max_gap_fraction);
        override_default(&mut self.min_substitutions, 0, config.min_substitutions);
        override_default(&mut self.diversity, "minor-alleles".to_string(), config.diversity);
        if !self.core && config.core.unwrap_or(false) {
            self.core = true;
        }

        // Partitions and windows
        if self.partitions.is_none() {
            self.partitions = config.partitions;
        }
        if self.delete_starts.is_none() {
            self.delete_starts = config.delete_starts;
        }
        if self.delete_ends.is_none() {
            self.delete_ends = config.delete_ends;
        }
        override_default(&mut self.step, 10, config.step);
        override_default(&mut self.window, 100, config.window);

        // Sequence filtering
        if self.include_seqs.is_none() {
            self.include_seqs = config.include_seqs;
        }
        if self.exclude_seqs.is_none() {
            self.exclude_seqs = config.exclude_seqs;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.no_progress && config.no_progress.unwrap_or(false) {
            self.no_progress = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self, String> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argh::FromArgs;

    #[test]
    fn test_cli_values_win_over_config() {
        let args = Args::from_args(&["msadist"], &["--distance", "shared", "--alignment", "cli.fasta"]).unwrap();
        let config = Config {
            alignment: Some("config.fasta".to_string()),
            distance: Some("logLikelihood".to_string()),
            window: Some(25),
            core: Some(true),
            ..Config::default()
        };

        let merged = args.merge_with_config(config);
        assert_eq!(merged.alignment.as_deref(), Some("cli.fasta"));
        assert_eq!(merged.distance, "shared");
        assert_eq!(merged.window, 25);
        assert!(merged.core);
        assert_eq!(merged.task, "distance");
    }
}
