// lib.rs - msadist library root

//! # msadist - Parallel distance and quality analysis for multiple sequence alignments
//!
//! This library loads FASTA alignments and computes pairwise distance
//! matrices between their rows, optionally scored with an empirical amino
//! acid substitution model learned from the alignments themselves. It also
//! edits alignments in place (column filtering, gap removal, partition
//! deletion) and repeats distance computation over gene partitions or
//! sliding windows.
//!
//! ## Features
//!
//! - **Parallel**: row-block distance matrices and per-column filtering on rayon
//! - **Substitution models**: counts, probabilities, log-odds and `-ln p` scores
//! - **Multiple formats**: TSV, CSV, PHYLIP, NEXUS and JSON output
//! - **Partition aware**: partition offsets are remapped when columns are removed
//! - **Cancellable**: long loops stop cleanly through a shared [`CancelToken`](core::CancelToken)
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use msadist::prelude::*;
//!
//! let mut alignment = Alignment::from_fasta(std::path::Path::new("genes.fasta"))?;
//! let cancel = CancelToken::new();
//!
//! // Keep gap-free columns that carry at least one substitution
//! filter_columns(&mut alignment, &ColumnFilter::core_genome(), None, &cancel)?;
//!
//! let mut engine = DistanceEngine::new(DistanceKind::Shared, Alphabet::Nucleotide);
//! engine.prime(&alignment, &cancel)?;
//! let matrix = engine.compute_distance_matrix(&alignment, &cancel)?;
//! println!("closest pair: {:?}", matrix.min_off_diagonal());
//! # Ok::<(), msadist::MsaError>(())
//! ```

pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{
        build_substitution_matrix, compute_distance_matrix, core_genome_distance_matrix, delete_partitions,
        distances_per_partition, filter_columns, remove_gap_columns, sliding_window_quality,
    };
    pub use crate::core::{
        Alphabet, CancelToken, ColumnFilter, DistanceEngine, DistanceKind, DistanceMatrix, DiversityPolicy,
        SubstitutionModel, SubstitutionTransform, WindowScore,
    };
    pub use crate::data::{Alignment, PartitionList};
    pub use crate::error::MsaError;
    pub use crate::output::write_matrix;
}

// Re-export main types at the root level for convenience
pub use cli::{Args, ValidationResult};
pub use crate::core::{CancelToken, DistanceEngine, DistanceKind, DistanceMatrix, SubstitutionModel};
pub use data::{Alignment, PartitionList};
pub use error::{MsaError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "msadist v{} - Parallel distance and quality analysis for multiple sequence alignments",
        VERSION
    )
}
