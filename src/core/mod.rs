// mod.rs - Core logic module

pub mod cancel;
pub mod column;
pub mod distance;
pub mod editor;
pub mod partitioned;
pub mod substitution;
pub mod symbols;

// Re-export main types for convenience
pub use cancel::CancelToken;
pub use column::{evaluate_columns, AlignmentColumn, ColumnFilter, DiversityPolicy};
pub use distance::{
    compute_distance_matrix, core_genome_distance_matrix, DistanceEngine, DistanceKind, DistanceMatrix,
};
pub use editor::{delete_partitions, filter_columns, remove_gap_columns, FilterReport};
pub use partitioned::{distances_per_partition, sliding_window_quality, WindowScore};
pub use substitution::{build_substitution_matrix, MatrixState, SubstitutionModel, SubstitutionTransform};
pub use symbols::{Alphabet, GAP};
