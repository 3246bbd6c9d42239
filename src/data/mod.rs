// mod.rs - Data structures module

pub mod alignment;
pub mod partitions;

// Re-export main types for convenience
pub use alignment::{Alignment, IdenticalGroup};
pub use partitions::{ranges_from_one_based, PartitionList};
