//! Page-partitioning engine
//!
//! Turns one multi-page document into several derived documents:
//!
//! - `selector`: strategy → ordered page groups (pure)
//! - `outline`: top-level bookmark extraction for the outline strategy
//! - `partitioner`: page groups → derived PDF files
//!
//! The selector validates caller input and never touches the filesystem;
//! the partitioner owns all file writes.

pub mod outline;
pub mod partitioner;
pub mod selector;

pub use outline::{top_level_entries, OutlineEntry};
pub use partitioner::{partition, PartitionError};
pub use selector::{select, PageGroup, PageRange, SelectionError, SelectionStrategy};
