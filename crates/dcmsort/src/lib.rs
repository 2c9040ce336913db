//! dcmsort - core library
//!
//! Shared by the `dcmsort` binary and integration tests.

pub mod config;
pub mod sort;

pub use config::SorterConfig;
pub use sort::{CollectionLoad, RunReport, SortOptions, Sorter};
