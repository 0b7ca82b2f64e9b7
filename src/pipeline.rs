//! Filesystem-facing stages built on the core algorithms.
//!
//! Each stage reads flat JSON records from the data directory and replaces
//! whole files atomically; none of them keeps state between runs.

pub mod export;
pub mod ghosts;
pub mod grind;
pub mod index;
pub mod store;

pub use export::{MigrateReport, build_graph, export_cloud, migrate_all};
pub use ghosts::{GhostScanner, ScanReport, scan_records};
pub use grind::{ArtifactFailure, ArtifactOutcome, BatchReport, Grinder};
pub use index::{IndexReport, build_manifest};
