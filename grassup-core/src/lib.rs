// grassup-core/src/lib.rs

pub mod install;

// Re-export key types for easier use by the CLI crate
pub use install::cleanup::CleanupReport;
pub use install::merge::MergeSummary;
pub use install::{InstallReport, Installer, StagedSource};
