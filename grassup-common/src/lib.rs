// grassup-common/src/lib.rs
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod targets;

// Re-export key types
pub use config::Config;
pub use error::{ErrorKind, GrassupError, Result};
pub use model::{
    ArchiveFormat, ClonePolicy, InstallProcedure, InstallTarget, MergeEntry, RenameRule, Source,
    SourceDescriptor,
};
pub use pipeline::{InstallEvent, InstallStage};
