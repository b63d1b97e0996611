// grassup-common/src/model/mod.rs
pub mod source;
pub mod target;

pub use source::{ArchiveFormat, ClonePolicy, Source, SourceDescriptor};
pub use target::{ConflictPolicy, InstallProcedure, InstallTarget, MergeEntry, RenameRule};
