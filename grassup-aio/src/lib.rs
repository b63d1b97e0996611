// grassup-aio/src/lib.rs
//! Asynchronous IO operations for grassup (filesystem, git, archives, processes)

pub mod extract;
pub mod fs;
pub mod git2;
pub mod process;

pub use extract::{extract_archive_async, ExtractTools};
pub use fs::*;
pub use self::git2::{clone_repo_async, repo_dir_name};
pub use process::run_command_async;
