// grassup-common/src/targets.rs
//! Built-in install targets and loading of user-supplied ones.
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::{GrassupError, Result};
use crate::model::{
    ArchiveFormat, InstallProcedure, InstallTarget, MergeEntry, RenameRule, Source,
    SourceDescriptor,
};

pub const GRASSCUTTER: &str = "grasscutter";
pub const GRASSCLIPPER: &str = "grassclipper";
pub const GRASSCLIPPER_X: &str = "grassclipper-x";

const ORG: &str = "Grasscutters";

pub fn grasscutter() -> InstallTarget {
    InstallTarget {
        name: GRASSCUTTER.to_string(),
        destination: PathBuf::from("Grasscutter"),
        sources: vec![
            Source::new(
                "server",
                SourceDescriptor::release_asset(ORG, "Grasscutter", "grasscutter.jar"),
            ),
            Source::new(
                "genshin-data",
                SourceDescriptor::repository("https://github.com/Dimbreath/GenshinData"),
            ),
            Source::new(
                "bin-output",
                SourceDescriptor::repository("https://github.com/radioegor146/gi-bin-output"),
            ),
            Source::new(
                "protos",
                SourceDescriptor::repository("https://github.com/Grasscutters/Grasscutter-Protos"),
            ),
            Source::new(
                "grasscutter",
                SourceDescriptor::repository("https://github.com/Grasscutters/Grasscutter"),
            ),
        ],
        procedure: InstallProcedure::Merge {
            entries: vec![
                MergeEntry::new("genshin-data", "TextMap", "resources/TextMap"),
                MergeEntry::new("genshin-data", "Subtitle", "resources/Subtitle"),
                MergeEntry::new("genshin-data", "Readable", "resources/Readable"),
                MergeEntry::new("genshin-data", "ExcelBinOutput", "resources/ExcelBinOutput"),
                MergeEntry::new("bin-output", "2.5.52/Data/_BinOutput", "resources/BinOutput"),
                MergeEntry::new("protos", "proto", "proto"),
                MergeEntry::new("grasscutter", "keys", "keys"),
                MergeEntry::new("grasscutter", "data", "data"),
                MergeEntry::new("grasscutter", "keystore.p12", "keystore.p12"),
            ],
            rename: Some(RenameRule {
                source: "server".to_string(),
                to: PathBuf::from("grasscutter.jar"),
            }),
        },
    }
}

pub fn grassclipper() -> InstallTarget {
    InstallTarget {
        name: GRASSCLIPPER.to_string(),
        destination: PathBuf::new(),
        sources: vec![Source::new(
            "archive",
            SourceDescriptor::release_asset(ORG, "GrassClipper", "GrassClipper.zip"),
        )],
        procedure: InstallProcedure::Extract {
            source: "archive".to_string(),
            format: Some(ArchiveFormat::Zip),
        },
    }
}

pub fn grassclipper_x() -> InstallTarget {
    InstallTarget {
        name: GRASSCLIPPER_X.to_string(),
        destination: PathBuf::from("GrassClipper-X"),
        sources: vec![Source::new(
            "archive",
            SourceDescriptor::release_asset(ORG, "GrassClipper-X", "GrassClipper-X-1.0.0-win-x64.7z"),
        )],
        procedure: InstallProcedure::Extract {
            source: "archive".to_string(),
            format: Some(ArchiveFormat::SevenZip),
        },
    }
}

pub fn builtin_targets() -> Vec<InstallTarget> {
    vec![grasscutter(), grassclipper(), grassclipper_x()]
}

/// Reads a JSON array of targets.
pub fn load_targets_file(path: &Path) -> Result<Vec<InstallTarget>> {
    debug!("Loading custom install targets from {}", path.display());
    let raw = fs::read_to_string(path).map_err(|e| {
        GrassupError::Config(format!(
            "Failed to read targets file {}: {}",
            path.display(),
            e
        ))
    })?;
    let targets: Vec<InstallTarget> = serde_json::from_str(&raw)?;
    for target in &targets {
        target.validate()?;
    }
    Ok(targets)
}

/// Built-in targets, with any custom file from the config layered on top.
/// A custom target replaces a built-in of the same name.
pub fn all_targets(config: &Config) -> Result<Vec<InstallTarget>> {
    let mut targets = builtin_targets();
    if let Some(path) = config.targets_file() {
        for custom in load_targets_file(path)? {
            match targets.iter_mut().find(|t| t.name == custom.name) {
                Some(existing) => {
                    debug!("Custom target '{}' replaces the built-in one", custom.name);
                    *existing = custom;
                }
                None => targets.push(custom),
            }
        }
    }
    Ok(targets)
}

pub fn find_target(config: &Config, name: &str) -> Result<InstallTarget> {
    all_targets(config)?
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| GrassupError::Config(format!("Unknown install target '{name}'")))
}
