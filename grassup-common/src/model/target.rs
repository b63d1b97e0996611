// grassup-common/src/model/target.rs
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::source::{ArchiveFormat, Source, SourceDescriptor};
use crate::error::{GrassupError, Result};

/// One installable application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallTarget {
    pub name: String,
    /// Relative to the install root. Empty means the root itself.
    #[serde(default)]
    pub destination: PathBuf,
    pub sources: Vec<Source>,
    pub procedure: InstallProcedure,
}

/// How staged sources become files under the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InstallProcedure {
    Merge {
        #[serde(default)]
        entries: Vec<MergeEntry>,
        #[serde(default)]
        rename: Option<RenameRule>,
    },
    Extract {
        source: String,
        #[serde(default)]
        format: Option<ArchiveFormat>,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    #[default]
    SkipIfExists,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEntry {
    pub source: String,
    pub from: PathBuf,
    pub to: PathBuf,
    #[serde(default)]
    pub policy: ConflictPolicy,
}

impl MergeEntry {
    pub fn new(source: &str, from: &str, to: &str) -> Self {
        Self {
            source: source.to_string(),
            from: PathBuf::from(from),
            to: PathBuf::from(to),
            policy: ConflictPolicy::SkipIfExists,
        }
    }
}

/// Copies a single staged file to a fixed name under the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameRule {
    pub source: String,
    pub to: PathBuf,
}

impl InstallTarget {
    pub fn source(&self, key: &str) -> Option<&Source> {
        self.sources.iter().find(|s| s.key == key)
    }

    /// Checks that the target is internally consistent before any step runs.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(GrassupError::Config("install target has no name".into()));
        }
        if self.sources.is_empty() {
            return Err(self.invalid("declares no sources"));
        }
        ensure_relative(&self.destination).map_err(|why| self.invalid(&why))?;

        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.key.as_str()) {
                return Err(self.invalid(&format!("duplicate source key '{}'", source.key)));
            }
            // The file name is joined onto the download directory.
            if let SourceDescriptor::ReleaseAsset { file, .. } = &source.locator {
                if !is_plain_file_name(file) {
                    return Err(self.invalid(&format!(
                        "release asset '{file}' must be a plain file name"
                    )));
                }
            }
        }

        match &self.procedure {
            InstallProcedure::Merge { entries, rename } => {
                for entry in entries {
                    let source = self.require(&entry.source)?;
                    if source.locator.stages_file() {
                        return Err(self.invalid(&format!(
                            "merge entry '{}' reads from '{}', which is not a directory tree",
                            entry.from.display(),
                            entry.source
                        )));
                    }
                    ensure_relative(&entry.from).map_err(|why| self.invalid(&why))?;
                    ensure_relative(&entry.to).map_err(|why| self.invalid(&why))?;
                }
                if let Some(rule) = rename {
                    let source = self.require(&rule.source)?;
                    if !source.locator.stages_file() {
                        return Err(self.invalid(&format!(
                            "rename reads from '{}', which is not a single file",
                            rule.source
                        )));
                    }
                    ensure_relative(&rule.to).map_err(|why| self.invalid(&why))?;
                }
            }
            InstallProcedure::Extract { source, format } => {
                let src = self.require(source)?;
                if !src.locator.stages_file() {
                    return Err(self.invalid(&format!("'{source}' is not an archive")));
                }
                if format.is_none() {
                    let name = src.locator.file_name().unwrap_or_default();
                    if ArchiveFormat::from_path(Path::new(&name)).is_none() {
                        return Err(self.invalid(&format!(
                            "cannot infer archive format of '{name}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Archive format for an `Extract` procedure, explicit or inferred.
    pub fn archive_format(&self) -> Option<ArchiveFormat> {
        match &self.procedure {
            InstallProcedure::Extract { source, format } => format.or_else(|| {
                let name = self.source(source)?.locator.file_name()?;
                ArchiveFormat::from_path(Path::new(&name))
            }),
            InstallProcedure::Merge { .. } => None,
        }
    }

    fn require(&self, key: &str) -> Result<&Source> {
        self.source(key)
            .ok_or_else(|| self.invalid(&format!("references unknown source '{key}'")))
    }

    fn invalid(&self, why: &str) -> GrassupError {
        GrassupError::Config(format!("install target '{}' {}", self.name, why))
    }
}

fn is_plain_file_name(name: &str) -> bool {
    let mut comps = Path::new(name).components();
    matches!(
        (comps.next(), comps.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn ensure_relative(path: &Path) -> std::result::Result<(), String> {
    for comp in path.components() {
        match comp {
            Component::Normal(_) | Component::CurDir => {}
            _ => {
                return Err(format!(
                    "path '{}' must stay relative and inside its root",
                    path.display()
                ))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge_target(entries: Vec<MergeEntry>, rename: Option<RenameRule>) -> InstallTarget {
        InstallTarget {
            name: "demo".into(),
            destination: PathBuf::from("Demo"),
            sources: vec![
                Source::new("jar", SourceDescriptor::release_asset("o", "r", "demo.jar")),
                Source::new("data", SourceDescriptor::repository("https://example.com/o/data")),
            ],
            procedure: InstallProcedure::Merge { entries, rename },
        }
    }

    #[test]
    fn valid_merge_target_passes() {
        let target = merge_target(
            vec![MergeEntry::new("data", "TextMap", "resources/TextMap")],
            Some(RenameRule {
                source: "jar".into(),
                to: PathBuf::from("demo.jar"),
            }),
        );
        target.validate().unwrap();
    }

    #[test]
    fn unknown_source_key_is_rejected() {
        let target = merge_target(vec![MergeEntry::new("nope", "a", "b")], None);
        let err = target.validate().unwrap_err();
        assert!(err.to_string().contains("unknown source 'nope'"));
    }

    #[test]
    fn merge_from_a_file_source_is_rejected() {
        let target = merge_target(vec![MergeEntry::new("jar", "a", "b")], None);
        assert!(target.validate().is_err());
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let target = merge_target(vec![MergeEntry::new("data", "a", "../../etc")], None);
        assert!(target.validate().is_err());

        let mut target = merge_target(vec![], None);
        target.destination = PathBuf::from("/abs");
        assert!(target.validate().is_err());
    }

    #[test]
    fn release_asset_must_be_a_plain_file_name() {
        for file in ["../../victim/important.zip", "nested/demo.jar", "/tmp/demo.jar", ".."] {
            let mut target = merge_target(vec![], None);
            target.sources[0] = Source::new("jar", SourceDescriptor::release_asset("o", "r", file));
            let err = target.validate().unwrap_err();
            assert!(err.to_string().contains("plain file name"), "{file}: {err}");
        }
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let mut target = merge_target(vec![], None);
        target.sources.push(Source::new(
            "data",
            SourceDescriptor::repository("https://example.com/o/other"),
        ));
        assert!(target.validate().unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn extract_format_is_inferred_from_file_name() {
        let target = InstallTarget {
            name: "tool".into(),
            destination: PathBuf::new(),
            sources: vec![Source::new(
                "archive",
                SourceDescriptor::release_asset("o", "r", "tool.7z"),
            )],
            procedure: InstallProcedure::Extract {
                source: "archive".into(),
                format: None,
            },
        };
        target.validate().unwrap();
        assert_eq!(target.archive_format(), Some(ArchiveFormat::SevenZip));
    }

    #[test]
    fn extract_with_unknown_extension_needs_explicit_format() {
        let mut target = InstallTarget {
            name: "tool".into(),
            destination: PathBuf::new(),
            sources: vec![Source::new(
                "archive",
                SourceDescriptor::release_asset("o", "r", "tool.bin"),
            )],
            procedure: InstallProcedure::Extract {
                source: "archive".into(),
                format: None,
            },
        };
        assert!(target.validate().is_err());
        target.procedure = InstallProcedure::Extract {
            source: "archive".into(),
            format: Some(ArchiveFormat::Zip),
        };
        target.validate().unwrap();
    }
}
