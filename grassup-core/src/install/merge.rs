// grassup-core/src/install/merge.rs
//! Gap-filling merge of staged sources into a destination tree.
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use grassup_aio::fs::{copy_file_if_absent, copy_tree_if_absent, CopyStats};
use grassup_common::error::{GrassupError, Result};
use grassup_common::model::{ConflictPolicy, MergeEntry};
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    pub destination: PathBuf,
    pub stats: CopyStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub entries: Vec<MergedEntry>,
    pub total: CopyStats,
}

impl MergeSummary {
    fn record(&mut self, destination: PathBuf, stats: CopyStats) {
        self.total.add(stats);
        self.entries.push(MergedEntry { destination, stats });
    }
}

/// Copies one manifest entry from `source_root` into `destination`.
///
/// The entry may name a directory (mirrored recursively) or a single file.
/// Existing destination files are never touched. A missing source path is a
/// `MergeError`.
pub fn merge_entry(source_root: &Path, destination: &Path, entry: &MergeEntry) -> Result<CopyStats> {
    let src = source_root.join(&entry.from);
    let dst = destination.join(&entry.to);

    let metadata = match fs::metadata(&src) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            error!(
                "Merge source {} is missing from '{}'",
                src.display(),
                entry.source
            );
            return Err(GrassupError::MergeError(
                entry.from.display().to_string(),
                format!(
                    "not found in source '{}' at {}",
                    entry.source,
                    source_root.display()
                ),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    match entry.policy {
        ConflictPolicy::SkipIfExists => {
            if metadata.is_dir() {
                copy_tree_if_absent(&src, &dst)
            } else {
                let copied = copy_file_if_absent(&src, &dst)?;
                Ok(CopyStats {
                    copied: usize::from(copied),
                    skipped: usize::from(!copied),
                })
            }
        }
    }
}

/// Applies `entries` in order. `roots` maps each source key to its staged
/// directory. Stops at the first failing entry; later entries are not
/// processed. `on_entry` sees every completed entry.
pub fn merge_entries<F>(
    roots: &HashMap<String, PathBuf>,
    destination: &Path,
    entries: &[MergeEntry],
    mut on_entry: F,
) -> Result<MergeSummary>
where
    F: FnMut(&MergedEntry),
{
    let mut summary = MergeSummary::default();
    for entry in entries {
        let root = roots.get(&entry.source).ok_or_else(|| {
            GrassupError::MergeError(
                entry.from.display().to_string(),
                format!("source '{}' was not staged", entry.source),
            )
        })?;
        let stats = merge_entry(root, destination, entry)?;
        debug!(
            "Merged {} -> {} ({} copied, {} kept)",
            entry.from.display(),
            entry.to.display(),
            stats.copied,
            stats.skipped
        );
        summary.record(destination.join(&entry.to), stats);
        if let Some(last) = summary.entries.last() {
            on_entry(last);
        }
    }
    Ok(summary)
}

/// Copies a single staged file to `destination/to` unless that file exists.
pub fn apply_rename(staged_file: &Path, destination: &Path, to: &Path) -> Result<bool> {
    if !staged_file.is_file() {
        return Err(GrassupError::MergeError(
            staged_file.display().to_string(),
            "staged file is missing".to_string(),
        ));
    }
    let dst = destination.join(to);
    let copied = copy_file_if_absent(staged_file, &dst)?;
    debug!(
        "Rename {} -> {}: {}",
        staged_file.display(),
        dst.display(),
        if copied { "copied" } else { "kept existing" }
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use grassup_common::ErrorKind as GrassupErrorKind;
    use walkdir::WalkDir;

    use super::*;

    fn write(path: &Path, body: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(root).unwrap().to_path_buf(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    fn fixture() -> (tempfile::TempDir, HashMap<String, PathBuf>, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let data = tmp.path().join("GenshinData");
        write(&data.join("TextMap/TextMapEN.json"), "en");
        write(&data.join("TextMap/TextMapCHS.json"), "chs");
        write(&data.join("Subtitle/EN/a.srt"), "srt");
        let server = tmp.path().join("Grasscutter");
        write(&server.join("keystore.p12"), "keystore");
        let mut roots = HashMap::new();
        roots.insert("data".to_string(), data);
        roots.insert("server".to_string(), server);
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        (tmp, roots, dest)
    }

    fn manifest() -> Vec<MergeEntry> {
        vec![
            MergeEntry::new("data", "TextMap", "resources/TextMap"),
            MergeEntry::new("data", "Subtitle", "resources/Subtitle"),
            MergeEntry::new("server", "keystore.p12", "keystore.p12"),
        ]
    }

    #[test]
    fn fills_gaps_with_identical_bytes() {
        let (_tmp, roots, dest) = fixture();
        let summary = merge_entries(&roots, &dest, &manifest(), |_| {}).unwrap();

        assert_eq!(summary.total, CopyStats { copied: 4, skipped: 0 });
        assert_eq!(
            fs::read(dest.join("resources/TextMap/TextMapEN.json")).unwrap(),
            fs::read(roots["data"].join("TextMap/TextMapEN.json")).unwrap()
        );
        assert_eq!(fs::read_to_string(dest.join("keystore.p12")).unwrap(), "keystore");
    }

    #[test]
    fn merging_twice_changes_nothing() {
        let (_tmp, roots, dest) = fixture();
        merge_entries(&roots, &dest, &manifest(), |_| {}).unwrap();
        let once = snapshot(&dest);

        let summary = merge_entries(&roots, &dest, &manifest(), |_| {}).unwrap();
        assert_eq!(summary.total.copied, 0);
        assert_eq!(snapshot(&dest), once);
    }

    #[test]
    fn existing_files_are_never_overwritten() {
        let (_tmp, roots, dest) = fixture();
        write(&dest.join("resources/TextMap/TextMapEN.json"), "patched by user");
        write(&dest.join("keystore.p12"), "custom keystore");

        let summary = merge_entries(&roots, &dest, &manifest(), |_| {}).unwrap();

        assert_eq!(summary.total, CopyStats { copied: 2, skipped: 2 });
        assert_eq!(
            fs::read_to_string(dest.join("resources/TextMap/TextMapEN.json")).unwrap(),
            "patched by user"
        );
        assert_eq!(
            fs::read_to_string(dest.join("keystore.p12")).unwrap(),
            "custom keystore"
        );
        assert_eq!(
            fs::read_to_string(dest.join("resources/TextMap/TextMapCHS.json")).unwrap(),
            "chs"
        );
    }

    #[test]
    fn missing_source_subtree_stops_the_merge() {
        let (_tmp, roots, dest) = fixture();
        let entries = vec![
            MergeEntry::new("data", "TextMap", "resources/TextMap"),
            MergeEntry::new("data", "Readable", "resources/Readable"),
            MergeEntry::new("data", "Subtitle", "resources/Subtitle"),
        ];
        let mut seen = Vec::new();

        let err = merge_entries(&roots, &dest, &entries, |e| seen.push(e.destination.clone()))
            .unwrap_err();

        assert_eq!(err.kind(), GrassupErrorKind::Merge);
        assert!(err.to_string().contains("Readable"));
        assert_eq!(seen, vec![dest.join("resources/TextMap")]);
        assert!(!dest.join("resources/Subtitle").exists());
    }

    #[test]
    fn unstaged_source_is_a_merge_error() {
        let (_tmp, roots, dest) = fixture();
        let entries = vec![MergeEntry::new("protos", "proto", "proto")];
        let err = merge_entries(&roots, &dest, &entries, |_| {}).unwrap_err();
        assert_eq!(err.kind(), GrassupErrorKind::Merge);
    }

    #[test]
    fn rename_copies_once_under_canonical_name() {
        let tmp = tempfile::tempdir().unwrap();
        let staged = tmp.path().join("grasscutter-latest.jar");
        write(&staged, "v1");
        let dest = tmp.path().join("Grasscutter");

        assert!(apply_rename(&staged, &dest, Path::new("grasscutter.jar")).unwrap());
        write(&staged, "v2");
        assert!(!apply_rename(&staged, &dest, Path::new("grasscutter.jar")).unwrap());
        assert_eq!(fs::read_to_string(dest.join("grasscutter.jar")).unwrap(), "v1");
    }
}
