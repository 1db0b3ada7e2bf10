use std::{
    path::{Path, PathBuf},
    time::SystemTime,
};

use globset::GlobMatcher;

use crate::error::Result;

/// A note file found on disk.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Path relative to the notes root.
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    /// Seconds since the Unix epoch.
    pub modified_at: u64,
    /// Creation time where the filesystem records one, else `modified_at`.
    pub created_at: u64,
}

const SUPPORTED_EXTENSIONS: &[&str] = &["md", "txt"];

/// Recursively collect `.md` and `.txt` files under `root`.
///
/// Hidden entries are skipped. When `include` is given, only files whose
/// relative path matches it are kept. Output is sorted by relative path.
pub fn discover_files(
    root: &Path,
    include: Option<&GlobMatcher>,
) -> Result<Vec<DiscoveredFile>> {
    let canonical_root = root.canonicalize()?;
    let mut results = Vec::new();
    walk_dir(&canonical_root, &canonical_root, &mut results)?;
    if let Some(matcher) = include {
        results.retain(|f| matcher.is_match(&f.relative_path));
    }
    results.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(results)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    results: &mut Vec<DiscoveredFile>,
) -> Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            walk_dir(root, &path, results)?;
        } else if file_type.is_symlink() {
            // Broken links are skipped; links to directories are not
            // followed so cycles cannot form.
            let Ok(resolved) = path.canonicalize() else {
                continue;
            };
            if resolved.is_file() && is_supported(&resolved) {
                results.push(discovered(root, &path, &resolved)?);
            }
        } else if file_type.is_file() && is_supported(&path) {
            let resolved = path.canonicalize()?;
            results.push(discovered(root, &path, &resolved)?);
        }
    }
    Ok(())
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
}

fn discovered(
    root: &Path,
    original: &Path,
    resolved: &Path,
) -> Result<DiscoveredFile> {
    let metadata = std::fs::metadata(resolved)?;
    let modified_at = unix_seconds(metadata.modified().ok());
    let created_at = match metadata.created().ok() {
        Some(time) => unix_seconds(Some(time)),
        None => modified_at,
    };

    Ok(DiscoveredFile {
        relative_path: original
            .strip_prefix(root)
            .unwrap_or(original)
            .to_path_buf(),
        absolute_path: resolved.to_path_buf(),
        modified_at,
        created_at,
    })
}

fn unix_seconds(time: Option<SystemTime>) -> u64 {
    time.unwrap_or(SystemTime::UNIX_EPOCH)
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
