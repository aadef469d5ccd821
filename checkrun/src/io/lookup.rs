//! Resolve command-line targets into a file list.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Directory names never descended into.
pub const IGNORED_DIRS: [&str; 4] = ["node_modules", ".git", ".svn", "target"];

/// Files reachable from `path`.
///
/// An existing file is returned as is; a directory yields the files under it
/// that match `extensions` (any when empty), recursing unless `recursive` is
/// false. Anything else is treated as a glob pattern.
pub fn lookup(path: &Path, extensions: &[String], recursive: bool) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return expand_glob(path);
    }
    let meta = fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    walk(path, extensions, recursive, &mut files)?;
    Ok(files)
}

/// Resolve every input against `cwd` and collect absolute, de-duplicated paths
/// in a stable order.
pub fn resolve_targets(
    cwd: &Path,
    inputs: &[PathBuf],
    extensions: &[String],
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    let mut seen = BTreeSet::new();
    for input in inputs {
        let joined = if input.is_absolute() {
            input.clone()
        } else {
            cwd.join(input)
        };
        for file in lookup(&joined, extensions, recursive)? {
            let absolute = fs::canonicalize(&file).unwrap_or(file);
            seen.insert(absolute);
        }
    }
    debug!(count = seen.len(), "resolved targets");
    Ok(seen.into_iter().collect())
}

fn walk(dir: &Path, extensions: &[String], recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("read dir {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect::<Vec<_>>();
    entries.sort();

    for path in entries {
        let Ok(meta) = fs::metadata(&path) else {
            continue;
        };
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if meta.is_dir() {
            if recursive && !IGNORED_DIRS.contains(&name.as_str()) {
                walk(&path, extensions, recursive, out)?;
            }
            continue;
        }
        if !meta.is_file() || name.starts_with('.') || !has_extension(&path, extensions) {
            continue;
        }
        out.push(path);
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| want.trim_start_matches('.') == ext))
}

fn expand_glob(pattern: &Path) -> Result<Vec<PathBuf>> {
    let text = pattern.to_string_lossy();
    let mut files = Vec::new();
    // An invalid pattern resolves nothing, same as one without matches.
    if let Ok(paths) = glob::glob(&text) {
        files.extend(paths.filter_map(|entry| entry.ok()).filter(|path| path.is_file()));
    }
    if files.is_empty() {
        bail!("cannot resolve path (or pattern) '{text}'");
    }
    files.sort();
    Ok(files)
}
