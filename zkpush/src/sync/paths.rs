use std::fs;
use std::path::{Component, Path, PathBuf};

use super::error::SyncError;

/// A regular file found under an upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Always `/`-separated.
    pub relative_path: String,
    pub source: PathBuf,
}

/// One file to write, and the node it lands on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub remote_path: String,
    pub source: PathBuf,
}

impl UploadItem {
    pub fn read_content(&self) -> Result<Vec<u8>, SyncError> {
        fs::read(&self.source).map_err(|err| SyncError::io(&self.source, err))
    }
}

/// Maps a local file or directory onto the nodes it should be uploaded to.
///
/// A single file goes to `target + file_name` when `target` ends with `/`,
/// otherwise to `target` itself. A directory contributes every regular file
/// below it, keyed by its relative path.
pub fn enumerate(local: &Path, target: &str) -> Result<Vec<UploadItem>, SyncError> {
    let metadata = fs::metadata(local).map_err(|_| SyncError::NotFound(local.to_path_buf()))?;

    if metadata.is_file() {
        let remote_path = if target.ends_with('/') {
            let name = local
                .file_name()
                .ok_or_else(|| SyncError::NotFound(local.to_path_buf()))?;
            let name = name
                .to_str()
                .ok_or_else(|| SyncError::NonUtf8Path(local.to_path_buf()))?;
            format!("{target}{name}")
        } else {
            target.to_string()
        };
        return Ok(vec![UploadItem {
            remote_path,
            source: local.to_path_buf(),
        }]);
    }

    if metadata.is_dir() {
        return Ok(walk_files(local)?
            .into_iter()
            .map(|entry| UploadItem {
                remote_path: join_remote(target, &entry.relative_path),
                source: entry.source,
            })
            .collect());
    }

    Err(SyncError::NotFound(local.to_path_buf()))
}

/// Regular files below `root`, sorted by name at each level.
///
/// Symlinks to files count as files; symlinked directories are not
/// followed; dangling links and special files are skipped.
pub fn walk_files(root: &Path) -> Result<Vec<LocalEntry>, SyncError> {
    let mut out = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut children = fs::read_dir(&dir)
            .map_err(|err| SyncError::io(&dir, err))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SyncError::io(&dir, err))?;
        children.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for child in children {
            let path = child.path();
            let file_type = child.file_type().map_err(|err| SyncError::io(&path, err))?;
            if file_type.is_dir() {
                subdirs.push(path);
            } else if fs::metadata(&path).is_ok_and(|meta| meta.is_file()) {
                out.push(LocalEntry {
                    relative_path: relative_remote_path(root, &path)?,
                    source: path,
                });
            }
        }
        // Reversed so the stack pops them in name order.
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(out)
}

/// `file` relative to `root`, joined with `/` whatever the host separator.
pub fn relative_remote_path(root: &Path, file: &Path) -> Result<String, SyncError> {
    let relative = file
        .strip_prefix(root)
        .map_err(|_| SyncError::NotFound(file.to_path_buf()))?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| SyncError::NonUtf8Path(file.to_path_buf()))?,
            ),
            Component::CurDir => continue,
            Component::RootDir | Component::ParentDir | Component::Prefix(_) => {
                return Err(SyncError::NotFound(file.to_path_buf()));
            }
        }
    }
    Ok(parts.join("/"))
}

/// Joins with exactly one `/` between `target` and `relative`.
pub fn join_remote(target: &str, relative: &str) -> String {
    if target.ends_with('/') {
        format!("{target}{relative}")
    } else {
        format!("{target}/{relative}")
    }
}
