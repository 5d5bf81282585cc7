use jwalk::WalkDir;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SyncError};

/// A file found by a local walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Forward-slash separated path relative to the walked root.
    pub key: String,
    /// Path on disk as produced by the walker.
    pub path: PathBuf,
}

pub struct LocalFs;

impl LocalFs {
    /// Recursively walk `root` and return every regular file.
    ///
    /// Hidden files are included. Symlinks are not followed and, like other
    /// special files, are left out. Any walk error aborts the whole listing.
    pub fn walk_files(root: &Path) -> Result<Vec<LocalFile>> {
        let mut files = Vec::new();

        for entry_result in WalkDir::new(root).skip_hidden(false).sort(true) {
            let entry = entry_result.map_err(|err| {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                SyncError::io(path, std::io::Error::other(err))
            })?;

            let file_type = entry.file_type();
            if !file_type.is_file() {
                if !file_type.is_dir() {
                    debug!(path = %entry.path().display(), "skipping non-regular file");
                }
                continue;
            }

            let path = entry.path();
            files.push(LocalFile {
                key: relative_key(root, &path)?,
                path,
            });
        }

        Ok(files)
    }

    pub fn read_file(path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|err| SyncError::io(path, err))
    }

    /// Write `data` to `path`, creating missing parent directories first.
    pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::create_dir_all(parent)?;
        }
        fs::write(path, data).map_err(|err| SyncError::io(path, err))
    }

    /// Recursive and idempotent: an existing directory is not an error.
    pub fn create_dir_all(path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(path).map_err(|err| SyncError::io(path, err))
    }

    /// Map a forward-slash key onto `root`, rejecting keys that would escape it.
    pub fn path_for_key(root: &Path, key: &str) -> Result<PathBuf> {
        let mut path = root.to_path_buf();
        let mut pushed = false;

        for part in key.split('/').filter(|part| !part.is_empty()) {
            match Path::new(part).components().next() {
                Some(Component::Normal(_)) if Path::new(part).components().count() == 1 => {
                    path.push(part);
                    pushed = true;
                }
                Some(Component::CurDir) => {}
                _ => {
                    return Err(SyncError::UnsafeKey {
                        key: key.to_string(),
                    })
                }
            }
        }

        if !pushed {
            return Err(SyncError::UnsafeKey {
                key: key.to_string(),
            });
        }
        Ok(path)
    }
}

/// Key of `path` relative to `root`, forward-slash separated, no leading separator.
///
/// Walking `"."` over `./a/b.txt` and walking `"data"` over `data/a/b.txt`
/// both give `"a/b.txt"`.
///
/// Fails with `NonUtf8Path` when a component has no exact string form.
pub fn relative_key(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let parts = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_str().ok_or_else(|| SyncError::NonUtf8Path {
                path: path.to_path_buf(),
            })),
            _ => None,
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(parts.join("/"))
}
