//! Moving finished artifacts to their destination.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Errors placing an artifact.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("artifact path has no file name: {}", .0.display())]
    NoFileName(PathBuf),

    #[error("failed to create destination directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Decides where a finished artifact lives and moves it there.
pub trait Placement: Send + Sync {
    /// Move `artifact` to its final location and return that location.
    fn place(&self, artifact: &Path) -> Result<PathBuf, PlacementError>;
}

/// Places artifacts in one directory, never overwriting.
///
/// On a name collision `name.ext` becomes `name_1.ext`, then `name_2.ext`,
/// and so on.
#[derive(Debug, Clone)]
pub struct DirectoryPlacement {
    dir: PathBuf,
}

impl DirectoryPlacement {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free path in the directory for `file_name`.
    pub fn free_path(&self, file_name: &Path) -> PathBuf {
        let candidate = self.dir.join(file_name);
        if !candidate.exists() {
            return candidate;
        }

        let stem = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = file_name
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        (1u64..)
            .map(|n| self.dir.join(format!("{}_{}{}", stem, n, ext)))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

impl Placement for DirectoryPlacement {
    fn place(&self, artifact: &Path) -> Result<PathBuf, PlacementError> {
        let file_name = artifact
            .file_name()
            .ok_or_else(|| PlacementError::NoFileName(artifact.to_path_buf()))?;

        fs::create_dir_all(&self.dir).map_err(|e| PlacementError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })?;

        let destination = self.free_path(Path::new(file_name));
        move_file(artifact, &destination).map_err(|e| PlacementError::Move {
            from: artifact.to_path_buf(),
            to: destination.clone(),
            source: e,
        })?;

        info!(path = %destination.display(), "artifact placed");
        Ok(destination)
    }
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_error) => {
            debug!(error = %rename_error, "rename failed, copying instead");
            if let Err(copy_error) = fs::copy(from, to) {
                fs::remove_file(to).ok();
                return Err(copy_error);
            }
            fs::remove_file(from)
        }
    }
}
