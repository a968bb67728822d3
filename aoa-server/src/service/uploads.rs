//! Upload Store
//!
//! The shared uploads directory: storing training data and models sent by
//! the browser, discarding rejected ones and purging stale files.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;

/// Never removed by a purge
const GITIGNORE: &str = ".gitignore";

/// Service error type
#[derive(Debug)]
pub enum UploadError {
    InvalidName(String),
    Io(io::Error),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadError::InvalidName(name) => write!(f, "Invalid upload name '{}'", name),
            UploadError::Io(err) => write!(f, "Upload store I/O error: {}", err),
        }
    }
}

impl From<io::Error> for UploadError {
    fn from(err: io::Error) -> Self {
        UploadError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Stores `bytes` under the base name of `file_name`
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = base_name(file_name)?;
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(name);
        fs::write(&path, bytes).await?;

        tracing::info!("Stored upload {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Removes one stored upload, if it is still there
    pub async fn discard(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!("Discarded upload {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every upload except `keep` and `.gitignore`
    ///
    /// `keep` is only compared against file names, so any name is accepted;
    /// an empty one keeps nothing. Returns the number of files removed.
    pub async fn purge(&self, keep: Option<&str>) -> Result<usize> {
        let keep = keep.map(last_segment).filter(|name| !name.is_empty());
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name == GITIGNORE || keep == Some(&*name) {
                continue;
            }
            if entry.file_type().await?.is_file() {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }

        tracing::info!(
            "Purged {} upload(s) from {} (kept: {:?})",
            removed,
            self.dir.display(),
            keep
        );
        Ok(removed)
    }

    /// Models are stored as-is, everything else goes through the validator
    pub fn skips_validation(path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("rds"))
    }
}

/// Last path segment of a client-supplied name, with either separator
fn last_segment(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or_default().trim()
}

/// Name an upload may be stored under
fn base_name(raw: &str) -> Result<&str> {
    let name = last_segment(raw);
    if name.is_empty() || name.starts_with('.') {
        return Err(UploadError::InvalidName(raw.to_string()));
    }
    Ok(name)
}
