//! Collision-safe persistence of matched archives.
//!
//! An [`ArtifactStore`] writes each archive body under a name derived from
//! its source URL and appends `<source-url> : <filename>` to an index log in
//! the same directory. Existing files are never overwritten, and the index
//! only records saves that fully succeeded.
//!
//! The store is shared by every save worker. File creation uses create-new
//! semantics, so two workers racing for the same name cannot both win, and
//! index appends are serialized behind a mutex.

mod error;
mod filename;

pub use error::SaveError;
pub use filename::{MAX_FILENAME_BYTES, derive_filename};

use filename::hex_digest;

use std::io::ErrorKind;
use std::path::PathBuf;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Name of the append-only index log inside the output directory.
pub const INDEX_FILE_NAME: &str = "index.log";

/// A successfully saved archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    /// URL the archive was downloaded from.
    pub source_url: String,
    /// Filename inside the output directory.
    pub filename: String,
    /// Full path of the saved file.
    pub path: PathBuf,
    /// Number of bytes written.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the body.
    pub sha256: String,
}

/// Output directory plus its index log.
#[derive(Debug)]
pub struct ArtifactStore {
    output_dir: PathBuf,
    index: Mutex<Option<File>>,
}

impl ArtifactStore {
    /// Creates a store rooted at `output_dir`. Nothing is touched on disk
    /// until the first save.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            index: Mutex::new(None),
        }
    }

    /// Path of the index log.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE_NAME)
    }

    /// Saves `body` as the archive downloaded from `source_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SaveError::Conflict`] if the derived file already exists,
    /// or [`SaveError::Io`] if the directory, file, or index cannot be
    /// written. A partially written file is removed.
    #[instrument(skip(self, body), fields(url = %source_url, bytes = body.len()))]
    pub async fn save(&self, source_url: &str, body: &[u8]) -> Result<SavedArtifact, SaveError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| SaveError::io(self.output_dir.clone(), e))?;

        let filename = derive_filename(source_url);
        let path = self.output_dir.join(&filename);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    SaveError::conflict(path.clone())
                } else {
                    SaveError::io(path.clone(), e)
                }
            })?;

        if let Err(e) = write_all_and_flush(&mut file, body).await {
            drop(file);
            debug!(path = %path.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(&path).await;
            return Err(SaveError::io(path, e));
        }
        drop(file);

        self.append_index(source_url, &filename).await?;

        let artifact = SavedArtifact {
            source_url: source_url.to_string(),
            filename,
            path,
            bytes: body.len() as u64,
            sha256: hex_digest(body),
        };
        info!(
            path = %artifact.path.display(),
            sha256 = %artifact.sha256,
            "saved archive"
        );
        Ok(artifact)
    }

    async fn append_index(&self, source_url: &str, filename: &str) -> Result<(), SaveError> {
        let index_path = self.index_path();
        let mut guard = self.index.lock().await;

        if guard.is_none() {
            let handle = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&index_path)
                .await
                .map_err(|e| SaveError::io(index_path.clone(), e))?;
            *guard = Some(handle);
        }

        if let Some(index) = guard.as_mut() {
            let line = format!("{source_url} : {filename}\n");
            write_all_and_flush(index, line.as_bytes())
                .await
                .map_err(|e| SaveError::io(index_path, e))?;
        }
        Ok(())
    }
}

async fn write_all_and_flush(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}
