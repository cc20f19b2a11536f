//! Scratch-file staging for uploaded videos.
//!
//! The upload API reads from a path, so the received bytes are written to a
//! named temporary file first. The file is removed when the [`StagedVideo`]
//! is dropped, whichever way the interaction ends.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use vchat_models::{UploadedVideo, VideoFormat};

use crate::error::{SessionError, SessionResult};

/// A video written to a scratch file for the duration of one interaction.
#[derive(Debug)]
pub struct StagedVideo {
    file: NamedTempFile,
    filename: String,
    format: VideoFormat,
    size: u64,
}

/// Writes an upload into a scratch file chunk by chunk.
///
/// Dropping the writer before [`StagingWriter::finish`] removes the partial file.
#[derive(Debug)]
pub struct StagingWriter {
    file: NamedTempFile,
    out: tokio::fs::File,
    filename: String,
    format: VideoFormat,
    size: u64,
}

impl StagingWriter {
    /// Resolve the format from `filename` and open a scratch file in `scratch_dir`.
    ///
    /// Unsupported formats are rejected before anything touches the disk.
    pub async fn create(scratch_dir: &Path, filename: impl Into<String>) -> SessionResult<Self> {
        let filename = filename.into();
        let format = VideoFormat::from_filename(&filename)?;

        let dir: PathBuf = scratch_dir.to_path_buf();
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
            std::fs::create_dir_all(&dir)?;
            tempfile::Builder::new()
                .prefix("vchat-")
                .suffix(&format!(".{}", format.extension()))
                .tempfile_in(&dir)
        })
        .await
        .map_err(|e| SessionError::Io(std::io::Error::other(e)))??;

        let out = tokio::fs::File::from_std(file.as_file().try_clone()?);
        Ok(Self {
            file,
            out,
            filename,
            format,
            size: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> SessionResult<()> {
        self.out.write_all(chunk).await?;
        self.size = self.size.saturating_add(chunk.len() as u64);
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Flush the scratch file. An upload with no bytes is rejected.
    pub async fn finish(mut self) -> SessionResult<StagedVideo> {
        if self.size == 0 {
            return Err(SessionError::EmptyUpload);
        }
        self.out.flush().await?;
        self.out.sync_all().await?;

        debug!("Staged {} bytes at {}", self.size, self.file.path().display());
        Ok(StagedVideo {
            file: self.file,
            filename: self.filename,
            format: self.format,
            size: self.size,
        })
    }
}

impl StagedVideo {
    /// Validate an in-memory upload and write it into `scratch_dir`.
    ///
    /// The format is resolved before anything touches the disk.
    pub async fn write(scratch_dir: &Path, video: UploadedVideo) -> SessionResult<Self> {
        video.format()?;
        if video.is_empty() {
            return Err(SessionError::EmptyUpload);
        }

        let mut writer = StagingWriter::create(scratch_dir, video.filename).await?;
        writer.write_chunk(&video.data).await?;
        writer.finish().await
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Declared filename of the upload
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn format(&self) -> VideoFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
