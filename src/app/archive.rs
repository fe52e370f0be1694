//! Streaming ZIP archive sink
//!
//! Entries are written to `<name>.zip.part` as they arrive and the file is
//! renamed to `<name>.zip` only when the archive is finalized. An archive that
//! is aborted or dropped unfinished leaves nothing behind at either path.
//!
//! The zip codec is blocking, so every write runs on the blocking thread pool.
//! `append` takes `&mut self`, so appends are serialized by construction.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::constants::archive;
use crate::errors::{ArchiveError, ArchiveResult};

type ZipSink = ZipWriter<BufWriter<File>>;

/// Build the archive path from an optional directory and a base name
pub fn archive_path(output_dir: Option<&Path>, output_name: &str) -> PathBuf {
    let file_name = format!("{}.{}", output_name, archive::ARCHIVE_EXTENSION);
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn partial_path(final_path: &Path) -> PathBuf {
    let mut name = OsString::from(final_path.as_os_str());
    name.push(archive::PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn entry_options(len: usize) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(archive::COMPRESSION_LEVEL))
        .large_file(len as u64 >= u32::MAX as u64)
}

fn task_failed(error: tokio::task::JoinError) -> ArchiveError {
    ArchiveError::Io(std::io::Error::new(std::io::ErrorKind::Other, error))
}

/// ZIP writer bound to one output path
pub struct ArchiveWriter {
    final_path: PathBuf,
    partial_path: PathBuf,
    writer: Option<ZipSink>,
    entries: usize,
    bytes_written: u64,
    finalized: bool,
}

impl ArchiveWriter {
    /// Open a new archive that will be published at `final_path`
    ///
    /// Any archive already at `final_path` is removed once the partial file
    /// is held, so a batch that later fails leaves nothing at the output path.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::InUse` if another writer holds the partial file,
    /// or `ArchiveError::Create` if it cannot be created
    pub async fn create(final_path: impl Into<PathBuf>) -> ArchiveResult<Self> {
        Self::open(final_path.into(), false).await
    }

    /// Like [`create`](Self::create), but first removes a partial file left
    /// behind by an interrupted run
    pub async fn create_replacing_partial(final_path: impl Into<PathBuf>) -> ArchiveResult<Self> {
        Self::open(final_path.into(), true).await
    }

    async fn open(final_path: PathBuf, replace_partial: bool) -> ArchiveResult<Self> {
        let partial_path = partial_path(&final_path);

        if replace_partial {
            match tokio::fs::remove_file(&partial_path).await {
                Ok(()) => warn!("Removed leftover partial archive {}", partial_path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ArchiveError::Create {
                        path: partial_path,
                        source,
                    })
                }
            }
        }

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&partial_path)
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::AlreadyExists => ArchiveError::InUse {
                    path: partial_path.clone(),
                },
                _ => ArchiveError::Create {
                    path: partial_path.clone(),
                    source,
                },
            })?;
        let file = file.into_std().await;

        // The output path holds either this run's archive or nothing
        if let Err(source) = tokio::fs::remove_file(&final_path).await {
            if source.kind() != std::io::ErrorKind::NotFound {
                drop(file);
                let _ = tokio::fs::remove_file(&partial_path).await;
                return Err(ArchiveError::Create {
                    path: final_path,
                    source,
                });
            }
        } else {
            info!("Removed previous archive {}", final_path.display());
        }

        debug!("Opened archive {}", partial_path.display());
        Ok(Self {
            final_path,
            partial_path,
            writer: Some(ZipWriter::new(BufWriter::new(file))),
            entries: 0,
            bytes_written: 0,
            finalized: false,
        })
    }

    /// Append one named entry
    pub async fn append(&mut self, name: &str, data: Vec<u8>) -> ArchiveResult<()> {
        let entry = name.to_string();
        let len = data.len();

        self.with_writer(move |writer| {
            writer
                .start_file(entry.as_str(), entry_options(len))
                .map_err(|source| ArchiveError::Write {
                    entry: entry.clone(),
                    source,
                })?;
            writer
                .write_all(&data)
                .map_err(|e| ArchiveError::Write {
                    entry,
                    source: ZipError::Io(e),
                })
        })
        .await?;

        self.entries += 1;
        self.bytes_written += len as u64;
        debug!("Appended entry {} ({} bytes)", name, len);
        Ok(())
    }

    /// Write the central directory, flush, and publish the archive
    pub async fn finalize(mut self) -> ArchiveResult<PathBuf> {
        let writer = self.writer.take().ok_or(ArchiveError::Closed)?;
        let partial_path = self.partial_path.clone();

        tokio::task::spawn_blocking(move || -> ArchiveResult<()> {
            let buffered = writer.finish().map_err(|source| ArchiveError::Finalize {
                path: partial_path,
                source,
            })?;
            let file = buffered.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
            Ok(())
        })
        .await
        .map_err(task_failed)??;

        tokio::fs::rename(&self.partial_path, &self.final_path).await?;
        self.finalized = true;

        info!(
            "Finalized archive {} ({} entries, {} bytes)",
            self.final_path.display(),
            self.entries,
            self.bytes_written
        );
        Ok(self.final_path.clone())
    }

    /// Discard the archive and remove the partial file
    pub async fn abort(mut self) {
        self.writer.take();
        if let Err(e) = tokio::fs::remove_file(&self.partial_path).await {
            warn!(
                "Failed to remove partial archive {}: {}",
                self.partial_path.display(),
                e
            );
        }
        // Nothing left for Drop to clean up
        self.finalized = true;
        debug!("Aborted archive {}", self.final_path.display());
    }

    /// Path the archive is published at
    pub fn path(&self) -> &Path {
        &self.final_path
    }

    /// Path written to until finalize
    pub fn partial_path(&self) -> &Path {
        &self.partial_path
    }

    /// Entries appended so far
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Uncompressed bytes appended so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    async fn with_writer<T, F>(&mut self, op: F) -> ArchiveResult<T>
    where
        F: FnOnce(&mut ZipSink) -> ArchiveResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut writer = self.writer.take().ok_or(ArchiveError::Closed)?;
        let (writer, result) = tokio::task::spawn_blocking(move || {
            let result = op(&mut writer);
            (writer, result)
        })
        .await
        .map_err(task_failed)?;

        self.writer = Some(writer);
        result
    }
}

impl std::fmt::Debug for ArchiveWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveWriter")
            .field("final_path", &self.final_path)
            .field("open", &self.writer.is_some())
            .field("entries", &self.entries)
            .field("bytes_written", &self.bytes_written)
            .field("finalized", &self.finalized)
            .finish()
    }
}

impl Drop for ArchiveWriter {
    fn drop(&mut self) {
        if !self.finalized {
            self.writer.take();
            let _ = std::fs::remove_file(&self.partial_path);
        }
    }
}
