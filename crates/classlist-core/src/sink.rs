//! Append-only manifest file.
//!
//! The file is truncated once on open, gets the header, and from then on only
//! grows. Every record is flushed before `write_line` returns, because the
//! host process may die at any point after a type is recorded.
//!
//! A record that fails halfway is cut back off, so the manifest always ends on
//! a whole line. The sink is unusable after a failed write.

use crate::config::ManifestConfig;
use crate::error::{ClassListError, Result};
use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Byte destination for a manifest.
pub trait ManifestOutput: Write + Send {
    /// Discard everything after the first `len` bytes.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl ManifestOutput for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

pub struct ManifestSink {
    path: PathBuf,
    out: Option<Box<dyn ManifestOutput>>,
    /// Length of the header plus every complete record.
    committed: u64,
    records: u64,
}

impl ManifestSink {
    /// Create (or truncate) the manifest at `path` and write the header.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ClassListError::Io {
                    message: format!("Failed to create directory {}", parent.display()),
                    path: Some(parent.to_path_buf()),
                    source: Some(e),
                })?;
            }
        }

        let file = File::create(&path).map_err(|e| ClassListError::Io {
            message: format!("Failed to create class list {}", path.display()),
            path: Some(path.clone()),
            source: Some(e),
        })?;

        let sink = Self::from_writer(path, Box::new(file))?;
        info!("Dumping loaded classes to {}", sink.path.display());
        Ok(sink)
    }

    /// Wrap an already-open, empty output and write the header to it.
    ///
    /// `path` is only used in log and error messages.
    pub fn from_writer(path: impl Into<PathBuf>, out: Box<dyn ManifestOutput>) -> Result<Self> {
        let mut sink = Self {
            path: path.into(),
            out: Some(out),
            committed: 0,
            records: 0,
        };

        let mut header = ManifestConfig::HEADER.join("\n");
        header.push('\n');
        sink.append(&header)?;
        Ok(sink)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.out.is_some()
    }

    /// Records written since open, header excluded.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Bytes of header and complete records on the output.
    pub fn committed_len(&self) -> u64 {
        self.committed
    }

    /// Append one record and flush it.
    ///
    /// On failure the partial record is removed and the sink is released.
    pub fn write_line(&mut self, line: &str) -> Result<()> {
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        self.append(&record)?;
        self.records += 1;
        debug!("class list: {}", line);
        Ok(())
    }

    /// Flush and release the output. Safe to call more than once.
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut out) = self.out.take() {
            out.flush()
                .map_err(|e| ClassListError::io_with_path(e, &self.path))?;
            info!(
                "Closed class list {} ({} records)",
                self.path.display(),
                self.records
            );
        }
        Ok(())
    }

    fn append(&mut self, text: &str) -> Result<()> {
        let out = self.out.as_mut().ok_or(ClassListError::SinkClosed)?;
        let result = out.write_all(text.as_bytes()).and_then(|()| out.flush());

        match result {
            Ok(()) => {
                self.committed += text.len() as u64;
                Ok(())
            }
            Err(e) => {
                self.abandon();
                Err(ClassListError::io_with_path(e, &self.path))
            }
        }
    }

    /// Cut the output back to the last complete record and drop it.
    fn abandon(&mut self) {
        if let Some(mut out) = self.out.take() {
            if let Err(e) = out.truncate(self.committed) {
                debug!(
                    "Could not remove partial record from {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for ManifestSink {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for ManifestSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestSink")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .field("committed", &self.committed)
            .field("records", &self.records)
            .finish()
    }
}
