//! Sample log persistence
//!
//! The engine hands a stream's pending samples to a [`LogSink`] at flush
//! points and clears them once the sink accepts. [`CsvLogSink`] is the
//! filesystem implementation.
//!
//! ## File Format
//!
//! One file per stream per session, named `<stream>_YYYYMMDD_HHMMSS.csv`,
//! with header `run,latency_ms`. Later flushes append and continue the run
//! numbering.

use super::store::StatsStore;
use super::stream::Stream;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Nothing to persist for stream {0}")]
    EmptyStream(Stream),
}

/// Destination for flushed samples
pub trait LogSink {
    /// Persist samples for a stream, in recording order
    fn persist(&mut self, stream: Stream, samples: &[f64]) -> Result<(), PersistError>;

    /// Start new files for the next session
    fn new_session(&mut self);
}

/// Hand a stream's pending samples to the sink, clearing them on success
///
/// # Returns
/// Number of samples persisted; 0 when nothing was pending
pub fn flush_stream(
    stats: &mut StatsStore,
    stream: Stream,
    sink: &mut dyn LogSink,
) -> Result<usize, PersistError> {
    let pending = stats.log(stream).len();
    if pending == 0 {
        return Ok(0);
    }
    sink.persist(stream, stats.log(stream).samples())?;
    stats.clear_log(stream);
    Ok(pending)
}

/// Per-stream file state within a session
#[derive(Debug)]
struct StreamFile {
    path: PathBuf,
    rows: u64,
}

/// CSV files under a directory
#[derive(Debug)]
pub struct CsvLogSink {
    dir: PathBuf,
    session_start: DateTime<Utc>,
    files: HashMap<Stream, StreamFile>,
}

impl CsvLogSink {
    /// Create a sink writing to `dir`, created on first flush
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            session_start: Utc::now(),
            files: HashMap::new(),
        }
    }

    /// Path of the current session file for a stream, if written yet
    pub fn file_path(&self, stream: Stream) -> Option<&Path> {
        self.files.get(&stream).map(|f| f.path.as_path())
    }

    fn file_name(&self, stream: Stream) -> String {
        format!(
            "{}_{}.csv",
            stream.slug(),
            self.session_start.format("%Y%m%d_%H%M%S")
        )
    }
}

impl LogSink for CsvLogSink {
    fn persist(&mut self, stream: Stream, samples: &[f64]) -> Result<(), PersistError> {
        if samples.is_empty() {
            return Err(PersistError::EmptyStream(stream));
        }

        fs::create_dir_all(&self.dir).map_err(|source| PersistError::Io {
            path: self.dir.clone(),
            source,
        })?;

        if !self.files.contains_key(&stream) {
            let path = self.dir.join(self.file_name(stream));
            self.files.insert(stream, StreamFile { path, rows: 0 });
        }
        let Some(file) = self.files.get_mut(&stream) else {
            return Err(PersistError::EmptyStream(stream));
        };

        let io_err = |source| PersistError::Io {
            path: file.path.clone(),
            source,
        };

        let handle = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file.path)
            .map_err(io_err)?;
        let fresh = handle.metadata().map_err(io_err)?.len() == 0;
        let mut writer = BufWriter::new(handle);

        if fresh {
            writeln!(writer, "run,latency_ms").map_err(io_err)?;
        }
        let mut rows = file.rows;
        for sample in samples {
            rows += 1;
            writeln!(writer, "{},{:.3}", rows, sample).map_err(io_err)?;
        }
        writer.flush().map_err(io_err)?;
        file.rows = rows;

        tracing::debug!(
            stream = %stream,
            path = %file.path.display(),
            samples = samples.len(),
            total_rows = rows,
            "samples_persisted"
        );
        Ok(())
    }

    fn new_session(&mut self) {
        self.session_start = Utc::now();
        self.files.clear();
    }
}
