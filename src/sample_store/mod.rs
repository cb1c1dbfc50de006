// Append-only CSV sample log. One writer (the capture loop), any number of readers.
//
// Each append is a single write of one complete line to an O_APPEND file followed by
// sync_data, so a reader never sees a partial record and a crash after append returns
// cannot lose the sample.

mod schema;

pub use schema::SCHEMA;

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::models::TelemetrySample;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sample log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sample log {path}: header {found:?} does not match schema")]
    SchemaMismatch { path: String, found: Vec<String> },
    #[error("sample log {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("sample store task join: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result of reading the whole log.
#[derive(Debug, Default)]
pub struct LoadedSamples {
    pub samples: Vec<TelemetrySample>,
    /// Rows that did not conform to the schema and were left out.
    pub skipped_rows: usize,
}

pub struct SampleStore {
    path: PathBuf,
}

impl SampleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log with its header row if it does not exist or is empty, and check the
    /// header of an existing log. A header torn by a crash mid-write (a strict prefix of the
    /// schema header and nothing else) is rewritten; any other mismatch is an error so the
    /// process refuses to append rows no reader could load. Rows are never truncated.
    #[instrument(skip(self), fields(repo = "samples", operation = "initialize_if_absent"))]
    pub async fn initialize_if_absent(&self) -> Result<(), StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| io_error(&path, e))?;
            }
            ensure_header(&path)
        })
        .await?
    }

    /// Durably append one sample. Returns only after the record reached stable storage.
    #[instrument(skip(self, sample), fields(repo = "samples", operation = "append"))]
    pub async fn append(&self, sample: &TelemetrySample) -> Result<(), StoreError> {
        let record = schema::encode_record(sample).map_err(|e| io_error(&self.path, e))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_with_header(&path, &record)).await?
    }

    /// All samples in append order. A missing or empty log is an empty sequence.
    #[instrument(skip(self), fields(repo = "samples", operation = "load_all"))]
    pub async fn load_all(&self) -> Result<Vec<TelemetrySample>, StoreError> {
        Ok(self.load_checked().await?.samples)
    }

    /// Like `load_all`, also reporting how many malformed rows were skipped.
    pub async fn load_checked(&self) -> Result<LoadedSamples, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_log(&path)).await?
    }

    /// The last `limit` samples, oldest first.
    pub async fn load_recent(&self, limit: usize) -> Result<Vec<TelemetrySample>, StoreError> {
        let mut samples = self.load_all().await?;
        let start = samples.len().saturating_sub(limit);
        Ok(samples.split_off(start))
    }

    pub async fn latest(&self) -> Result<Option<TelemetrySample>, StoreError> {
        Ok(self.load_all().await?.pop())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Appends `record`, prefixed by the header when the file is new or empty, in one write.
/// A torn last line (crash mid-write) is terminated first so it cannot swallow the record.
fn write_with_header(path: &Path, record: &[u8]) -> Result<(), StoreError> {
    let mut file = OpenOptions::new()
        .read(true)
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    let len = file.metadata().map_err(|e| io_error(path, e))?.len();

    let mut buf = Vec::with_capacity(record.len() + 160);
    if len == 0 {
        buf.extend_from_slice(schema::header_line().as_bytes());
    } else if !ends_with_newline(&mut file).map_err(|e| io_error(path, e))? {
        buf.push(b'\n');
    }
    buf.extend_from_slice(record);
    file.write_all(&buf).map_err(|e| io_error(path, e))?;
    file.sync_data().map_err(|e| io_error(path, e))?;
    if len == 0 {
        sync_parent_dir(path).map_err(|e| io_error(path, e))?;
    }
    Ok(())
}

fn ensure_header(path: &Path) -> Result<(), StoreError> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    let len = file.metadata().map_err(|e| io_error(path, e))?.len();
    let header = schema::header_line();

    if len > 0 {
        let mut first_line = String::new();
        BufReader::new(&mut file)
            .read_line(&mut first_line)
            .map_err(|e| io_error(path, e))?;
        if schema::header_line_matches(&first_line) {
            return Ok(());
        }
        let torn = len < header.len() as u64 && header.starts_with(first_line.as_str());
        if !torn {
            return Err(StoreError::SchemaMismatch {
                path: path.display().to_string(),
                found: first_line.trim_end().split(',').map(String::from).collect(),
            });
        }
        tracing::warn!(
            path = %path.display(),
            found = %first_line,
            "sample log header was torn; rewriting it"
        );
        file.set_len(0).map_err(|e| io_error(path, e))?;
        file.seek(SeekFrom::Start(0)).map_err(|e| io_error(path, e))?;
    }

    file.write_all(header.as_bytes()).map_err(|e| io_error(path, e))?;
    file.sync_data().map_err(|e| io_error(path, e))?;
    if len == 0 {
        sync_parent_dir(path).map_err(|e| io_error(path, e))?;
    }
    Ok(())
}

/// Makes a newly created log's directory entry durable.
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn read_log(path: &Path) -> Result<LoadedSamples, StoreError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadedSamples::default()),
        Err(e) => return Err(io_error(path, e)),
    };
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| StoreError::Csv {
            path: path.display().to_string(),
            source: e,
        })?
        .clone();
    if headers.is_empty() {
        return Ok(LoadedSamples::default());
    }
    if !schema::header_matches(&headers) {
        return Err(StoreError::SchemaMismatch {
            path: path.display().to_string(),
            found: headers.iter().map(String::from).collect(),
        });
    }

    let mut loaded = LoadedSamples::default();
    for row in reader.deserialize::<TelemetrySample>() {
        match row {
            Ok(sample) => loaded.samples.push(sample),
            Err(e) if e.is_io_error() => {
                return Err(StoreError::Csv {
                    path: path.display().to_string(),
                    source: e,
                });
            }
            Err(e) => {
                loaded.skipped_rows += 1;
                tracing::warn!(
                    error = %e,
                    line = e.position().map(|p| p.line()),
                    operation = "load_all",
                    "skipping malformed sample row"
                );
            }
        }
    }
    Ok(loaded)
}
