//! Crash-safe CSV persistence.
//!
//! Append mode adds rows after every unit of work and fsyncs before returning,
//! so an interrupted run loses at most the query in flight. Snapshot mode
//! rewrites the whole file through a temp sibling and a rename, so a reader
//! never sees a half-written file.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::records::Record;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl WriterError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        WriterError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        WriterError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// How the writer persists each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Add the batch to the end of the file.
    Append,
    /// Rewrite the file with every record seen so far.
    Snapshot,
}

fn ensure_parent(path: &Path) -> Result<(), WriterError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|e| WriterError::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn serialize_rows<W: Write, R: Record>(
    path: &Path,
    out: W,
    records: &[R],
    with_header: bool,
) -> Result<W, WriterError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    if with_header {
        if let Some(first) = records.first() {
            writer
                .write_record(first.headers())
                .map_err(|e| WriterError::csv(path, e))?;
        }
    }
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| WriterError::csv(path, e))?;
    }

    writer
        .into_inner()
        .map_err(|e| WriterError::io(path, e.into_error()))
}

/// Append rows to `path`, writing the header first when the file is new.
///
/// An existing file that does not end with a newline gets one before the new
/// rows. Data is fsynced before this returns.
pub fn append_rows<R: Record>(path: &Path, records: &[R]) -> Result<usize, WriterError> {
    if records.is_empty() {
        return Ok(0);
    }
    ensure_parent(path)?;

    let existing_len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(WriterError::io(path, e)),
    };
    let is_new = existing_len == 0;

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)
        .map_err(|e| WriterError::io(path, e))?;

    if !is_new && !ends_with_newline(&mut file).map_err(|e| WriterError::io(path, e))? {
        file.write_all(b"\n").map_err(|e| WriterError::io(path, e))?;
    }

    let mut file = serialize_rows(path, file, records, is_new)?;
    file.flush().map_err(|e| WriterError::io(path, e))?;
    file.sync_all().map_err(|e| WriterError::io(path, e))?;

    debug!(path = %path.display(), rows = records.len(), header = is_new, "Rows appended");
    Ok(records.len())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}

/// Replace `path` with a header and `records`.
///
/// The data goes to a temp sibling first, is fsynced, then renamed over the
/// destination.
pub fn write_all<R: Record>(path: &Path, records: &[R]) -> Result<(), WriterError> {
    ensure_parent(path)?;
    let tmp = temp_sibling(path);

    let file = File::create(&tmp).map_err(|e| WriterError::io(&tmp, e))?;
    let mut file = serialize_rows(&tmp, file, records, true)?;
    file.flush().map_err(|e| WriterError::io(&tmp, e))?;
    file.sync_all().map_err(|e| WriterError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| WriterError::io(path, e))?;

    debug!(path = %path.display(), rows = records.len(), "Snapshot written");
    Ok(())
}

/// Owns one output file for the length of a run.
pub struct IncrementalWriter<R: Record> {
    path: PathBuf,
    mode: WriteMode,
    /// Everything committed so far; only kept in snapshot mode.
    snapshot: Vec<R>,
    rows_written: usize,
}

impl<R: Record> IncrementalWriter<R> {
    pub fn new(path: impl Into<PathBuf>, mode: WriteMode) -> Self {
        Self {
            path: path.into(),
            mode,
            snapshot: Vec::new(),
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Rows committed through this writer.
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Persist one record.
    pub fn append(&mut self, record: R) -> Result<(), WriterError> {
        self.commit(vec![record])
    }

    /// Persist one query's batch in a single write.
    pub fn commit(&mut self, batch: Vec<R>) -> Result<(), WriterError> {
        let count = batch.len();
        match self.mode {
            WriteMode::Append => {
                append_rows(&self.path, &batch)?;
            }
            WriteMode::Snapshot => {
                self.snapshot.extend(batch);
                write_all(&self.path, &self.snapshot)?;
            }
        }
        self.rows_written += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize)]
    struct Row {
        id: u32,
        note: String,
    }

    impl Record for Row {
        fn headers(&self) -> &'static [&'static str] {
            &["id", "note"]
        }
    }

    fn row(id: u32, note: &str) -> Row {
        Row {
            id,
            note: note.to_string(),
        }
    }

    #[test]
    fn test_three_appends_write_one_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut writer = IncrementalWriter::new(&path, WriteMode::Append);

        writer.append(row(1, "a")).unwrap();
        writer.append(row(2, "b")).unwrap();
        writer.append(row(3, "c")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,note\n1,a\n2,b\n3,c\n");
        assert_eq!(writer.rows_written(), 3);
    }

    #[test]
    fn test_second_writer_does_not_repeat_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        IncrementalWriter::new(&path, WriteMode::Append)
            .append(row(1, "first run"))
            .unwrap();
        IncrementalWriter::new(&path, WriteMode::Append)
            .append(row(2, "second run"))
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("id,note").count(), 1);
        assert_eq!(content, "id,note\n1,first run\n2,second run\n");
    }

    #[test]
    fn test_append_inserts_missing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "id,note\n1,a").unwrap();

        append_rows(&path, &[row(2, "b")]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "id,note\n1,a\n2,b\n");
    }

    #[test]
    fn test_batch_is_written_together() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        let mut writer = IncrementalWriter::new(&path, WriteMode::Append);

        writer.commit(vec![row(1, "a"), row(2, "b")]).unwrap();
        writer.commit(Vec::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "id,note\n1,a\n2,b\n");
    }

    #[test]
    fn test_fields_are_quoted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        append_rows(&path, &[row(1, "Ben, Jerry \"and\" co")]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "id,note\n1,\"Ben, Jerry \"\"and\"\" co\"\n");
    }

    #[test]
    fn test_creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("nested").join("out.csv");
        append_rows(&path, &[row(1, "a")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_snapshot_rewrites_full_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snap.csv");
        fs::write(&path, "stale content\n").unwrap();

        let mut writer = IncrementalWriter::new(&path, WriteMode::Snapshot);
        writer.append(row(1, "a")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,note\n1,a\n");

        writer.append(row(2, "b")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "id,note\n1,a\n2,b\n");

        // No temp file is left behind.
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_io_error_is_reported() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the output file.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();

        let err = append_rows(&path, &[row(1, "a")]).unwrap_err();
        assert!(matches!(err, WriterError::Io { .. }));
    }
}
