use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use triad_core::{ExperimentError, TrialRecord};

/// Destination for completed trial records.
pub trait RecordSink {
    fn record(&mut self, record: &TrialRecord) -> Result<(), ExperimentError>;

    fn location(&self) -> Option<&Path> {
        None
    }
}

/// In-memory sink, handy when nothing should touch the disk.
impl RecordSink for Vec<TrialRecord> {
    fn record(&mut self, record: &TrialRecord) -> Result<(), ExperimentError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Append-only CSV file. Every [`RecordSink::record`] opens, writes one
/// complete line, syncs and closes, so an abort loses at most that call.
#[derive(Debug, Clone)]
pub struct ResponseLogger {
    path: PathBuf,
    header_pending: bool,
}

impl ResponseLogger {
    /// The header is written only if `path` does not exist yet. An existing
    /// file is resumed: new rows go after the old ones.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let header_pending = !path.exists();
        Self {
            path,
            header_pending,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode_line<'a>(fields: impl IntoIterator<Item = Cow<'a, str>>, out: &mut String) {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&escape(&field));
        }
        out.push('\n');
    }
}

impl RecordSink for ResponseLogger {
    fn record(&mut self, record: &TrialRecord) -> Result<(), ExperimentError> {
        let mut line = String::new();
        if self.header_pending {
            Self::encode_line(TrialRecord::COLUMNS.map(Cow::Borrowed), &mut line);
        }
        Self::encode_line(record.fields(), &mut line);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;

        self.header_pending = false;
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Quotes a field if it holds a delimiter, quote or line break.
fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
