//! The two append-only run logs.
//!
//! The action log gets one `"<Action>: <note>"` line per note. The novel
//! label log gets one `"<note>: <label>, <label>"` line per note that
//! introduced labels missing from the vocabulary.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::AuditAction;

/// File name of the action log inside the log directory.
pub const ACTION_LOG_FILE: &str = "process_log.txt";
/// File name of the novel label log inside the log directory.
pub const NOVEL_LABELS_LOG_FILE: &str = "new_tags_log.txt";

type Sink = Mutex<Box<dyn Write + Send>>;

/// Append-only audit destinations for a run.
///
/// Each line is written while holding that destination's lock, so lines from
/// concurrent callers never interleave.
pub struct AuditLog {
    actions: Sink,
    novel_labels: Sink,
}

impl AuditLog {
    /// Creates (or truncates) both log files in `dir`.
    ///
    /// The directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory or either file cannot be created.
    pub fn create(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let actions = File::create(dir.join(ACTION_LOG_FILE))?;
        let novel_labels = File::create(dir.join(NOVEL_LABELS_LOG_FILE))?;
        Ok(Self::from_writers(actions, novel_labels))
    }

    /// Wraps arbitrary writers, e.g. in-memory buffers.
    pub fn from_writers(
        actions: impl Write + Send + 'static,
        novel_labels: impl Write + Send + 'static,
    ) -> Self {
        Self {
            actions: Mutex::new(Box::new(actions)),
            novel_labels: Mutex::new(Box::new(novel_labels)),
        }
    }

    /// Appends `"<action>: <document>"` to the action log.
    pub fn record_action(&self, action: AuditAction, document: &str) -> io::Result<()> {
        append(&self.actions, &format!("{action}: {document}"))
    }

    /// Appends `"<document>: <labels>"` to the novel label log.
    ///
    /// Nothing is written for an empty set.
    pub fn record_novel_labels(&self, document: &str, labels: &BTreeSet<String>) -> io::Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        let joined = labels.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        append(&self.novel_labels, &format!("{document}: {joined}"))
    }
}

fn append(sink: &Sink, line: &str) -> io::Result<()> {
    let mut writer = sink
        .lock()
        .map_err(|_| io::Error::other("audit log lock poisoned"))?;
    writeln!(writer, "{line}")?;
    writer.flush()
}

/// Paths of the two log files for a log directory.
pub fn log_paths(dir: &Path) -> (PathBuf, PathBuf) {
    (dir.join(ACTION_LOG_FILE), dir.join(NOVEL_LABELS_LOG_FILE))
}
