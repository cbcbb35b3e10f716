//! Per-note and per-folder orchestration.
//!
//! For each note: read, decode the front matter, decide whether to skip,
//! generate metadata, apply the run's merge policy, detect novel labels,
//! write the note back and record the outcome in the audit log. A failure
//! in any step ends processing of that note only.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::audit::AuditLog;
use crate::classifier::{Classifier, GenerationError};
use crate::config::RunContext;
use crate::frontmatter::{self, FrontmatterError};
use crate::merge::{MergeOutcome, apply_policy};
use crate::models::{AuditAction, MergeMode};
use crate::storage::Storage;
use crate::vocabulary::find_novel;

/// Extension of the files a folder run picks up.
const NOTE_EXTENSION: &str = "md";

/// Whether a note is processed or left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Leave the note untouched and log it as skipped.
    Skip,
    /// Generate metadata and write the note back.
    Process,
}

/// Decides what to do with a note from the run's mode and whether the note
/// already has front matter.
///
/// Only header-less notes in an `Additive` run are skipped; `Merge` and
/// `Replace` runs give such notes a fresh header.
pub fn plan(mode: MergeMode, header_present: bool) -> Plan {
    match (mode, header_present) {
        (MergeMode::Additive, false) => Plan::Skip,
        _ => Plan::Process,
    }
}

/// Result of processing one note successfully.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// The note had no front matter and was not modified.
    Skipped,
    /// The note was rewritten.
    Written {
        action: AuditAction,
        novel_labels: BTreeSet<String>,
    },
}

/// Errors that end processing of a single note.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode front matter in {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("failed to generate metadata for {}: {source}", .path.display())]
    Generate {
        path: PathBuf,
        #[source]
        source: GenerationError,
    },

    #[error("failed to encode front matter for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A note (or directory entry) that could not be processed.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub path: PathBuf,
    pub message: String,
}

/// Counts for a folder run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub written: usize,
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    /// Number of notes that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} skipped, {} failed",
            self.written,
            self.skipped,
            self.failed()
        )
    }
}

/// Applies a run's policy to notes.
pub struct DocumentProcessor {
    context: RunContext,
    classifier: Arc<dyn Classifier>,
    storage: Arc<dyn Storage>,
    audit: Arc<AuditLog>,
}

impl DocumentProcessor {
    /// Creates a processor for one run.
    pub fn new(
        context: RunContext,
        classifier: Arc<dyn Classifier>,
        storage: Arc<dyn Storage>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            context,
            classifier,
            storage,
            audit,
        }
    }

    /// Returns the run context.
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Processes a single note.
    ///
    /// The audit lines for a rewritten note are appended only after the write
    /// succeeded, so the logs list exactly the notes that changed. A failed
    /// append is logged as a warning; the outcome still reports the write.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` if the note cannot be read, decoded, classified
    /// or written. The note is left unmodified in every error case.
    pub fn process_document(&self, path: &Path) -> Result<DocumentOutcome, ProcessError> {
        let name = document_name(path);

        let raw = self.storage.read(path).map_err(|source| ProcessError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc = frontmatter::decode(&raw).map_err(|source| ProcessError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

        if plan(self.context.mode, doc.has_header()) == Plan::Skip {
            warn!(document = %name, "no front matter, skipping");
            self.audit_action(AuditAction::SkippedNoHeader, &name);
            return Ok(DocumentOutcome::Skipped);
        }

        debug!(document = %name, test_mode = self.context.test_mode, "generating metadata");
        let generated = self
            .classifier
            .generate(
                &doc.body,
                &self.context.reference,
                &self.context.prompt_template,
                self.context.test_mode,
            )
            .map_err(|source| ProcessError::Generate {
                path: path.to_path_buf(),
                source,
            })?;

        let MergeOutcome { record, action } =
            apply_policy(doc.header.as_ref(), &generated, self.context.mode);
        let novel_labels = find_novel(&record.tags(), &self.context.vocabulary);

        let contents = frontmatter::encode(&record, &doc.body).map_err(|source| {
            ProcessError::Encode {
                path: path.to_path_buf(),
                source,
            }
        })?;
        self.storage
            .write(path, &contents)
            .map_err(|source| ProcessError::Persist {
                path: path.to_path_buf(),
                source,
            })?;

        self.audit_action(action, &name);
        if let Err(e) = self.audit.record_novel_labels(&name, &novel_labels) {
            warn!(document = %name, error = %e, "failed to append to the novel label log");
        }

        info!(document = %name, %action, novel = novel_labels.len(), "updated front matter");
        Ok(DocumentOutcome::Written {
            action,
            novel_labels,
        })
    }

    fn audit_action(&self, action: AuditAction, name: &str) {
        if let Err(e) = self.audit.record_action(action, name) {
            warn!(document = %name, error = %e, "failed to append to the action log");
        }
    }

    /// Processes every `.md` file under `root`, in file-name order.
    ///
    /// Failures are logged and collected in the summary; they never stop the
    /// run.
    pub fn process_folder(&self, root: &Path) -> RunSummary {
        let mut summary = RunSummary::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    error!(path = %path.display(), error = %e, "failed to read directory entry");
                    summary.failures.push(Failure {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_note(entry.path()) {
                continue;
            }

            match self.process_document(entry.path()) {
                Ok(DocumentOutcome::Skipped) => summary.skipped += 1,
                Ok(DocumentOutcome::Written { .. }) => summary.written += 1,
                Err(e) => {
                    error!(error = %e, "note failed");
                    summary.failures.push(Failure {
                        path: entry.path().to_path_buf(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(%summary, "folder processed");
        summary
    }
}

/// The identifier written to the audit logs: the note's file name.
fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_note(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == NOTE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, test_mode_record};
    use crate::models::{MetadataRecord, Value};
    use crate::vocabulary::Vocabulary;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStorage {
        files: Mutex<HashMap<PathBuf, String>>,
        fail_writes: bool,
    }

    impl MemoryStorage {
        fn with(path: &str, content: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .unwrap()
                .insert(PathBuf::from(path), content.to_string());
            storage
        }

        fn get(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(Path::new(path)).cloned()
        }
    }

    impl Storage for MemoryStorage {
        fn read(&self, path: &Path) -> io::Result<String> {
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
            if self.fail_writes {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), contents.to_string());
            Ok(())
        }
    }

    struct StubClassifier {
        reply: Result<MetadataRecord, ()>,
        calls: Mutex<Vec<(String, String, String, bool)>>,
    }

    impl StubClassifier {
        fn returning(record: MetadataRecord) -> Self {
            Self {
                reply: Ok(record),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Classifier for StubClassifier {
        fn generate(
            &self,
            body: &str,
            reference: &str,
            prompt_template: &str,
            test_mode: bool,
        ) -> Result<MetadataRecord, GenerationError> {
            self.calls.lock().unwrap().push((
                body.to_string(),
                reference.to_string(),
                prompt_template.to_string(),
                test_mode,
            ));
            self.reply
                .clone()
                .map_err(|()| GenerationError::Client(ClassifierError::Http { status: 503 }))
        }
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Harness {
        processor: DocumentProcessor,
        storage: Arc<MemoryStorage>,
        classifier: Arc<StubClassifier>,
        actions: SharedBuffer,
        novel: SharedBuffer,
    }

    fn harness(mode: MergeMode, storage: MemoryStorage, classifier: StubClassifier) -> Harness {
        let context = RunContext {
            mode,
            test_mode: true,
            reference: "reference content".to_string(),
            prompt_template: "prompt template".to_string(),
            vocabulary: ["AI", "Machine Learning"].into_iter().collect::<Vocabulary>(),
        };
        let storage = Arc::new(storage);
        let classifier = Arc::new(classifier);
        let actions = SharedBuffer::default();
        let novel = SharedBuffer::default();
        let audit = Arc::new(AuditLog::from_writers(actions.clone(), novel.clone()));

        Harness {
            processor: DocumentProcessor::new(context, classifier.clone(), storage.clone(), audit),
            storage,
            classifier,
            actions,
            novel,
        }
    }

    fn generated(tags: &[&str]) -> MetadataRecord {
        [("tags", tags.to_vec())].into_iter().collect()
    }

    const WITH_HEADER: &str = "---\ntags:\n- AI\n- Machine Learning\ncategory: Technology\ntopic: Neural Networks\n---\n\nBody text.";

    #[test]
    fn plan_table() {
        let cases = [
            (MergeMode::Additive, false, Plan::Skip),
            (MergeMode::Additive, true, Plan::Process),
            (MergeMode::Merge, false, Plan::Process),
            (MergeMode::Merge, true, Plan::Process),
            (MergeMode::Replace, false, Plan::Process),
            (MergeMode::Replace, true, Plan::Process),
        ];
        for (mode, header, expected) in cases {
            assert_eq!(plan(mode, header), expected, "{mode} with header={header}");
        }
    }

    #[test]
    fn no_header_without_mode_flags_is_skipped() {
        let h = harness(
            MergeMode::Additive,
            MemoryStorage::with("notes/plain.md", "Just a body."),
            StubClassifier::returning(generated(&["AI", "ML"])),
        );

        let outcome = h.processor.process_document(Path::new("notes/plain.md")).unwrap();

        assert_eq!(outcome, DocumentOutcome::Skipped);
        assert_eq!(h.storage.get("notes/plain.md").unwrap(), "Just a body.");
        assert!(h.classifier.calls.lock().unwrap().is_empty());
        assert_eq!(h.actions.text(), "Skipped (No Header): plain.md\n");
        assert_eq!(h.novel.text(), "");
    }

    #[test]
    fn no_header_in_merge_run_gets_generated_header() {
        let h = harness(
            MergeMode::Merge,
            MemoryStorage::with("plain.md", "Just a body."),
            StubClassifier::returning(generated(&["AI", "ML"])),
        );

        let outcome = h.processor.process_document(Path::new("plain.md")).unwrap();

        assert_eq!(
            outcome,
            DocumentOutcome::Written {
                action: AuditAction::Added,
                novel_labels: BTreeSet::from(["ML".to_string()]),
            }
        );
        assert_eq!(
            h.storage.get("plain.md").unwrap(),
            "---\ntags:\n- AI\n- ML\n---\n\nJust a body."
        );
        assert_eq!(h.actions.text(), "Added YAML: plain.md\n");
        assert_eq!(h.novel.text(), "plain.md: ML\n");
    }

    #[test]
    fn classifier_receives_body_reference_template_and_test_flag() {
        let h = harness(
            MergeMode::Additive,
            MemoryStorage::with("note.md", WITH_HEADER),
            StubClassifier::returning(generated(&["AI"])),
        );

        h.processor.process_document(Path::new("note.md")).unwrap();

        let calls = h.classifier.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(
                "Body text.".to_string(),
                "reference content".to_string(),
                "prompt template".to_string(),
                true
            )]
        );
    }

    #[test]
    fn header_in_additive_run_is_overwritten_and_logged_as_added() {
        let h = harness(
            MergeMode::Additive,
            MemoryStorage::with("note.md", WITH_HEADER),
            StubClassifier::returning(generated(&["AI", "ML"])),
        );

        h.processor.process_document(Path::new("note.md")).unwrap();

        let doc = frontmatter::decode(&h.storage.get("note.md").unwrap()).unwrap();
        assert_eq!(doc.header, Some(generated(&["AI", "ML"])));
        assert_eq!(h.actions.text(), "Added YAML: note.md\n");
    }

    #[test]
    fn merge_run_merges_with_existing_header() {
        let mut incoming = MetadataRecord::new();
        incoming.insert("tags", vec!["Deep Learning", "AI"]);
        incoming.insert("category", "Advanced Technology");
        incoming.insert("phase", "Training");

        let h = harness(
            MergeMode::Merge,
            MemoryStorage::with("note.md", WITH_HEADER),
            StubClassifier::returning(incoming),
        );

        let outcome = h.processor.process_document(Path::new("note.md")).unwrap();

        let doc = frontmatter::decode(&h.storage.get("note.md").unwrap()).unwrap();
        let header = doc.header.unwrap();
        assert_eq!(
            header.get("tags"),
            Some(&Value::from(vec!["AI", "Machine Learning", "Deep Learning"]))
        );
        assert_eq!(header.get("category"), Some(&Value::from("Advanced Technology")));
        assert_eq!(header.get("topic"), Some(&Value::from("Neural Networks")));
        assert_eq!(header.get("phase"), Some(&Value::from("Training")));
        assert_eq!(doc.body, "Body text.");

        assert_eq!(
            outcome,
            DocumentOutcome::Written {
                action: AuditAction::Merged,
                novel_labels: BTreeSet::from(["Deep Learning".to_string()]),
            }
        );
        assert_eq!(h.actions.text(), "Merged YAML: note.md\n");
        assert_eq!(h.novel.text(), "note.md: Deep Learning\n");
    }

    #[test]
    fn replace_run_discards_existing_header() {
        let h = harness(
            MergeMode::Replace,
            MemoryStorage::with("note.md", WITH_HEADER),
            StubClassifier::returning(test_mode_record()),
        );

        h.processor.process_document(Path::new("note.md")).unwrap();

        let doc = frontmatter::decode(&h.storage.get("note.md").unwrap()).unwrap();
        assert_eq!(doc.header, Some(test_mode_record()));
        assert_eq!(h.actions.text(), "Replaced YAML: note.md\n");
        assert_eq!(h.novel.text(), "note.md: Deep Learning\n");
    }

    #[test]
    fn known_labels_write_no_novel_line() {
        let h = harness(
            MergeMode::Replace,
            MemoryStorage::with("note.md", WITH_HEADER),
            StubClassifier::returning(generated(&["AI"])),
        );

        h.processor.process_document(Path::new("note.md")).unwrap();
        assert_eq!(h.novel.text(), "");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let h = harness(
            MergeMode::Merge,
            MemoryStorage::default(),
            StubClassifier::returning(generated(&["AI"])),
        );

        let result = h.processor.process_document(Path::new("missing.md"));
        assert!(matches!(result, Err(ProcessError::Read { .. })));
        assert_eq!(h.actions.text(), "");
    }

    #[test]
    fn malformed_header_is_a_decode_error_and_note_is_untouched() {
        let raw = "---\ntags: [AI\n---\nBody";
        let h = harness(
            MergeMode::Merge,
            MemoryStorage::with("bad.md", raw),
            StubClassifier::returning(generated(&["AI"])),
        );

        let result = h.processor.process_document(Path::new("bad.md"));

        assert!(matches!(result, Err(ProcessError::Decode { .. })));
        assert_eq!(h.storage.get("bad.md").unwrap(), raw);
        assert!(h.classifier.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn generation_failure_leaves_note_untouched() {
        let h = harness(
            MergeMode::Merge,
            MemoryStorage::with("note.md", WITH_HEADER),
            StubClassifier::failing(),
        );

        let result = h.processor.process_document(Path::new("note.md"));

        assert!(matches!(result, Err(ProcessError::Generate { .. })));
        assert_eq!(h.storage.get("note.md").unwrap(), WITH_HEADER);
        assert_eq!(h.actions.text(), "");
    }

    #[test]
    fn write_failure_is_reported_and_nothing_is_logged() {
        let mut storage = MemoryStorage::with("note.md", WITH_HEADER);
        storage.fail_writes = true;
        let h = harness(
            MergeMode::Merge,
            storage,
            StubClassifier::returning(generated(&["NLP"])),
        );

        let result = h.processor.process_document(Path::new("note.md"));

        assert!(matches!(result, Err(ProcessError::Persist { .. })));
        assert_eq!(h.storage.get("note.md").unwrap(), WITH_HEADER);
        assert_eq!(h.actions.text(), "");
        assert_eq!(h.novel.text(), "");
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("log volume full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn audit_failure_after_write_still_counts_as_written() {
        let mut h = harness(
            MergeMode::Merge,
            MemoryStorage::with("note.md", WITH_HEADER),
            StubClassifier::returning(generated(&["NLP"])),
        );
        h.processor.audit = Arc::new(AuditLog::from_writers(BrokenWriter, BrokenWriter));

        let outcome = h.processor.process_document(Path::new("note.md")).unwrap();

        assert!(matches!(
            outcome,
            DocumentOutcome::Written {
                action: AuditAction::Merged,
                ..
            }
        ));
        assert_ne!(h.storage.get("note.md").unwrap(), WITH_HEADER);
    }

    #[test]
    fn header_with_only_null_values_is_processed_in_additive_run() {
        let h = harness(
            MergeMode::Additive,
            MemoryStorage::with("note.md", "---\nreviewed: null\n---\nBody."),
            StubClassifier::returning(generated(&["AI"])),
        );

        let outcome = h.processor.process_document(Path::new("note.md")).unwrap();

        assert!(matches!(
            outcome,
            DocumentOutcome::Written {
                action: AuditAction::Added,
                ..
            }
        ));
        assert_eq!(h.actions.text(), "Added YAML: note.md\n");
    }

    #[test]
    fn summary_display() {
        let summary = RunSummary {
            written: 3,
            skipped: 1,
            failures: vec![Failure {
                path: PathBuf::from("bad.md"),
                message: "boom".to_string(),
            }],
        };
        assert_eq!(summary.to_string(), "3 written, 1 skipped, 1 failed");
    }

    #[test]
    fn only_markdown_files_are_notes() {
        assert!(is_note(Path::new("a/b/note.md")));
        assert!(!is_note(Path::new("a/b/note.txt")));
        assert!(!is_note(Path::new("a/b/md")));
        assert!(!is_note(Path::new("a/b/note.MD")));
    }
}
