pub mod audit;
pub mod classifier;
pub mod config;
pub mod frontmatter;
pub mod merge;
pub mod models;
pub mod processor;
pub mod storage;
pub mod vocabulary;

pub use audit::AuditLog;
pub use config::{ConfigError, RunConfig, RunContext};
pub use merge::{MergeOutcome, apply_policy, merge_records};
pub use models::{AuditAction, Document, MergeMode, MetadataRecord, Value};
pub use processor::{DocumentOutcome, DocumentProcessor, ProcessError, RunSummary};
pub use storage::{FsStorage, Storage};
pub use vocabulary::{Vocabulary, find_novel};
