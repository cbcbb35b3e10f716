mod audit_action;
mod document;
mod merge_mode;
mod record;
mod value;

pub use audit_action::AuditAction;
pub use document::Document;
pub use merge_mode::MergeMode;
pub use record::{MetadataRecord, RecordShapeError};
pub use value::Value;
