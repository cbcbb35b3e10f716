use super::MetadataRecord;

/// A note split into its front matter and body.
///
/// A note without a header block has `header: None` and its whole (trimmed)
/// text as the body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub header: Option<MetadataRecord>,
    pub body: String,
}

impl Document {
    /// Creates a document from its parts.
    pub fn new(header: Option<MetadataRecord>, body: impl Into<String>) -> Self {
        Self {
            header,
            body: body.into(),
        }
    }

    /// Returns `true` if the note carries front matter.
    pub fn has_header(&self) -> bool {
        self.header.is_some()
    }
}
