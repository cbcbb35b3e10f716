//! Reading and writing a note's YAML front matter.
//!
//! A header block starts on the first line of the note with a `---` marker
//! and ends at the next line that is exactly `---`:
//!
//! ```text
//! ---
//! tags:
//! - AI
//! category: Technology
//! ---
//!
//! Body text.
//! ```
//!
//! Both functions are pure; reading and writing files happens in
//! [`crate::storage`].

use serde_yaml::Value as Yaml;
use thiserror::Error;

use crate::models::{Document, MetadataRecord, RecordShapeError};

/// Line that opens and closes a header block.
pub const MARKER: &str = "---";

/// Errors raised while decoding or encoding front matter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// The header block is not valid YAML.
    #[error("invalid YAML front matter: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// The header block is valid YAML but not a key-value mapping.
    #[error("front matter is not a key-value block: {0}")]
    Shape(#[from] RecordShapeError),

    /// The record could not be rendered as YAML.
    #[error("failed to serialize front matter: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Splits a note into its front matter and body.
///
/// Surrounding whitespace and a leading byte order mark are ignored. A note
/// that does not open with the marker, or never closes it, has no header and
/// its whole trimmed text becomes the body. A block that is empty (or holds
/// only comments, `null` or `{}`) also yields no header.
///
/// # Errors
///
/// Returns `FrontmatterError` if the block is not valid YAML or is not a
/// mapping. Callers treat this as fatal for the note.
///
/// # Examples
///
/// ```
/// use notetag::frontmatter::decode;
/// use notetag::Value;
///
/// let doc = decode("---\ncategory: Technology\n---\n\nBody text.").unwrap();
/// let header = doc.header.unwrap();
/// assert_eq!(header.get("category"), Some(&Value::from("Technology")));
/// assert_eq!(doc.body, "Body text.");
///
/// let plain = decode("  Just a note.\n").unwrap();
/// assert!(plain.header.is_none());
/// assert_eq!(plain.body, "Just a note.");
/// ```
pub fn decode(raw: &str) -> Result<Document, FrontmatterError> {
    let text = raw.trim_start_matches('\u{feff}').trim();

    let Some((block, body)) = split_header(text) else {
        return Ok(Document::new(None, text));
    };

    let header = parse_block(block)?;
    Ok(Document::new(header, body.trim()))
}

/// Parses the YAML between the markers.
///
/// Returns `Ok(None)` for a block that carries no keys. A mapping whose keys
/// all hold `null` is still a header, even though its record is empty.
pub fn parse_block(block: &str) -> Result<Option<MetadataRecord>, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(None);
    }

    let value: Yaml = serde_yaml::from_str(block).map_err(FrontmatterError::Parse)?;
    match &value {
        Yaml::Null => return Ok(None),
        Yaml::Mapping(mapping) if mapping.is_empty() => return Ok(None),
        _ => {}
    }

    Ok(Some(MetadataRecord::try_from(value)?))
}

/// Renders a record and body as a complete note.
///
/// The layout is the opening marker, the YAML block in the record's key
/// order, the closing marker, a blank line and the body. Encoding the same
/// record twice yields the same text.
///
/// # Errors
///
/// Returns `FrontmatterError::Serialize` if YAML rendering fails.
///
/// # Examples
///
/// ```
/// use notetag::frontmatter::encode;
/// use notetag::MetadataRecord;
///
/// let mut record = MetadataRecord::new();
/// record.insert("tags", vec!["AI", "ML"]);
///
/// let note = encode(&record, "Body").unwrap();
/// assert_eq!(note, "---\ntags:\n- AI\n- ML\n---\n\nBody");
/// ```
pub fn encode(record: &MetadataRecord, body: &str) -> Result<String, FrontmatterError> {
    let yaml = serde_yaml::to_string(&record.to_yaml()).map_err(FrontmatterError::Serialize)?;
    Ok(format!("{MARKER}\n{}\n{MARKER}\n\n{body}", yaml.trim_end()))
}

/// Finds the header block, returning the YAML span and everything after the
/// closing marker.
fn split_header(text: &str) -> Option<(&str, &str)> {
    let (first, rest) = text.split_once('\n')?;
    if first.trim_end() != MARKER {
        return None;
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == MARKER {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
