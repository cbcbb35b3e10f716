//! Metadata generation for a single note.
//!
//! `MetadataGenerator` fills the user's prompt template with the reference
//! note and the target note, sends it to a [`ChatClient`] and parses the YAML
//! reply into a [`MetadataRecord`]. In test mode it returns a fixed record
//! without touching the network.

use std::sync::Arc;

use thiserror::Error;

use crate::frontmatter::{self, FrontmatterError, MARKER};
use crate::models::{MetadataRecord, Value};

use super::client::{ChatClient, ClassifierError};

/// System message sent with every classification request.
const SYSTEM_PROMPT: &str = "You categorize notes using a provided reference.";

/// Errors raised while producing metadata for a note.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The chat request failed.
    #[error(transparent)]
    Client(#[from] ClassifierError),

    /// The model's reply is not a YAML mapping.
    #[error("model reply is not valid metadata: {0}")]
    InvalidReply(#[source] FrontmatterError),

    /// The model replied with nothing usable.
    #[error("model reply contained no metadata")]
    EmptyReply,

    /// A live request was needed but no client is configured.
    #[error("no classification client configured")]
    NoClient,
}

/// Produces metadata for a note body.
///
/// This is the processor's only dependency on the classification service, so
/// tests can swap in a stub.
pub trait Classifier: Send + Sync {
    /// Generates metadata for `body`.
    ///
    /// The returned record always holds a `tags` list (possibly empty). With
    /// `test_mode` set, a fixed record is returned and no request is made.
    fn generate(
        &self,
        body: &str,
        reference: &str,
        prompt_template: &str,
        test_mode: bool,
    ) -> Result<MetadataRecord, GenerationError>;
}

/// Builder for constructing `MetadataGenerator` instances.
///
/// # Examples
///
/// ```
/// use notetag::classifier::{Classifier, MetadataGeneratorBuilder};
///
/// // Without a client the generator only serves test mode.
/// let generator = MetadataGeneratorBuilder::new().build();
/// let record = generator.generate("body", "reference", "{target_content}", true).unwrap();
/// assert!(record.contains_key("tags"));
/// ```
#[derive(Default)]
pub struct MetadataGeneratorBuilder {
    client: Option<Arc<dyn ChatClient>>,
}

impl MetadataGeneratorBuilder {
    /// Creates a new `MetadataGeneratorBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chat client used for live requests.
    pub fn client(mut self, client: Arc<dyn ChatClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the `MetadataGenerator`.
    #[must_use]
    pub fn build(self) -> MetadataGenerator {
        MetadataGenerator {
            client: self.client,
        }
    }
}

/// Generates front matter for notes with an LLM.
pub struct MetadataGenerator {
    client: Option<Arc<dyn ChatClient>>,
}

impl MetadataGenerator {
    /// Creates a generator backed by `client`.
    #[must_use]
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            client: Some(client),
        }
    }
}

impl Classifier for MetadataGenerator {
    fn generate(
        &self,
        body: &str,
        reference: &str,
        prompt_template: &str,
        test_mode: bool,
    ) -> Result<MetadataRecord, GenerationError> {
        if test_mode {
            return Ok(test_mode_record());
        }

        let client = self.client.as_ref().ok_or(GenerationError::NoClient)?;
        let prompt = build_prompt(prompt_template, reference, body);
        let reply = client.complete(SYSTEM_PROMPT, &prompt)?;

        parse_reply(&reply)
    }
}

/// The record served in test mode.
pub fn test_mode_record() -> MetadataRecord {
    let mut record = MetadataRecord::new();
    record.insert("tags", vec!["AI", "Machine Learning", "Deep Learning"]);
    record.insert("aliases", vec!["ML Model", "AI Model"]);
    record.insert("category", "Technology");
    record.insert("phase", "Model Training");
    record.insert("topic", "Neural Networks");
    record.insert("filename", "neural_network_model.py");
    record
}

/// Fills the `{reference}` and `{target_content}` placeholders.
fn build_prompt(template: &str, reference: &str, body: &str) -> String {
    template
        .replace("{reference}", reference)
        .replace("{target_content}", body)
}

/// Parses a model reply into metadata with a guaranteed `tags` list.
fn parse_reply(reply: &str) -> Result<MetadataRecord, GenerationError> {
    let yaml = extract_yaml(reply);
    let record = frontmatter::parse_block(yaml)
        .map_err(GenerationError::InvalidReply)?
        .ok_or(GenerationError::EmptyReply)?;
    Ok(ensure_tags(record))
}

/// Strips a Markdown code fence and front matter markers around the YAML.
fn extract_yaml(reply: &str) -> &str {
    let mut text = reply.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string ("yaml", "yml" or nothing).
        text = rest.split_once('\n').map_or("", |(_, inner)| inner).trim_end();
        text = text.strip_suffix("```").unwrap_or(text).trim();
    }

    let text = text.strip_prefix(MARKER).map_or(text, str::trim_start);
    text.strip_suffix(MARKER).map_or(text, str::trim_end)
}

fn ensure_tags(mut record: MetadataRecord) -> MetadataRecord {
    let tags = match record.get("tags") {
        Some(Value::List(_)) => return record,
        Some(other) => other.labels(),
        None => Vec::new(),
    };
    record.insert("tags", Value::List(tags));
    record
}
