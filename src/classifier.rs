/// Classification service access.
///
/// `client` talks to an OpenAI-compatible chat-completions endpoint;
/// `generator` turns a note into metadata using that client, or a fixed
/// record in test mode.
mod client;
mod generator;

pub use client::{ChatClient, ClassifierError, OpenAiClient, OpenAiClientBuilder};
pub use generator::{
    Classifier, GenerationError, MetadataGenerator, MetadataGeneratorBuilder, test_mode_record,
};
