//! Run configuration and the immutable context built from it.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::frontmatter::FrontmatterError;
use crate::models::MergeMode;
use crate::vocabulary::Vocabulary;

/// A required input that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingPath {
    Reference(PathBuf),
    Prompt(PathBuf),
    NotesDir(PathBuf),
}

impl fmt::Display for MissingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference(path) => write!(f, "Reference file not found: {}", path.display()),
            Self::Prompt(path) => write!(f, "Prompt file not found: {}", path.display()),
            Self::NotesDir(path) => write!(f, "Notes directory not found: {}", path.display()),
        }
    }
}

/// Errors that stop a run before any note is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Both `--merge` and `--replace` were given.
    #[error("--merge and --replace cannot be used together")]
    ConflictingModes,

    /// One or more input paths do not exist.
    #[error("{}", join_lines(.0))]
    MissingPaths(Vec<MissingPath>),

    /// An input file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The reference note's front matter is malformed.
    #[error("reference file {} has malformed front matter: {source}", .path.display())]
    Reference {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },
}

fn join_lines(missing: &[MissingPath]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parameters of a run, as given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub mode: MergeMode,
    pub test_mode: bool,
    pub reference_path: PathBuf,
    pub prompt_path: PathBuf,
    pub notes_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl RunConfig {
    /// Checks that every input path exists, reporting all missing ones at once.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingPaths` listing each missing input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if !self.reference_path.is_file() {
            missing.push(MissingPath::Reference(self.reference_path.clone()));
        }
        if !self.prompt_path.is_file() {
            missing.push(MissingPath::Prompt(self.prompt_path.clone()));
        }
        if !self.notes_dir.is_dir() {
            missing.push(MissingPath::NotesDir(self.notes_dir.clone()));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingPaths(missing))
        }
    }
}

/// Everything a run shares across notes. Never mutated once loaded.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub mode: MergeMode,
    pub test_mode: bool,
    pub reference: String,
    pub prompt_template: String,
    pub vocabulary: Vocabulary,
}

impl RunContext {
    /// Validates `config`, reads the reference note and prompt template, and
    /// extracts the vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for missing or unreadable inputs and for a
    /// reference note with malformed front matter.
    pub fn load(config: &RunConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let reference = read_trimmed(&config.reference_path)?;
        let prompt_template = read_trimmed(&config.prompt_path)?;
        let vocabulary =
            Vocabulary::from_reference(&reference).map_err(|source| ConfigError::Reference {
                path: config.reference_path.clone(),
                source,
            })?;

        Ok(Self {
            mode: config.mode,
            test_mode: config.test_mode,
            reference,
            prompt_template,
            vocabulary,
        })
    }
}

fn read_trimmed(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map(|content| content.trim().to_string())
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
}
