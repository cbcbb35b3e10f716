use std::fmt;

/// What happened to a note, as written to the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditAction {
    /// The note had no front matter and the run does not add headers to such notes.
    SkippedNoHeader,
    /// Existing and generated metadata were merged.
    Merged,
    /// Existing front matter was replaced.
    Replaced,
    /// Generated metadata was written as the note's front matter.
    Added,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedNoHeader => write!(f, "Skipped (No Header)"),
            Self::Merged => write!(f, "Merged YAML"),
            Self::Replaced => write!(f, "Replaced YAML"),
            Self::Added => write!(f, "Added YAML"),
        }
    }
}
