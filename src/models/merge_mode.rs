use std::fmt;

/// How generated metadata combines with a note's existing front matter.
///
/// Chosen once per run and applied to every note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MergeMode {
    /// Write the generated metadata as-is. Notes without front matter are
    /// skipped.
    #[default]
    Additive,
    /// Outer-join existing and generated metadata, keeping curated values.
    Merge,
    /// Discard existing front matter and write the generated metadata.
    Replace,
}

impl MergeMode {
    /// Resolves the mode from the two mutually exclusive CLI switches.
    ///
    /// Returns `None` when both are set.
    pub fn from_flags(merge: bool, replace: bool) -> Option<Self> {
        match (merge, replace) {
            (true, true) => None,
            (true, false) => Some(Self::Merge),
            (false, true) => Some(Self::Replace),
            (false, false) => Some(Self::Additive),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Additive => write!(f, "additive"),
            Self::Merge => write!(f, "merge"),
            Self::Replace => write!(f, "replace"),
        }
    }
}
