//! Known labels and detection of new ones.

use std::collections::{BTreeSet, HashSet};

use crate::frontmatter::{self, FrontmatterError};

/// The set of labels a reference note already knows about.
///
/// Built once at the start of a run and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    labels: HashSet<String>,
}

impl Vocabulary {
    /// Reads the vocabulary from a reference note's `tags` field.
    ///
    /// A reference without front matter or without `tags` yields an empty
    /// vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `FrontmatterError` if the reference note's header is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use notetag::Vocabulary;
    ///
    /// let reference = "---\ntags:\n  - AI\n  - Machine Learning\n---\nReference file example.";
    /// let vocabulary = Vocabulary::from_reference(reference).unwrap();
    /// assert!(vocabulary.contains("AI"));
    /// assert!(vocabulary.contains("Machine Learning"));
    /// assert_eq!(vocabulary.len(), 2);
    /// ```
    pub fn from_reference(reference: &str) -> Result<Self, FrontmatterError> {
        let doc = frontmatter::decode(reference)?;
        Ok(doc
            .header
            .map(|header| header.tags().into_iter().collect())
            .unwrap_or_default())
    }

    /// Returns `true` if `label` is known.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Returns the number of known labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no labels are known.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Returns the generated labels that the vocabulary does not contain.
///
/// Duplicates in `tags` collapse and input order does not matter; the result
/// is sorted so log lines are stable.
///
/// # Examples
///
/// ```
/// use notetag::{Vocabulary, find_novel};
///
/// let vocabulary: Vocabulary = ["AI", "Machine Learning"].into_iter().collect();
/// let tags = vec!["AI".to_string(), "NLP".to_string(), "Deep Learning".to_string()];
///
/// let novel: Vec<_> = find_novel(&tags, &vocabulary).into_iter().collect();
/// assert_eq!(novel, vec!["Deep Learning", "NLP"]);
/// ```
pub fn find_novel(tags: &[String], vocabulary: &Vocabulary) -> BTreeSet<String> {
    tags.iter()
        .filter(|tag| !vocabulary.contains(tag))
        .cloned()
        .collect()
}
