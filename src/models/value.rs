use serde_yaml::Value as Yaml;

/// A single front matter value.
///
/// Strings and lists of strings are the shapes the merge engine reasons
/// about. Everything else YAML can express (numbers, booleans, nested
/// mappings, mixed sequences) is carried through as `Opaque` so a note's
/// header survives a rewrite with its types intact.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A plain string value, e.g. `category: Technology`.
    Scalar(String),
    /// A sequence of strings, e.g. `tags: [AI, ML]`.
    List(Vec<String>),
    /// Any other non-null YAML value, left untouched.
    Opaque(Yaml),
}

impl Value {
    /// Converts a parsed YAML value.
    ///
    /// Returns `None` for `null`: records never hold null values.
    pub fn from_yaml(value: Yaml) -> Option<Self> {
        match value {
            Yaml::Null => None,
            Yaml::String(s) => Some(Self::Scalar(s)),
            Yaml::Sequence(items) if items.iter().all(Yaml::is_string) => Some(Self::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Yaml::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            )),
            other => Some(Self::Opaque(other)),
        }
    }

    /// Converts back into a YAML value for serialization.
    pub fn to_yaml(&self) -> Yaml {
        match self {
            Self::Scalar(s) => Yaml::String(s.clone()),
            Self::List(items) => Yaml::Sequence(items.iter().cloned().map(Yaml::String).collect()),
            Self::Opaque(value) => value.clone(),
        }
    }

    /// Returns `true` if this value carries no information.
    ///
    /// Empty strings, empty lists and empty opaque sequences or mappings
    /// count as empty. Generated empty values never overwrite or introduce
    /// keys during a merge.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Opaque(Yaml::Sequence(items)) => items.is_empty(),
            Self::Opaque(Yaml::Mapping(map)) => map.is_empty(),
            Self::Opaque(_) => false,
        }
    }

    /// Returns `true` for the `List` variant.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Reads the value as a set of labels.
    ///
    /// A scalar is one label, a list is its items, and an opaque sequence
    /// contributes its string, number and boolean items as text. Empty
    /// strings are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use notetag::Value;
    ///
    /// let tags = Value::List(vec!["AI".into(), "".into(), "ML".into()]);
    /// assert_eq!(tags.labels(), vec!["AI", "ML"]);
    ///
    /// assert_eq!(Value::Scalar("AI".into()).labels(), vec!["AI"]);
    /// ```
    pub fn labels(&self) -> Vec<String> {
        let labels: Vec<String> = match self {
            Self::Scalar(s) => vec![s.clone()],
            Self::List(items) => items.clone(),
            Self::Opaque(Yaml::Sequence(items)) => items.iter().filter_map(scalar_text).collect(),
            Self::Opaque(_) => Vec::new(),
        };
        labels.into_iter().filter(|l| !l.is_empty()).collect()
    }
}

fn scalar_text(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Scalar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Scalar(s)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}
