use crate::serialize::{Deserialize, Serialize, SerializeError};
use std::fmt::Display;
use std::io::{Read, Write};

/// Dotted path of the enclosing types/extensions, outer first. The root
/// namespace is empty; no other segment may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolNamespace {
    segments: Vec<String>,
}

impl SymbolNamespace {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<String>) -> Self {
        assert!(
            segments.iter().all(|segment| !segment.is_empty()),
            "namespace segments must be non-empty"
        );
        Self { segments }
    }

    pub fn single(segment: impl Into<String>) -> Self {
        Self::new(vec![segment.into()])
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let segment = segment.into();
        assert!(!segment.is_empty(), "namespace segments must be non-empty");

        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl Display for SymbolNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl Serialize for SymbolNamespace {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.segments.serialize(writer)
    }
}

impl Deserialize for SymbolNamespace {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let segments = Vec::<String>::deserialize(reader)?;

        if segments.iter().any(String::is_empty) {
            return Err(SerializeError::Malformed(
                "namespace contains an empty segment".into(),
            ));
        }

        Ok(Self { segments })
    }
}
