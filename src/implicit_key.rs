use crate::serialize::{Deserialize, Serialize, SerializeError};
use std::fmt::Display;
use std::io::{Read, Write};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ImplicitKeyKind {
    /// Keyed by a rendered type, e.g. `UInt8` or `[Int]`.
    Type,
    /// Keyed by a declared key path, e.g. `\.networkService`.
    KeyPath,
}

/// Identity an implicit value is looked up under. Ordered by name first
/// so exported requirement sets come out lexicographically sorted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImplicitKey {
    pub name: String,
    pub kind: ImplicitKeyKind,
}

impl ImplicitKey {
    pub fn of_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ImplicitKeyKind::Type,
        }
    }

    pub fn key_path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ImplicitKeyKind::KeyPath,
        }
    }
}

impl Display for ImplicitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl Serialize for ImplicitKey {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        let tag: u8 = match self.kind {
            ImplicitKeyKind::Type => 0,
            ImplicitKeyKind::KeyPath => 1,
        };

        tag.serialize(writer)?;
        self.name.serialize(writer)
    }
}

impl Deserialize for ImplicitKey {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let kind = match u8::deserialize(reader)? {
            0 => ImplicitKeyKind::Type,
            1 => ImplicitKeyKind::KeyPath,
            other => {
                return Err(SerializeError::Malformed(format!(
                    "invalid implicit key tag {}",
                    other
                )))
            }
        };

        Ok(Self {
            name: String::deserialize(reader)?,
            kind,
        })
    }
}
