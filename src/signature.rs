use crate::namespace::SymbolNamespace;
use crate::serialize::{Deserialize, Failable, Serialize, SerializeError};
use crate::source_files::SourceLocation;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};

/// What a callable is, as far as call-site matching cares.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    CallAsFunction,
    Initializer { optional: bool },
    MemberFunction { name: String },
    StaticFunction { name: String },
}

impl CallableKind {
    pub fn basename(&self) -> &str {
        match self {
            CallableKind::CallAsFunction => "callAsFunction",
            CallableKind::Initializer { .. } => "init",
            CallableKind::MemberFunction { name } => name,
            CallableKind::StaticFunction { name } => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureParameter {
    /// Outer argument label; `_` when the argument is unlabeled.
    pub label: String,
    pub ty: String,
    pub has_default: bool,
}

impl SignatureParameter {
    pub fn new(label: impl Into<String>, ty: impl Into<String>, has_default: bool) -> Self {
        Self {
            label: label.into(),
            ty: ty.into(),
            has_default,
        }
    }

    pub fn is_unlabeled(&self) -> bool {
        self.label == "_"
    }
}

/// A type that resolved during scouting, in both rendered forms.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResolvedType {
    pub namespace: SymbolNamespace,
    pub description: String,
    pub strict_description: String,
}

impl ResolvedType {
    pub fn plain(description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            namespace: SymbolNamespace::root(),
            strict_description: description.clone(),
            description,
        }
    }
}

/// Keys the symbol index. Equality and hashing deliberately ignore
/// `return_type` and `file`; two declarations with the same kind,
/// parameters, and namespace are the same symbol for lookup purposes.
#[derive(Clone, Debug)]
pub struct CallableSignature {
    pub kind: CallableKind,
    pub parameters: Vec<SignatureParameter>,
    pub namespace: SymbolNamespace,
    pub return_type: Option<Failable<ResolvedType>>,
    pub file: String,
}

impl PartialEq for CallableSignature {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.parameters == other.parameters
            && self.namespace == other.namespace
    }
}

impl Eq for CallableSignature {}

impl Hash for CallableSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.parameters.hash(state);
        self.namespace.hash(state);
    }
}

impl Display for CallableSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.namespace.is_root() {
            write!(f, "{}.", self.namespace)?;
        }

        write!(f, "{}(", self.kind.basename())?;

        for parameter in &self.parameters {
            write!(f, "{}:", parameter.label)?;
        }

        write!(f, ")")
    }
}

/// A signature paired with the syntax handle its diagnostics point at.
/// `S` is a full [`crate::source_files::Source`] while a symbol lives in
/// its own module and a [`SourceLocation`] once it crossed an interface.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolInfo<S> {
    pub signature: CallableSignature,
    pub syntax: S,
}

impl<S> SymbolInfo<S> {
    pub fn new(signature: CallableSignature, syntax: S) -> Self {
        Self { signature, syntax }
    }

    pub fn map_syntax<T>(self, f: impl FnOnce(S) -> T) -> SymbolInfo<T> {
        SymbolInfo {
            signature: self.signature,
            syntax: f(self.syntax),
        }
    }
}

impl Serialize for CallableKind {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        match self {
            CallableKind::CallAsFunction => 0u8.serialize(writer),
            CallableKind::Initializer { optional } => {
                1u8.serialize(writer)?;
                optional.serialize(writer)
            }
            CallableKind::MemberFunction { name } => {
                2u8.serialize(writer)?;
                name.serialize(writer)
            }
            CallableKind::StaticFunction { name } => {
                3u8.serialize(writer)?;
                name.serialize(writer)
            }
        }
    }
}

impl Deserialize for CallableKind {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        Ok(match u8::deserialize(reader)? {
            0 => CallableKind::CallAsFunction,
            1 => CallableKind::Initializer {
                optional: bool::deserialize(reader)?,
            },
            2 => CallableKind::MemberFunction {
                name: String::deserialize(reader)?,
            },
            3 => CallableKind::StaticFunction {
                name: String::deserialize(reader)?,
            },
            other => {
                return Err(SerializeError::Malformed(format!(
                    "invalid callable kind tag {}",
                    other
                )))
            }
        })
    }
}

impl Serialize for SignatureParameter {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.label.serialize(writer)?;
        self.ty.serialize(writer)?;
        self.has_default.serialize(writer)
    }
}

impl Deserialize for SignatureParameter {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        Ok(Self {
            label: String::deserialize(reader)?,
            ty: String::deserialize(reader)?,
            has_default: bool::deserialize(reader)?,
        })
    }
}

impl Serialize for ResolvedType {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.namespace.serialize(writer)?;
        self.description.serialize(writer)?;
        self.strict_description.serialize(writer)
    }
}

impl Deserialize for ResolvedType {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        Ok(Self {
            namespace: SymbolNamespace::deserialize(reader)?,
            description: String::deserialize(reader)?,
            strict_description: String::deserialize(reader)?,
        })
    }
}

impl Serialize for SourceLocation {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.file.serialize(writer)?;
        self.line.serialize(writer)?;
        self.column.serialize(writer)
    }
}

impl Deserialize for SourceLocation {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        Ok(Self {
            file: String::deserialize(reader)?,
            line: i32::deserialize(reader)?,
            column: i32::deserialize(reader)?,
        })
    }
}

// Interface wire form; field order is part of the format.
impl Serialize for SymbolInfo<SourceLocation> {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.signature.kind.serialize(writer)?;
        self.signature.parameters.serialize(writer)?;
        self.signature.namespace.serialize(writer)?;
        self.signature.return_type.serialize(writer)?;
        self.syntax.serialize(writer)?;
        self.signature.file.serialize(writer)
    }
}

impl Deserialize for SymbolInfo<SourceLocation> {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let kind = CallableKind::deserialize(reader)?;
        let parameters = Vec::<SignatureParameter>::deserialize(reader)?;
        let namespace = SymbolNamespace::deserialize(reader)?;
        let return_type = Option::<Failable<ResolvedType>>::deserialize(reader)?;
        let syntax = SourceLocation::deserialize(reader)?;
        let file = String::deserialize(reader)?;

        Ok(Self {
            signature: CallableSignature {
                kind,
                parameters,
                namespace,
                return_type,
                file,
            },
            syntax,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature(ty: &str, file: &str) -> CallableSignature {
        CallableSignature {
            kind: CallableKind::MemberFunction {
                name: "fetch".into(),
            },
            parameters: vec![SignatureParameter::new("_", ty, false)],
            namespace: SymbolNamespace::single("Client"),
            return_type: None,
            file: file.into(),
        }
    }

    #[test]
    fn equality_ignores_return_type_and_file() {
        let mut a = signature("ImplicitScope", "a.swift");
        let b = signature("ImplicitScope", "b.swift");
        a.return_type = Some(Failable::Success(ResolvedType::plain("Int")));

        assert_eq!(a, b);
    }

    #[test]
    fn equality_observes_parameters() {
        assert_ne!(signature("ImplicitScope", "a.swift"), signature("Int", "a.swift"));
    }

    #[test]
    fn display_is_call_site_shaped() {
        assert_eq!(
            signature("ImplicitScope", "a.swift").to_string(),
            "Client.fetch(_:)"
        );
    }
}
