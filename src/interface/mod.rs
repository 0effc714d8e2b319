//! The public contract one module hands the next: every exported
//! callable, its requirement set when it takes a scope, the key-path
//! keys the module defines, and the modules it re-exports. This is the
//! only artifact downstream analysis consumes.

mod build;

pub use build::build_interface;

use crate::implicit_key::ImplicitKey;
use crate::serialize::{Deserialize, Serialize, SerializeError};
use crate::signature::SymbolInfo;
use crate::source_files::SourceLocation;
use std::collections::BTreeSet;
use std::io::{Read, Write};

#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceSymbol {
    pub info: SymbolInfo<SourceLocation>,
    /// `None` when the symbol takes no scope and carries no
    /// requirements of its own.
    pub requirements: Option<BTreeSet<ImplicitKey>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefinedKey {
    pub name: String,
    pub ty: String,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ImplicitModuleInterface {
    pub module: String,
    pub symbols: Vec<InterfaceSymbol>,
    pub testable_symbols: Vec<InterfaceSymbol>,
    pub defined_keypath_keys: Vec<DefinedKey>,
    pub reexported_modules: Vec<String>,
}

impl Serialize for InterfaceSymbol {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.info.serialize(writer)?;

        match &self.requirements {
            None => 0u8.serialize(writer),
            Some(requirements) => {
                1u8.serialize(writer)?;
                let keys: Vec<ImplicitKey> = requirements.iter().cloned().collect();
                keys.serialize(writer)
            }
        }
    }
}

impl Deserialize for InterfaceSymbol {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        let info = SymbolInfo::<SourceLocation>::deserialize(reader)?;

        let requirements = match u8::deserialize(reader)? {
            0 => None,
            1 => Some(Vec::<ImplicitKey>::deserialize(reader)?.into_iter().collect()),
            other => {
                return Err(SerializeError::Malformed(format!(
                    "invalid requirements byte {}",
                    other
                )))
            }
        };

        Ok(Self { info, requirements })
    }
}

impl Serialize for DefinedKey {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.name.serialize(writer)?;
        self.ty.serialize(writer)
    }
}

impl Deserialize for DefinedKey {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        Ok(Self {
            name: String::deserialize(reader)?,
            ty: String::deserialize(reader)?,
        })
    }
}

impl Serialize for ImplicitModuleInterface {
    fn serialize(&self, writer: &mut dyn Write) -> Result<(), SerializeError> {
        self.module.serialize(writer)?;
        self.symbols.serialize(writer)?;
        self.testable_symbols.serialize(writer)?;
        self.defined_keypath_keys.serialize(writer)?;
        self.reexported_modules.serialize(writer)
    }
}

impl Deserialize for ImplicitModuleInterface {
    fn deserialize(reader: &mut dyn Read) -> Result<Self, SerializeError> {
        Ok(Self {
            module: String::deserialize(reader)?,
            symbols: Vec::deserialize(reader)?,
            testable_symbols: Vec::deserialize(reader)?,
            defined_keypath_keys: Vec::deserialize(reader)?,
            reexported_modules: Vec::deserialize(reader)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{from_bytes, to_bytes, Failable};
    use crate::signature::{
        CallableKind, CallableSignature, ResolvedType, SignatureParameter,
    };
    use crate::namespace::SymbolNamespace;

    fn sample() -> ImplicitModuleInterface {
        ImplicitModuleInterface {
            module: "Networking".into(),
            symbols: vec![InterfaceSymbol {
                info: SymbolInfo::new(
                    CallableSignature {
                        kind: CallableKind::Initializer { optional: false },
                        parameters: vec![
                            SignatureParameter::new("url", "URL", false),
                            SignatureParameter::new("_", "ImplicitScope", false),
                        ],
                        namespace: SymbolNamespace::single("Client"),
                        return_type: Some(Failable::Success(ResolvedType::plain("Client"))),
                        file: "client.swift".into(),
                    },
                    SourceLocation::new("client.swift", 12, 5),
                ),
                requirements: Some(
                    [ImplicitKey::key_path("myType"), ImplicitKey::of_type("MyType")]
                        .into_iter()
                        .collect(),
                ),
            }],
            testable_symbols: vec![InterfaceSymbol {
                info: SymbolInfo::new(
                    CallableSignature {
                        kind: CallableKind::StaticFunction {
                            name: "makeDefault".into(),
                        },
                        parameters: Vec::new(),
                        namespace: SymbolNamespace::root(),
                        return_type: Some(Failable::Failure(vec![
                            "Unable to render missing type".into(),
                        ])),
                        file: "factory.swift".into(),
                    },
                    SourceLocation::new("factory.swift", 3, 1),
                ),
                requirements: None,
            }],
            defined_keypath_keys: vec![DefinedKey {
                name: "myType".into(),
                ty: "MyType".into(),
            }],
            reexported_modules: vec!["NetworkingCore".into()],
        }
    }

    #[test]
    fn interface_round_trips_and_consumes_the_stream() {
        let interface = sample();
        let bytes = to_bytes(&interface).unwrap();
        let back: ImplicitModuleInterface = from_bytes(&bytes).unwrap();

        assert_eq!(back, interface);

        // Signature equality ignores return type and file on purpose;
        // check those fields made the trip explicitly.
        for (symbol, original) in back
            .symbols
            .iter()
            .chain(&back.testable_symbols)
            .zip(interface.symbols.iter().chain(&interface.testable_symbols))
        {
            assert_eq!(
                symbol.info.signature.return_type,
                original.info.signature.return_type
            );
            assert_eq!(symbol.info.signature.file, original.info.signature.file);
            assert_eq!(symbol.info.syntax, original.info.syntax);
        }
    }

    #[test]
    fn serialization_is_deterministic() {
        assert_eq!(to_bytes(&sample()).unwrap(), to_bytes(&sample()).unwrap());
    }
}
