use crate::implicit_key::ImplicitKey;
use crate::namespace::SymbolNamespace;
use crate::signature::CallableSignature;
use itertools::Itertools;
use std::fmt::Display;

#[derive(Clone, Debug)]
pub enum GraphErrorKind {
    ImplicitlyOverridingScope,
    NestingScopeForbidden,
    MultipleLocalScopes,
    FirstScopeHere,
    NestedScopeWithBag,
    EndOutsideDefer,
    EndWithoutLocalScope,
    EndInheritedScope,
    ScopeEndedTwice,
    FirstEndHere,
    MissingScopeEnd,
    ReadWithoutScope,
    WriteWithoutLocalScope,
    UnusedBag,
    NoBagAvailable,
    MissingStoredBag { namespace: SymbolNamespace },
    UnusedStoredBag,
    TypeNeedsScopeTakingInit { namespace: SymbolNamespace },
    UnresolvedSymbol { name: String },
    AmbiguousUse { name: String },
    FoundCandidate { signature: CallableSignature },
    UnresolvedRequirements { keys: Vec<ImplicitKey> },
}

impl Display for GraphErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphErrorKind::ImplicitlyOverridingScope => {
                write!(f, "Implicitly overriding existing implicit scope")
            }
            GraphErrorKind::NestingScopeForbidden => {
                write!(f, "Nesting scope is forbidden here")
            }
            GraphErrorKind::MultipleLocalScopes => write!(f, "Multiple local implicit scopes"),
            GraphErrorKind::FirstScopeHere => write!(f, "First implicit scope declared here"),
            GraphErrorKind::NestedScopeWithBag => {
                write!(f, "Nested scopes with bags are not supported")
            }
            GraphErrorKind::EndOutsideDefer => {
                write!(f, "'scope.end()' must appear in a 'defer' block")
            }
            GraphErrorKind::EndWithoutLocalScope => {
                write!(f, "Ending an implicit scope requires a local 'ImplicitScope'")
            }
            GraphErrorKind::EndInheritedScope => {
                write!(f, "Cannot end an inherited implicit scope")
            }
            GraphErrorKind::ScopeEndedTwice => write!(f, "Implicit scope is already ended"),
            GraphErrorKind::FirstEndHere => write!(f, "First ended here"),
            GraphErrorKind::MissingScopeEnd => {
                write!(f, "Implicit scope must be ended in a 'defer' block")
            }
            GraphErrorKind::ReadWithoutScope => {
                write!(f, "Reading from implicit scope without an 'ImplicitScope'")
            }
            GraphErrorKind::WriteWithoutLocalScope => {
                write!(f, "Writing to implicit scope without local 'ImplicitScope'")
            }
            GraphErrorKind::UnusedBag => write!(f, "Unused implicits bag"),
            GraphErrorKind::NoBagAvailable => {
                write!(f, "No implicits bag is available here")
            }
            GraphErrorKind::MissingStoredBag { namespace } => {
                write!(f, "No stored implicits bag declared in '{}'", namespace)
            }
            GraphErrorKind::UnusedStoredBag => write!(f, "Unused implicits bag"),
            GraphErrorKind::TypeNeedsScopeTakingInit { namespace } => write!(
                f,
                "'{}' stores implicits and must declare an initializer taking an implicit scope",
                namespace
            ),
            GraphErrorKind::UnresolvedSymbol { name } => {
                write!(f, "Unresolved symbol '{}'", name)
            }
            GraphErrorKind::AmbiguousUse { name } => write!(f, "Ambiguous use of '{}'", name),
            GraphErrorKind::FoundCandidate { signature } => {
                write!(f, "Found candidate '{}'", signature)
            }
            GraphErrorKind::UnresolvedRequirements { keys } => {
                if keys.len() == 1 {
                    write!(f, "Unresolved requirement: {}", keys[0])
                } else {
                    write!(
                        f,
                        "Unresolved requirements: {}",
                        keys.iter().map(ToString::to_string).join(", ")
                    )
                }
            }
        }
    }
}
