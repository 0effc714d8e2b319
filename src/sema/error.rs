use crate::signature::CallableSignature;
use std::fmt::Display;

#[derive(Clone, Debug)]
pub enum SemaErrorKind {
    MultipleScopeParameters,
    ScopeParameterName,
    OpenScopeFunction,
    OverrideScopeFunction,
    ClassScopeFunction,
    NonFinalScopeFunction,
    PublicWithoutSpi,
    ProtocolScopeRequirement,
    ImplicitMustBeOutermost,
    ImplicitKeyArgumentLabeled,
    UnableToInferKey,
    UnableToInferType { name: String },
    RedundantScopeAnnotation,
    ScopeMustBeLet,
    ScopeMustBeBound,
    AnonymousImplicitNotSaved,
    StoredImplicitInitializer,
    ImplicitInComplexExtension,
    InvalidBagVariableName,
    NestedFunctionScopeParameter,
    AmbiguousUse { name: String },
    FoundCandidate { signature: CallableSignature },
    UnresolvedSymbol { name: String },
    ImplicitMapArgumentCount,
    ImplicitMapArgumentForm,
    ImplicitMapKeyPathComponents,
    DeferOnlyScopeEnd,
    DeferScopeEndTopLevel,
    UnresolvedBranchScope,
    UnresolvedBranchMutation,
}

impl Display for SemaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemaErrorKind::MultipleScopeParameters => {
                write!(f, "Functions cannot take more than one implicit scope parameter")
            }
            SemaErrorKind::ScopeParameterName => {
                write!(f, "Implicit scope parameter must be unnamed or named 'scope'")
            }
            SemaErrorKind::OpenScopeFunction => write!(
                f,
                "Functions taking an implicit scope cannot be 'open'; static dispatch is required"
            ),
            SemaErrorKind::OverrideScopeFunction => write!(
                f,
                "Functions taking an implicit scope cannot be 'override'; static dispatch is required"
            ),
            SemaErrorKind::ClassScopeFunction => write!(
                f,
                "Functions taking an implicit scope cannot be 'class' members; static dispatch is required"
            ),
            SemaErrorKind::NonFinalScopeFunction => write!(
                f,
                "Functions taking an implicit scope must be 'final' inside a non-final class"
            ),
            SemaErrorKind::PublicWithoutSpi => write!(
                f,
                "Public functions taking an implicit scope must be marked '@_spi(Implicits)'"
            ),
            SemaErrorKind::ProtocolScopeRequirement => write!(
                f,
                "Protocol requirements cannot take an implicit scope; there is no dynamic dispatch"
            ),
            SemaErrorKind::ImplicitMustBeOutermost => {
                write!(f, "'@Implicit' must be the outermost attribute")
            }
            SemaErrorKind::ImplicitKeyArgumentLabeled => {
                write!(f, "Implicit key argument must not be labeled")
            }
            SemaErrorKind::UnableToInferKey => write!(f, "Unable to infer implicit key"),
            SemaErrorKind::UnableToInferType { name } => {
                write!(f, "Unable to infer type of '{}'", name)
            }
            SemaErrorKind::RedundantScopeAnnotation => {
                write!(f, "Redundant type annotation; 'ImplicitScope' is implied")
            }
            SemaErrorKind::ScopeMustBeLet => write!(f, "'scope' must be declared with 'let'"),
            SemaErrorKind::ScopeMustBeBound => {
                write!(f, "'ImplicitScope()' must be bound to a 'let' constant")
            }
            SemaErrorKind::AnonymousImplicitNotSaved => {
                write!(f, "Anonymous implicit will not be saved")
            }
            SemaErrorKind::StoredImplicitInitializer => {
                write!(f, "Stored implicit property cannot have an initial value")
            }
            SemaErrorKind::ImplicitInComplexExtension => {
                write!(f, "Implicits are not supported in extensions of complex types")
            }
            SemaErrorKind::InvalidBagVariableName => {
                write!(f, "Invalid bag variable name; expected 'implicits'")
            }
            SemaErrorKind::NestedFunctionScopeParameter => {
                write!(f, "Nested functions with a scope parameter are not supported")
            }
            SemaErrorKind::AmbiguousUse { name } => write!(f, "Ambiguous use of '{}'", name),
            SemaErrorKind::FoundCandidate { signature } => {
                write!(f, "Found candidate '{}'", signature)
            }
            SemaErrorKind::UnresolvedSymbol { name } => {
                write!(f, "Unresolved symbol '{}'", name)
            }
            SemaErrorKind::ImplicitMapArgumentCount => {
                write!(f, "'Implicit.map' requires exactly two arguments")
            }
            SemaErrorKind::ImplicitMapArgumentForm => write!(
                f,
                "'Implicit.map' arguments must be key path literals or metatypes"
            ),
            SemaErrorKind::ImplicitMapKeyPathComponents => {
                write!(f, "Key paths in 'Implicit.map' must have exactly one component")
            }
            SemaErrorKind::DeferOnlyScopeEnd => write!(
                f,
                "Only 'scope.end()' may affect the implicit scope inside a 'defer' block"
            ),
            SemaErrorKind::DeferScopeEndTopLevel => {
                write!(f, "'scope.end()' must be at the top level of the 'defer' block")
            }
            SemaErrorKind::UnresolvedBranchScope => write!(
                f,
                "Cannot create an implicit scope inside an unresolved '#if' block"
            ),
            SemaErrorKind::UnresolvedBranchMutation => write!(
                f,
                "Cannot modify the implicit context inside an unresolved '#if' block"
            ),
        }
    }
}
