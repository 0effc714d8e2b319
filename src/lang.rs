//! Names of the source-language constructs the analyzer keys on.

/// Marker attribute on implicit bindings: `@Implicit`.
pub const IMPLICIT_ATTRIBUTE: &str = "Implicit";
/// The scope type: `ImplicitScope`.
pub const SCOPE_TYPE: &str = "ImplicitScope";
/// The only accepted name for a visible scope binding.
pub const SCOPE_VARIABLE: &str = "scope";
/// The bag identifier: capture entries, `with:` arguments, stored bags.
pub const BAG_VARIABLE: &str = "implicits";
/// Scoped-execution function taking a trailing `{ scope in … }`.
pub const WITH_SCOPE: &str = "withScope";
/// Key-path keys are declared in extensions of this namespace.
pub const KEYS_NAMESPACE: &str = "ImplicitsKeys";
/// SPI attribute public scope-taking functions must carry.
pub const SPI_ATTRIBUTE: &str = "_spi";
/// Attribute marking a re-exported import.
pub const EXPORTED_ATTRIBUTE: &str = "_exported";
/// `Implicit.map(_:_:)` remaps one key to another.
pub const IMPLICIT_MAP_BASE: &str = "Implicit";
pub const IMPLICIT_MAP_MEMBER: &str = "map";
/// Named-implicits wrappers look like `with<Name>Implicits`.
pub const NAMED_WRAPPER_PREFIX: &str = "with";
pub const NAMED_WRAPPER_SUFFIX: &str = "Implicits";

/// `withFooImplicits` → `Foo`; `withScope` and bare `withImplicits`
/// never match.
pub fn named_wrapper_middle(name: &str) -> Option<&str> {
    let middle = name
        .strip_prefix(NAMED_WRAPPER_PREFIX)?
        .strip_suffix(NAMED_WRAPPER_SUFFIX)?;

    (!middle.is_empty()).then_some(middle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_names() {
        assert_eq!(named_wrapper_middle("withNetworkImplicits"), Some("Network"));
        assert_eq!(named_wrapper_middle("withImplicits"), None);
        assert_eq!(named_wrapper_middle("withScope"), None);
        assert_eq!(named_wrapper_middle("fooImplicits"), None);
    }
}
