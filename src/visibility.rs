use std::fmt::Display;

/// Access levels ordered from least to most visible. `Default` is what an
/// unannotated declaration gets; it sits between `fileprivate` and
/// `internal` so that explicitly-`internal` symbols outrank it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Private,
    FilePrivate,
    #[default]
    Default,
    Internal,
    Package,
    Public,
    Open,
}

impl Visibility {
    pub fn parse(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "private" => Self::Private,
            "fileprivate" => Self::FilePrivate,
            "internal" => Self::Internal,
            "package" => Self::Package,
            "public" => Self::Public,
            "open" => Self::Open,
            _ => return None,
        })
    }

    pub fn more_or_equal_visible(self, other: Visibility) -> bool {
        self >= other
    }

    pub fn less_or_equal_visible(self, other: Visibility) -> bool {
        self <= other
    }

    /// Goes into the module interface's `symbols` list.
    pub fn is_exported(self) -> bool {
        self.more_or_equal_visible(Visibility::Public)
    }

    /// Goes into the module interface's `testableSymbols` list.
    pub fn is_testable(self) -> bool {
        self >= Visibility::Internal && self <= Visibility::Package
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Visibility::Private => "private",
            Visibility::FilePrivate => "fileprivate",
            Visibility::Default => "internal",
            Visibility::Internal => "internal",
            Visibility::Package => "package",
            Visibility::Public => "public",
            Visibility::Open => "open",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_order() {
        use Visibility::*;

        let ascending = [Private, FilePrivate, Default, Internal, Package, Public, Open];

        for window in ascending.windows(2) {
            assert!(window[1].more_or_equal_visible(window[0]));
            assert!(window[0].less_or_equal_visible(window[1]));
            assert!(!window[0].more_or_equal_visible(window[1]));
        }
    }

    #[test]
    fn interface_bands() {
        assert!(Visibility::Public.is_exported());
        assert!(Visibility::Open.is_exported());
        assert!(!Visibility::Package.is_exported());

        assert!(Visibility::Internal.is_testable());
        assert!(Visibility::Package.is_testable());
        assert!(!Visibility::Default.is_testable());
        assert!(!Visibility::Public.is_testable());
    }
}
