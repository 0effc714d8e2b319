use super::{SourceFileKey, SourceFiles};
use crate::line_column::Location;
use std::fmt::Display;

// Deliberately no PartialEq/Hash - constructs must never compare
// equal or unequal depending on where they were written.
#[derive(Copy, Clone, Debug)]
pub struct Source {
    pub key: SourceFileKey,
    pub location: Location,
}

impl Source {
    pub fn new(key: SourceFileKey, location: Location) -> Self {
        Self { key, location }
    }

    pub fn internal() -> Self {
        Self {
            key: SourceFiles::INTERNAL_KEY,
            location: Location { line: 1, column: 1 },
        }
    }

    pub fn is_internal(&self) -> bool {
        self.key == SourceFiles::INTERNAL_KEY
    }

    pub fn shift_column(&self, amount: usize) -> Self {
        Self {
            key: self.key,
            location: self.location.shift_column(amount),
        }
    }
}

/// Position form used once a syntax handle leaves the module it was
/// recorded in (module interfaces, external symbol diagnostics).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: String,
    pub line: i32,
    pub column: i32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: i32, column: i32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    pub fn from_source(source: Source, source_files: &SourceFiles) -> Self {
        Self {
            file: source_files.filename(source.key).to_string(),
            line: source.location.line as i32,
            column: source.location.column as i32,
        }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}
