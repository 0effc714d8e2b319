use crate::source_files::{Source, SourceFiles, SourceLocation};
use append_only_vec::AppendOnlyVec;
use colored::Colorize;
use std::fmt::Display;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagnosticLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub column_end: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<DiagnosticLocation>,
    pub code_line: Option<String>,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{}:{}:{}: ", location.file, location.line, location.column)?;
        }

        let severity = format!("{}: ", self.severity);

        match self.severity {
            Severity::Error => write!(f, "{}", severity.bright_red())?,
            Severity::Warning => write!(f, "{}", severity.yellow())?,
            Severity::Note => write!(f, "{}", severity.bright_black())?,
        }

        write!(f, "{}", self.message)?;

        if let Some(code_line) = &self.code_line {
            write!(f, "\n  {}", code_line.trim_end())?;
        }

        Ok(())
    }
}

/// Where a diagnostic points. In-module constructs carry a [`Source`];
/// symbols imported from a dependency interface only have a
/// [`SourceLocation`] left.
#[derive(Clone, Debug)]
pub enum DiagnosticSite {
    Internal(Source),
    External(SourceLocation),
}

impl From<Source> for DiagnosticSite {
    fn from(source: Source) -> Self {
        Self::Internal(source)
    }
}

impl From<SourceLocation> for DiagnosticSite {
    fn from(location: SourceLocation) -> Self {
        Self::External(location)
    }
}

impl From<&SourceLocation> for DiagnosticSite {
    fn from(location: &SourceLocation) -> Self {
        Self::External(location.clone())
    }
}

pub struct Diagnostics<'a> {
    source_files: &'a SourceFiles,
    collected: AppendOnlyVec<Diagnostic>,
}

impl<'a> std::fmt::Debug for Diagnostics<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

impl<'a> Diagnostics<'a> {
    pub fn new(source_files: &'a SourceFiles) -> Self {
        Self {
            source_files,
            collected: AppendOnlyVec::new(),
        }
    }

    pub fn source_files(&self) -> &'a SourceFiles {
        self.source_files
    }

    pub fn error(&self, site: impl Into<DiagnosticSite>, message: impl Display) {
        self.diagnose(Severity::Error, site, message);
    }

    pub fn warning(&self, site: impl Into<DiagnosticSite>, message: impl Display) {
        self.diagnose(Severity::Warning, site, message);
    }

    pub fn note(&self, site: impl Into<DiagnosticSite>, message: impl Display) {
        self.diagnose(Severity::Note, site, message);
    }

    /// Records an error unless `condition` holds. Returns `condition` so
    /// callers can keep analysing the happy path.
    pub fn check(
        &self,
        condition: bool,
        site: impl Into<DiagnosticSite>,
        message: impl Display,
    ) -> bool {
        if !condition {
            self.error(site, message);
        }
        condition
    }

    pub fn diagnose(
        &self,
        severity: Severity,
        site: impl Into<DiagnosticSite>,
        message: impl Display,
    ) {
        let (location, code_line) = match site.into() {
            DiagnosticSite::Internal(source) => (
                Some(DiagnosticLocation {
                    file: self.source_files.filename(source.key).to_string(),
                    line: source.location.line,
                    column: source.location.column,
                    column_end: None,
                }),
                self.source_files
                    .line_text(source.key, source.location.line)
                    .map(str::to_string),
            ),
            DiagnosticSite::External(location) => (
                Some(DiagnosticLocation {
                    file: location.file,
                    line: location.line as usize,
                    column: location.column as usize,
                    column_end: None,
                }),
                None,
            ),
        };

        self.push(Diagnostic {
            severity,
            message: message.to_string(),
            location,
            code_line,
        });
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.collected.push(diagnostic);
    }

    pub fn extend_from(&self, other: &Diagnostics) {
        for diagnostic in other.iter() {
            self.push(diagnostic.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        (0..self.collected.len()).map(|index| &self.collected[index])
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.len() == 0
    }

    pub fn has_errors(&self) -> bool {
        self.iter()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    pub fn to_vec(&self) -> Vec<Diagnostic> {
        self.iter().cloned().collect()
    }
}
