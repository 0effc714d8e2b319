mod file;
mod source;

use append_only_vec::AppendOnlyVec;
pub use file::SourceFile;
pub use source::{Source, SourceLocation};
use std::path::PathBuf;

#[derive(Debug)]
pub struct SourceFiles {
    files: AppendOnlyVec<SourceFile>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceFileKey {
    index: u32,
}

impl SourceFiles {
    pub const INTERNAL_KEY: SourceFileKey = SourceFileKey { index: 0 };

    pub fn new() -> Self {
        let files = AppendOnlyVec::new();

        assert_eq!(
            files.push(SourceFile::new("<internal>".into(), "".into())),
            0
        );

        Self { files }
    }

    pub fn get(&self, key: SourceFileKey) -> &SourceFile {
        &self.files[key.index as usize]
    }

    pub fn add(&self, filename: PathBuf, content: String) -> SourceFileKey {
        let index = self.files.push(SourceFile::new(filename, content));

        SourceFileKey {
            index: index.try_into().unwrap(),
        }
    }

    pub fn filename(&self, key: SourceFileKey) -> &str {
        self.get(key).filename()
    }

    // 1-based, matching Location
    pub fn line_text(&self, key: SourceFileKey, line: usize) -> Option<&str> {
        self.get(key)
            .content()
            .lines()
            .nth(line.checked_sub(1)?)
    }
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self::new()
    }
}
