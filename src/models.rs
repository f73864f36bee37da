// src/models.rs

use crate::core::{paths, tags::TagSet};
use std::sync::Arc;

// --- SOURCE POSITIONS ---
// Used only for diagnostics: every Processor remembers the line it came from
// and the chain of INCLUDE lines that led to that file.

/// A physical line of a list-file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLineInFile {
    pub file_name: String,
    /// 1-based.
    pub line_number: usize,
    pub contents: String,
}

impl SourceLineInFile {
    pub fn new(file_name: &str, line_number: usize, contents: impl Into<String>) -> Self {
        Self {
            file_name: paths::normalize_path(file_name),
            line_number,
            contents: contents.into(),
        }
    }
}

/// The INCLUDE lines that lead to a file, top-level file first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeFileChain {
    files: Vec<SourceLineInFile>,
}

impl IncludeFileChain {
    pub fn new_for_top_level_file() -> Self {
        Self::default()
    }

    /// Returns a new chain, leaving `self` untouched.
    pub fn new_include(&self, source_line: SourceLineInFile) -> Self {
        let mut files = self.files.clone();
        files.push(source_line);
        Self { files }
    }

    pub fn from_top_to_bottom(&self) -> &[SourceLineInFile] {
        &self.files
    }
}

/// The line of an instruction together with the include chain of its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    pub includes: Arc<IncludeFileChain>,
    pub source_line: SourceLineInFile,
}

impl SourceReference {
    pub fn new(includes: Arc<IncludeFileChain>, source_line: SourceLineInFile) -> Self {
        Self {
            includes,
            source_line,
        }
    }

    /// The chain that an error at this line, or a file included from it, reports.
    pub fn as_include_file_chain(&self) -> IncludeFileChain {
        self.includes.new_include(self.source_line.clone())
    }
}

// --- RESULT ITEMS ---

/// A fully resolved unit of output, produced by evaluating a Processor.
///
/// File paths are relative to the top-level list-file. How they are finally
/// printed is decided by the rendition layer (`core::rendition`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultItem {
    Print(String),
    FilePath {
        path: String,
        tags: TagSet,
        exists: bool,
    },
    TagsPrint {
        tags: TagSet,
        prefix: String,
        suffix: String,
    },
    /// `stack` is ordered from the most recently pushed set.
    TagsPrintStack {
        stack: Vec<TagSet>,
        prefix: String,
        suffix: String,
    },
}

impl ResultItem {
    pub fn is_file_path(&self) -> bool {
        matches!(self, Self::FilePath { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_chain_is_extended_without_mutating_the_parent() {
        let top = IncludeFileChain::new_for_top_level_file();
        let line = SourceLineInFile::new("dir/./top.lst", 3, "@INCLUDE sub/x.lst");

        let child = top.new_include(line.clone());

        assert!(top.from_top_to_bottom().is_empty());
        assert_eq!(child.from_top_to_bottom(), &[line]);
        assert_eq!(child.from_top_to_bottom()[0].file_name, "dir/top.lst");
    }

    #[test]
    fn test_source_reference_chain_ends_with_own_line() {
        let first = SourceLineInFile::new("top.lst", 1, "@I a.lst");
        let includes = Arc::new(IncludeFileChain::new_for_top_level_file().new_include(first));
        let own = SourceLineInFile::new("a.lst", 7, "missing.txt");
        let reference = SourceReference::new(includes, own.clone());

        let chain = reference.as_include_file_chain();
        let files = chain.from_top_to_bottom();

        assert_eq!(files.len(), 2);
        assert_eq!(files[1], own);
    }
}
