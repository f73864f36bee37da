//! # File Matchers
//!
//! Composable predicates over directory entries, used by LIST and FIND.
//!
//! Name predicates only ever look at the base name of an entry. The type
//! predicate needs the entry's metadata, which is fetched at most once per
//! entry and only if some type predicate actually asks for it.

use regex::Regex;
use std::{cell::OnceCell, fs, path::PathBuf, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("Invalid wildcard: `{0}'")]
    InvalidWildcard(String),
    #[error("Invalid regular expression: `{0}'")]
    InvalidRegex(String),
    #[error("Invalid file type: `{0}'\nValid types are f, d.")]
    InvalidFileType(String),
}

/// A directory entry that is tested by matchers.
#[derive(Debug)]
pub struct FileMatchInfo {
    path: PathBuf,
    base_name: String,
    metadata: OnceCell<Option<fs::Metadata>>,
}

impl FileMatchInfo {
    /// `path` must be usable from the current directory of the process.
    pub fn new(path: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            base_name: base_name.into(),
            metadata: OnceCell::new(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Symbolic links are followed. `None` if the entry cannot be stat:ed.
    fn metadata(&self) -> Option<&fs::Metadata> {
        self.metadata
            .get_or_init(|| fs::metadata(&self.path).ok())
            .as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    RegularFile,
    Directory,
}

impl FromStr for FileType {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f" => Ok(Self::RegularFile),
            "d" => Ok(Self::Directory),
            other => Err(MatcherError::InvalidFileType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Matcher {
    Constant(bool),
    /// Anchored at both ends.
    Wildcard(Regex),
    /// Matches if found anywhere in the base name.
    Regex(Regex),
    FileType(FileType),
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
    Not(Box<Matcher>),
}

impl Matcher {
    pub fn wildcard(pattern: &str) -> Result<Self, MatcherError> {
        Regex::new(&wildcard_to_regex(pattern))
            .map(Self::Wildcard)
            .map_err(|_| MatcherError::InvalidWildcard(pattern.to_string()))
    }

    pub fn regex(pattern: &str) -> Result<Self, MatcherError> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|_| MatcherError::InvalidRegex(pattern.to_string()))
    }

    /// An empty list is always true.
    pub fn and(mut matchers: Vec<Matcher>) -> Self {
        match matchers.len() {
            0 => Self::Constant(true),
            1 => matchers.remove(0),
            _ => Self::And(matchers),
        }
    }

    /// An empty list is always false.
    pub fn or(mut matchers: Vec<Matcher>) -> Self {
        match matchers.len() {
            0 => Self::Constant(false),
            1 => matchers.remove(0),
            _ => Self::Or(matchers),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(matcher: Matcher) -> Self {
        Self::Not(Box::new(matcher))
    }

    pub fn matches(&self, file: &FileMatchInfo) -> bool {
        match self {
            Self::Constant(value) => *value,
            Self::Wildcard(regex) => regex.is_match(file.base_name()),
            Self::Regex(regex) => regex.is_match(file.base_name()),
            Self::FileType(FileType::RegularFile) => file.metadata().is_some_and(|m| m.is_file()),
            Self::FileType(FileType::Directory) => file.metadata().is_some_and(|m| m.is_dir()),
            Self::And(matchers) => matchers.iter().all(|m| m.matches(file)),
            Self::Or(matchers) => matchers.iter().any(|m| m.matches(file)),
            Self::Not(matcher) => !matcher.matches(file),
        }
    }
}

/// The filters of a LIST or FIND instruction, before compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSetFilters {
    pub types: Vec<String>,
    pub patterns: Vec<String>,
    pub regexes: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub exclude_regexes: Vec<String>,
}

impl FileSetFilters {
    /// Compiles to `or(types) AND or(names) AND NOT or(excludes)`.
    /// A group with no inputs puts no constraint on entries.
    pub fn compile(&self) -> Result<Matcher, MatcherError> {
        let mut conjuncts = Vec::new();

        let types = self
            .types
            .iter()
            .map(|t| t.parse::<FileType>().map(Matcher::FileType))
            .collect::<Result<Vec<_>, _>>()?;
        if !types.is_empty() {
            conjuncts.push(Matcher::or(types));
        }

        let names = name_matchers(&self.patterns, &self.regexes)?;
        if !names.is_empty() {
            conjuncts.push(Matcher::or(names));
        }

        let excludes = name_matchers(&self.exclude_patterns, &self.exclude_regexes)?;
        if !excludes.is_empty() {
            conjuncts.push(Matcher::not(Matcher::or(excludes)));
        }

        Ok(Matcher::and(conjuncts))
    }
}

fn name_matchers(wildcards: &[String], regexes: &[String]) -> Result<Vec<Matcher>, MatcherError> {
    let wildcards = wildcards.iter().map(|w| Matcher::wildcard(w));
    let regexes = regexes.iter().map(|r| Matcher::regex(r));
    wildcards.chain(regexes).collect()
}

/// Translates a shell-style wildcard (`*`, `?`, `[abc]`, `[!abc]`) into an
/// anchored regular expression.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut regex = String::from("^(?s:");
    let mut i = 0;

    while let Some(&c) = chars.get(i) {
        i += 1;
        match c {
            '*' => {
                // Consecutive stars mean the same as one.
                while chars.get(i) == Some(&'*') {
                    i += 1;
                }
                regex.push_str(".*");
            }
            '?' => regex.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    regex.push_str(&bracket_class(chars.get(i..end).unwrap_or_default()));
                    i = end + 1;
                }
                None => regex.push_str(r"\["),
            },
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    regex.push_str(")$");
    regex
}

/// The index of the `]` that closes a class whose contents start at `start`.
/// A `]` directly after the opening (or after `[!`) is a literal member.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while let Some(&c) = chars.get(j) {
        if c == ']' {
            return Some(j);
        }
        j += 1;
    }
    None
}

fn bracket_class(contents: &[char]) -> String {
    let mut class = String::from("[");
    let mut members = contents;
    if let Some(('!', rest)) = contents.split_first() {
        class.push('^');
        members = rest;
    }
    for (index, &c) in members.iter().enumerate() {
        match c {
            // Special inside a regex class but literal in a wildcard class.
            '\\' | '[' | ']' | '&' | '~' => {
                class.push('\\');
                class.push(c);
            }
            '^' if index == 0 => class.push_str(r"\^"),
            _ => class.push(c),
        }
    }
    class.push(']');
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn named(base_name: &str) -> FileMatchInfo {
        FileMatchInfo::new(base_name, base_name)
    }

    fn wildcard(pattern: &str) -> Matcher {
        Matcher::wildcard(pattern).unwrap()
    }

    #[test]
    fn test_wildcard_is_anchored() {
        let m = wildcard("*.rs");
        assert!(m.matches(&named("main.rs")));
        assert!(!m.matches(&named("main.rs.bak")));
        assert!(!wildcard("ain").matches(&named("main")));
    }

    #[test]
    fn test_wildcard_constructs() {
        assert!(wildcard("a?c").matches(&named("abc")));
        assert!(!wildcard("a?c").matches(&named("ac")));
        assert!(wildcard("[ab]x").matches(&named("bx")));
        assert!(!wildcard("[!ab]x").matches(&named("bx")));
        assert!(wildcard("[!ab]x").matches(&named("cx")));
        assert!(wildcard("[]]").matches(&named("]")));
        assert!(wildcard("a.b").matches(&named("a.b")));
        assert!(!wildcard("a.b").matches(&named("axb")));
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        let m = wildcard("[abc");
        assert!(m.matches(&named("[abc")));
        assert!(!m.matches(&named("a")));
    }

    #[test]
    fn test_regex_searches_anywhere_in_base_name() {
        let m = Matcher::regex("ai").unwrap();
        assert!(m.matches(&named("main")));
        assert!(!Matcher::regex("^ai").unwrap().matches(&named("main")));
    }

    #[test]
    fn test_invalid_patterns_and_types_are_errors() {
        assert_eq!(
            Matcher::regex("(").unwrap_err(),
            MatcherError::InvalidRegex("(".to_string())
        );
        assert_eq!(
            "x".parse::<FileType>().unwrap_err().to_string(),
            "Invalid file type: `x'\nValid types are f, d."
        );
    }

    #[test]
    fn test_combinator_identities() {
        let file = named("anything");
        assert!(Matcher::and(vec![]).matches(&file));
        assert!(!Matcher::or(vec![]).matches(&file));

        for matcher in [wildcard("any*"), wildcard("x*"), Matcher::Constant(true)] {
            let double_negation = Matcher::not(Matcher::not(matcher.clone()));
            assert_eq!(double_negation.matches(&file), matcher.matches(&file));
        }
    }

    #[test]
    fn test_type_matchers_use_metadata() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("file.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let file = FileMatchInfo::new(dir.path().join("file.txt"), "file.txt");
        let sub = FileMatchInfo::new(dir.path().join("sub"), "sub");
        let missing = FileMatchInfo::new(dir.path().join("missing"), "missing");

        let regular = Matcher::FileType(FileType::RegularFile);
        let directory = Matcher::FileType(FileType::Directory);

        assert!(regular.matches(&file) && !directory.matches(&file));
        assert!(directory.matches(&sub) && !regular.matches(&sub));
        assert!(!regular.matches(&missing) && !directory.matches(&missing));
    }

    #[test]
    fn test_compiled_filters() {
        let filters = FileSetFilters {
            patterns: vec!["*.rs".to_string()],
            regexes: vec!["^Cargo".to_string()],
            exclude_patterns: vec!["test_*".to_string()],
            ..Default::default()
        };
        let m = filters.compile().unwrap();

        assert!(m.matches(&named("lib.rs")));
        assert!(m.matches(&named("Cargo.toml")));
        assert!(!m.matches(&named("test_lib.rs")));
        assert!(!m.matches(&named("README.md")));
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let m = FileSetFilters::default().compile().unwrap();
        assert!(m.matches(&named("whatever")));
    }

    #[test]
    fn test_invalid_type_in_filters() {
        let filters = FileSetFilters {
            types: vec!["f".to_string(), "q".to_string()],
            ..Default::default()
        };
        assert_eq!(
            filters.compile().unwrap_err(),
            MatcherError::InvalidFileType("q".to_string())
        );
    }
}
