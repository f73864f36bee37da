//! # Processors
//!
//! The parsed, not yet evaluated, form of the lines of a list-file. A file
//! is parsed once into a `ListFileProcessor`; evaluating it produces
//! `ResultItem`s through `core::result_items`.

use crate::{
    core::{
        environment::Environment,
        errors::InterpreterError,
        line_parser::{ListFileParser, ParsingSettings},
        lines_source::LinesSource,
        matcher::Matcher,
        result_items::ResultItems,
        tags::TagsIncludePolicy,
    },
    models::SourceReference,
};
use std::{cell::OnceCell, path::Path, rc::Rc};

/// What a TAGS instruction does when it is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagsOperation {
    Add(Vec<String>),
    /// An empty list removes every tag.
    Remove(Vec<String>),
    Set(Vec<String>),
    Push,
    Pop,
    Print { prefix: String, suffix: String },
    PrintStack { prefix: String, suffix: String },
}

/// Settings of a LIST or FIND instruction, ready for use.
#[derive(Debug, Clone)]
pub struct FileSetSettings {
    /// Relative to the list-file (or absolute).
    pub directory: String,
    pub matcher: Matcher,
    pub sort: bool,
    /// FIND descends into sub directories, LIST does not.
    pub recursive: bool,
}

#[derive(Debug)]
pub enum Processor {
    Print {
        origin: SourceReference,
        text: String,
    },
    Shell {
        origin: SourceReference,
        command_line: String,
    },
    FilePath {
        origin: SourceReference,
        path: String,
    },
    FileSet {
        origin: SourceReference,
        settings: FileSetSettings,
    },
    Include(IncludeProcessor),
    Tags {
        origin: SourceReference,
        operation: TagsOperation,
    },
}

impl Processor {
    pub fn origin(&self) -> &SourceReference {
        match self {
            Self::Print { origin, .. }
            | Self::Shell { origin, .. }
            | Self::FilePath { origin, .. }
            | Self::FileSet { origin, .. }
            | Self::Tags { origin, .. } => origin,
            Self::Include(include) => &include.origin,
        }
    }
}

/// The Processors of a single list-file, in file order.
#[derive(Debug)]
pub struct ListFileProcessor {
    /// As used to open the file: relative to the current directory of the process.
    pub file_name: String,
    /// As written in the INCLUDE instruction. Same as `file_name` for a top-level file.
    pub file_name_relative_including_file: String,
    pub processors: Vec<Processor>,
}

impl ListFileProcessor {
    /// A single-pass, lazy sequence of the items of this file.
    pub fn result_items<'a>(
        &'a self,
        settings: &'a ParsingSettings,
        env: Rc<Environment>,
    ) -> ResultItems<'a> {
        ResultItems::new(&self.processors, settings, env)
    }

    /// The INCLUDE Processors of this file, in file order.
    pub fn includes(&self) -> impl Iterator<Item = &IncludeProcessor> {
        self.processors.iter().filter_map(|processor| match processor {
            Processor::Include(include) => Some(include),
            _ => None,
        })
    }
}

/// An included file, parsed, together with the environment it is evaluated in.
#[derive(Debug)]
pub struct ResolvedInclude {
    pub file: ListFileProcessor,
    pub env: Rc<Environment>,
}

#[derive(Debug)]
pub struct IncludeProcessor {
    origin: SourceReference,
    file_name: String,
    preserve_current_directory: bool,
    policy: TagsIncludePolicy,
    resolved: OnceCell<ResolvedInclude>,
}

impl IncludeProcessor {
    pub fn new(
        origin: SourceReference,
        file_name: impl Into<String>,
        preserve_current_directory: bool,
        policy: TagsIncludePolicy,
    ) -> Self {
        Self {
            origin,
            file_name: file_name.into(),
            preserve_current_directory,
            policy,
            resolved: OnceCell::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Parses the included file on first call, deriving its environment from
    /// `env`. Later calls return the same result, whatever `env` is given.
    pub fn resolve(
        &self,
        settings: &ParsingSettings,
        env: &Environment,
    ) -> Result<&ResolvedInclude, InterpreterError> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }

        // Deriving the environment may rebind the tags of `env`, so it is
        // done before anything can fail.
        let env_for_file = env.new_for_included_file(
            &self.file_name,
            self.preserve_current_directory,
            self.policy,
        );

        let file_path = env
            .file_refs
            .file_name_relative_current_dir_of_process(&self.file_name);
        if !Path::new(&file_path).is_file() {
            return Err(InterpreterError::MissingFile {
                origin: self.origin.clone(),
                path: file_path,
            });
        }

        let lines = LinesSource::IncludedFile {
            path: &file_path,
            origin: &self.origin,
        }
        .read_lines(settings.preprocessor())?;

        let file = ListFileParser::for_included_file(
            settings,
            self.origin.as_include_file_chain(),
            &self.file_name,
            &file_path,
        )
        .apply(lines)?;
        log::debug!(
            "Included '{}' with {} processors",
            file.file_name,
            file.processors.len()
        );

        Ok(self.resolved.get_or_init(|| ResolvedInclude {
            file,
            env: Rc::new(env_for_file),
        }))
    }
}
