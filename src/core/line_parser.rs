//! # Line Parser
//!
//! Turns the lines of a list-file into Processors. Each line is offered to
//! a fixed sequence of line parsers; the first that accepts it decides what
//! the line means:
//!
//! 1. blank lines and `#` comments are ignored,
//! 2. `<prefix><NAME> <arguments>` is an instruction,
//! 3. anything else is a file path.

use crate::{
    core::{
        errors::InterpreterError,
        instructions,
        processor::{ListFileProcessor, Processor},
    },
    models::{IncludeFileChain, SourceLineInFile, SourceReference},
};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

lazy_static! {
    static ref IGNORED_LINE_RE: Regex = Regex::new(r"^\s*(#.*)?$").unwrap();
}

/// Tells if a line is blank or a comment.
pub fn is_ignored_line(line: &str) -> bool {
    IGNORED_LINE_RE.is_match(line)
}

#[derive(Debug, Clone)]
pub enum LineParser {
    IgnoredLine,
    /// Captures the instruction name and the rest of the line.
    Instruction(Regex),
    /// Accepts every line.
    FilePath,
}

impl LineParser {
    /// The prefix is matched literally.
    pub fn for_instruction_prefix(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r"^{}(\w+)\s*(.*)", regex::escape(prefix));
        Ok(Self::Instruction(Regex::new(&pattern)?))
    }

    /// `None` if this parser does not apply to the line.
    pub fn parse(
        &self,
        origin: &SourceReference,
        line: &str,
    ) -> Result<Option<Vec<Processor>>, InterpreterError> {
        match self {
            Self::IgnoredLine => Ok(is_ignored_line(line).then(Vec::new)),
            Self::FilePath => Ok(Some(vec![Processor::FilePath {
                origin: origin.clone(),
                path: line.to_string(),
            }])),
            Self::Instruction(regex) => {
                let Some(captures) = regex.captures(line) else {
                    return Ok(None);
                };
                let name = captures.get(1).map_or("", |m| m.as_str());
                let argument = captures.get(2).map_or("", |m| m.as_str());

                let definition = instructions::find_instruction(&name.to_uppercase()).ok_or_else(
                    || InterpreterError::UnknownInstruction {
                        origin: origin.clone(),
                        name: name.to_string(),
                    },
                )?;

                definition
                    .parse(origin, argument)
                    .map(Some)
                    .map_err(|lines| InterpreterError::InvalidArguments {
                        origin: origin.clone(),
                        lines,
                    })
            }
        }
    }
}

/// Settings shared by the parsing of every list-file of a run.
#[derive(Debug, Clone)]
pub struct ParsingSettings {
    line_parsers: Vec<LineParser>,
    preprocessor: Option<String>,
}

impl ParsingSettings {
    pub fn new(line_parsers: Vec<LineParser>, preprocessor: Option<String>) -> Self {
        Self {
            line_parsers,
            preprocessor,
        }
    }

    /// The standard parsers: ignored lines, instructions, file paths.
    pub fn for_instruction_prefix(
        instruction_prefix: &str,
        preprocessor: Option<String>,
    ) -> Result<Self, regex::Error> {
        let line_parsers = vec![
            LineParser::IgnoredLine,
            LineParser::for_instruction_prefix(instruction_prefix)?,
            LineParser::FilePath,
        ];
        Ok(Self::new(line_parsers, preprocessor))
    }

    pub fn preprocessor(&self) -> Option<&str> {
        self.preprocessor.as_deref()
    }
}

/// Parses the lines of one list-file.
#[derive(Debug)]
pub struct ListFileParser<'a> {
    settings: &'a ParsingSettings,
    includes: Arc<IncludeFileChain>,
    file_name_relative_including_file: String,
    file_name: String,
}

impl<'a> ListFileParser<'a> {
    pub fn for_top_level(settings: &'a ParsingSettings, file_name: &str) -> Self {
        Self::for_included_file(
            settings,
            IncludeFileChain::new_for_top_level_file(),
            file_name,
            file_name,
        )
    }

    pub fn for_included_file(
        settings: &'a ParsingSettings,
        includes: IncludeFileChain,
        file_name_relative_including_file: &str,
        file_name: &str,
    ) -> Self {
        Self {
            settings,
            includes: Arc::new(includes),
            file_name_relative_including_file: file_name_relative_including_file.to_string(),
            file_name: file_name.to_string(),
        }
    }

    pub fn apply(self, lines: Vec<String>) -> Result<ListFileProcessor, InterpreterError> {
        let mut processors = Vec::new();

        for (index, line) in lines.into_iter().enumerate() {
            let origin = SourceReference::new(
                Arc::clone(&self.includes),
                SourceLineInFile::new(&self.file_name, index + 1, line),
            );
            processors.extend(self.processors_for_line(&origin)?);
        }

        Ok(ListFileProcessor {
            file_name: self.file_name,
            file_name_relative_including_file: self.file_name_relative_including_file,
            processors,
        })
    }

    fn processors_for_line(&self, origin: &SourceReference) -> Result<Vec<Processor>, InterpreterError> {
        let line = origin.source_line.contents.as_str();
        for line_parser in &self.settings.line_parsers {
            if let Some(processors) = line_parser.parse(origin, line)? {
                return Ok(processors);
            }
        }
        Err(InterpreterError::InvalidLine {
            origin: origin.clone(),
        })
    }
}
