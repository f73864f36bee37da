// src/core/errors.rs

use crate::{
    constants::{
        ERROR_MESSAGE_INDENT, EXIT_FILE_DOES_NOT_EXIST, EXIT_INVALID_ARGUMENTS,
        EXIT_PRE_PROCESSING, EXIT_SHELL_COMMAND_EXECUTION_ERROR, EXIT_SYNTAX, EXIT_TAGS_ERROR,
        EXIT_USAGE,
    },
    models::SourceReference,
    system::executor::ExecutionError,
};
use thiserror::Error;

/// A fatal condition that aborts the whole run.
///
/// Variants with an `origin` are attributed to a line of a list-file and are
/// rendered together with the include chain that led to that line.
#[derive(Error, Debug)]
pub enum InterpreterError {
    #[error("Invalid input line, cannot find instruction:")]
    InvalidLine { origin: SourceReference },

    #[error("Invalid instruction name `{name}'")]
    UnknownInstruction { origin: SourceReference, name: String },

    #[error("{}", .lines.join("\n"))]
    InvalidArguments {
        origin: SourceReference,
        lines: Vec<String>,
    },

    #[error("File does not exist: `{path}'")]
    MissingFile { origin: SourceReference, path: String },

    #[error("Shell command failed.")]
    ShellCommand {
        origin: SourceReference,
        #[source]
        error: ExecutionError,
    },

    #[error("Pop of tags from empty stack.")]
    TagsStackUnderflow { origin: SourceReference },

    #[error("Preprocessor failed.")]
    Preprocessor(#[source] ExecutionError),

    #[error("Cannot open file: \"{path}\"")]
    CannotOpenFile {
        path: String,
        #[source]
        error: std::io::Error,
    },

    #[error("{0}")]
    Usage(String),
}

impl InterpreterError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidLine { .. }
            | Self::UnknownInstruction { .. }
            | Self::InvalidArguments { .. } => EXIT_SYNTAX,
            Self::MissingFile { .. } => EXIT_FILE_DOES_NOT_EXIST,
            Self::ShellCommand { .. } => EXIT_SHELL_COMMAND_EXECUTION_ERROR,
            Self::TagsStackUnderflow { .. } => EXIT_TAGS_ERROR,
            Self::Preprocessor(_) => EXIT_PRE_PROCESSING,
            Self::CannotOpenFile { .. } => EXIT_INVALID_ARGUMENTS,
            Self::Usage(_) => EXIT_USAGE,
        }
    }

    pub fn origin(&self) -> Option<&SourceReference> {
        match self {
            Self::InvalidLine { origin }
            | Self::UnknownInstruction { origin, .. }
            | Self::InvalidArguments { origin, .. }
            | Self::MissingFile { origin, .. }
            | Self::ShellCommand { origin, .. }
            | Self::TagsStackUnderflow { origin } => Some(origin),
            Self::Preprocessor(_) | Self::CannotOpenFile { .. } | Self::Usage(_) => None,
        }
    }

    /// The full diagnostic, as printed on stderr. Ends with a newline.
    ///
    /// ```text
    /// File "top.lst", line 3
    ///   `@INCLUDE sub/a.lst'
    ///
    /// File "sub/a.lst", line 1
    ///   `@TAGS POP'
    ///
    /// Pop of tags from empty stack.
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();

        if let Some(origin) = self.origin() {
            for line in origin.as_include_file_chain().from_top_to_bottom() {
                out.push_str(&format!(
                    "File \"{}\", line {}\n{}`{}'\n\n",
                    line.file_name, line.line_number, ERROR_MESSAGE_INDENT, line.contents
                ));
            }
        }

        for line in self.description_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    fn description_lines(&self) -> Vec<String> {
        match self {
            Self::ShellCommand { error, .. } => {
                error.describe("Shell command failed.", "Output from command:")
            }
            Self::Preprocessor(error) => {
                error.describe("Preprocessor failed.", "Output from preprocessor:")
            }
            Self::CannotOpenFile { .. } | Self::Usage(_) => {
                vec![format!("{}: {}", env!("CARGO_PKG_NAME"), self)]
            }
            other => vec![other.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncludeFileChain, SourceLineInFile};
    use std::sync::Arc;

    fn origin_in_included_file() -> SourceReference {
        let include_line = SourceLineInFile::new("top.lst", 3, "@INCLUDE sub/a.lst");
        let chain = IncludeFileChain::new_for_top_level_file().new_include(include_line);
        SourceReference::new(Arc::new(chain), SourceLineInFile::new("sub/a.lst", 1, "@TAGS POP"))
    }

    #[test]
    fn test_render_lists_include_chain_top_first() {
        let err = InterpreterError::TagsStackUnderflow {
            origin: origin_in_included_file(),
        };

        let expected = "File \"top.lst\", line 3\n  `@INCLUDE sub/a.lst'\n\n\
                        File \"sub/a.lst\", line 1\n  `@TAGS POP'\n\n\
                        Pop of tags from empty stack.\n";
        assert_eq!(err.render(), expected);
        assert_eq!(err.exit_code(), EXIT_TAGS_ERROR);
    }

    #[test]
    fn test_exit_codes() {
        let origin = origin_in_included_file();
        let cases = [
            (
                InterpreterError::UnknownInstruction {
                    origin: origin.clone(),
                    name: "BOGUS".to_string(),
                },
                4,
            ),
            (
                InterpreterError::MissingFile {
                    origin: origin.clone(),
                    path: "x".to_string(),
                },
                8,
            ),
            (
                InterpreterError::ShellCommand {
                    origin,
                    error: ExecutionError::EmptyCommand,
                },
                9,
            ),
            (InterpreterError::Usage("bad".to_string()), 2),
            (InterpreterError::Preprocessor(ExecutionError::EmptyCommand), 5),
        ];
        for (err, code) in cases {
            assert_eq!(err.exit_code(), code, "{:?}", err);
        }
    }

    #[test]
    fn test_shell_error_reports_exit_code_and_output() {
        let err = InterpreterError::ShellCommand {
            origin: origin_in_included_file(),
            error: ExecutionError::NonZeroExitStatus {
                command: "false".to_string(),
                code: Some(1),
                output: String::new(),
            },
        };
        assert!(err.render().ends_with("Shell command failed.\nCommand exit code: 1\n"));
    }

    #[test]
    fn test_errors_without_origin_have_no_chain() {
        let err = InterpreterError::Usage("The instruction prefix may not match as a comment line.".to_string());
        assert_eq!(
            err.render(),
            "filelist: The instruction prefix may not match as a comment line.\n"
        );
    }

    #[test]
    fn test_argument_errors_keep_all_lines() {
        let err = InterpreterError::InvalidArguments {
            origin: origin_in_included_file(),
            lines: vec!["first".to_string(), "second".to_string()],
        };
        assert!(err.render().ends_with("first\nsecond\n"));
    }
}
