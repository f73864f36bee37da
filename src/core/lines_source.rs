// src/core/lines_source.rs

use crate::{
    constants::COMMAND_LINE_ARGUMENT_FOR_STDIN, core::errors::InterpreterError, models::SourceReference,
    system::executor,
};
use std::{
    fs,
    io::{self, Read},
    process::Stdio,
};

/// Where the lines of a list-file come from.
#[derive(Debug, Clone, Copy)]
pub enum LinesSource<'a> {
    Stdin,
    /// A list-file given on the command line.
    TopLevelFile(&'a str),
    /// A list-file named by the INCLUDE instruction at `origin`.
    IncludedFile {
        path: &'a str,
        origin: &'a SourceReference,
    },
}

impl LinesSource<'_> {
    /// Reads every line, optionally passing the contents through a
    /// preprocessor shell command first.
    ///
    /// The file is read completely and closed before this returns, so that
    /// at most one list-file is open at a time however deep includes nest.
    /// Trailing whitespace is removed from each line.
    pub fn read_lines(&self, preprocessor: Option<&str>) -> Result<Vec<String>, InterpreterError> {
        let (path, origin) = match *self {
            Self::Stdin => return read_stream(io::stdin(), preprocessor),
            Self::TopLevelFile(path) => (path, None),
            Self::IncludedFile { path, origin } => (path, Some(origin)),
        };
        let open_error = |error: io::Error| match origin {
            Some(origin) => InterpreterError::MissingFile {
                origin: origin.clone(),
                path: path.to_string(),
            },
            None => InterpreterError::CannotOpenFile {
                path: path.to_string(),
                error,
            },
        };

        let text = match preprocessor {
            Some(command) => {
                let file = fs::File::open(path).map_err(open_error)?;
                executor::execute_with_stdin(command, Stdio::from(file)).map_err(InterpreterError::Preprocessor)?
            }
            None => String::from_utf8_lossy(&fs::read(path).map_err(open_error)?).into_owned(),
        };
        Ok(split_lines(&text))
    }
}

/// The lines of a list-file read from a stream rather than a named file.
fn read_stream<R>(mut reader: R, preprocessor: Option<&str>) -> Result<Vec<String>, InterpreterError>
where
    R: Read + Send + 'static,
{
    let text = match preprocessor {
        Some(command) => {
            executor::execute_with_input(command, reader).map_err(InterpreterError::Preprocessor)?
        }
        None => {
            let mut contents = Vec::new();
            reader
                .read_to_end(&mut contents)
                .map_err(|error| InterpreterError::CannotOpenFile {
                    path: COMMAND_LINE_ARGUMENT_FOR_STDIN.to_string(),
                    error,
                })?;
            String::from_utf8_lossy(&contents).into_owned()
        }
    };
    Ok(split_lines(&text))
}

/// Splits at `\r\n`, `\n` and a lone `\r`, and right-trims each line.
/// A terminator at the very end does not start another line.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
        lines.push(rest[..end].trim_end().to_string());
        let after = &rest[end..];
        rest = after
            .strip_prefix("\r\n")
            .or_else(|| after.strip_prefix('\r'))
            .or_else(|| after.strip_prefix('\n'))
            .unwrap_or(after);
    }
    lines
}
