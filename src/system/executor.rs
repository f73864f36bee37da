// src/system/executor.rs

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command as StdCommand, Output, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' exited with a non-zero error code.")]
    NonZeroExitStatus {
        command: String,
        /// `None` if the process was terminated by a signal.
        code: Option<i32>,
        output: String,
    },
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl ExecutionError {
    /// The lines that describe a failed command in a diagnostic:
    /// `<headline>`, the exit code, and any captured output.
    pub fn describe(&self, headline: &str, output_header: &str) -> Vec<String> {
        match self {
            Self::NonZeroExitStatus { code, output, .. } => {
                let code = code.map_or_else(|| "none".to_string(), |code| code.to_string());
                let mut lines = vec![headline.to_string(), format!("Command exit code: {}", code)];
                if !output.is_empty() {
                    lines.push(output_header.to_string());
                    lines.push(output.clone());
                }
                lines
            }
            other => vec![headline.to_string(), other.to_string()],
        }
    }
}

/// Builds a command that runs `command_line` through the platform's shell.
fn shell_command(command_line: &str) -> StdCommand {
    if cfg!(target_os = "windows") {
        let mut command = StdCommand::new("cmd");
        command.arg("/C").arg(command_line);
        command
    } else {
        let mut command = StdCommand::new("sh");
        command.arg("-c").arg(command_line);
        command
    }
}

fn stdout_of(command_line: &str, output: Output) -> Result<String, ExecutionError> {
    let stdout = String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: command_line.to_string(),
        source: e,
    })?;

    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: command_line.to_string(),
            code: output.status.code(),
            output: stdout,
        });
    }
    Ok(stdout)
}

/// Executes a shell command line in `cwd` and captures its standard output.
/// Stderr is passed through to the user's terminal.
/// NOTE: This operation is blocking, with no timeout.
pub fn execute_and_capture_output(command_line: &str, cwd: &Path) -> Result<String, ExecutionError> {
    let trimmed_command = command_line.trim();
    if trimmed_command.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let clean_cwd = dunce::simplified(cwd);
    log::debug!("Running shell command '{}' in '{}'", trimmed_command, clean_cwd.display());

    let command_output = shell_command(trimmed_command)
        .current_dir(clean_cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;

    stdout_of(trimmed_command, command_output)
}

fn spawn_with_stdin(command_line: &str, stdin: Stdio) -> Result<Child, ExecutionError> {
    log::debug!("Running preprocessor '{}'", command_line);
    shell_command(command_line)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(command_line.to_string(), e))
}

/// Runs a shell command with `stdin` as its standard input, typically an
/// open file, and captures its standard output.
pub fn execute_with_stdin(command_line: &str, stdin: Stdio) -> Result<String, ExecutionError> {
    let trimmed_command = command_line.trim();
    if trimmed_command.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let command_output = spawn_with_stdin(trimmed_command, stdin)?
        .wait_with_output()
        .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;

    stdout_of(trimmed_command, command_output)
}

/// Feeds everything read from `input` to a shell command and captures its
/// standard output.
///
/// `input` is copied on a separate thread while stdout is drained here, so a
/// command that writes as it reads never blocks on a full pipe.
pub fn execute_with_input<R>(command_line: &str, mut input: R) -> Result<String, ExecutionError>
where
    R: Read + Send + 'static,
{
    let trimmed_command = command_line.trim();
    if trimmed_command.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }

    let mut child = spawn_with_stdin(trimmed_command, Stdio::piped())?;
    let writer = child
        .stdin
        .take()
        .map(|mut stdin| thread::spawn(move || io::copy(&mut input, &mut stdin).map(|_| ())));

    let command_output = child
        .wait_with_output()
        .map_err(|e| ExecutionError::CommandFailed(trimmed_command.to_string(), e))?;

    if let Some(writer) = writer {
        match writer.join() {
            // A command that exits without reading its input closes the pipe early.
            Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(ExecutionError::CommandFailed(trimmed_command.to_string(), e));
            }
            Ok(_) => {}
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    stdout_of(trimmed_command, command_output)
}
