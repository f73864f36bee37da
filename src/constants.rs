// src/constants.rs

/// Exit code for an invalid combination of command-line options.
pub const EXIT_USAGE: i32 = 2;

/// Exit code for a list-file argument that cannot be opened.
pub const EXIT_INVALID_ARGUMENTS: i32 = 3;

/// Exit code for a line or instruction syntax error in a list-file.
pub const EXIT_SYNTAX: i32 = 4;

/// Exit code for a failing preprocessor command.
pub const EXIT_PRE_PROCESSING: i32 = 5;

/// Exit code for a referenced file or directory that does not exist.
pub const EXIT_FILE_DOES_NOT_EXIST: i32 = 8;

/// Exit code for a SHELL instruction whose command fails.
pub const EXIT_SHELL_COMMAND_EXECUTION_ERROR: i32 = 9;

/// Exit code for a POP of an empty tags stack.
pub const EXIT_TAGS_ERROR: i32 = 10;

/// The prefix that marks a line as an instruction, unless configured otherwise.
pub const DEFAULT_INSTRUCTION_PREFIX: &str = "@";

/// The file argument that means "read the list-file from stdin".
pub const COMMAND_LINE_ARGUMENT_FOR_STDIN: &str = "-";

/// Separates rendered tags from the path they belong to.
pub const TAGS_AND_PATH_SEPARATOR: &str = ":";

/// Indentation of quoted source lines in error messages.
pub const ERROR_MESSAGE_INDENT: &str = "  ";

/// Name of the settings file inside the user config directory (`~/.config/filelist/`).
pub const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable that points at an explicit settings file.
pub const CONFIG_PATH_ENV_VAR: &str = "FILELIST_CONFIG";
