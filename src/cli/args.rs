// src/cli/args.rs
use crate::core::{rendition::MissingFileMode, tags::SetOperator};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Prints file paths listed in list-files.
///
/// A list-file lists one path per line. Lines that start with the
/// instruction prefix are instructions: PRINT, SHELL, FIND, LIST, INCLUDE
/// and TAGS. Blank lines and lines starting with `#` are ignored.
#[derive(Parser, Debug, Default)]
#[command(name = "filelist", version, about)]
pub struct Cli {
    /// A list-file. '-' means stdin and can be given at most once.
    /// Paths read from stdin are relative the current directory, unless
    /// --stdin-paths-are-relative is used.
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,

    /// Sets the prefix for lines that contain an instruction (default "@").
    #[arg(long, value_name = "PREFIX", allow_hyphen_values = true)]
    pub instruction_prefix: Option<String>,

    /// How paths that do not correspond to an existing file are handled (default "fail").
    #[arg(short = 'm', long = "missing-file-handling", value_name = "MODE", value_enum)]
    pub missing_file_handling: Option<MissingFileMode>,

    /// Paths are printed relative the location of the FILE argument,
    /// instead of relative the current directory.
    #[arg(short = 'f', long)]
    pub relative_file_argument_location: bool,

    /// Normalizes paths: A//B, A/B/, A/./B and A/foo/../B all become A/B.
    /// May change the meaning of a path that goes through a symbolic link.
    #[arg(short = 'n', long)]
    pub normalize_paths: bool,

    /// Makes paths absolute.
    #[arg(short = 'a', long)]
    pub absolute_paths: bool,

    /// The directory that paths read from stdin are relative to.
    #[arg(long, value_name = "DIR")]
    pub stdin_paths_are_relative: Option<String>,

    /// Suppresses all output other than file paths (PRINT, TAGS PRINT ...).
    #[arg(short = 'S', long)]
    pub suppress_non_path_output: bool,

    /// Prints the tags of each file before it, separated by ":".
    #[arg(short = 't', long)]
    pub prepend_tags: bool,

    /// Prints the tags of each file after it, separated by ":".
    #[arg(short = 'T', long)]
    pub append_tags: bool,

    /// Outputs only the paths whose tags satisfy
    /// `<FILE-TAGS> SET-OPERATOR <SET-OF-TAGS>`. Tags are separated by
    /// whitespace and commas.
    #[arg(short = 'F', long, value_name = "SET-OF-TAGS", allow_hyphen_values = true)]
    pub filter_tags: Option<String>,

    /// The operator of the tags filter (default "contains-any-of").
    #[arg(
        short = 'O',
        long,
        value_name = "SET-OPERATOR",
        long_help = operator_help()
    )]
    pub operator_for_filter_tags: Option<SetOperator>,

    /// Negates the tags filter. May be given multiple times.
    #[arg(short = 'N', long, action = ArgAction::Count)]
    pub negate_operator_for_filter_tags: u8,

    /// The tags at the end of a FILE are forwarded to the following FILE.
    #[arg(long)]
    pub forward_tags: bool,

    /// A shell command that every list-file is passed through (on stdin)
    /// before it is interpreted. Included files are processed as well.
    #[arg(long, value_name = "PROCESSOR")]
    pub preprocessor: Option<String>,

    /// Prints the file inclusion hierarchy instead of the paths.
    #[arg(short = 'i', long, conflicts_with = "print_inclusion_hierarchy_pretty")]
    pub print_inclusion_hierarchy: bool,

    /// Prints the file inclusion hierarchy in a pretty layout instead of the paths.
    #[arg(short = 'I', long)]
    pub print_inclusion_hierarchy_pretty: bool,

    /// A settings file with defaults for these options.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

fn operator_help() -> String {
    format!(
        "The operator of the tags filter. It is applied as \
         <FILE-TAGS> SET-OPERATOR <SET-OF-TAGS>. The filter is only applied \
         if --filter-tags is given. Default: {}.\n\nOperators are: {}.",
        SetOperator::DEFAULT,
        SetOperator::all_names_for_help_text()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("filelist").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(cli.files.is_empty());
        assert_eq!(cli.missing_file_handling, None);
        assert_eq!(cli.negate_operator_for_filter_tags, 0);
        assert!(!cli.print_inclusion_hierarchy);
    }

    #[test]
    fn test_options() {
        let cli = parse(&[
            "-m", "include", "-nN", "-N", "-O", "none-of", "-F", "a,b", "--", "-", "top.lst",
        ]);
        assert_eq!(cli.missing_file_handling, Some(MissingFileMode::Include));
        assert!(cli.normalize_paths);
        assert_eq!(cli.negate_operator_for_filter_tags, 2);
        assert_eq!(cli.operator_for_filter_tags, Some(SetOperator::ContainsNoneOf));
        assert_eq!(cli.filter_tags.as_deref(), Some("a,b"));
        assert_eq!(cli.files, vec!["-", "top.lst"]);
    }

    #[test]
    fn test_stdin_file_argument() {
        assert_eq!(parse(&["-"]).files, vec!["-"]);
    }

    #[test]
    fn test_invalid_operator_and_mode() {
        assert!(Cli::try_parse_from(["filelist", "-O", "bogus"]).is_err());
        assert!(Cli::try_parse_from(["filelist", "-m", "sometimes"]).is_err());
    }

    #[test]
    fn test_hierarchy_layouts_conflict() {
        assert!(Cli::try_parse_from(["filelist", "-i", "-I", "x"]).is_err());
    }
}
