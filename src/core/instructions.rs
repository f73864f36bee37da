//! # Instructions
//!
//! The instruction table and the argument parser of each instruction.
//! Arguments use shell-style quoting and are parsed with `clap`, so a
//! malformed argument string is reported with clap's own message.

use crate::{
    core::{
        matcher::FileSetFilters,
        processor::{FileSetSettings, IncludeProcessor, Processor, TagsOperation},
        tags::{self, TagsIncludePolicy},
    },
    models::SourceReference,
};
use clap::{Args, ColorChoice, Parser, Subcommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    Find,
    Include,
    List,
    Print,
    Shell,
    Tags,
}

#[derive(Debug)]
pub struct InstructionDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: InstructionKind,
    pub summary: &'static str,
}

/// Every instruction, with its aliases. Names are upper case.
pub static INSTRUCTION_REGISTRY: &[InstructionDefinition] = &[
    InstructionDefinition {
        name: "FIND",
        aliases: &["F"],
        kind: InstructionKind::Find,
        summary: "Paths of the files at any depth below a directory.",
    },
    InstructionDefinition {
        name: "INCLUDE",
        aliases: &["I"],
        kind: InstructionKind::Include,
        summary: "Includes the contents of a list-file.",
    },
    InstructionDefinition {
        name: "LIST",
        aliases: &["L", "LS"],
        kind: InstructionKind::List,
        summary: "Paths of the files in a directory.",
    },
    InstructionDefinition {
        name: "PRINT",
        aliases: &["P"],
        kind: InstructionKind::Print,
        summary: "Outputs the rest of the line.",
    },
    InstructionDefinition {
        name: "SHELL",
        aliases: &[],
        kind: InstructionKind::Shell,
        summary: "Paths output by a shell command, one per line.",
    },
    InstructionDefinition {
        name: "TAGS",
        aliases: &["T"],
        kind: InstructionKind::Tags,
        summary: "Manages the current set of tags.",
    },
];

/// Finds an instruction by its (upper case) name or alias.
pub fn find_instruction(name: &str) -> Option<&'static InstructionDefinition> {
    INSTRUCTION_REGISTRY
        .iter()
        .find(|def| def.name == name || def.aliases.contains(&name))
}

/// Error messages, one per line.
pub type ArgumentErrorLines = Vec<String>;

impl InstructionDefinition {
    pub fn parse(
        &self,
        origin: &SourceReference,
        argument: &str,
    ) -> Result<Vec<Processor>, ArgumentErrorLines> {
        let processor = match self.kind {
            InstructionKind::Print => Processor::Print {
                origin: origin.clone(),
                text: argument.to_string(),
            },
            InstructionKind::Shell => parse_shell(origin, argument)?,
            InstructionKind::List => parse_file_set(self.name, origin, argument, false)?,
            InstructionKind::Find => parse_file_set(self.name, origin, argument, true)?,
            InstructionKind::Include => parse_include(self.name, origin, argument)?,
            InstructionKind::Tags => parse_tags(self.name, origin, argument)?,
        };
        Ok(vec![processor])
    }
}

// --- ARGUMENT HELPERS ---

fn split_arguments(argument: &str) -> Result<Vec<String>, ArgumentErrorLines> {
    shlex::split(argument).ok_or_else(|| vec!["No closing quotation".to_string()])
}

fn clap_error_lines(error: clap::Error) -> ArgumentErrorLines {
    error
        .to_string()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `args` with the clap definition `T`, naming it after the instruction.
fn parse_args<T: Parser>(name: &'static str, args: Vec<String>) -> Result<T, ArgumentErrorLines> {
    let matches = T::command()
        .name(name)
        .color(ColorChoice::Never)
        .try_get_matches_from(args)
        .map_err(clap_error_lines)?;
    T::from_arg_matches(&matches).map_err(clap_error_lines)
}

// --- SHELL ---

fn parse_shell(origin: &SourceReference, argument: &str) -> Result<Processor, ArgumentErrorLines> {
    if argument.trim().is_empty() {
        return Err(vec!["missing command-line".to_string()]);
    }
    Ok(Processor::Shell {
        origin: origin.clone(),
        command_line: argument.to_string(),
    })
}

// --- LIST / FIND ---

/// Arguments after DIRECTORY.
#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct FileSetArgs {
    /// Shell-style wildcards; a file must match one of them (or a REG-EX).
    #[arg(value_name = "PATTERN")]
    patterns: Vec<String>,

    /// A regular expression searched for in the base name.
    #[arg(short = 'r', long = "regex", value_name = "REG-EX")]
    regexes: Vec<String>,

    /// Excludes files whose name matches the wildcard.
    #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
    exclude_patterns: Vec<String>,

    /// Excludes files whose name matches the regular expression.
    #[arg(short = 'E', long = "exclude-regex", value_name = "REG-EX")]
    exclude_regexes: Vec<String>,

    /// "f" for regular file, "d" for directory. Repeated types are OR:ed.
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    types: Vec<String>,

    /// Sort on file name.
    #[arg(short, long)]
    sort: bool,
}

fn parse_file_set(
    name: &'static str,
    origin: &SourceReference,
    argument: &str,
    recursive: bool,
) -> Result<Processor, ArgumentErrorLines> {
    let mut arguments = split_arguments(argument)?.into_iter();
    let Some(directory) = arguments.next() else {
        return Err(vec![
            "A directory must be given (use '.' for current directory).".to_string(),
        ]);
    };

    let args: FileSetArgs = parse_args(name, arguments.collect())?;
    let filters = FileSetFilters {
        types: args.types,
        patterns: args.patterns,
        regexes: args.regexes,
        exclude_patterns: args.exclude_patterns,
        exclude_regexes: args.exclude_regexes,
    };
    let matcher = filters
        .compile()
        .map_err(|e| e.to_string().lines().map(str::to_string).collect::<Vec<_>>())?;

    Ok(Processor::FileSet {
        origin: origin.clone(),
        settings: FileSetSettings {
            directory,
            matcher,
            sort: args.sort,
            recursive,
        },
    })
}

// --- INCLUDE ---

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct IncludeArgs {
    /// A list-file, relative to the including file.
    #[arg(value_name = "FILE")]
    file: String,

    /// Modifications of the tags made by the included file are not seen by the including file.
    #[arg(short = 'I', long)]
    do_not_import_tags: bool,

    /// The included file starts with an empty set of tags.
    #[arg(short = 'E', long)]
    do_not_export_tags: bool,

    /// Resolve paths in the included file relative to the including file's directory.
    #[arg(short, long)]
    preserve_current_directory: bool,
}

fn parse_include(
    name: &'static str,
    origin: &SourceReference,
    argument: &str,
) -> Result<Processor, ArgumentErrorLines> {
    let args: IncludeArgs = parse_args(name, split_arguments(argument)?)?;
    let policy = TagsIncludePolicy {
        export: !args.do_not_export_tags,
        import: !args.do_not_import_tags,
    };
    Ok(Processor::Include(IncludeProcessor::new(
        origin.clone(),
        args.file,
        args.preserve_current_directory,
        policy,
    )))
}

// --- TAGS ---

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    disable_help_flag = true,
    disable_help_subcommand = true,
    subcommand_required = true
)]
struct TagsArgs {
    #[command(subcommand)]
    command: TagsCommand,
}

#[derive(Subcommand, Debug)]
enum TagsCommand {
    /// Adds the given tags to the current set of tags.
    #[command(name = "ADD", disable_help_flag = true)]
    Add(TagListArgs),
    /// Replaces the current tags with the most recently pushed ones.
    #[command(name = "POP", disable_help_flag = true)]
    Pop,
    /// Prints the current set of tags, sorted.
    #[command(name = "PRINT", disable_help_flag = true)]
    Print(AffixArgs),
    /// Prints the tags stack.
    #[command(name = "PRINT-STACK", disable_help_flag = true)]
    PrintStack(AffixArgs),
    /// Pushes a copy of the current tags on the stack.
    #[command(name = "PUSH", disable_help_flag = true)]
    Push,
    /// Removes the given tags, or every tag if none is given.
    #[command(name = "REMOVE", alias = "RM", disable_help_flag = true)]
    Remove(TagListArgs),
    /// Sets the current set of tags to the given tags.
    #[command(name = "SET", disable_help_flag = true)]
    Set(TagListArgs),
}

#[derive(Args, Debug)]
struct TagListArgs {
    /// Tags, separated by whitespace and/or commas.
    #[arg(value_name = "TAG")]
    tags: Vec<String>,
}

impl TagListArgs {
    fn into_tags(self) -> Vec<String> {
        tags::parse_tags_list(&self.tags.join(" "))
    }
}

#[derive(Args, Debug)]
struct AffixArgs {
    #[arg(short, long, value_name = "STRING", default_value = "", allow_hyphen_values = true)]
    prefix: String,

    #[arg(short, long, value_name = "STRING", default_value = "", allow_hyphen_values = true)]
    suffix: String,
}

fn parse_tags(
    name: &'static str,
    origin: &SourceReference,
    argument: &str,
) -> Result<Processor, ArgumentErrorLines> {
    let mut arguments = split_arguments(argument)?;
    if let Some(sub_command) = arguments.first_mut() {
        *sub_command = sub_command.to_uppercase();
    }

    let args: TagsArgs = parse_args(name, arguments)?;
    let operation = match args.command {
        TagsCommand::Add(list) => TagsOperation::Add(list.into_tags()),
        TagsCommand::Remove(list) => TagsOperation::Remove(list.into_tags()),
        TagsCommand::Set(list) => TagsOperation::Set(list.into_tags()),
        TagsCommand::Push => TagsOperation::Push,
        TagsCommand::Pop => TagsOperation::Pop,
        TagsCommand::Print(AffixArgs { prefix, suffix }) => TagsOperation::Print { prefix, suffix },
        TagsCommand::PrintStack(AffixArgs { prefix, suffix }) => {
            TagsOperation::PrintStack { prefix, suffix }
        }
    };

    Ok(Processor::Tags {
        origin: origin.clone(),
        operation,
    })
}
