// src/cli/handlers/commons.rs

// Settings and the per-file loop shared by the handlers.

use anyhow::Result;
use std::{path::Path, rc::Rc};

use crate::{
    cli::Cli,
    constants::{COMMAND_LINE_ARGUMENT_FOR_STDIN, DEFAULT_INSTRUCTION_PREFIX},
    core::{
        config_loader::FileListConfig,
        environment::Environment,
        errors::InterpreterError,
        line_parser::{self, ListFileParser, ParsingSettings},
        lines_source::LinesSource,
        processor::ListFileProcessor,
        rendition::{MissingFileMode, RenditionSettings, TagsRenditionSettings},
        tags::{self, SetOperator, Tags, TagsCondition},
    },
};

/// Everything a run needs, merged from the command line and the settings file.
#[derive(Debug)]
pub struct RunSettings {
    pub files: Vec<String>,
    pub missing_file_mode: MissingFileMode,
    pub stdin_paths_are_relative: Option<String>,
    pub forward_tags: bool,
    pub tags_condition: Rc<TagsCondition>,
    pub rendition: RenditionSettings,
    pub parsing: ParsingSettings,
}

impl RunSettings {
    /// Command line values win over settings file values; flags are OR:ed.
    pub fn new(cli: &Cli, config: &FileListConfig) -> Result<Self, InterpreterError> {
        check_stdin_is_given_at_most_once(&cli.files)?;

        let instruction_prefix = cli
            .instruction_prefix
            .clone()
            .or_else(|| config.instruction_prefix.clone())
            .unwrap_or_else(|| DEFAULT_INSTRUCTION_PREFIX.to_string());
        if line_parser::is_ignored_line(&instruction_prefix) {
            return Err(InterpreterError::Usage(
                "The instruction prefix may not match as a comment line.".to_string(),
            ));
        }

        let missing_file_mode = cli
            .missing_file_handling
            .or(config.missing_file_handling)
            .unwrap_or_default();

        let negated = cli.negate_operator_for_filter_tags % 2 == 1;
        let tags_condition = tags_condition(
            cli.filter_tags.as_deref().or(config.filter_tags.as_deref()),
            cli.operator_for_filter_tags
                .or(config.operator_for_filter_tags)
                .unwrap_or(SetOperator::DEFAULT),
            negated != config.negate_operator_for_filter_tags,
        );

        let rendition = RenditionSettings {
            relative_to_file_argument: cli.relative_file_argument_location
                || config.relative_file_argument_location,
            normalize: cli.normalize_paths || config.normalize_paths,
            absolute: cli.absolute_paths || config.absolute_paths,
            tags: TagsRenditionSettings {
                prepend: cli.prepend_tags || config.prepend_tags,
                append: cli.append_tags || config.append_tags,
            },
            suppress_non_path_output: cli.suppress_non_path_output
                || config.suppress_non_path_output,
            ..Default::default()
        }
        .with_missing_file_mode(missing_file_mode);

        let preprocessor = cli.preprocessor.clone().or_else(|| config.preprocessor.clone());
        let parsing = ParsingSettings::for_instruction_prefix(&instruction_prefix, preprocessor)
            .map_err(|e| InterpreterError::Usage(format!("Invalid instruction prefix: {}", e)))?;

        Ok(Self {
            files: cli.files.clone(),
            missing_file_mode,
            stdin_paths_are_relative: cli
                .stdin_paths_are_relative
                .clone()
                .or_else(|| config.stdin_paths_are_relative.clone()),
            forward_tags: cli.forward_tags || config.forward_tags,
            tags_condition: Rc::new(tags_condition),
            rendition,
            parsing,
        })
    }

    /// The name a FILE argument is parsed and rendered under.
    ///
    /// Stdin gets a name inside `--stdin-paths-are-relative` so that its
    /// paths resolve relative that directory.
    pub fn parsing_and_rendition_file_name(&self, file_name: &str) -> String {
        match &self.stdin_paths_are_relative {
            Some(dir) if file_name == COMMAND_LINE_ARGUMENT_FOR_STDIN => Path::new(dir)
                .join(COMMAND_LINE_ARGUMENT_FOR_STDIN)
                .to_string_lossy()
                .into_owned(),
            _ => file_name.to_string(),
        }
    }
}

fn check_stdin_is_given_at_most_once(files: &[String]) -> Result<(), InterpreterError> {
    let stdin_count = files
        .iter()
        .filter(|f| *f == COMMAND_LINE_ARGUMENT_FOR_STDIN)
        .count();
    if stdin_count > 1 {
        return Err(InterpreterError::Usage(format!(
            "stdin ('{}') as file argument can be given at most once.",
            COMMAND_LINE_ARGUMENT_FOR_STDIN
        )));
    }
    Ok(())
}

/// No filter unless a set of tags is given. A blank set is the empty set.
fn tags_condition(operand: Option<&str>, operator: SetOperator, negated: bool) -> TagsCondition {
    match operand {
        Some(operand) => TagsCondition::new(
            operator,
            negated,
            tags::parse_tags_list(operand).into_iter().collect(),
        ),
        None => TagsCondition::Unconditional,
    }
}

/// Parses each FILE argument in turn and hands it, with a fresh top-level
/// environment, to `process`.
///
/// A file is parsed completely before any of its items are produced. With
/// `forward_tags`, each file after the first continues with the tags that
/// were current at the end of the previous one.
pub fn for_each_list_file<F>(settings: &RunSettings, mut process: F) -> Result<()>
where
    F: FnMut(usize, &ListFileProcessor, Rc<Environment>) -> Result<()>,
{
    let mut previous_env: Option<Rc<Environment>> = None;

    for (index, file_name) in settings.files.iter().enumerate() {
        let lines_source = if file_name == COMMAND_LINE_ARGUMENT_FOR_STDIN {
            LinesSource::Stdin
        } else {
            LinesSource::TopLevelFile(file_name)
        };
        let lines = lines_source.read_lines(settings.parsing.preprocessor())?;

        let name = settings.parsing_and_rendition_file_name(file_name);
        let file = ListFileParser::for_top_level(&settings.parsing, &name).apply(lines)?;
        log::debug!("Parsed '{}': {} processors", name, file.processors.len());

        let tags = match &previous_env {
            Some(env) if settings.forward_tags => env.tags(),
            _ => Tags::new_shared(),
        };
        let env = Rc::new(Environment::for_top_level_file(
            &name,
            settings.missing_file_mode.fail_on_missing(),
            Rc::clone(&settings.tags_condition),
            tags,
        ));

        process(index + 1, &file, Rc::clone(&env))?;
        previous_env = Some(env);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("filelist").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_stdin_at_most_once() {
        let err = RunSettings::new(&cli(&["-", "a.lst", "-"]), &FileListConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.render(),
            "filelist: stdin ('-') as file argument can be given at most once.\n"
        );
    }

    #[test]
    fn test_instruction_prefix_may_not_be_a_comment() {
        for prefix in ["#", " ", "#!"] {
            let args = cli(&["--instruction-prefix", prefix, "a.lst"]);
            let err = RunSettings::new(&args, &FileListConfig::default()).unwrap_err();
            assert!(matches!(err, InterpreterError::Usage(_)), "prefix: '{}'", prefix);
        }
    }

    #[test]
    fn test_no_filter_unless_tags_are_given() {
        let settings = RunSettings::new(&cli(&["-N"]), &FileListConfig::default()).unwrap();
        assert_eq!(*settings.tags_condition, TagsCondition::Unconditional);

        let settings = RunSettings::new(&cli(&["-F", "  "]), &FileListConfig::default()).unwrap();
        assert_eq!(
            *settings.tags_condition,
            TagsCondition::new(SetOperator::ContainsAnyOf, false, Default::default())
        );
    }

    #[test]
    fn test_negation_count() {
        let once = RunSettings::new(&cli(&["-F", "a", "-N"]), &FileListConfig::default()).unwrap();
        let twice = RunSettings::new(&cli(&["-F", "a", "-NN"]), &FileListConfig::default()).unwrap();
        assert!(matches!(*once.tags_condition, TagsCondition::Compare { negated: true, .. }));
        assert!(matches!(*twice.tags_condition, TagsCondition::Compare { negated: false, .. }));
    }

    #[test]
    fn test_command_line_overrides_settings_file() {
        let config = FileListConfig {
            missing_file_handling: Some(MissingFileMode::Include),
            normalize_paths: true,
            filter_tags: Some("x".into()),
            ..Default::default()
        };

        let from_file = RunSettings::new(&cli(&[]), &config).unwrap();
        assert_eq!(from_file.missing_file_mode, MissingFileMode::Include);
        assert!(from_file.rendition.normalize);
        assert!(from_file.rendition.include_non_existing);
        assert!(matches!(*from_file.tags_condition, TagsCondition::Compare { .. }));

        let overridden = RunSettings::new(&cli(&["-m", "only"]), &config).unwrap();
        assert_eq!(overridden.missing_file_mode, MissingFileMode::Only);
        assert!(!overridden.rendition.include_existing);
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_file_name() {
        let settings = RunSettings::new(
            &cli(&["--stdin-paths-are-relative", "some/dir", "-"]),
            &FileListConfig::default(),
        )
        .unwrap();
        assert_eq!(settings.parsing_and_rendition_file_name("-"), "some/dir/-");
        assert_eq!(settings.parsing_and_rendition_file_name("a.lst"), "a.lst");
    }
}
