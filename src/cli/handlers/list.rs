// src/cli/handlers/list.rs

use anyhow::Result;
use std::io::Write;

use super::commons::{self, RunSettings};
use crate::core::rendition::RenditionContext;

/// Prints the rendition of every item that is included in the output, one
/// per line, as the items are produced.
///
/// Output written before a fatal error stays written.
pub fn handle(settings: &RunSettings, out: &mut dyn Write) -> Result<()> {
    commons::for_each_list_file(settings, |_, file, env| {
        let file_refs = env.file_refs.clone();
        let ctx = RenditionContext {
            settings: &settings.rendition,
            file_refs: &file_refs,
        };

        for item in file.result_items(&settings.parsing, env) {
            let item = item?;
            if item.include_in_output(&ctx) {
                writeln!(out, "{}", item.render(&ctx)?)?;
            }
        }
        Ok(())
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{
        cli::Cli,
        core::{config_loader::FileListConfig, errors::InterpreterError},
    };
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    /// Runs with `-f`, so that paths are printed relative the list-file.
    fn run(args: &[&str]) -> (String, Result<()>) {
        let cli = Cli::try_parse_from(["filelist", "-f"].iter().copied().chain(args.iter().copied())).unwrap();
        let settings = RunSettings::new(&cli, &FileListConfig::default()).unwrap();
        let mut out = Vec::new();
        let result = handle(&settings, &mut out);
        (String::from_utf8(out).unwrap(), result)
    }

    fn exit_code(result: Result<()>) -> i32 {
        result
            .unwrap_err()
            .downcast_ref::<InterpreterError>()
            .map(InterpreterError::exit_code)
            .unwrap()
    }

    #[test]
    fn test_print_comment_and_existing_path() {
        let dir = tempdir().unwrap();
        write(&dir, "some/path.txt", "");
        let top = write(&dir, "top.lst", "@PRINT hello\n\n# comment\nsome/path.txt\n");

        let (out, result) = run(&[&top]);

        result.unwrap();
        assert_eq!(out, "hello\nsome/path.txt\n");
    }

    #[test]
    fn test_missing_path_fails_by_default_after_earlier_output() {
        let dir = tempdir().unwrap();
        let top = write(&dir, "top.lst", "@PRINT hello\nsome/path.txt\n@PRINT never\n");

        let (out, result) = run(&[&top]);

        assert_eq!(out, "hello\n");
        assert_eq!(exit_code(result), 8);
    }

    #[test]
    fn test_missing_file_modes() {
        let dir = tempdir().unwrap();
        write(&dir, "here.txt", "");
        let top = write(&dir, "top.lst", "here.txt\ngone.txt\n");

        assert_eq!(run(&["-m", "ignore", &top]).0, "here.txt\n");
        assert_eq!(run(&["-m", "include", &top]).0, "here.txt\ngone.txt\n");
        assert_eq!(run(&["-m", "only", &top]).0, "gone.txt\n");
    }

    #[test]
    fn test_tags_filter() {
        let dir = tempdir().unwrap();
        write(&dir, "a.txt", "");
        let top = write(&dir, "top.lst", "@TAGS SET a b\na.txt\n");

        assert_eq!(run(&["-F", "b", &top]).0, "a.txt\n");
        assert_eq!(run(&["-F", "c", &top]).0, "");
        assert_eq!(run(&["-F", "c", "-N", &top]).0, "a.txt\n");
        assert_eq!(run(&["-F", "a", "-O", "equals", &top]).0, "");
    }

    #[test]
    fn test_failing_shell_aborts_the_run() {
        let dir = tempdir().unwrap();
        let top = write(&dir, "top.lst", "@PRINT before\n@SHELL echo partial; exit 1\n@PRINT after\n");
        let second = write(&dir, "second.lst", "@PRINT second\n");

        let (out, result) = run(&[&top, &second]);

        assert_eq!(out, "before\n");
        assert_eq!(exit_code(result), 9);
    }

    #[test]
    fn test_syntax_error_is_reported_before_any_output_of_the_file() {
        let dir = tempdir().unwrap();
        let top = write(&dir, "top.lst", "@PRINT hello\n@NOPE\n");

        let (out, result) = run(&[&top]);

        assert_eq!(out, "");
        assert_eq!(exit_code(result), 4);
    }

    #[test]
    fn test_suppress_non_path_output_and_tag_rendition() {
        let dir = tempdir().unwrap();
        write(&dir, "a.txt", "");
        let top = write(&dir, "top.lst", "@PRINT hello\n@TAGS SET y x\na.txt\n@TAGS PRINT -p [ -s ]\n");

        assert_eq!(run(&["-S", "-t", &top]).0, "x y:a.txt\n");
        assert_eq!(run(&["-T", &top]).0, "hello\na.txt:x y\n[x y]\n");
    }

    #[test]
    fn test_tags_are_forwarded_between_files_on_request() {
        let dir = tempdir().unwrap();
        let first = write(&dir, "first.lst", "@TAGS SET kept\n");
        let second = write(&dir, "second.lst", "@TAGS PRINT\n");

        assert_eq!(run(&[&first, &second]).0, "\n");
        assert_eq!(run(&["--forward-tags", &first, &second]).0, "kept\n");
    }

    #[test]
    fn test_paths_are_relative_to_cwd_without_f() {
        let dir = tempdir().unwrap();
        write(&dir, "sub/a.txt", "");
        let top = write(&dir, "sub/top.lst", "a.txt\n");

        let cli = Cli::try_parse_from(["filelist", "-n", top.as_str()]).unwrap();
        let settings = RunSettings::new(&cli, &FileListConfig::default()).unwrap();
        let mut out = Vec::new();
        handle(&settings, &mut out).unwrap();

        let expected = dir.path().join("sub").join("a.txt");
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", expected.display()));
    }

    #[test]
    fn test_unreadable_file_argument() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.lst");

        let (_, result) = run(&[missing.to_str().unwrap()]);

        assert_eq!(exit_code(result), 3);
    }
}
