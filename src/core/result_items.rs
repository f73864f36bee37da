//! # Result Items
//!
//! Lazy evaluation of a file's Processors.
//!
//! `ResultItems` pulls from the stream of the current Processor until it is
//! exhausted and only then starts the next Processor. Starting a Processor
//! is where its side effects happen (tag mutations, shell commands,
//! directory checks), so they happen exactly in file order, interleaved
//! with the items of the Processors before them. Nothing is collected up
//! front except where sorting requires it.

use crate::{
    core::{
        environment::{Environment, FileReferenceEnvironment},
        errors::InterpreterError,
        line_parser::ParsingSettings,
        matcher::{FileMatchInfo, Matcher},
        processor::{FileSetSettings, Processor, TagsOperation},
        tags::TagSet,
    },
    models::{ResultItem, SourceReference},
    system::executor,
};
use std::{fmt, fs, path::Path, rc::Rc, slice, vec};
use walkdir::WalkDir;

type ItemResult = Result<ResultItem, InterpreterError>;

/// The items of a sequence of Processors, evaluated in `env`.
///
/// Fused: after an error, nothing more is produced.
#[derive(Debug)]
pub struct ResultItems<'a> {
    processors: slice::Iter<'a, Processor>,
    settings: &'a ParsingSettings,
    env: Rc<Environment>,
    current: Option<ItemStream<'a>>,
    finished: bool,
}

impl<'a> ResultItems<'a> {
    pub fn new(processors: &'a [Processor], settings: &'a ParsingSettings, env: Rc<Environment>) -> Self {
        Self {
            processors: processors.iter(),
            settings,
            env,
            current: None,
            finished: false,
        }
    }

    fn start(&self, processor: &'a Processor) -> Result<ItemStream<'a>, InterpreterError> {
        log::trace!(
            "Evaluating line {} of '{}'",
            processor.origin().source_line.line_number,
            processor.origin().source_line.file_name
        );
        let env = &self.env;

        match processor {
            Processor::Print { text, .. } => Ok(ItemStream::single(ResultItem::Print(text.clone()))),
            Processor::FilePath { origin, path } => Ok(ItemStream::Paths(PathItems::new(
                origin,
                env,
                vec![path.clone()],
            ))),
            Processor::Shell {
                origin,
                command_line,
            } => start_shell(origin, command_line, env),
            Processor::FileSet { origin, settings } => start_file_set(origin, settings, env),
            Processor::Tags { origin, operation } => start_tags(origin, operation, env),
            Processor::Include(include) => {
                let resolved = include.resolve(self.settings, env)?;
                Ok(ItemStream::Nested(Box::new(
                    resolved
                        .file
                        .result_items(self.settings, Rc::clone(&resolved.env)),
                )))
            }
        }
    }
}

impl Iterator for ResultItems<'_> {
    type Item = ItemResult;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if let Some(stream) = self.current.as_mut() {
                match stream.next() {
                    Some(Err(error)) => {
                        self.finished = true;
                        return Some(Err(error));
                    }
                    Some(item) => return Some(item),
                    None => self.current = None,
                }
            }

            let Some(processor) = self.processors.next() else {
                self.finished = true;
                return None;
            };
            match self.start(processor) {
                Ok(stream) => self.current = Some(stream),
                Err(error) => {
                    self.finished = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

// --- PER-PROCESSOR STREAMS ---

#[derive(Debug)]
enum ItemStream<'a> {
    Items(vec::IntoIter<ResultItem>),
    Paths(PathItems),
    Listing(ListingItems<'a>),
    Find(FindItems<'a>),
    Nested(Box<ResultItems<'a>>),
}

impl ItemStream<'_> {
    fn empty() -> Self {
        Self::Items(Vec::new().into_iter())
    }

    fn single(item: ResultItem) -> Self {
        Self::Items(vec![item].into_iter())
    }

    fn next(&mut self) -> Option<ItemResult> {
        match self {
            Self::Items(items) => items.next().map(Ok),
            Self::Paths(paths) => paths.next(),
            Self::Listing(listing) => listing.next().map(Ok),
            Self::Find(find) => find.next().map(Ok),
            Self::Nested(nested) => nested.next(),
        }
    }
}

/// Literal file names, checked for existence one at a time.
///
/// The tags are those current when the stream was started.
#[derive(Debug)]
struct PathItems {
    origin: SourceReference,
    env: Rc<Environment>,
    tags: TagSet,
    names: vec::IntoIter<String>,
}

impl PathItems {
    /// Empty if the current tags do not satisfy the run's filter.
    fn new(origin: &SourceReference, env: &Rc<Environment>, names: Vec<String>) -> Self {
        let names = if env.current_tags_satisfies_tags_filter() {
            names
        } else {
            Vec::new()
        };
        Self {
            origin: origin.clone(),
            env: Rc::clone(env),
            tags: env.current_tags(),
            names: names.into_iter(),
        }
    }

    fn next(&mut self) -> Option<ItemResult> {
        let name = self.names.next()?;
        let refs = &self.env.file_refs;
        let file_path = refs.file_name_relative_current_dir_of_process(&name);
        let exists = Path::new(&file_path).exists();

        if !exists && self.env.fail_on_missing_file {
            return Some(Err(InterpreterError::MissingFile {
                origin: self.origin.clone(),
                path: file_path,
            }));
        }
        Some(Ok(ResultItem::FilePath {
            path: refs.file_name_relative_top_level_source_file(&name),
            tags: self.tags.clone(),
            exists,
        }))
    }
}

/// Lazily reads a single directory level.
#[derive(Debug)]
struct ListingItems<'a> {
    entries: fs::ReadDir,
    matcher: &'a Matcher,
    dir_refs: FileReferenceEnvironment,
    tags: TagSet,
}

impl ListingItems<'_> {
    fn next(&mut self) -> Option<ResultItem> {
        for entry in self.entries.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let base_name = entry.file_name().to_string_lossy().into_owned();
            if let Some(item) = matching_item(self.matcher, &self.dir_refs, &self.tags, &base_name) {
                return Some(item);
            }
        }
        None
    }
}

/// Walks every level below a directory, depth first.
struct FindItems<'a> {
    walker: walkdir::IntoIter,
    matcher: &'a Matcher,
    dir_refs: FileReferenceEnvironment,
    tags: TagSet,
}

impl fmt::Debug for FindItems<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindItems")
            .field("matcher", &self.matcher)
            .field("dir_refs", &self.dir_refs)
            .finish_non_exhaustive()
    }
}

impl FindItems<'_> {
    fn next(&mut self) -> Option<ResultItem> {
        for entry in self.walker.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            let Some(relative) = relative_to_walk_root(&entry) else {
                continue;
            };
            let base_name = entry.file_name().to_string_lossy();
            let info = FileMatchInfo::new(entry.path(), base_name.as_ref());
            if self.matcher.matches(&info) {
                return Some(ResultItem::FilePath {
                    path: self.dir_refs.file_name_relative_top_level_source_file(&relative),
                    tags: self.tags.clone(),
                    exists: true,
                });
            }
        }
        None
    }
}

/// The path of a walked entry, relative to the directory the walk started in.
fn relative_to_walk_root(entry: &walkdir::DirEntry) -> Option<String> {
    let components: Vec<String> = entry
        .path()
        .components()
        .rev()
        .take(entry.depth())
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if components.is_empty() {
        return None;
    }
    let mut relative = components;
    relative.reverse();
    Some(relative.join(std::path::MAIN_SEPARATOR_STR))
}

fn matching_item(
    matcher: &Matcher,
    dir_refs: &FileReferenceEnvironment,
    tags: &TagSet,
    base_name: &str,
) -> Option<ResultItem> {
    let info = FileMatchInfo::new(
        dir_refs.file_name_relative_current_dir_of_process(base_name),
        base_name,
    );
    matcher.matches(&info).then(|| ResultItem::FilePath {
        path: dir_refs.file_name_relative_top_level_source_file(base_name),
        tags: tags.clone(),
        exists: true,
    })
}

// --- STARTING PROCESSORS ---

fn start_shell<'a>(
    origin: &SourceReference,
    command_line: &str,
    env: &Rc<Environment>,
) -> Result<ItemStream<'a>, InterpreterError> {
    if !env.current_tags_satisfies_tags_filter() {
        return Ok(ItemStream::empty());
    }

    let cwd = env.file_refs.current_dir_of_process();
    let output = executor::execute_and_capture_output(command_line, Path::new(cwd)).map_err(
        |error| InterpreterError::ShellCommand {
            origin: origin.clone(),
            error,
        },
    )?;

    let names = output
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    Ok(ItemStream::Paths(PathItems::new(origin, env, names)))
}

fn start_file_set<'a>(
    origin: &SourceReference,
    settings: &'a FileSetSettings,
    env: &Rc<Environment>,
) -> Result<ItemStream<'a>, InterpreterError> {
    let dir_path = env
        .file_refs
        .file_name_relative_current_dir_of_process(&settings.directory);
    if !Path::new(&dir_path).is_dir() {
        return Err(InterpreterError::MissingFile {
            origin: origin.clone(),
            path: dir_path,
        });
    }
    if !env.current_tags_satisfies_tags_filter() {
        return Ok(ItemStream::empty());
    }

    let dir_refs = env.file_refs.new_for_directory(&settings.directory);
    let tags = env.current_tags();
    let matcher = &settings.matcher;

    if settings.recursive {
        let mut walker = WalkDir::new(&dir_path).min_depth(1);
        if settings.sort {
            walker = walker.sort_by_file_name();
        }
        return Ok(ItemStream::Find(FindItems {
            walker: walker.into_iter(),
            matcher,
            dir_refs,
            tags,
        }));
    }

    let entries = match fs::read_dir(&dir_path) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot read directory '{}': {}", dir_path, e);
            return Ok(ItemStream::empty());
        }
    };

    if !settings.sort {
        return Ok(ItemStream::Listing(ListingItems {
            entries,
            matcher,
            dir_refs,
            tags,
        }));
    }

    // Sorting on the base name gives the same order as sorting on the full
    // path, since every entry has the same directory prefix.
    let mut base_names: Vec<String> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.file_name().to_string_lossy().into_owned()),
            Err(e) => {
                log::warn!("Skipping unreadable directory entry: {}", e);
                None
            }
        })
        .filter(|base_name| {
            let info = FileMatchInfo::new(
                dir_refs.file_name_relative_current_dir_of_process(base_name),
                base_name.as_str(),
            );
            matcher.matches(&info)
        })
        .collect();
    base_names.sort();

    let items = base_names
        .iter()
        .map(|base_name| ResultItem::FilePath {
            path: dir_refs.file_name_relative_top_level_source_file(base_name),
            tags: tags.clone(),
            exists: true,
        })
        .collect::<Vec<_>>();
    Ok(ItemStream::Items(items.into_iter()))
}

fn start_tags<'a>(
    origin: &SourceReference,
    operation: &TagsOperation,
    env: &Rc<Environment>,
) -> Result<ItemStream<'a>, InterpreterError> {
    let handle = env.tags();
    let mut tags = handle.borrow_mut();

    let stream = match operation {
        TagsOperation::Add(list) => {
            tags.add(list.iter().cloned());
            ItemStream::empty()
        }
        TagsOperation::Remove(list) => {
            tags.remove(list);
            ItemStream::empty()
        }
        TagsOperation::Set(list) => {
            tags.set(list.iter().cloned());
            ItemStream::empty()
        }
        TagsOperation::Push => {
            tags.push();
            ItemStream::empty()
        }
        TagsOperation::Pop => {
            tags.pop()
                .map_err(|_| InterpreterError::TagsStackUnderflow {
                    origin: origin.clone(),
                })?;
            ItemStream::empty()
        }
        TagsOperation::Print { prefix, suffix } => ItemStream::single(ResultItem::TagsPrint {
            tags: tags.current().clone(),
            prefix: prefix.clone(),
            suffix: suffix.clone(),
        }),
        TagsOperation::PrintStack { prefix, suffix } => {
            ItemStream::single(ResultItem::TagsPrintStack {
                stack: tags.stack_from_top(),
                prefix: prefix.clone(),
                suffix: suffix.clone(),
            })
        }
    };
    Ok(stream)
}
