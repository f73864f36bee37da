//! # Rendition
//!
//! Decides which `ResultItem`s are printed and how. This is the only place
//! that knows about the output options of a run; the interpreter itself
//! only produces items.

use crate::{
    constants::TAGS_AND_PATH_SEPARATOR,
    core::{
        environment::FileReferenceEnvironment,
        paths::{self, PathError},
        tags::TagSet,
    },
    models::ResultItem,
};
use clap::ValueEnum;
use serde::Deserialize;

/// What to do with file paths that do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingFileMode {
    /// Abort the run on the first missing file.
    #[default]
    Fail,
    /// Print existing files only.
    Ignore,
    /// Print existing and missing files.
    Include,
    /// Print missing files only.
    Only,
}

impl MissingFileMode {
    pub fn include_existing(self) -> bool {
        !matches!(self, Self::Only)
    }

    pub fn include_non_existing(self) -> bool {
        matches!(self, Self::Include | Self::Only)
    }

    pub fn fail_on_missing(self) -> bool {
        matches!(self, Self::Fail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagsRenditionSettings {
    pub prepend: bool,
    pub append: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenditionSettings {
    /// Render paths relative to the list-file argument instead of the
    /// current directory.
    pub relative_to_file_argument: bool,
    pub include_existing: bool,
    pub include_non_existing: bool,
    pub normalize: bool,
    pub absolute: bool,
    pub tags: TagsRenditionSettings,
    pub suppress_non_path_output: bool,
}

impl RenditionSettings {
    pub fn with_missing_file_mode(mut self, mode: MissingFileMode) -> Self {
        self.include_existing = mode.include_existing();
        self.include_non_existing = mode.include_non_existing();
        self
    }
}

/// Rendition settings together with the references of the top-level file
/// whose items are being rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenditionContext<'a> {
    pub settings: &'a RenditionSettings,
    pub file_refs: &'a FileReferenceEnvironment,
}

impl ResultItem {
    pub fn include_in_output(&self, ctx: &RenditionContext<'_>) -> bool {
        match self {
            Self::FilePath { exists: true, .. } => ctx.settings.include_existing,
            Self::FilePath { exists: false, .. } => ctx.settings.include_non_existing,
            Self::Print(_) | Self::TagsPrint { .. } | Self::TagsPrintStack { .. } => {
                !ctx.settings.suppress_non_path_output
            }
        }
    }

    /// The line printed for this item, without the trailing newline.
    pub fn render(&self, ctx: &RenditionContext<'_>) -> Result<String, PathError> {
        match self {
            Self::Print(text) => Ok(text.clone()),
            Self::FilePath { path, tags, .. } => render_path(ctx, path, tags),
            Self::TagsPrint {
                tags,
                prefix,
                suffix,
            } => Ok(format!("{}{}{}", prefix, tags_string(tags), suffix)),
            Self::TagsPrintStack {
                stack,
                prefix,
                suffix,
            } => Ok(format!("{}{}{}", prefix, stack_string(stack), suffix)),
        }
    }
}

fn render_path(ctx: &RenditionContext<'_>, path: &str, tags: &TagSet) -> Result<String, PathError> {
    let settings = ctx.settings;

    let mut rendered = if settings.relative_to_file_argument {
        path.to_string()
    } else {
        ctx.file_refs.file_name_relative_current_dir_of_process(path)
    };
    if settings.normalize {
        rendered = paths::normalize_path(&rendered);
    }
    if settings.absolute {
        rendered = paths::absolute_path(&rendered)?;
    }

    if !settings.tags.prepend && !settings.tags.append {
        return Ok(rendered);
    }
    let tags = tags_string(tags);
    let mut components = Vec::with_capacity(3);
    if settings.tags.prepend {
        components.push(tags.as_str());
    }
    components.push(rendered.as_str());
    if settings.tags.append {
        components.push(tags.as_str());
    }
    Ok(components.join(TAGS_AND_PATH_SEPARATOR))
}

/// Sorted, space separated.
fn tags_string(tags: &TagSet) -> String {
    tags.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// `[['a', 'b'], []]`, top of the stack first.
fn stack_string(stack: &[TagSet]) -> String {
    let sets: Vec<String> = stack
        .iter()
        .map(|set| {
            let quoted: Vec<String> = set.iter().map(|tag| quote(tag)).collect();
            format!("[{}]", quoted.join(", "))
        })
        .collect();
    format!("[{}]", sets.join(", "))
}

/// Single-quoted, unless the string holds a single quote and no double quote.
fn quote(s: &str) -> String {
    let delimiter = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push(delimiter);
    for c in s.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            c => quoted.push(c),
        }
    }
    quoted.push(delimiter);
    quoted
}
