//! # Construction Environment
//!
//! The context a list-file's Processors are evaluated in: where relative
//! paths are resolved from, the current tags, the run-wide tags filter, and
//! how missing files are treated.
//!
//! Environments are derived, never mutated, when descending into a
//! directory or an included file. The one exception is the tags handle,
//! which is shared or replaced according to the `TagsIncludePolicy` of the
//! INCLUDE instruction.

use crate::core::{
    paths,
    tags::{SharedTags, TagSet, Tags, TagsCondition, TagsIncludePolicy},
};
use std::{
    cell::RefCell,
    path::{MAIN_SEPARATOR, Path},
    rc::Rc,
};

/// Prefixes that turn a file name written in a list-file into a path
/// relative to the process' current directory, and into a path relative to
/// the top-level list-file.
///
/// Both prefixes are either empty or end with a path separator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileReferenceEnvironment {
    from_current_dir: String,
    from_top_level_file: String,
}

impl FileReferenceEnvironment {
    pub fn new(from_current_dir: impl Into<String>, from_top_level_file: impl Into<String>) -> Self {
        Self {
            from_current_dir: from_current_dir.into(),
            from_top_level_file: from_top_level_file.into(),
        }
    }

    pub fn for_top_level_file(file_name: &str) -> Self {
        let directory = paths::directory_component(file_name);
        Self::new(with_trailing_separator(directory), "")
    }

    pub fn new_for_directory(&self, name_of_directory: &str) -> Self {
        if name_of_directory == "." {
            self.clone()
        } else {
            self.new_for_appended_dir(name_of_directory)
        }
    }

    /// The references for a file included via `file_name_relative_include_file`.
    pub fn for_included_file(
        &self,
        file_name_relative_include_file: &str,
        preserve_current_directory: bool,
    ) -> Self {
        if preserve_current_directory {
            return self.clone();
        }
        match paths::directory_component(file_name_relative_include_file) {
            "" => self.clone(),
            dir_delta => self.new_for_appended_dir(dir_delta),
        }
    }

    pub fn file_name_relative_current_dir_of_process(&self, file_name: &str) -> String {
        prefixed(&self.from_current_dir, file_name)
    }

    pub fn file_name_relative_top_level_source_file(&self, file_name: &str) -> String {
        prefixed(&self.from_top_level_file, file_name)
    }

    /// The directory of the list-file, as a path usable as a process cwd.
    pub fn current_dir_of_process(&self) -> &str {
        if self.from_current_dir.is_empty() {
            "."
        } else {
            &self.from_current_dir
        }
    }

    fn new_for_appended_dir(&self, dir_delta: &str) -> Self {
        let dir_delta = with_trailing_separator(dir_delta);
        Self::new(
            join(&self.from_current_dir, &dir_delta),
            join(&self.from_top_level_file, &dir_delta),
        )
    }
}

fn with_trailing_separator(directory: &str) -> String {
    if directory.is_empty() || directory.ends_with(['/', MAIN_SEPARATOR]) {
        directory.to_string()
    } else {
        format!("{}{}", directory, MAIN_SEPARATOR)
    }
}

/// `prefix` is empty or ends with a separator, so plain concatenation is a join.
fn join(prefix: &str, path: &str) -> String {
    if Path::new(path).is_absolute() {
        path.to_string()
    } else {
        format!("{}{}", prefix, path)
    }
}

fn prefixed(prefix: &str, file_name: &str) -> String {
    join(prefix, file_name)
}

/// The environment a list-file's Processors are evaluated in.
#[derive(Debug)]
pub struct Environment {
    pub file_refs: FileReferenceEnvironment,
    pub fail_on_missing_file: bool,
    condition: Rc<TagsCondition>,
    /// Replaceable, so that an include that neither exports nor isolates
    /// the tags can hand a fresh object to both sides.
    tags: RefCell<SharedTags>,
}

impl Environment {
    pub fn new(
        file_refs: FileReferenceEnvironment,
        fail_on_missing_file: bool,
        condition: Rc<TagsCondition>,
        tags: SharedTags,
    ) -> Self {
        Self {
            file_refs,
            fail_on_missing_file,
            condition,
            tags: RefCell::new(tags),
        }
    }

    pub fn for_top_level_file(
        file_name: &str,
        fail_on_missing_file: bool,
        condition: Rc<TagsCondition>,
        tags: SharedTags,
    ) -> Self {
        Self::new(
            FileReferenceEnvironment::for_top_level_file(file_name),
            fail_on_missing_file,
            condition,
            tags,
        )
    }

    /// The handle to the tags object currently in effect.
    pub fn tags(&self) -> SharedTags {
        Rc::clone(&self.tags.borrow())
    }

    pub fn current_tags(&self) -> TagSet {
        self.tags().borrow().current().clone()
    }

    pub fn satisfies_tags_filter(&self, file_tags: &TagSet) -> bool {
        self.condition.is_satisfied_by(file_tags)
    }

    pub fn current_tags_satisfies_tags_filter(&self) -> bool {
        let tags = self.tags();
        let tags = tags.borrow();
        self.satisfies_tags_filter(tags.current())
    }

    /// Derives the environment of an included file.
    ///
    /// | export | import | included file gets                                  |
    /// |--------|--------|-----------------------------------------------------|
    /// | no     | no     | a new, empty, isolated object                       |
    /// | no     | yes    | a new, empty object that also replaces the tags of  |
    /// |        |        | the including file (so modifications flow back)     |
    /// | yes    | yes    | the very same object                                |
    /// | yes    | no     | an independent copy                                 |
    pub fn new_for_included_file(
        &self,
        file_name_relative_include_file: &str,
        preserve_current_directory: bool,
        policy: TagsIncludePolicy,
    ) -> Self {
        Self {
            file_refs: self
                .file_refs
                .for_included_file(file_name_relative_include_file, preserve_current_directory),
            fail_on_missing_file: self.fail_on_missing_file,
            condition: Rc::clone(&self.condition),
            tags: RefCell::new(self.tags_for_included_file(policy)),
        }
    }

    fn tags_for_included_file(&self, policy: TagsIncludePolicy) -> SharedTags {
        match (policy.export, policy.import) {
            (false, false) => Tags::new_shared(),
            (false, true) => {
                let fresh = Tags::new_shared();
                self.tags.replace(Rc::clone(&fresh));
                fresh
            }
            (true, true) => self.tags(),
            (true, false) => {
                let copy = self.tags().borrow().clone();
                Rc::new(RefCell::new(copy))
            }
        }
    }
}
