// src/core/paths.rs

use crate::constants::{CONFIG_FILENAME, CONFIG_PATH_ENV_VAR};
use anyhow::{Result, anyhow};
use std::env;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not determine the current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// Lexically normalizes a path.
///
/// `A//B`, `A/B/`, `A/./B` and `A/foo/../B` all become `A/B`. The file system
/// is never consulted, so the result may differ in meaning from the input if
/// the path goes through a symbolic link. An empty path normalizes to `.`.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let is_absolute = path.starts_with('/') || path.starts_with(MAIN_SEPARATOR);

    let mut components: Vec<&str> = Vec::new();
    for component in path.split(['/', MAIN_SEPARATOR]) {
        match component {
            "" | "." => {}
            ".." => match components.last() {
                Some(&last) if last != ".." => {
                    components.pop();
                }
                // `/..` is `/`.
                _ if is_absolute => {}
                _ => components.push(".."),
            },
            other => components.push(other),
        }
    }

    let joined = components.join(&MAIN_SEPARATOR.to_string());
    match (is_absolute, joined.is_empty()) {
        (true, _) => format!("{}{}", MAIN_SEPARATOR, joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Makes a path absolute by prepending the current directory, then
/// normalizes it.
pub fn absolute_path(path: &str) -> Result<String, PathError> {
    if Path::new(path).is_absolute() {
        return Ok(normalize_path(path));
    }
    let cwd = env::current_dir().map_err(PathError::CurrentDir)?;
    let cwd = dunce::simplified(&cwd);
    Ok(normalize_path(&cwd.join(path).to_string_lossy()))
}

/// Returns the directory part of a path, as `os.path.dirname` would: empty
/// if the path has no directory component.
pub fn directory_component(path: &str) -> &str {
    match path.rfind(['/', MAIN_SEPARATOR]) {
        // Keep a lone leading separator (the root directory).
        Some(0) => path.get(..1).unwrap_or_default(),
        Some(index) => path
            .get(..index)
            .unwrap_or_default()
            .trim_end_matches(['/', MAIN_SEPARATOR]),
        None => "",
    }
}

/// Returns the path of the user's filelist config directory (`~/.config/filelist`).
/// The directory is not created.
pub fn get_filelist_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("filelist"))
}

/// Finds the settings file to load, if any.
///
/// Priority: an explicit path (command line), then `$FILELIST_CONFIG`, then
/// `config.toml` in the user config directory. The first two must exist;
/// the last one is optional.
pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(template) = env::var(CONFIG_PATH_ENV_VAR) {
        // `shellexpand::full` handles both home dir and env vars.
        let expanded = shellexpand::full(&template).map_err(|e| {
            anyhow!(
                "Failed to expand {} value '{}': {}",
                CONFIG_PATH_ENV_VAR,
                template,
                e
            )
        })?;
        return Ok(Some(PathBuf::from(expanded.into_owned())));
    }

    Ok(get_filelist_config_dir()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .filter(|path| path.is_file()))
}
