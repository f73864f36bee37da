// src/cli/handlers/mod.rs

pub mod commons;
pub mod hierarchy;
pub mod list;

use anyhow::Result;
use std::io::Write;

use crate::{cli::Cli, core::config_loader};
use commons::RunSettings;
use hierarchy::Layout;

/// Runs the command line: loads the settings file, then prints either the
/// items of the list-files or their inclusion hierarchy.
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<()> {
    let config = config_loader::load(cli.config.as_deref())?;
    let settings = RunSettings::new(cli, &config)?;
    log::debug!("Run settings: {:?}", settings);

    if cli.print_inclusion_hierarchy {
        hierarchy::handle(&settings, Layout::Simple, out)
    } else if cli.print_inclusion_hierarchy_pretty {
        hierarchy::handle(&settings, Layout::Pretty, out)
    } else {
        list::handle(&settings, out)
    }
}
