// src/cli/handlers/hierarchy.rs

use anyhow::Result;
use std::io::Write;

use super::commons::{self, RunSettings};
use crate::core::{
    environment::Environment,
    errors::InterpreterError,
    graph_display::{self, InclusionNode},
    line_parser::ParsingSettings,
    processor::ListFileProcessor,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Indented by one space per level; names as opened.
    Simple,
    /// ASCII tree; names as written in the including file, one empty line
    /// between the trees of the FILE arguments.
    Pretty,
}

/// Prints the inclusion hierarchy of every FILE argument instead of its items.
pub fn handle(settings: &RunSettings, layout: Layout, out: &mut dyn Write) -> Result<()> {
    commons::for_each_list_file(settings, |file_number, file, env| {
        if layout == Layout::Pretty && file_number != 1 {
            writeln!(out)?;
        }

        let tree = inclusion_tree(file, &settings.parsing, &env, layout)?;
        let lines = match layout {
            Layout::Simple => graph_display::render_simple(&tree),
            Layout::Pretty => graph_display::render_pretty(&tree),
        };
        for line in lines {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    })
}

fn inclusion_tree(
    file: &ListFileProcessor,
    parsing: &ParsingSettings,
    env: &Environment,
    layout: Layout,
) -> Result<InclusionNode, InterpreterError> {
    let name = match layout {
        Layout::Simple => &file.file_name,
        Layout::Pretty => &file.file_name_relative_including_file,
    };
    let mut node = InclusionNode::new(name.as_str());

    for include in file.includes() {
        let resolved = include.resolve(parsing, env)?;
        node.children
            .push(inclusion_tree(&resolved.file, parsing, &resolved.env, layout)?);
    }
    Ok(node)
}
