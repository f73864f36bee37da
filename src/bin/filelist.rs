// src/bin/filelist.rs

use clap::Parser;
use colored::*;
use filelist::{
    cli::{Cli, handlers},
    core::errors::InterpreterError,
};
use std::io::{self, BufWriter, Write};

/// Sets up logging, parses the command line and runs it, mapping errors to
/// the exit codes of the interpreter.
fn main() {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("CLI args parsed: {:?}", cli);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let result = handlers::run(&cli, &mut out);
    // Whatever was produced before an error is still printed.
    let flushed = out.flush();

    if let Err(e) = result {
        if let Some(interpreter_err) = e.downcast_ref::<InterpreterError>() {
            eprint!("{}", interpreter_err.render());
            std::process::exit(interpreter_err.exit_code());
        }
        if let Some(io_err) = e.downcast_ref::<io::Error>()
            && io_err.kind() == io::ErrorKind::BrokenPipe
        {
            std::process::exit(0);
        }
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }

    if let Err(e) = flushed
        && e.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
