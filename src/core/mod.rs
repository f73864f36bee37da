// src/core/mod.rs

pub mod config_loader;
pub mod environment;
pub mod errors;
pub mod graph_display;
pub mod instructions;
pub mod line_parser;
pub mod lines_source;
pub mod matcher;
pub mod paths;
pub mod processor;
pub mod rendition;
pub mod result_items;
pub mod tags;
