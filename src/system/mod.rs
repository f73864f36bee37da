//! # System Interaction Layer
//!
//! The boundary between the interpreter and the operating system.
//!
//! - **`executor`**: runs SHELL instructions and the preprocessor through the
//!   platform shell (`sh -c`, or `cmd /C` on Windows), capturing stdout.

pub mod executor;
