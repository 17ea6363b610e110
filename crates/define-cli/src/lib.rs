//! Library side of the `definex` command-line tool.

pub mod commands;
pub mod logging;
pub mod summary;
pub mod types;
