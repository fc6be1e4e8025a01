// src/lib.rs
pub mod cli;
pub mod config;
pub mod dialog;
pub mod error;
pub mod indices;
pub mod io;
pub mod plugin;
pub mod processing;
pub mod style;
pub mod workspace;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
