//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, list, init)
//! - [`harvest`] - Batch harvest from a CSV file
//! - [`tile`] - Tile address and URL for one coordinate

pub mod config;
pub mod harvest;
pub mod tile;
