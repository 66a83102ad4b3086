//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`describe`] - Print layers and datasource descriptions as JSON
//! - [`grid`] - Render a layer into a feature grid
//! - [`render`] - Render a stylesheet to an image or SVG

pub mod common;
pub mod describe;
pub mod grid;
pub mod render;
