//! Domain types for the bookthrifter library.

pub mod catalog;
pub mod config;
pub mod outcome;
