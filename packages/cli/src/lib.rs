//! Profile discovery and per-profile runs for the `bookthrifter` binary.

pub mod config;
pub mod run;

pub use config::{discover_profiles, Paths, Profile};
pub use run::{extract_with_session, persist_outcome, run_profile, RunOptions, RunSummary};
