//! Core trait abstractions for the bookthrifter library.
//!
//! The browser is the only capability the core needs injected; everything
//! else (ledger, snapshots) is plain file I/O.

pub mod page;
