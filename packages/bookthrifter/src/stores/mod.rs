//! File-backed persistence.
//!
//! - `LedgerFile` - record-low/high prices, locked read-modify-write
//! - `SnapshotStore` - one timestamped catalog file per run

pub mod ledger_file;
pub mod snapshot;

pub use ledger_file::LedgerFile;
pub use snapshot::{parse_snapshot_name, SnapshotStore};
