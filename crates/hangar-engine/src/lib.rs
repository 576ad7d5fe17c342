//! Reconciliation and identity-migration engine for Hangar.
//!
//! Every operation takes the store explicitly and is generic over
//! [`CollectionStore`](hangar_core::store::CollectionStore). Batch operations
//! process records sequentially; per-record failures are logged and counted
//! rather than aborting the batch.

pub mod cleanup;
pub mod import;
pub mod migrate;
pub mod orphans;
pub mod references;
pub mod resolve;
pub mod upsert;

pub use cleanup::{CleanupAction, CleanupRejected, run_cleanup};
pub use import::{ImportError, ImportSummary, import_context, import_file, import_rows};
pub use migrate::{MigrationError, MigrationReport, Precondition, mapping_for, migrate_identifiers};
pub use orphans::{OrphanReport, TableOrphans, delete_orphans, find_orphans};
pub use references::{EditionImportSummary, SyncSummary, create_edition, import_editions, sync_references};
pub use resolve::{apply_edition, resolve_edition};
pub use upsert::{UpsertOutcome, upsert};
