//! Database side of the import: the loader seam and its MySQL implementation.
//!
//! Layout:
//! - `models.rs`: connection descriptor and per-artifact target
//! - `schema.rs`: SQL statements issued by this crate
//! - `mysql.rs`: loader that pipes dumps into the `mysql` client, and the
//!   `sqlx`-backed replication master reset

pub mod models;
pub mod mysql;
pub mod schema;

pub use models::{ConnectionInfo, DatabaseTarget};
pub use mysql::MySqlLoader;

use crate::error::ImportError;
use std::future::Future;

/// Bulk-load interface of the database engine.
pub trait ArtifactLoader: Send + Sync {
    /// Execute `sql` against `target`. Any failure aborts the import.
    fn load(
        &self,
        target: &DatabaseTarget,
        sql: &[u8],
    ) -> impl Future<Output = Result<(), ImportError>> + Send;
}
