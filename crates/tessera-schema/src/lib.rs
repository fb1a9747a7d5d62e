//! # tessera-schema
//!
//! The typed-table schema subsystem of Tessera.
//!
//! Tables and columns are named by [`Shove`]s: 64-bit tokens packing a
//! seeded hash of the uppercased identifier with its type and index
//! flags. Each table's definition persists as a checksum-protected record
//! in a reserved catalog tree; clients hold lazily bound name handles
//! ([`TableId`], [`ColumnId`]) that refresh against a transaction's
//! schema version, and the trees backing tables and indexes are resolved
//! through a session-wide handle cache.
//!
//! ## Example
//!
//! ```rust
//! use tessera_schema::{
//!     create_table, open_column, refresh_couple, ColType, ColumnId, ColumnSet,
//!     IndexKind, TableId, TableStore, TxnLevel,
//! };
//!
//! # fn main() -> tessera_schema::SchemaResult<()> {
//! let store = TableStore::default();
//!
//! let mut set = ColumnSet::new();
//! set.describe("id", ColType::Uint64, IndexKind::PrimaryUniqueOrderedObverse)?;
//! set.describe("name", ColType::Str, IndexKind::SecondaryWithdupsOrderedObverse)?;
//!
//! let mut txn = store.begin(TxnLevel::Schema);
//! create_table(&mut txn, "users", &mut set)?;
//! txn.commit()?;
//!
//! let mut table = TableId::new("users")?;
//! let mut column = ColumnId::new(&table, "name")?;
//! let mut txn = store.begin(TxnLevel::Read);
//! refresh_couple(&mut txn, &mut table, Some(&mut column))?;
//! let (_tbl, _idx) = open_column(&mut txn, &mut table, &mut column)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cache;
pub mod catalog;
pub mod column_set;
pub mod ddl;
pub mod error;
pub mod handle;
pub mod kind;
pub mod record;
pub mod row;
pub mod shove;
pub mod store;

mod index;
mod open;

pub use cache::DbiCache;
pub use catalog::{schema_fetch, SchemaInfo};
pub use column_set::ColumnSet;
pub use ddl::{create_table, drop_table};
pub use error::{ErrorCode, SchemaError, SchemaResult};
pub use handle::{refresh_couple, refresh_table, ColumnId, TableId};
pub use kind::{ColType, IndexKind};
pub use open::{open_column, open_secondaries, open_table};
pub use record::TableSchema;
pub use row::{check_unindexed_columns, FieldLookup};
pub use shove::{validate_name, NameKind, Shove};
pub use store::{SchemaTxn, TableStore};

pub use tessera_engine::{Dbi, EngineConfig, TxnLevel};
