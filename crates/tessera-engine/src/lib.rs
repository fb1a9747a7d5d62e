//! # tessera-engine
//!
//! The key/value engine underneath Tessera's typed-table layer.
//!
//! The engine manages a registry of named ordered trees, each with its own
//! key and data comparators, and hands out leveled transactions:
//!
//! - **Read** transactions observe the last committed state and take no
//!   locks.
//! - **Write** transactions hold the single writer slot.
//! - **Schema** transactions are write transactions that are additionally
//!   allowed to change the set of trees and the schema version.
//!
//! The schema subsystem in `tessera-schema` is the only intended client;
//! the surface here is deliberately the contract that layer consumes:
//! tree open/create with comparators, `get`/`put`/`del`, cursors, tree
//! drop, and the monotonic database/schema version counters.
//!
//! ## Example
//!
//! ```rust
//! use tessera_engine::{Comparator, Database, EngineConfig, TreeFlags, TxnLevel};
//!
//! # fn main() -> tessera_engine::EngineResult<()> {
//! let db = Database::new(EngineConfig::default());
//! let mut txn = db.begin(TxnLevel::Write);
//! let dbi = txn.open_tree(
//!     "t",
//!     TreeFlags::CREATE,
//!     Comparator::Lexical,
//!     Comparator::Lexical,
//! )?;
//! txn.put(dbi, b"k", b"v", false)?;
//! txn.commit()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cmp;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod flags;
pub mod txn;

mod tree;

pub use cmp::Comparator;
pub use config::EngineConfig;
pub use cursor::Cursor;
pub use db::{Database, Dbi};
pub use error::{EngineError, EngineResult};
pub use flags::TreeFlags;
pub use txn::{Transaction, TxnLevel};
