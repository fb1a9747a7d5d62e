//! # tessera-common
//!
//! Shared constants and types for Tessera.
//!
//! This crate holds the pieces every other Tessera crate agrees on:
//!
//! - **Constants**: identifier limits, catalog capacity, on-disk magic
//!   numbers, and hash seeds
//! - **Types**: the [`Csn`] change-sequence-number newtype
//!
//! ## Example
//!
//! ```rust
//! use tessera_common::types::Csn;
//! use tessera_common::constants::MAX_COLS;
//!
//! let csn = Csn::new(7);
//! assert!(csn.is_valid());
//! assert!(MAX_COLS >= 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod types;

pub use constants::*;
pub use types::Csn;
