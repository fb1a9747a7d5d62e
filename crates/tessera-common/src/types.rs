//! Core version types for Tessera.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Change sequence number - a monotonic database version.
///
/// Every committing write transaction advances the database version; the
/// CSN recorded in a schema record is the database version at which that
/// schema was written. A CSN of zero never names a committed state and is
/// used as the "never refreshed" sentinel on name handles.
///
/// # Example
///
/// ```rust
/// use tessera_common::types::Csn;
///
/// let csn = Csn::new(42);
/// assert!(csn.is_valid());
/// assert!(csn > Csn::INVALID);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Csn(u64);

impl Csn {
    /// Invalid CSN, used as the "never written / never refreshed" sentinel.
    pub const INVALID: Self = Self(0);

    /// First valid CSN.
    pub const FIRST: Self = Self(1);

    /// Creates a new `Csn` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(csn: u64) -> Self {
        Self(csn)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next CSN.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Checks if this is a valid (committed) CSN.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Debug for Csn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Csn(INVALID)")
        } else {
            write!(f, "Csn({})", self.0)
        }
    }
}

impl fmt::Display for Csn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Csn {
    #[inline]
    fn from(csn: u64) -> Self {
        Self::new(csn)
    }
}

impl From<Csn> for u64 {
    #[inline]
    fn from(csn: Csn) -> Self {
        csn.0
    }
}
