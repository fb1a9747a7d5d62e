//! The column-set builder and its validation rules.
//!
//! A column set accumulates column descriptors for CREATE TABLE. Slot 0 is
//! reserved for the primary key; validation stable-sorts the remaining
//! columns so that indexed columns come first, then nullable non-indexed
//! ones, then plain columns, and checks the composite rules that also
//! apply to every persisted record.

use tessera_common::constants::{MAX_COLS, MAX_INDEXES};

use crate::error::{SchemaError, SchemaResult};
use crate::kind::{ColType, IndexKind};
use crate::shove::{validate_name, NameKind, Shove};

/// Sort weight of a column: indexed before nullable before plain.
fn weight(shove: Shove) -> u8 {
    if shove.is_indexed() {
        3
    } else if shove.is_nullable() {
        1
    } else {
        0
    }
}

/// An ordered set of column descriptors under construction.
///
/// # Example
///
/// ```rust
/// use tessera_schema::{ColType, ColumnSet, IndexKind};
///
/// # fn main() -> tessera_schema::SchemaResult<()> {
/// let mut set = ColumnSet::new();
/// set.describe("id", ColType::Uint64, IndexKind::PrimaryUniqueOrderedObverse)?;
/// set.describe("name", ColType::Str, IndexKind::SecondaryWithdupsOrderedObverse)?;
/// set.describe("age", ColType::Uint32, IndexKind::None)?;
/// set.validate()?;
/// assert_eq!(set.count(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    shoves: Vec<Shove>,
}

impl ColumnSet {
    /// Creates an empty column set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of described columns (including the reserved primary slot
    /// once any column exists).
    #[must_use]
    pub fn count(&self) -> usize {
        self.shoves.len()
    }

    /// The column shoves in their current order.
    #[must_use]
    pub fn columns(&self) -> &[Shove] {
        &self.shoves
    }

    /// Adds one column descriptor.
    ///
    /// Primary-kind columns install into slot 0, which must be free;
    /// secondary and non-indexed columns append. Secondary columns are
    /// rejected outright when a non-unique primary is already present.
    pub fn describe(&mut self, name: &str, ty: ColType, kind: IndexKind) -> SchemaResult<()> {
        if !validate_name(name) {
            return Err(SchemaError::InvalidName { name: name.into() });
        }
        if ty == ColType::Null {
            return Err(SchemaError::InvalidArgument {
                message: "reserved column type",
            });
        }
        check_reverse_combination(ty, kind)?;

        let shove = Shove::column(Shove::of_name(name, NameKind::Column), ty, kind);
        if self.shoves.iter().any(|existing| existing.name_eq(shove)) {
            return Err(SchemaError::ColumnExists { name: name.into() });
        }

        if kind.is_primary() {
            match self.shoves.first() {
                Some(&slot) if slot != Shove::NONE => return Err(SchemaError::PrimaryExists),
                Some(_) => self.shoves[0] = shove,
                None => self.shoves.push(shove),
            }
            return Ok(());
        }

        if kind.is_secondary() {
            if let Some(&primary) = self.shoves.first() {
                if primary != Shove::NONE && !primary.is_unique() {
                    return Err(SchemaError::InvalidArgument {
                        message: "secondary indexes require a unique primary key",
                    });
                }
            }
        }
        if self.shoves.len() >= MAX_COLS {
            return Err(SchemaError::TooManyColumns { max: MAX_COLS });
        }
        if self.shoves.is_empty() {
            // Hold slot 0 open for the primary key.
            self.shoves.push(Shove::NONE);
        }
        self.shoves.push(shove);
        Ok(())
    }

    /// Removes a described column by name.
    ///
    /// Removing the primary key leaves its slot reserved, so a later
    /// validation fails until a new primary is described.
    pub fn remove(&mut self, name: &str) -> SchemaResult<()> {
        if !validate_name(name) {
            return Err(SchemaError::InvalidName { name: name.into() });
        }
        let shove = Shove::of_name(name, NameKind::Column);
        let at = self
            .shoves
            .iter()
            .position(|existing| existing.name_eq(shove))
            .ok_or(SchemaError::NoSuchColumn)?;
        if at == 0 {
            if self.shoves.len() == 1 {
                self.shoves.clear();
            } else {
                self.shoves[0] = Shove::NONE;
            }
        } else {
            self.shoves.remove(at);
        }
        Ok(())
    }

    /// Canonicalizes and validates the set.
    ///
    /// Columns after the primary are stable-sorted by descending weight,
    /// which produces the order the persisted record will carry, then the
    /// composite rules are checked. Validation is idempotent.
    pub fn validate(&mut self) -> SchemaResult<()> {
        if self.shoves.is_empty() {
            return Err(SchemaError::InvalidArgument {
                message: "empty column set",
            });
        }
        if self.shoves.len() > MAX_COLS {
            return Err(SchemaError::TooManyColumns { max: MAX_COLS });
        }
        self.shoves[1..].sort_by(|a, b| weight(*b).cmp(&weight(*a)));
        validate_columns(&self.shoves)
    }
}

/// Rejects reverse-index combinations that the key encoding cannot carry:
/// a reverse index needs an ordered index over a type of at least 96 bits,
/// unless the column is nullable and the type's null sentinel is itself
/// reverse-sensitive.
fn check_reverse_combination(ty: ColType, kind: IndexKind) -> SchemaResult<()> {
    if kind.is_indexed() && kind.is_reverse() && (!kind.is_ordered() || !ty.is_wide()) {
        if !kind.is_nullable() || !ty.nullable_reverse_sensitive() {
            return Err(SchemaError::InvalidArgument {
                message: "reverse index unsupported for this column type",
            });
        }
    }
    Ok(())
}

/// Validates a finalized column array: the composite rules shared by the
/// builder and by persisted-record validation.
pub(crate) fn validate_columns(columns: &[Shove]) -> SchemaResult<()> {
    if columns.is_empty() {
        return Err(SchemaError::InvalidArgument {
            message: "empty column set",
        });
    }
    if columns.len() > MAX_COLS {
        return Err(SchemaError::TooManyColumns { max: MAX_COLS });
    }

    let mut indexed = 0usize;
    for (at, &shove) in columns.iter().enumerate() {
        let kind = shove.index_kind().ok_or(SchemaError::InvalidArgument {
            message: "unknown index kind",
        })?;

        if kind.is_primary() {
            if at != 0 {
                return Err(SchemaError::InvalidArgument {
                    message: "primary key must be the first column",
                });
            }
            indexed = 1;
        } else {
            if at == 0 {
                return Err(SchemaError::InvalidArgument {
                    message: "first column must carry the primary key",
                });
            }
            if kind.is_secondary() {
                if !columns[at - 1].is_indexed() {
                    return Err(SchemaError::InvalidArgument {
                        message: "indexed columns must be contiguous",
                    });
                }
                if !columns[0].is_unique() {
                    return Err(SchemaError::InvalidArgument {
                        message: "secondary indexes require a unique primary key",
                    });
                }
                indexed += 1;
                if indexed > MAX_INDEXES {
                    return Err(SchemaError::TooManyIndexes { max: MAX_INDEXES });
                }
            }
        }

        let ty = shove.col_type().ok_or(SchemaError::InvalidArgument {
            message: "unknown column type",
        })?;
        if ty == ColType::Null {
            return Err(SchemaError::InvalidArgument {
                message: "reserved column type",
            });
        }
        check_reverse_combination(ty, kind)?;

        if columns[..at].iter().any(|prior| prior.name_eq(shove)) {
            return Err(SchemaError::InvalidArgument {
                message: "duplicate column name",
            });
        }
    }
    Ok(())
}
