//! Tree open flags.

bitflags::bitflags! {
    /// Flags controlling how a named tree is opened or created.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TreeFlags: u32 {
        /// Create the tree if it does not exist.
        const CREATE = 0b0000_0001;
        /// Keys are native-endian unsigned integers.
        const INTEGER_KEY = 0b0000_0010;
        /// Allow multiple sorted data items per key.
        const DUP_SORT = 0b0000_0100;
        /// Keys compare in reversed byte order.
        const REVERSE_KEY = 0b0000_1000;
    }
}

impl TreeFlags {
    /// Returns the flags that describe a tree's persistent shape.
    ///
    /// `CREATE` is an open-time directive, not a property of the tree, so
    /// it is excluded when comparing a reopen against the stored shape.
    #[inline]
    #[must_use]
    pub fn shape(self) -> Self {
        self & !Self::CREATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_strips_create() {
        let flags = TreeFlags::CREATE | TreeFlags::DUP_SORT;
        assert_eq!(flags.shape(), TreeFlags::DUP_SORT);
    }
}
