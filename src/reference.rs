use std::fmt::{Display, Formatter};

use crate::utils::MyHash;

/// Handle to an abstract value interned in a [`ValueFactory`][crate::factory::ValueFactory].
///
/// Handles are 1-based; 0 is never issued.
/// Two handles from the same factory are equal iff they denote the same value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ValueId(u32);

impl ValueId {
    /// Creates a handle from a raw table index.
    ///
    /// # Panics
    ///
    /// Panics if `index == 0`.
    pub fn new(index: u32) -> Self {
        assert_ne!(index, 0, "Value index should not be zero");
        Self(index)
    }

    /// Return the raw index of the handle.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl MyHash for ValueId {
    fn hash(&self) -> u64 {
        self.0 as u64
    }
}

impl Display for ValueId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_id() {
        let a = ValueId::new(1);
        let b = ValueId::new(2);
        assert_eq!(a.index(), 1);
        assert_eq!(b.get(), 2);
        assert!(a < b);
        assert_eq!(a.to_string(), "#1");
    }

    #[test]
    #[should_panic(expected = "Value index should not be zero")]
    fn test_zero_panics() {
        ValueId::new(0);
    }
}
