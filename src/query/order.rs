//! Result ordering specification

use std::fmt;
use std::ops::BitOr;

use crate::schema::PropertyDescriptor;

/// Bit flags modifying one sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OrderFlags(u32);

impl OrderFlags {
    /// Ascending, case-insensitive, nulls first
    pub const NONE: OrderFlags = OrderFlags(0);
    pub const DESCENDING: OrderFlags = OrderFlags(1);
    pub const CASE_SENSITIVE: OrderFlags = OrderFlags(2);
    /// Nulls after every value, whatever the direction
    pub const NULLS_LAST: OrderFlags = OrderFlags(4);

    pub fn from_bits(bits: u32) -> Self {
        OrderFlags(bits & 0b111)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: OrderFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_descending(&self) -> bool {
        self.contains(OrderFlags::DESCENDING)
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.contains(OrderFlags::CASE_SENSITIVE)
    }

    pub fn nulls_last(&self) -> bool {
        self.contains(OrderFlags::NULLS_LAST)
    }
}

impl BitOr for OrderFlags {
    type Output = OrderFlags;

    fn bitor(self, rhs: OrderFlags) -> OrderFlags {
        OrderFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for OrderFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.is_descending() { "desc" } else { "asc" })?;
        if self.is_case_sensitive() {
            write!(f, ", case-sensitive")?;
        }
        write!(f, ", nulls {}", if self.nulls_last() { "last" } else { "first" })
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderKey {
    pub property: PropertyDescriptor,
    pub flags: OrderFlags,
}

/// Ordered list of sort keys, primary first
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderSpec {
    keys: Vec<OrderKey>,
}

impl OrderSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, property: PropertyDescriptor, flags: OrderFlags) {
        self.keys.push(OrderKey { property, flags });
    }

    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} ({})", key.property.name, key.flags)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_composition() {
        let flags = OrderFlags::DESCENDING | OrderFlags::CASE_SENSITIVE | OrderFlags::NULLS_LAST;
        assert_eq!(flags.bits(), 7);
        assert!(flags.is_descending());
        assert!(flags.nulls_last());
        assert!(!OrderFlags::NONE.is_case_sensitive());
    }

    #[test]
    fn test_from_bits_masks_unknown() {
        assert_eq!(OrderFlags::from_bits(0xFF).bits(), 7);
    }

    #[test]
    fn test_display() {
        assert_eq!(OrderFlags::NONE.to_string(), "asc, nulls first");
        assert_eq!(
            (OrderFlags::DESCENDING | OrderFlags::NULLS_LAST).to_string(),
            "desc, nulls last"
        );
    }
}
