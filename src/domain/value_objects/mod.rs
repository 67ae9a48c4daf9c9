//! Value objects shared across the domain

use serde::{Deserialize, Serialize};

/// Quantity value object
///
/// Non-negative count used for stock levels and cart line items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(u32);

impl Quantity {
    pub fn new(value: u32) -> Self { Self(value) }
    pub fn value(&self) -> u32 { self.0 }
    pub fn add(&self, other: u32) -> Self { Self(self.0.saturating_add(other)) }
    pub fn subtract(&self, other: u32) -> Option<Self> {
        if other > self.0 { None } else { Some(Self(self.0 - other)) }
    }
    pub fn is_zero(&self) -> bool { self.0 == 0 }
}

impl Default for Quantity { fn default() -> Self { Self(0) } }

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_subtract_checked() {
        let q = Quantity::new(5);
        assert_eq!(q.subtract(3), Some(Quantity::new(2)));
        assert_eq!(q.subtract(6), None);
    }
    #[test]
    fn test_add_saturates() {
        assert_eq!(Quantity::new(u32::MAX).add(1).value(), u32::MAX);
    }
}
