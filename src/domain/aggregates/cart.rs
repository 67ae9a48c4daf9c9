//! Cart Aggregate
//!
//! One cart per user. Every mutation reconciles the product's stock in the
//! same step: adding reserves units, removing releases them, and quantity
//! updates move the delta, so reserved cart quantities and available stock
//! always add up.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::aggregates::product::Product;

#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

impl Cart {
    /// Created lazily on a user's first add-to-cart.
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(), user_id, items: vec![], created_at: now, updated_at: now }
    }

    pub fn from_parts(
        id: Uuid,
        user_id: Uuid,
        items: Vec<CartItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self { id, user_id, items, created_at, updated_at }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    pub fn quantity_of(&self, product_id: Uuid) -> Option<u32> {
        self.items.iter().find(|i| i.product_id == product_id).map(|i| i.quantity)
    }

    /// Reserves `qty` units of `product` and appends or merges the line item.
    /// Fails without touching either side when stock is short.
    pub fn add_item(&mut self, product: &mut Product, qty: u32) -> Result<(), CartError> {
        if qty == 0 { return Err(CartError::InvalidQuantity); }
        product.reserve(qty).map_err(|_| CartError::InsufficientStock)?;
        if let Some(existing) = self.items.iter_mut().find(|i| i.product_id == product.id()) {
            existing.quantity += qty;
        } else {
            self.items.push(CartItem { product_id: product.id(), quantity: qty });
        }
        self.touch();
        Ok(())
    }

    /// Sets the line for `product` to `new_qty`, moving the stock delta.
    /// Increasing past available stock fails and leaves both sides unchanged;
    /// a quantity of zero removes the line and releases its reservation.
    pub fn update_quantity(&mut self, product: &mut Product, new_qty: u32) -> Result<(), CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id())
            .ok_or(CartError::ItemNotFound)?;
        let old_qty = item.quantity;
        if new_qty > old_qty {
            product
                .reserve(new_qty - old_qty)
                .map_err(|_| CartError::InsufficientStock)?;
        } else if new_qty < old_qty {
            product.release(old_qty - new_qty);
        }
        if new_qty == 0 {
            self.items.retain(|i| i.product_id != product.id());
        } else {
            item.quantity = new_qty;
        }
        self.touch();
        Ok(())
    }

    /// Drops the line for `product`, releasing its full reservation.
    /// Returns the quantity that was restored.
    pub fn remove_item(&mut self, product: &mut Product) -> Result<u32, CartError> {
        let pos = self
            .items
            .iter()
            .position(|i| i.product_id == product.id())
            .ok_or(CartError::ItemNotFound)?;
        let removed = self.items.remove(pos);
        product.release(removed.quantity);
        self.touch();
        Ok(removed.quantity)
    }

    /// Drops the lines for `product_ids` when an order carries their
    /// reservation over; stock is not touched. Lines for other products stay
    /// in the cart and keep their reservation. Returns the product ids of
    /// the lines that were removed.
    pub fn clear_lines(&mut self, product_ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
        let ids: Vec<Uuid> = product_ids.into_iter().collect();
        let mut removed = Vec::new();
        self.items.retain(|i| {
            if ids.contains(&i.product_id) {
                removed.push(i.product_id);
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            self.touch();
        }
        removed
    }

    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Item not found in cart")]
    ItemNotFound,
    #[error("Insufficient stock")]
    InsufficientStock,
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_stock(stock: u32) -> Product {
        let mut p = Product::create("Linen Shirt", 129900, "INR").unwrap();
        p.set_stock(stock).unwrap();
        p
    }

    #[test]
    fn test_add_reserves_and_merges() {
        let mut p = product_with_stock(5);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut p, 3).unwrap();
        assert_eq!(p.stock(), 2);
        assert_eq!(cart.quantity_of(p.id()), Some(3));
        cart.add_item(&mut p, 2).unwrap();
        assert_eq!(p.stock(), 0);
        assert_eq!(cart.quantity_of(p.id()), Some(5));
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_add_past_stock_fails_cleanly() {
        // stock=5: add 3, add 2, then the next unit must be refused
        let mut p = product_with_stock(5);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut p, 3).unwrap();
        cart.add_item(&mut p, 2).unwrap();
        assert_eq!(cart.add_item(&mut p, 1), Err(CartError::InsufficientStock));
        assert_eq!(p.stock(), 0);
        assert_eq!(cart.quantity_of(p.id()), Some(5));
    }

    #[test]
    fn test_update_moves_the_delta() {
        let mut p = product_with_stock(10);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut p, 4).unwrap();
        cart.update_quantity(&mut p, 7).unwrap();
        assert_eq!(p.stock(), 3);
        cart.update_quantity(&mut p, 2).unwrap();
        assert_eq!(p.stock(), 8);
        assert_eq!(cart.quantity_of(p.id()), Some(2));
    }

    #[test]
    fn test_update_past_stock_leaves_both_unchanged() {
        let mut p = product_with_stock(5);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut p, 4).unwrap();
        assert_eq!(cart.update_quantity(&mut p, 7), Err(CartError::InsufficientStock));
        assert_eq!(p.stock(), 1);
        assert_eq!(cart.quantity_of(p.id()), Some(4));
    }

    #[test]
    fn test_update_to_zero_removes_line() {
        let mut p = product_with_stock(5);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut p, 2).unwrap();
        cart.update_quantity(&mut p, 0).unwrap();
        assert_eq!(p.stock(), 5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_restores_full_reservation() {
        let mut p = product_with_stock(6);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut p, 4).unwrap();
        let restored = cart.remove_item(&mut p).unwrap();
        assert_eq!(restored, 4);
        assert_eq!(p.stock(), 6);
        assert!(cart.quantity_of(p.id()).is_none());
    }

    #[test]
    fn test_remove_missing_line() {
        let mut p = product_with_stock(6);
        let mut cart = Cart::new(Uuid::new_v4());
        assert_eq!(cart.remove_item(&mut p), Err(CartError::ItemNotFound));
        assert_eq!(p.stock(), 6);
    }

    #[test]
    fn test_clear_lines_keeps_reservation() {
        let mut p = product_with_stock(5);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut p, 3).unwrap();
        let cleared = cart.clear_lines([p.id()]);
        assert_eq!(cleared, vec![p.id()]);
        assert!(cart.is_empty());
        assert_eq!(p.stock(), 2);
    }

    #[test]
    fn test_ordering_a_subset_leaves_other_lines_reserved() {
        let mut jacket = product_with_stock(5);
        let mut scarf = product_with_stock(3);
        let mut cart = Cart::new(Uuid::new_v4());
        cart.add_item(&mut jacket, 2).unwrap();
        cart.add_item(&mut scarf, 1).unwrap();

        // Order only the jacket: its line leaves the cart, the scarf line
        // keeps both its place and its reserved unit.
        let cleared = cart.clear_lines([jacket.id()]);
        assert_eq!(cleared, vec![jacket.id()]);
        assert_eq!(cart.quantity_of(jacket.id()), None);
        assert_eq!(cart.quantity_of(scarf.id()), Some(1));
        assert_eq!(jacket.stock(), 3);
        assert_eq!(scarf.stock(), 2);
    }
}
