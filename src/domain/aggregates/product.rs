//! Product Aggregate
//!
//! Owns the stock numbers the cart reconciliation relies on. When a per-size
//! breakdown exists, the aggregate stock is derived from it rather than
//! stored independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::Quantity;

#[derive(Clone, Debug)]
pub struct Product {
    id: Uuid,
    name: String,
    description: String,
    price: i64,
    currency: String,
    category_id: Option<Uuid>,
    subcategory_id: Option<Uuid>,
    stock: Quantity,
    sizes: Vec<SizeStock>,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

/// Per-size stock entry, ordered by position in `Product::sizes`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SizeStock {
    pub label: String,
    pub stock: u32,
}

impl Product {
    pub fn create(name: impl Into<String>, price: i64, currency: &str) -> Result<Self, ProductError> {
        let name = name.into();
        if name.trim().is_empty() { return Err(ProductError::MissingName); }
        if price < 0 { return Err(ProductError::NegativePrice); }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(), name, description: String::new(), price,
            currency: currency.to_string(), category_id: None, subcategory_id: None,
            stock: Quantity::default(), sizes: vec![], images: vec![],
            created_at: now, updated_at: now, events: vec![],
        })
    }

    /// Rebuilds an aggregate from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        name: String,
        description: String,
        price: i64,
        currency: String,
        category_id: Option<Uuid>,
        subcategory_id: Option<Uuid>,
        stock: u32,
        sizes: Vec<SizeStock>,
        images: Vec<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id, name, description, price, currency, category_id, subcategory_id,
            stock: Quantity::new(stock), sizes, images, created_at, updated_at,
            events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn price(&self) -> i64 { self.price }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn category_id(&self) -> Option<Uuid> { self.category_id }
    pub fn subcategory_id(&self) -> Option<Uuid> { self.subcategory_id }
    pub fn stock(&self) -> u32 { self.stock.value() }
    pub fn sizes(&self) -> &[SizeStock] { &self.sizes }
    pub fn images(&self) -> &[String] { &self.images }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_in_stock(&self) -> bool { !self.stock.is_zero() }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
        self.touch();
    }

    pub fn set_category(&mut self, category_id: Option<Uuid>, subcategory_id: Option<Uuid>) {
        self.category_id = category_id;
        self.subcategory_id = subcategory_id;
        self.touch();
    }

    pub fn set_images(&mut self, images: Vec<String>) {
        self.images = images;
        self.touch();
    }

    pub fn update_price(&mut self, price: i64) -> Result<(), ProductError> {
        if price < 0 { return Err(ProductError::NegativePrice); }
        self.price = price;
        self.touch();
        Ok(())
    }

    /// Replaces the per-size breakdown and derives the aggregate stock
    /// from it, so the two can never drift apart.
    pub fn set_sizes(&mut self, sizes: Vec<SizeStock>) {
        self.stock = Quantity::new(sizes.iter().map(|s| s.stock).sum());
        self.sizes = sizes;
        self.touch();
    }

    /// Sets aggregate stock directly; only valid for products without a
    /// per-size breakdown.
    pub fn set_stock(&mut self, stock: u32) -> Result<(), ProductError> {
        if !self.sizes.is_empty() { return Err(ProductError::StockIsDerived); }
        self.stock = Quantity::new(stock);
        self.touch();
        Ok(())
    }

    /// Takes `qty` units out of available stock for a cart reservation.
    pub fn reserve(&mut self, qty: u32) -> Result<(), ProductError> {
        self.stock = self.stock.subtract(qty).ok_or(ProductError::InsufficientStock)?;
        self.touch();
        self.raise(ProductEvent::StockReserved {
            product_id: self.id, quantity: qty, remaining: self.stock.value(),
        });
        Ok(())
    }

    /// Returns `qty` units to available stock when a reservation is undone.
    pub fn release(&mut self, qty: u32) {
        self.stock = self.stock.add(qty);
        self.touch();
        self.raise(ProductEvent::StockReleased {
            product_id: self.id, quantity: qty, remaining: self.stock.value(),
        });
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise(&mut self, e: ProductEvent) { self.events.push(DomainEvent::Product(e)); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("Product name is required")]
    MissingName,
    #[error("Price cannot be negative")]
    NegativePrice,
    #[error("Insufficient stock")]
    InsufficientStock,
    #[error("Aggregate stock is derived from sizes")]
    StockIsDerived,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_stock(stock: u32) -> Product {
        let mut p = Product::create("Denim Jacket", 249900, "INR").unwrap();
        p.set_stock(stock).unwrap();
        p
    }

    #[test]
    fn test_reserve_and_release() {
        let mut p = product_with_stock(10);
        p.reserve(4).unwrap();
        assert_eq!(p.stock(), 6);
        p.release(4);
        assert_eq!(p.stock(), 10);
        assert_eq!(p.take_events().len(), 2);
    }

    #[test]
    fn test_reserve_beyond_stock_leaves_product_unchanged() {
        let mut p = product_with_stock(2);
        assert_eq!(p.reserve(3), Err(ProductError::InsufficientStock));
        assert_eq!(p.stock(), 2);
        assert!(p.take_events().is_empty());
    }

    #[test]
    fn test_aggregate_stock_derived_from_sizes() {
        let mut p = Product::create("Tee", 79900, "INR").unwrap();
        p.set_sizes(vec![
            SizeStock { label: "S".into(), stock: 3 },
            SizeStock { label: "M".into(), stock: 5 },
            SizeStock { label: "L".into(), stock: 0 },
        ]);
        assert_eq!(p.stock(), 8);
        assert!(p.set_stock(20).is_err());
    }

    #[test]
    fn test_in_stock_reflects_quantity() {
        let mut p = product_with_stock(1);
        assert!(p.is_in_stock());
        p.reserve(1).unwrap();
        assert!(!p.is_in_stock());
    }

    #[test]
    fn test_create_rejects_bad_input() {
        assert!(Product::create("  ", 100, "INR").is_err());
        assert!(Product::create("Scarf", -1, "INR").is_err());
    }
}
