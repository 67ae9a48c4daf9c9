//! Domain events
//!
//! Raised by aggregates and drained by the API layer, which logs them.

use uuid::Uuid;

#[derive(Clone, Debug)]
pub enum DomainEvent {
    Product(ProductEvent),
    Order(OrderEvent),
}

#[derive(Clone, Debug)]
pub enum ProductEvent {
    StockReserved { product_id: Uuid, quantity: u32, remaining: u32 },
    StockReleased { product_id: Uuid, quantity: u32, remaining: u32 },
}

#[derive(Clone, Debug)]
pub enum OrderEvent {
    Placed { order_id: Uuid, user_id: Uuid, total: i64, payment_status: &'static str },
    StatusChanged { order_id: Uuid, from: &'static str, to: &'static str },
}
