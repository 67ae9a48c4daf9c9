//! Order Aggregate
//!
//! Orders are placed through a single constructor regardless of how they are
//! paid; checkout and gateway verification only differ in the payment state
//! they pass in. The item snapshot and its captured prices never change after
//! placement, and status changes go through a validated transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    order_number: String,
    user_id: Uuid,
    status: OrderStatus,
    payment_method: String,
    payment_status: PaymentStatus,
    items: Vec<OrderLine>,
    total: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

/// Line item with the price captured at order time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Canceled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
        }
    }

    fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Shipped)
                | (OrderStatus::Pending, OrderStatus::Canceled)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
                | (OrderStatus::Shipped, OrderStatus::Canceled)
        )
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELED" => Ok(OrderStatus::Canceled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

impl Order {
    /// The one order-construction path. `payment_status` is Pending for plain
    /// checkout and Paid when a verified gateway payment places the order.
    pub fn place(
        order_number: String,
        user_id: Uuid,
        items: Vec<OrderLine>,
        payment_method: impl Into<String>,
        payment_status: PaymentStatus,
        currency: &str,
    ) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        if items.iter().any(|i| i.quantity == 0) { return Err(OrderError::InvalidLine); }
        let total = items
            .iter()
            .map(|i| i.unit_price * i64::from(i.quantity))
            .sum();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut order = Self {
            id, order_number, user_id, status: OrderStatus::Pending,
            payment_method: payment_method.into(), payment_status, items, total,
            currency: currency.to_string(), created_at: now, updated_at: now,
            events: vec![],
        };
        order.raise(OrderEvent::Placed {
            order_id: id, user_id, total, payment_status: payment_status.as_str(),
        });
        Ok(order)
    }

    /// Rebuilds an aggregate from persisted state.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        order_number: String,
        user_id: Uuid,
        status: OrderStatus,
        payment_method: String,
        payment_status: PaymentStatus,
        items: Vec<OrderLine>,
        total: i64,
        currency: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id, order_number, user_id, status, payment_method, payment_status,
            items, total, currency, created_at, updated_at, events: vec![],
        }
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_method(&self) -> &str { &self.payment_method }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn items(&self) -> &[OrderLine] { &self.items }
    pub fn total(&self) -> i64 { self.total }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Moves the order along PENDING -> {SHIPPED, CANCELED} ->
    /// {DELIVERED, CANCELED}; DELIVERED and CANCELED are terminal.
    pub fn transition(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidStatusTransition {
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        let from = self.status.as_str();
        self.status = next;
        self.updated_at = Utc::now();
        self.raise(OrderEvent::StatusChanged { order_id: self.id, from, to: next.as_str() });
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise(&mut self, e: OrderEvent) { self.events.push(DomainEvent::Order(e)); }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Order has no items")]
    NoItems,
    #[error("Order line has zero quantity")]
    InvalidLine,
    #[error("Unknown status: {0}")]
    UnknownStatus(String),
    #[error("Illegal status transition: {from} -> {to}")]
    InvalidStatusTransition { from: &'static str, to: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(qty: u32, unit_price: i64) -> OrderLine {
        OrderLine { product_id: Uuid::new_v4(), name: "Chinos".into(), quantity: qty, unit_price }
    }

    fn pending_order() -> Order {
        Order::place(
            "ORD-00000001".into(), Uuid::new_v4(), vec![line(2, 99900)], "COD",
            PaymentStatus::Pending, "INR",
        )
        .unwrap()
    }

    #[test]
    fn test_total_computed_from_snapshot() {
        let order = Order::place(
            "ORD-00000002".into(), Uuid::new_v4(), vec![line(2, 99900), line(1, 49900)],
            "COD", PaymentStatus::Pending, "INR",
        )
        .unwrap();
        assert_eq!(order.total(), 2 * 99900 + 49900);
        assert_eq!(order.status(), OrderStatus::Pending);
    }

    #[test]
    fn test_place_is_append_only() {
        let user = Uuid::new_v4();
        let a = Order::place("ORD-1".into(), user, vec![line(1, 500)], "COD", PaymentStatus::Pending, "INR").unwrap();
        let b = Order::place("ORD-2".into(), user, vec![line(1, 500)], "COD", PaymentStatus::Pending, "INR").unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = Order::place("ORD-3".into(), Uuid::new_v4(), vec![], "COD", PaymentStatus::Pending, "INR");
        assert_eq!(err.unwrap_err(), OrderError::NoItems);
    }

    #[test]
    fn test_legal_transitions() {
        let mut order = pending_order();
        order.transition(OrderStatus::Shipped).unwrap();
        order.transition(OrderStatus::Delivered).unwrap();
        assert_eq!(order.status(), OrderStatus::Delivered);

        let mut order = pending_order();
        order.transition(OrderStatus::Canceled).unwrap();

        let mut order = pending_order();
        order.transition(OrderStatus::Shipped).unwrap();
        order.transition(OrderStatus::Canceled).unwrap();
    }

    #[test]
    fn test_illegal_transitions_rejected() {
        let mut order = pending_order();
        assert!(order.transition(OrderStatus::Delivered).is_err());
        assert!(order.transition(OrderStatus::Pending).is_err());

        order.transition(OrderStatus::Shipped).unwrap();
        assert!(order.transition(OrderStatus::Pending).is_err());

        order.transition(OrderStatus::Delivered).unwrap();
        assert!(order.transition(OrderStatus::Canceled).is_err());
        assert!(order.transition(OrderStatus::Shipped).is_err());
    }

    #[test]
    fn test_gateway_order_placed_paid() {
        let order = Order::place(
            "ORD-4".into(), Uuid::new_v4(), vec![line(1, 149900)], "RAZORPAY",
            PaymentStatus::Paid, "INR",
        )
        .unwrap();
        assert_eq!(order.payment_status(), PaymentStatus::Paid);
        assert_eq!(order.payment_method(), "RAZORPAY");
    }

    #[test]
    fn test_status_parse_round_trip() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("REFUNDED".parse::<OrderStatus>().is_err());
        assert_eq!("paid".parse::<PaymentStatus>().unwrap(), PaymentStatus::Paid);
    }
}
