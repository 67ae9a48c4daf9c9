//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;

pub use product::{Product, ProductError, SizeStock};
pub use order::{Order, OrderError, OrderLine, OrderStatus, PaymentStatus};
pub use cart::{Cart, CartError, CartItem};
