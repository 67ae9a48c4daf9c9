//! Payment gateway integration
pub mod razorpay;
