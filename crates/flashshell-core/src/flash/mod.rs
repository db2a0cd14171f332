//! Internal flash access
//!
//! [`FlashGuard`] owns the page/address arithmetic and the protection
//! policy; [`FlashDriver`] is the contract of the hardware primitives it
//! guards.

mod driver;
mod guard;

pub use driver::FlashDriver;
pub use guard::{FlashGuard, Geometry};
