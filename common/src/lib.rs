//! OrderDesk Common Types
//!
//! This crate contains the domain types shared by the FX core and the order
//! service: currency codes and their display precision, order records and
//! their validation rules.

pub mod monetary;
pub mod order;
pub mod error;
pub mod time;

pub use monetary::*;
pub use order::*;
pub use error::*;
pub use time::*;
