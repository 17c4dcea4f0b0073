//! Domain models.
//!
//! These are the validated types services work with and handlers return.
//! Database row types stay private to the `db` modules and convert into
//! these.

pub mod audit;
pub mod blog;
pub mod cart;
pub mod contact;
pub mod loyalty;
pub mod order;
pub mod payment;
pub mod product;
pub mod testimonial;
pub mod user;

pub use user::{CurrentUser, User};
