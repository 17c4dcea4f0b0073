//! Business logic services.
//!
//! Services borrow the pool and build the repositories they need, so
//! handlers construct them per request:
//!
//! ```rust,ignore
//! let order = OrderService::new(state.pool()).create(&user, &request, &client).await?;
//! ```

pub mod audit;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod catalog;
pub mod comments;
pub mod contact;
pub mod contact_info;
pub mod email;
pub mod loyalty;
pub mod orders;
pub mod payments;
pub mod scheduler;
pub mod testimonials;
pub mod users;
pub mod validation;
