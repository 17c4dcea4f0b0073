//! Baby Cash Core - Shared domain types.
//!
//! This crate provides the types shared by every Baby Cash component:
//! - `api` - The REST API server
//! - `cli` - Command-line tools for migrations, seeding and maintenance jobs
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no HTTP. Anything that can be decided without touching
//! storage (loyalty arithmetic, slug generation, pagination math) lives here
//! so it can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, email addresses, status enums, pagination
//! - [`loyalty`] - Points accrual, tiers and discount rules
//! - [`slug`] - URL slugs for blog posts

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod loyalty;
pub mod slug;
pub mod types;

pub use types::*;
