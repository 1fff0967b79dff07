//! Stockroom Core - Domain types and transaction logic.
//!
//! This crate provides the pieces of Stockroom that do not touch the
//! filesystem or the network. It is shared by:
//! - `server` - axum web application that persists these types as JSON
//! - `cli` - management commands (seeding, users, exports)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! sessions, no HTTP. Callers load a collection, hand it to the functions
//! here, and persist whatever they mutated.
//!
//! # Modules
//!
//! - [`types`] - Entities (users, products, sales) and legacy normalization
//! - [`cart`] - Cart entries and lenient coercion of client-supplied data
//! - [`checkout`] - Converting a cart into sales, stock policies
//! - [`forms`] - Validation of submitted sale, product and registration forms

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod forms;
pub mod types;

pub use cart::{Cart, CartEntry};
pub use checkout::{CheckoutError, StockError, StockPolicy, checkout, record_manual_sale};
pub use types::*;
