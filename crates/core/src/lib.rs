//! Rocketshoes Core - Shared types library.
//!
//! This crate provides the domain types used across all Rocketshoes components:
//! - `cart` - Cart store, catalog client and storage adapters
//! - `catalog-server` - Development catalog/stock HTTP service
//! - `cli` - Command-line front end over the cart store
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, catalog entries, stock and the cart itself

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
