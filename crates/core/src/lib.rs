//! Goods Mall Core - Shared domain types.
//!
//! This crate provides the types shared by every goods mall component:
//! - `client` - HTTP API client and session state
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no async runtime. This keeps it lightweight and usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, won amounts, phone numbers,
//!   emails, zipcodes, passwords and fulfillment methods

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
