//! Goods mall client library.
//!
//! Browsing, cart management and order placement against the goods mall
//! HTTP API.
//!
//! # Modules
//!
//! - [`api`] - HTTP client and wire types
//! - [`cart`] - Cart split by fulfillment method, with selection
//! - [`order`] - Order composition and validation
//! - [`fees`] - Delivery fee resolution for cart orders
//! - [`session`] - Session state, replayable operations and events
//! - [`error`] - Error taxonomy and presentation
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fees;
pub mod order;
pub mod session;
pub mod signup;

pub use api::GoodsMallClient;
pub use config::{ApiConfig, ClientConfig, ConfigError};
pub use error::{ApiError, Conflict, ErrorReport, Presentation};
pub use session::{Operation, OrderPhase, Session, SessionError, SessionEvent};
