//! Core types for the goods mall.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod method;
pub mod password;
pub mod phone;
pub mod won;

pub use address::{Zipcode, ZipcodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use method::{FulfillmentMethod, SellerMethod, UnknownMethod};
pub use password::{Password, PasswordError};
pub use phone::{PhoneNumber, PhoneNumberError};
pub use won::Won;
