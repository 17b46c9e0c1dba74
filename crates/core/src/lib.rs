//! Shopora Core - Shared types and the product display engine.
//!
//! This crate provides the types shared by every Shopora component:
//! - `storefront` - Server-rendered storefront over the e-commerce REST backend
//! - `integration-tests` - End-to-end tests against a mocked backend
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. The backend stays authoritative for every entity; this crate only
//! decides how already-fetched data is displayed.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money, and status enums
//! - [`catalog`] - Product and category DTOs plus the display engine
//!   (image resolution, pricing, listing filter/sort)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod types;

pub use types::*;
