//! Candela Core - Shared types and catalog logic.
//!
//! This crate provides the domain layer used by every Candela component:
//! - `storefront` - Public catalog, product pages and customer sign-in
//! - `admin` - Store administration panel
//! - `cli` - Migrations, seeding and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Everything here works on in-memory snapshots that the data
//! layer delivers, which keeps the derived-state rules testable on their own.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails and roles
//! - [`catalog`] - Catalog entities, grouping, filtering, validation and cascades
//! - [`session`] - Inactivity guard for signed-in sessions
//! - [`pagination`] - Fixed-size page arithmetic for admin listings

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod pagination;
pub mod session;
pub mod types;

pub use types::*;
