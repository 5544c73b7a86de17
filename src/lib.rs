//! # eshop
//!
//! An e-commerce backend service built on axum and MongoDB.
//!
//! ## Architecture
//!
//! - **Catalog entities**: products, categories and users are plain document
//!   CRUD, persisted through the [`storage`] store traits (one collection per
//!   entity type).
//! - **Order workflow**: order creation is a multi-step sequence — validate
//!   the requested line items, persist them, aggregate per-item subtotals
//!   into a total price, persist the order referencing the created line item
//!   ids. The stored total always equals the sum of line-item subtotals at
//!   creation time; later product price changes never rewrite history.
//! - **Storage backends**: MongoDB for production, an in-memory backend for
//!   tests and development. Both implement the same store traits.
//! - **Web layer**: axum routers under a configurable API prefix, mapping
//!   the typed error taxonomy to HTTP status codes and stable error codes.
//! - **Auth**: HS256 JWT bearer tokens, argon2 password hashes, and
//!   capability extractors (`RequireUser` / `RequireAdmin`) applied at the
//!   route layer.
//!
//! ## Money
//!
//! All price arithmetic uses [`rust_decimal::Decimal`]. Floats never touch
//! a price; subtotals and totals are exact.

pub mod config;
pub mod core;
pub mod models;
pub mod orders;
pub mod storage;
pub mod web;
