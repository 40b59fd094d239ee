//! Core types and trait definitions for the Vellum audit trail.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends (e.g. `vellum-store-sqlite`) and host applications
//! depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod codec;
pub mod context;
pub mod error;
pub mod event;
pub mod identity;
pub mod presenter;
pub mod render;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
