//! Core types and trait definitions for the Verdict decision log.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod decision;
pub mod error;
pub mod filter;
pub mod index;
pub mod plan;
pub mod store;

pub use error::{Error, FieldError, Result};
