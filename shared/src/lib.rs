//! Shared types and domain rules for the POS back office
//!
//! This crate holds the arithmetic and state rules that both the backend
//! and the browser till (via WASM) must agree on. Nothing here touches I/O.

pub mod calendar;
pub mod error;
pub mod models;
pub mod reporting;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
