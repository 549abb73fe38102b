//! Test-only adapters that live inside the providers crate for convenience.
//!
//! These are intended purely for unit testing and local demos. Real adapters
//! (HTTP, database, etc.) live in their own crates and only need to build a
//! [`Provider`](crate::Provider) record.

pub mod dummy;
pub mod memory;
