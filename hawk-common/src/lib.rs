//! Shared utilities for the Hawk workspace.
//!
//! This crate stays small so every other crate can depend on it without
//! pulling in the browser or portal stacks.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`retry`]: Bounded retries with exponential backoff and cancellation
//!
//! # Examples
//!
//! ```rust
//! use hawk_common::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.max_attempts, 3);
//! ```
pub mod observability;
pub mod retry;

pub use retry::{retry_bounded, RetryError, RetryPolicy};
