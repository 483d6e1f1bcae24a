//! # appstack-common
//!
//! Shared types, error definitions, deployment parameters, and constants
//! used across the appstack workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and holds the input record the resolver consumes.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
