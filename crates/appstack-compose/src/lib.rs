//! # appstack-compose
//!
//! Resolver for the application stack's docker-compose deployment.
//!
//! Handles:
//! - **Validator**: the trust-on-first-use certificate requirement.
//! - **Versions / TLS / Auth**: image tags, UI certificate files, and the
//!   query-auth environment.
//! - **Resolver**: the fully computed [`resolver::ResolvedConfig`].
//! - **Render**: the compose document text.
//! - **Resources / Graph / Plan**: managed resources and their convergence order.
//! - **Apply**: driving file-management and compose collaborators.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod apply;
pub mod auth;
pub mod env;
pub mod graph;
pub mod identity;
pub mod plan;
pub mod render;
pub mod resolver;
pub mod resources;
pub mod tls;
pub mod validator;
pub mod versions;

pub use plan::DeploymentPlan;
