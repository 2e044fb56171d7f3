//! Shared building blocks for the db-dashboards services.
//!
//! Configuration, the error type and its HTTP mapping, the response envelope,
//! middleware, transport models and small utilities.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
