//! Shared data models for all microservices.

pub mod introspection;
pub mod user;

// Re-export commonly used types
pub use introspection::{ColumnResponse, RowResponse, TableRequest, TableResponse, TablesRequest};
pub use user::{ListUsersQuery, LoginRequest, RegisterRequest, TokenResponse, UserResponse};
