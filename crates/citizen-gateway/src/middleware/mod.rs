//! Tower middleware for the gateway.

pub mod auth;
pub mod cors;
pub mod tracing;

pub use auth::{RequireRoleLayer, RequireRoleService};
pub use cors::create_cors_layer;
pub use self::tracing::{TracingLayer, TracingService};
