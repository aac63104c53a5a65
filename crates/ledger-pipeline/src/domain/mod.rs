//! Domain layer for the transaction pipeline.

pub mod config;
pub mod entities;
pub mod errors;
pub mod identity;
pub mod value_objects;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use identity::*;
pub use value_objects::*;
