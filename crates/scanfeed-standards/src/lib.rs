#![deny(unsafe_code)]

pub mod error;
pub mod handle;
pub mod registry;
pub mod schema;

pub use crate::error::SchemaError;
pub use crate::handle::RegistryHandle;
pub use crate::registry::MappingRegistry;
pub use crate::schema::SchemaMeta;
