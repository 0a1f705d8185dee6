//! Data models for the Dolphin navigator core.
//!
//! - `connection` - ConnectionDescriptor, NodeIdentity
//! - `query` - result rows
//! - `schema` - column metadata

pub mod connection;
pub mod query;
pub mod schema;

pub use connection::{ConnectionDescriptor, ConnectionDescriptorBuilder, NodeIdentity};
pub use query::Row;
pub use schema::{ColumnKey, ColumnMeta};
