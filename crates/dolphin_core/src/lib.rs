//! Core of the Dolphin MySQL browser.
//!
//! This crate provides schema navigation and SQL authoring for MySQL:
//!
//! - **models**: Connection descriptors, node identities and column metadata
//! - **nodes**: The schema tree (connection, database, table, column)
//! - **sql**: Pure SQL synthesis with identifier quoting
//! - **services**: Connection registry, metadata cache, mutations and backups
//! - **context**: The shared navigator context
//! - **config**: Settings file handling
//! - **logging**: Structured logging setup

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod models;
pub mod nodes;
pub mod services;
pub mod sql;

#[cfg(test)]
mod test_support;

pub use config::NavigatorSettings;
pub use context::{NavigatorContext, NavigatorContextBuilder};
pub use error::{DolphinError, ErrorInfo};
pub use models::{ColumnKey, ColumnMeta, ConnectionDescriptor, NodeIdentity, Row};
pub use nodes::{
    Collapsible, ColumnNode, ConnectionNode, DatabaseNode, InfoNode, NodeKind, SchemaNode,
    TableNode, TreeItem,
};
pub use services::{
    ConnectionRegistry, MetadataCache, MutationCoordinator, MutationOutcome, QueryService,
};
