//! Backend services for the navigator core.
//!
//! - `connection` - Connection registry and the driver seam
//! - `mysql` - MySQL sessions with mysql_async
//! - `query` - Statement execution with tracing
//! - `cache` - Metadata cache for tree children and expansion state
//! - `mutation` - Confirmation-gated schema mutations
//! - `interaction` - Prompts, editor surface, tree refresh and notifications
//! - `dump` - Table backups through mysqldump

pub mod cache;
pub mod connection;
pub mod dump;
pub mod interaction;
pub mod mutation;
pub mod mysql;
pub mod query;

pub use cache::MetadataCache;
pub use connection::{ConnectionHandle, ConnectionRegistry, Connector, Session};
pub use dump::{DumpRequest, DumpTool, MysqldumpCommand};
pub use interaction::{ConfirmationPrompt, Notifier, PromptRequest, TextSurface, TreeView};
pub use mutation::{Gate, InvalidationScope, Mutation, MutationCoordinator, MutationOutcome};
pub use mysql::MySqlConnector;
pub use query::{QueryRunner, QueryService, QueryType};
