//! Database nodes, listing the base tables of one database.

use super::{load_children, SchemaNode, TableNode};
use crate::context::NavigatorContext;
use crate::models::{query, ConnectionDescriptor, NodeIdentity, Row};
use crate::sql::discovery;

/// A database. Children are its base tables.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseNode {
    descriptor: ConnectionDescriptor,
    database: String,
    identity: NodeIdentity,
}

impl DatabaseNode {
    /// The descriptor is re-scoped to `database`.
    pub fn new(descriptor: ConnectionDescriptor, database: impl Into<String>) -> Self {
        let database = database.into();
        let descriptor = descriptor.with_database(database.clone());
        let identity = descriptor.database_identity(&database);
        Self { descriptor, database, identity }
    }

    /// Get the node identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Get the connection descriptor, scoped to this database.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Get the database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Table nodes in name order, from the cache unless `force_refresh`.
    pub async fn children(&self, ctx: &NavigatorContext, force_refresh: bool) -> Vec<SchemaNode> {
        load_children(
            ctx,
            &self.identity,
            &self.descriptor,
            force_refresh,
            discovery::tables(&self.database),
            {
                let descriptor = self.descriptor.clone();
                let database = self.database.clone();
                move |rows| tables_from_rows(&descriptor, &database, rows)
            },
        )
        .await
    }

    /// Table node for `table` in this database.
    pub fn table(&self, table: impl Into<String>) -> TableNode {
        TableNode::new(self.descriptor.clone(), self.database.clone(), table)
    }
}

fn tables_from_rows(
    descriptor: &ConnectionDescriptor,
    database: &str,
    rows: Vec<Row>,
) -> Vec<SchemaNode> {
    rows.iter()
        .filter_map(|row| query::text(row, "name"))
        .map(|table| SchemaNode::Table(TableNode::new(descriptor.clone(), database, table)))
        .collect()
}
