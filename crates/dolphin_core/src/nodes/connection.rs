//! Connection nodes, the roots of the schema tree.
//!
//! A root lists every database visible to its user.

use super::{load_children, DatabaseNode, SchemaNode};
use crate::context::NavigatorContext;
use crate::models::{query, ConnectionDescriptor, NodeIdentity, Row};
use crate::sql::discovery;

/// A server endpoint. Children are its databases.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionNode {
    descriptor: ConnectionDescriptor,
    identity: NodeIdentity,
}

impl ConnectionNode {
    /// Create the root node for an endpoint.
    ///
    /// Any database on the descriptor is ignored; the node lists them all.
    pub fn new(mut descriptor: ConnectionDescriptor) -> Self {
        descriptor.database = None;
        let identity = descriptor.connection_identity();
        Self { descriptor, identity }
    }

    /// Get the node identity, the descriptor's connection identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Get the connection descriptor. It never names a database.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// `user@host:port`.
    pub fn tree_label(&self) -> String {
        format!("{}@{}:{}", self.descriptor.user, self.descriptor.host, self.descriptor.port)
    }

    /// Database nodes in server order, from the cache unless `force_refresh`.
    pub async fn children(&self, ctx: &NavigatorContext, force_refresh: bool) -> Vec<SchemaNode> {
        load_children(
            ctx,
            &self.identity,
            &self.descriptor,
            force_refresh,
            discovery::databases(),
            {
                let descriptor = self.descriptor.clone();
                move |rows| databases_from_rows(&descriptor, rows)
            },
        )
        .await
    }
}

fn databases_from_rows(descriptor: &ConnectionDescriptor, rows: Vec<Row>) -> Vec<SchemaNode> {
    rows.iter()
        .filter_map(|row| query::text(row, "Database"))
        .map(|name| SchemaNode::Database(DatabaseNode::new(descriptor.clone(), name)))
        .collect()
}
