//! Schema tree nodes.
//!
//! Nodes are cheap values rebuilt on every expansion. Each one owns its
//! connection descriptor and identity; children are loaded lazily through the
//! metadata cache.

mod column;
mod connection;
mod database;
mod table;

pub use column::ColumnNode;
pub use connection::ConnectionNode;
pub use database::DatabaseNode;
pub use table::TableNode;

use crate::context::NavigatorContext;
use crate::error::DolphinError;
use crate::models::{ConnectionDescriptor, NodeIdentity, Row};
use crate::services::cache::LoadResult;

use serde::Serialize;
use std::sync::Arc;

/// Node type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Server endpoint
    Connection,
    /// Database (schema)
    Database,
    /// Base table
    Table,
    /// Table column
    Column,
    /// Inline diagnostic
    Info,
}

/// Expand/collapse state reported to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Collapsible {
    /// Leaf node
    None,
    /// Has children, collapsed
    Collapsed,
    /// Has children, expanded
    Expanded,
}

/// What the tree needs to render one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeItem {
    /// Display label.
    pub label: String,
    /// Node type tag.
    pub kind: NodeKind,
    /// Stable identity.
    pub identity: NodeIdentity,
    /// Expansion state.
    pub collapsible: Collapsible,
}

/// Diagnostic shown in place of children that failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoNode {
    /// Error message, verbatim.
    pub message: String,
    /// Actionable hint.
    pub hint: Option<String>,
}

impl InfoNode {
    /// Build from a load failure.
    pub fn from_error(error: &DolphinError) -> Self {
        Self { message: error.to_string(), hint: error.hint().map(String::from) }
    }

    /// Stable identity.
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::from_segments(["info", self.message.as_str()])
    }
}

/// A node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Server endpoint.
    Connection(ConnectionNode),
    /// Database.
    Database(DatabaseNode),
    /// Table.
    Table(TableNode),
    /// Column.
    Column(ColumnNode),
    /// Diagnostic.
    Info(InfoNode),
}

impl SchemaNode {
    /// Node type tag.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Connection(_) => NodeKind::Connection,
            Self::Database(_) => NodeKind::Database,
            Self::Table(_) => NodeKind::Table,
            Self::Column(_) => NodeKind::Column,
            Self::Info(_) => NodeKind::Info,
        }
    }

    /// Stable identity, the cache key.
    pub fn identity(&self) -> NodeIdentity {
        match self {
            Self::Connection(node) => node.identity().clone(),
            Self::Database(node) => node.identity().clone(),
            Self::Table(node) => node.identity().clone(),
            Self::Column(node) => node.identity().clone(),
            Self::Info(node) => node.identity(),
        }
    }

    /// Label shown in the tree.
    pub fn tree_label(&self) -> String {
        match self {
            Self::Connection(node) => node.tree_label(),
            Self::Database(node) => node.database().to_string(),
            Self::Table(node) => node.table().to_string(),
            Self::Column(node) => node.tree_label(),
            Self::Info(node) => node.message.clone(),
        }
    }

    /// Children of this node. Leaves have none.
    ///
    /// Load failures come back as a single [`InfoNode`].
    pub async fn children(&self, ctx: &NavigatorContext, force_refresh: bool) -> Vec<SchemaNode> {
        match self {
            Self::Connection(node) => node.children(ctx, force_refresh).await,
            Self::Database(node) => node.children(ctx, force_refresh).await,
            Self::Table(node) => node.children(ctx, force_refresh).await,
            Self::Column(_) | Self::Info(_) => Vec::new(),
        }
    }

    /// Render data for the tree, using the cached expansion state.
    pub fn tree_item(&self, ctx: &NavigatorContext) -> TreeItem {
        let identity = self.identity();
        let collapsible = match self.kind() {
            NodeKind::Column | NodeKind::Info => Collapsible::None,
            _ if ctx.cache().expansion_state(&identity) => Collapsible::Expanded,
            _ => Collapsible::Collapsed,
        };
        TreeItem { label: self.tree_label(), kind: self.kind(), identity, collapsible }
    }

    /// The table, if this is a table node.
    pub fn as_table(&self) -> Option<&TableNode> {
        match self {
            Self::Table(node) => Some(node),
            _ => None,
        }
    }

    /// The column, if this is a column node.
    pub fn as_column(&self) -> Option<&ColumnNode> {
        match self {
            Self::Column(node) => Some(node),
            _ => None,
        }
    }

    /// The diagnostic, if this is an info node.
    pub fn as_info(&self) -> Option<&InfoNode> {
        match self {
            Self::Info(node) => Some(node),
            _ => None,
        }
    }
}

/// Load children through the cache, running `sql` on a miss.
///
/// `map` turns the discovery rows into child nodes. Failures are logged and
/// returned as a single diagnostic node.
pub(crate) async fn load_children<F>(
    ctx: &NavigatorContext,
    identity: &NodeIdentity,
    descriptor: &ConnectionDescriptor,
    force_refresh: bool,
    sql: String,
    map: F,
) -> Vec<SchemaNode>
where
    F: FnOnce(Vec<Row>) -> Vec<SchemaNode> + Send + 'static,
{
    match try_load_children(ctx, identity, descriptor, force_refresh, sql, map).await {
        Ok(children) => children,
        Err(e) => {
            tracing::warn!(identity = %identity, error = %e, "Failed to load children");
            vec![SchemaNode::Info(InfoNode::from_error(&e))]
        }
    }
}

/// Like [`load_children`], but hands the typed failure back to the caller.
pub(crate) async fn try_load_children<F>(
    ctx: &NavigatorContext,
    identity: &NodeIdentity,
    descriptor: &ConnectionDescriptor,
    force_refresh: bool,
    sql: String,
    map: F,
) -> LoadResult
where
    F: FnOnce(Vec<Row>) -> Vec<SchemaNode> + Send + 'static,
{
    let registry = Arc::clone(ctx.registry());
    let runner = Arc::clone(ctx.runner());
    let descriptor = descriptor.clone();
    let loader = async move {
        let handle = registry.get_connection(&descriptor, false).await?;
        let rows = runner.execute(&handle, &sql).await?;
        Ok::<_, DolphinError>(map(rows))
    };

    ctx.cache().load_children(identity, force_refresh, loader).await
}
