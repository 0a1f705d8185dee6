//! Column nodes, the leaves of the schema tree.

use crate::models::{ColumnMeta, ConnectionDescriptor, NodeIdentity};

/// A column of a table. Leaf node.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNode {
    descriptor: ConnectionDescriptor,
    database: String,
    table: String,
    column: ColumnMeta,
    identity: NodeIdentity,
}

impl ColumnNode {
    /// Create a column node of `database`.`table`.
    pub fn new(
        descriptor: ConnectionDescriptor,
        database: impl Into<String>,
        table: impl Into<String>,
        column: ColumnMeta,
    ) -> Self {
        let database = database.into();
        let table = table.into();
        let identity = descriptor.table_identity(&database, &table).child(&column.name);
        Self { descriptor, database, table, column, identity }
    }

    /// Get the node identity, the table's identity plus the column name.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Get the connection descriptor.
    pub fn descriptor(&self) -> &ConnectionDescriptor {
        &self.descriptor
    }

    /// Get the database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Get the table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Get the column metadata from discovery.
    pub fn column(&self) -> &ColumnMeta {
        &self.column
    }

    /// `name : type`, followed by the comment when there is one.
    pub fn tree_label(&self) -> String {
        let label = format!("{} : {}", self.column.name, self.column.column_type);
        if self.column.comment.is_empty() {
            label
        } else {
            format!("{label}  {}", self.column.comment)
        }
    }
}
