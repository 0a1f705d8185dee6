//! Table nodes: column discovery, SQL templates and table mutations.

use super::{load_children, try_load_children, ColumnNode, SchemaNode};
use crate::context::NavigatorContext;
use crate::error::DolphinError;
use crate::models::{query, ColumnMeta, ConnectionDescriptor, NodeIdentity, Row};
use crate::services::dump::{backup_file_name, DumpRequest};
use crate::services::interaction::PromptRequest;
use crate::services::mutation::{Gate, InvalidationScope, Mutation, MutationOutcome};
use crate::sql::{discovery, template};

use chrono::Local;
use std::path::{Path, PathBuf};

/// A base table. Children are its columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableNode {
    descriptor: ConnectionDescriptor,
    database: String,
    table: String,
    identity: NodeIdentity,
}

impl TableNode {
    /// The descriptor is re-scoped to `database`.
    pub fn new(
        descriptor: ConnectionDescriptor,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        let database = database.into();
        let table = table.into();
        let descriptor = descriptor.with_database(database.clone());
        let identity = descriptor.table_identity(&database, &table);
        Self { descriptor, database, table, identity }
    }

    /// Get the node identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Get the connection descriptor, scoped to the table's database.
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

    /// Identity of the owning database; the scope invalidated by structural
    /// changes.
    pub fn database_identity(&self) -> NodeIdentity {
        self.descriptor.database_identity(&self.database)
    }

    /// Bare table name, for the clipboard.
    pub fn copy_name(&self) -> &str {
        &self.table
    }

    // ========== Children ==========

    /// Column nodes in declaration order.
    ///
    /// Served from the cache unless `force_refresh`; a failed discovery query
    /// yields a single info node.
    pub async fn children(&self, ctx: &NavigatorContext, force_refresh: bool) -> Vec<SchemaNode> {
        load_children(
            ctx,
            &self.identity,
            &self.descriptor,
            force_refresh,
            discovery::columns(&self.database, &self.table),
            self.column_mapper(),
        )
        .await
    }

    /// Column metadata in declaration order.
    ///
    /// Shares the cache entry with [`TableNode::children`], but a failed
    /// discovery comes back as the error itself.
    pub async fn columns(&self, ctx: &NavigatorContext) -> Result<Vec<ColumnMeta>, DolphinError> {
        let children = try_load_children(
            ctx,
            &self.identity,
            &self.descriptor,
            false,
            discovery::columns(&self.database, &self.table),
            self.column_mapper(),
        )
        .await
        .map_err(DolphinError::from_shared)?;

        Ok(children
            .iter()
            .filter_map(SchemaNode::as_column)
            .map(|c| c.column().clone())
            .collect())
    }

    fn column_mapper(&self) -> impl FnOnce(Vec<Row>) -> Vec<SchemaNode> + Send + 'static {
        let table = self.clone();
        move |rows| table.columns_from_rows(rows)
    }

    fn columns_from_rows(&self, rows: Vec<Row>) -> Vec<SchemaNode> {
        rows.iter()
            .filter_map(ColumnMeta::from_row)
            .map(|column| {
                SchemaNode::Column(ColumnNode::new(
                    self.descriptor.clone(),
                    self.database.clone(),
                    self.table.clone(),
                    column,
                ))
            })
            .collect()
    }

    // ========== Templates ==========

    /// `SELECT *` with the configured page size.
    ///
    /// With `run`, executes right away on a fresh connection; otherwise opens
    /// the statement as a document.
    pub async fn select_template(
        &self,
        ctx: &NavigatorContext,
        run: bool,
    ) -> Result<String, DolphinError> {
        let sql = template::select(&self.database, &self.table, ctx.settings().default_page_size);
        if run {
            ctx.registry().get_connection(&self.descriptor, true).await?;
            ctx.surface().run_immediately(&sql, self);
        } else {
            ctx.surface().open_document(&sql);
        }
        Ok(sql)
    }

    /// INSERT listing every column.
    pub async fn insert_template(&self, ctx: &NavigatorContext) -> Result<String, DolphinError> {
        let columns = self.template_columns(ctx).await?;
        let sql = template::insert(&self.database, &self.table, &columns);
        ctx.surface().open_document(&sql);
        Ok(sql)
    }

    /// DELETE filtered by key columns.
    ///
    /// Tables without a primary or unique key get a `[condition]` placeholder
    /// and a warning.
    pub async fn delete_template(&self, ctx: &NavigatorContext) -> Result<String, DolphinError> {
        let columns = self.template_columns(ctx).await?;
        self.warn_if_keyless(ctx, &columns);
        let sql = template::delete(&self.database, &self.table, &columns);
        ctx.surface().open_document(&sql);
        Ok(sql)
    }

    /// UPDATE of non-key columns filtered by key columns.
    pub async fn update_template(&self, ctx: &NavigatorContext) -> Result<String, DolphinError> {
        let columns = self.template_columns(ctx).await?;
        self.warn_if_keyless(ctx, &columns);
        let sql = template::update(&self.database, &self.table, &columns);
        ctx.surface().open_document(&sql);
        Ok(sql)
    }

    /// Index skeletons, plus a listing of the table's current indexes.
    pub async fn index_template(&self, ctx: &NavigatorContext) -> Result<String, DolphinError> {
        let sql = template::index(&self.database, &self.table);
        ctx.surface().open_document(&sql);
        ctx.registry().get_connection(&self.descriptor, true).await?;
        ctx.surface().run_immediately(&discovery::indexes(&self.database, &self.table), self);
        Ok(sql)
    }

    /// `ALTER TABLE ... ADD COLUMN` skeleton.
    pub fn add_column_template(&self, ctx: &NavigatorContext) -> String {
        let sql = template::add_column(&self.database, &self.table);
        ctx.surface().open_document(&sql);
        sql
    }

    async fn template_columns(
        &self,
        ctx: &NavigatorContext,
    ) -> Result<Vec<ColumnMeta>, DolphinError> {
        self.columns(ctx).await.inspect_err(|e| {
            ctx.notifier().error(&format!("Could not read columns of {}: {e}", self.table));
        })
    }

    fn warn_if_keyless(&self, ctx: &NavigatorContext, columns: &[ColumnMeta]) {
        if !columns.iter().any(ColumnMeta::is_key) {
            tracing::warn!(identity = %self.identity, "Table has no primary or unique key");
            ctx.notifier().warn(&format!(
                "{} has no primary or unique key; fill in the WHERE condition before running",
                self.table
            ));
        }
    }

    // ========== Mutations ==========

    /// Rename the table to a name entered by the user.
    ///
    /// An empty or dismissed prompt is a no-op.
    pub async fn change_name(
        &self,
        ctx: &NavigatorContext,
    ) -> Result<MutationOutcome, DolphinError> {
        let mutation = Mutation {
            descriptor: &self.descriptor,
            request: PromptRequest::new(
                format!("Rename {}.{} to", self.database, self.table),
                "newTableName",
            )
            .with_value(self.table.clone()),
            gate: Gate::Input,
            scope: InvalidationScope::Database(self.database_identity()),
            subject: format!("rename table {}", self.table),
        };
        ctx.mutations()
            .run(mutation, |new_name| {
                template::rename_table(&self.database, &self.table, new_name)
            })
            .await
    }

    /// Drop the table after the user confirms with `y`.
    pub async fn drop(&self, ctx: &NavigatorContext) -> Result<MutationOutcome, DolphinError> {
        let mutation = Mutation {
            descriptor: &self.descriptor,
            request: PromptRequest::new(
                format!("Drop table {}?", self.table),
                "Input y to confirm.",
            ),
            gate: Gate::Affirm,
            scope: InvalidationScope::Database(self.database_identity()),
            subject: format!("drop table {}", self.table),
        };
        ctx.mutations()
            .run(mutation, |_| template::drop_table(&self.database, &self.table))
            .await
    }

    /// Delete every row after the user confirms with `y`.
    ///
    /// Column metadata is unchanged, so nothing is invalidated.
    pub async fn truncate(&self, ctx: &NavigatorContext) -> Result<MutationOutcome, DolphinError> {
        let mutation = Mutation {
            descriptor: &self.descriptor,
            request: PromptRequest::new(
                format!("Clear all data of table {}?", self.table),
                "Input y to confirm.",
            ),
            gate: Gate::Affirm,
            scope: InvalidationScope::None,
            subject: format!("truncate table {}", self.table),
        };
        ctx.mutations()
            .run(mutation, |_| template::truncate_table(&self.database, &self.table))
            .await
    }

    // ========== Source and backup ==========

    /// The table's DDL, verbatim from `SHOW CREATE TABLE`.
    pub async fn show_source(&self, ctx: &NavigatorContext) -> Result<String, DolphinError> {
        let handle = ctx.registry().get_connection(&self.descriptor, true).await?;
        let rows = ctx
            .runner()
            .execute(&handle, &discovery::show_create_table(&self.database, &self.table))
            .await?;
        rows.first().and_then(|row| query::text(row, "Create Table")).ok_or_else(|| {
            DolphinError::query(
                format!("SHOW CREATE TABLE returned no DDL for {}", self.table),
                None,
                None,
            )
        })
    }

    /// Dump the table into `destination` and report the outcome.
    ///
    /// Returns the path of the written file.
    pub async fn backup(
        &self,
        ctx: &NavigatorContext,
        destination: &Path,
    ) -> Result<PathBuf, DolphinError> {
        let label = format!("{}_{}_{}", self.descriptor.host, self.database, self.table);
        let file = destination.join(backup_file_name(
            &self.descriptor.host,
            &self.database,
            &self.table,
            &Local::now(),
        ));
        let request = DumpRequest {
            descriptor: self.descriptor.clone(),
            database: self.database.clone(),
            table: self.table.clone(),
            file: file.clone(),
        };

        tracing::info!(backup = %label, file = %file.display(), "Starting backup");
        match ctx.dump().dump(&request).await {
            Ok(()) => {
                ctx.notifier().info(&format!("Backup {label} success!"));
                Ok(file)
            }
            Err(e) => {
                tracing::error!(backup = %label, error = %e, "Backup failed");
                ctx.notifier().error(&format!("Backup {label} fail!\n{e}"));
                Err(e)
            }
        }
    }
}
