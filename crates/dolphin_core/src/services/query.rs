//! Statement execution.
//!
//! Every statement the core issues goes through a [`QueryRunner`], which
//! makes discovery and mutation traffic observable (and replaceable in tests).

use crate::error::DolphinError;
use crate::models::Row;
use crate::services::connection::ConnectionHandle;

use async_trait::async_trait;
use std::time::Instant;
use uuid::Uuid;

/// Type of SQL statement, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// SELECT, SHOW and other row-returning statements
    Select,
    /// INSERT, UPDATE, DELETE
    Dml,
    /// CREATE, ALTER, DROP, RENAME, TRUNCATE
    Ddl,
    /// Anything else
    Other,
}

/// Executes SQL text on a connection handle.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Execute one statement and return its rows.
    async fn execute(
        &self,
        handle: &ConnectionHandle,
        sql: &str,
    ) -> Result<Vec<Row>, DolphinError>;
}

/// Default runner: executes on the handle's session with tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryService;

impl QueryService {
    /// Detect the statement type from its leading keyword.
    pub fn detect_query_type(sql: &str) -> QueryType {
        let keyword = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(' || c == ';')
            .next()
            .unwrap_or("")
            .to_uppercase();
        match keyword.as_str() {
            "SELECT" | "SHOW" | "WITH" | "DESCRIBE" | "DESC" | "EXPLAIN" => QueryType::Select,
            "INSERT" | "UPDATE" | "DELETE" | "REPLACE" => QueryType::Dml,
            "CREATE" | "ALTER" | "DROP" | "RENAME" | "TRUNCATE" => QueryType::Ddl,
            _ => QueryType::Other,
        }
    }
}

#[async_trait]
impl QueryRunner for QueryService {
    async fn execute(
        &self,
        handle: &ConnectionHandle,
        sql: &str,
    ) -> Result<Vec<Row>, DolphinError> {
        let query_id = Uuid::new_v4();
        let query_type = Self::detect_query_type(sql);
        let start = Instant::now();

        tracing::debug!(
            query_id = %query_id,
            identity = %handle.identity(),
            query_type = ?query_type,
            "Executing query"
        );

        match handle.query(sql).await {
            Ok(rows) => {
                tracing::debug!(
                    query_id = %query_id,
                    execution_time_ms = start.elapsed().as_millis() as u64,
                    row_count = rows.len(),
                    "Query completed"
                );
                Ok(rows)
            }
            Err(e) => {
                tracing::warn!(query_id = %query_id, error = %e, "Query failed");
                Err(e)
            }
        }
    }
}
