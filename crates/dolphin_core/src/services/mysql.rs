//! MySQL sessions with mysql_async.
//!
//! Each handle owns a small pool so a retired handle can finish its running
//! statements while its replacement serves new ones.

use crate::error::DolphinError;
use crate::models::{ConnectionDescriptor, Row};
use crate::services::connection::{Connector, Session};

use async_trait::async_trait;
use mysql_async::prelude::Queryable;
use mysql_async::{Opts, OptsBuilder, Pool, PoolConstraints, PoolOpts, SslOpts, Value};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Opens [`MySqlSession`]s.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    connect_timeout: Duration,
}

impl MySqlConnector {
    /// Create a connector with the given connect timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn opts(descriptor: &ConnectionDescriptor) -> Opts {
        let constraints = PoolConstraints::new(0, 2).unwrap_or_default();
        let mut builder = OptsBuilder::default()
            .ip_or_hostname(descriptor.host.as_str())
            .tcp_port(descriptor.port)
            .user(Some(descriptor.user.as_str()))
            .pass(descriptor.credential.as_deref())
            .db_name(descriptor.database.as_deref())
            .pool_opts(PoolOpts::default().with_constraints(constraints));

        if let Some(cert_path) = &descriptor.cert_path {
            let ssl = SslOpts::default().with_root_certs(vec![cert_path.clone().into()]);
            builder = builder.ssl_opts(ssl);
        }
        builder.into()
    }
}

impl Default for MySqlConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn Session>, DolphinError> {
        let identity = descriptor.identity();
        let pool = Pool::new(Self::opts(descriptor));

        // Validate connectivity before handing the session out.
        let validation = async {
            let mut conn = pool.get_conn().await?;
            conn.query_drop("SELECT 1").await?;
            Ok::<_, mysql_async::Error>(())
        };
        let outcome = tokio::time::timeout(self.connect_timeout, validation).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = pool.disconnect().await;
                return Err(DolphinError::from(e).with_identity(identity.as_str()));
            }
            Err(_) => {
                let _ = pool.disconnect().await;
                return Err(DolphinError::connection(
                    identity.as_str(),
                    format!("Timed out after {}s", self.connect_timeout.as_secs()),
                ));
            }
        }

        tracing::info!(
            identity = %identity,
            host = %descriptor.host,
            database = ?descriptor.database,
            tls = descriptor.cert_path.is_some(),
            "MySQL session established"
        );
        Ok(Arc::new(MySqlSession { pool }))
    }
}

/// A session backed by a mysql_async pool.
pub struct MySqlSession {
    pool: Pool,
}

#[async_trait]
impl Session for MySqlSession {
    async fn query(&self, sql: &str) -> Result<Vec<Row>, DolphinError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<mysql_async::Row> = conn.query(sql).await?;
        Ok(rows.iter().map(to_row).collect())
    }

    async fn close(&self) {
        if let Err(e) = self.pool.clone().disconnect().await {
            tracing::warn!(error = %e, "Failed to close MySQL session cleanly");
        }
    }
}

fn to_row(row: &mysql_async::Row) -> Row {
    row.columns_ref()
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let value = row.as_ref(i).map(to_json).unwrap_or(JsonValue::Null);
            (column.name_str().into_owned(), value)
        })
        .collect()
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::NULL => JsonValue::Null,
        Value::Bytes(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(v) => JsonValue::from(*v),
        Value::UInt(v) => JsonValue::from(*v),
        Value::Float(v) => JsonValue::from(*v),
        Value::Double(v) => JsonValue::from(*v),
        Value::Date(y, mo, d, h, mi, s, us) => JsonValue::String(if *us == 0 {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}")
        } else {
            format!("{y:04}-{mo:02}-{d:02} {h:02}:{mi:02}:{s:02}.{us:06}")
        }),
        Value::Time(neg, days, h, mi, s, us) => {
            let sign = if *neg { "-" } else { "" };
            let hours = u32::from(*h) + days * 24;
            JsonValue::String(if *us == 0 {
                format!("{sign}{hours:02}:{mi:02}:{s:02}")
            } else {
                format!("{sign}{hours:02}:{mi:02}:{s:02}.{us:06}")
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_text_protocol_values() {
        assert_eq!(to_json(&Value::NULL), JsonValue::Null);
        assert_eq!(to_json(&Value::Bytes(b"PRI".to_vec())), JsonValue::from("PRI"));
        assert_eq!(to_json(&Value::Int(-3)), JsonValue::from(-3));
        assert_eq!(to_json(&Value::UInt(7)), JsonValue::from(7u64));
    }

    #[test]
    fn test_to_json_temporal_values() {
        assert_eq!(
            to_json(&Value::Date(2024, 3, 9, 14, 5, 0, 0)),
            JsonValue::from("2024-03-09 14:05:00")
        );
        assert_eq!(to_json(&Value::Time(true, 1, 2, 3, 4, 0)), JsonValue::from("-26:03:04"));
    }
}
