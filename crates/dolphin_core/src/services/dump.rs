//! Table backups through an external dump tool.

use crate::error::DolphinError;
use crate::models::ConnectionDescriptor;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Timestamp format embedded in backup file names (`yyyy-MM-dd_HHmmss`).
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Build the backup file name for a table.
pub fn backup_file_name<Tz>(host: &str, database: &str, table: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{host}_{database}_{table}_{}.sql", at.format(BACKUP_TIMESTAMP_FORMAT))
}

/// What to dump and where.
#[derive(Debug, Clone)]
pub struct DumpRequest {
    /// Connection parameters.
    pub descriptor: ConnectionDescriptor,
    /// Database holding the table.
    pub database: String,
    /// Table to dump.
    pub table: String,
    /// Output file.
    pub file: PathBuf,
}

/// Performs an external export.
#[async_trait]
pub trait DumpTool: Send + Sync {
    /// Dump one table to `request.file`.
    async fn dump(&self, request: &DumpRequest) -> Result<(), DolphinError>;
}

/// Runs the `mysqldump` binary.
#[derive(Debug, Clone)]
pub struct MysqldumpCommand {
    program: PathBuf,
}

impl MysqldumpCommand {
    /// Use the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    /// Arguments for a request. The password is passed through the
    /// environment, never on the command line.
    pub fn args(request: &DumpRequest) -> Vec<String> {
        let descriptor = &request.descriptor;
        let mut args = vec![
            format!("--host={}", descriptor.host),
            format!("--port={}", descriptor.port),
            format!("--user={}", descriptor.user),
            "--add-drop-table".to_string(),
            "--skip-set-charset".to_string(),
            format!("--result-file={}", request.file.display()),
        ];
        if let Some(cert_path) = &descriptor.cert_path {
            args.push(format!("--ssl-ca={}", cert_path.display()));
        }
        args.push(request.database.clone());
        args.push(request.table.clone());
        args
    }
}

impl Default for MysqldumpCommand {
    fn default() -> Self {
        Self::new("mysqldump")
    }
}

#[async_trait]
impl DumpTool for MysqldumpCommand {
    async fn dump(&self, request: &DumpRequest) -> Result<(), DolphinError> {
        let mut command = Command::new(&self.program);
        command
            .args(Self::args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        if let Some(credential) = &request.descriptor.credential {
            command.env("MYSQL_PWD", credential);
        }

        tracing::debug!(
            program = %self.program.display(),
            database = %request.database,
            table = %request.table,
            file = %request.file.display(),
            "Running dump"
        );

        let output = command.output().await.map_err(|e| DolphinError::Dump {
            message: format!("Failed to start {}: {e}", self.program.display()),
            source: Some(Box::new(e)),
        })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(DolphinError::dump(format!("{} ({})", stderr, output.status)))
        }
    }
}
