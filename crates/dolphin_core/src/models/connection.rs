//! Connection descriptor and node identity models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default MySQL port.
pub const DEFAULT_PORT: u16 = 3306;

/// Separator between identity segments.
pub const IDENTITY_SEPARATOR: char = '/';

/// Immutable identity of a MySQL endpoint.
///
/// Two descriptors are equivalent iff host, port, user and database match;
/// the credential and certificate path do not take part in identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Server hostname or IP
    pub host: String,
    /// Server port (default 3306)
    pub port: u16,
    /// Login username
    pub user: String,
    /// Password; never logged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    /// Default database, if any
    pub database: Option<String>,
    /// CA certificate for TLS
    pub cert_path: Option<PathBuf>,
}

impl ConnectionDescriptor {
    /// Create a descriptor with required fields.
    pub fn new(host: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            credential: None,
            database: None,
            cert_path: None,
        }
    }

    /// Create a builder for complex descriptors.
    pub fn builder() -> ConnectionDescriptorBuilder {
        ConnectionDescriptorBuilder::default()
    }

    /// Validate the descriptor.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host is required".to_string());
        }
        if self.user.is_empty() {
            return Err("User is required".to_string());
        }
        if self.port == 0 {
            return Err("Port must be between 1 and 65535".to_string());
        }
        if let Some(ref database) = self.database {
            if database.is_empty() || database.len() > 64 {
                return Err("Database name must be 1-64 characters".to_string());
            }
        }
        Ok(())
    }

    /// Copy of this descriptor scoped to another database.
    pub fn with_database(&self, database: impl Into<String>) -> Self {
        Self { database: Some(database.into()), ..self.clone() }
    }

    /// Identity of the endpoint (host, port, user).
    pub fn connection_identity(&self) -> NodeIdentity {
        let port = self.port.to_string();
        NodeIdentity::from_segments([self.host.as_str(), port.as_str(), self.user.as_str()])
    }

    /// Identity of this descriptor, including the database when set.
    ///
    /// This is the registry key.
    pub fn identity(&self) -> NodeIdentity {
        match self.database.as_deref() {
            Some(database) => self.database_identity(database),
            None => self.connection_identity(),
        }
    }

    /// Identity of a database under this endpoint.
    pub fn database_identity(&self, database: &str) -> NodeIdentity {
        self.connection_identity().child(database)
    }

    /// Identity of a table under this endpoint.
    pub fn table_identity(&self, database: &str, table: &str) -> NodeIdentity {
        self.database_identity(database).child(table)
    }

    /// Get the display connection string (without password).
    pub fn display_url(&self) -> String {
        match self.database.as_deref() {
            Some(database) => {
                format!("mysql://{}@{}:{}/{}", self.user, self.host, self.port, database)
            }
            None => format!("mysql://{}@{}:{}", self.user, self.host, self.port),
        }
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("credential", &self.credential.as_ref().map(|_| "********"))
            .field("database", &self.database)
            .field("cert_path", &self.cert_path)
            .finish()
    }
}

/// Builder for ConnectionDescriptor.
#[derive(Debug, Default)]
pub struct ConnectionDescriptorBuilder {
    host: Option<String>,
    port: u16,
    user: Option<String>,
    credential: Option<String>,
    database: Option<String>,
    cert_path: Option<PathBuf>,
}

impl ConnectionDescriptorBuilder {
    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the user.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the password.
    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Set the default database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the CA certificate path.
    pub fn cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_path = Some(path.into());
        self
    }

    /// Build the descriptor.
    pub fn build(self) -> Result<ConnectionDescriptor, String> {
        let descriptor = ConnectionDescriptor {
            host: self.host.ok_or("Host is required")?,
            port: if self.port == 0 { DEFAULT_PORT } else { self.port },
            user: self.user.ok_or("User is required")?,
            credential: self.credential,
            database: self.database,
            cert_path: self.cert_path,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

/// Deterministic cache key for a schema object.
///
/// Segments are joined with [`IDENTITY_SEPARATOR`]; `%` and the separator are
/// percent-escaped inside segments so one identity is a prefix scope of
/// another only when it names a parent object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Build an identity from raw segments.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let separator = IDENTITY_SEPARATOR.to_string();
        let joined = segments
            .into_iter()
            .map(escape_segment)
            .collect::<Vec<_>>()
            .join(separator.as_str());
        Self(joined)
    }

    /// Identity of a child object one level below this one.
    pub fn child(&self, segment: &str) -> Self {
        Self(format!("{}{}{}", self.0, IDENTITY_SEPARATOR, escape_segment(segment)))
    }

    /// Whether `self` lies strictly beneath `scope`.
    pub fn is_within(&self, scope: &NodeIdentity) -> bool {
        self.0
            .strip_prefix(scope.as_str())
            .is_some_and(|rest| rest.starts_with(IDENTITY_SEPARATOR))
    }

    /// Get the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace(IDENTITY_SEPARATOR, "%2F")
}
