//! Error types for the Dolphin navigator core.
//!
//! Every failure is surfaced once, with the engine message preserved verbatim.
//! Declined confirmations are not errors (see `MutationOutcome::Cancelled`).

use std::sync::Arc;
use thiserror::Error;

/// Main error type for the navigator core.
#[derive(Debug, Error)]
pub enum DolphinError {
    /// Endpoint unreachable, handle retired, or the session dropped.
    #[error("Connection error ({identity}): {message}")]
    Connection {
        /// Identity of the descriptor the connection belongs to.
        identity: String,
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Credentials rejected by the server.
    #[error("Authentication error ({identity}): {message}")]
    Authentication {
        /// Identity of the descriptor the connection belongs to.
        identity: String,
        /// Server message.
        message: String,
        /// Actionable hint for the user.
        hint: Option<String>,
    },

    /// Statement rejected by the engine.
    #[error("{message}")]
    Query {
        /// Engine message, verbatim.
        message: String,
        /// MySQL error code (e.g. 1146).
        code: Option<u16>,
        /// SQLSTATE (e.g. "42S02").
        state: Option<String>,
    },

    /// External dump failed.
    #[error("Dump error: {message}")]
    Dump {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Settings could not be read, written or validated.
    #[error("Config error: {message}")]
    Config {
        /// Human-readable error message.
        message: String,
        /// Optional underlying error source.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unexpected internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
    },
}

impl DolphinError {
    // ========== Constructors ==========

    /// Create a new connection error.
    pub fn connection(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection { identity: identity.into(), message: message.into(), source: None }
    }

    /// Create a new connection error with source.
    pub fn connection_with_source(
        identity: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            identity: identity.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new authentication error.
    pub fn authentication(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            identity: identity.into(),
            message: message.into(),
            hint: Some("Check username and password".to_string()),
        }
    }

    /// Create a new query error.
    pub fn query(message: impl Into<String>, code: Option<u16>, state: Option<String>) -> Self {
        Self::Query { message: message.into(), code, state }
    }

    /// Create a new dump error.
    pub fn dump(message: impl Into<String>) -> Self {
        Self::Dump { message: message.into(), source: None }
    }

    /// Create a new config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Attach a descriptor identity to a connection-level error.
    ///
    /// Driver errors are converted without knowing which descriptor they came
    /// from; the registry fills the identity in afterwards.
    pub fn with_identity(self, identity: &str) -> Self {
        match self {
            Self::Connection { message, source, .. } => {
                Self::Connection { identity: identity.to_string(), message, source }
            }
            Self::Authentication { message, hint, .. } => {
                Self::Authentication { identity: identity.to_string(), message, hint }
            }
            other => other,
        }
    }

    /// Take ownership of a failure shared between cache waiters.
    ///
    /// The last holder gets the original error back. Otherwise the kind,
    /// message and hint are copied and the source chain is left behind.
    pub fn from_shared(err: Arc<DolphinError>) -> Self {
        Arc::try_unwrap(err).unwrap_or_else(|shared| shared.detached())
    }

    fn detached(&self) -> Self {
        match self {
            Self::Connection { identity, message, .. } => {
                Self::connection(identity.clone(), message.clone())
            }
            Self::Authentication { identity, message, hint } => Self::Authentication {
                identity: identity.clone(),
                message: message.clone(),
                hint: hint.clone(),
            },
            Self::Query { message, code, state } => {
                Self::query(message.clone(), *code, state.clone())
            }
            Self::Dump { message, .. } => Self::dump(message.clone()),
            Self::Config { message, .. } => Self::config(message.clone()),
            Self::Internal { message } => Self::internal(message.clone()),
        }
    }

    // ========== Methods ==========

    /// Check if this error means the connection is unusable.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "Connection",
            Self::Authentication { .. } => "Authentication",
            Self::Query { .. } => "Query",
            Self::Dump { .. } => "Dump",
            Self::Config { .. } => "Config",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Get actionable hint for the user.
    pub fn hint(&self) -> Option<&str> {
        match self {
            Self::Connection { .. } => Some("Check that the MySQL server is running"),
            Self::Authentication { hint, .. } => hint.as_deref(),
            Self::Query { .. } => None,
            Self::Dump { .. } => Some("Check that mysqldump is installed and on PATH"),
            Self::Config { .. } => Some("Check the settings file"),
            Self::Internal { .. } => Some("Please report this issue"),
        }
    }

    /// Get the MySQL error code (if applicable).
    pub fn mysql_code(&self) -> Option<u16> {
        match self {
            Self::Query { code, .. } => *code,
            _ => None,
        }
    }

    /// Convert to user-displayable error info.
    pub fn to_error_info(&self) -> ErrorInfo {
        let error_type = format!("{} Error", self.category());
        let message = self.to_string();
        let hint = self.hint().map(String::from);

        let technical_detail = match self {
            Self::Query { code, state, .. } => {
                let mut parts = Vec::new();
                if let Some(code) = code {
                    parts.push(format!("Code: {code}"));
                }
                if let Some(state) = state {
                    parts.push(format!("SQLSTATE: {state}"));
                }
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("\n"))
                }
            }
            Self::Connection { identity, .. } | Self::Authentication { identity, .. } => {
                Some(format!("Connection: {identity}"))
            }
            _ => None,
        };

        ErrorInfo { error_type, message, hint, technical_detail }
    }
}

/// User-displayable error information.
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Category name (e.g., "Connection Error").
    pub error_type: String,
    /// User-friendly message.
    pub message: String,
    /// Actionable suggestion.
    pub hint: Option<String>,
    /// Technical detail for "Show Details" expansion.
    pub technical_detail: Option<String>,
}

// ========== Error Conversions ==========

/// MySQL "access denied" server codes.
const ER_DBACCESS_DENIED: u16 = 1044;
const ER_ACCESS_DENIED: u16 = 1045;

/// Convert from mysql_async::Error to DolphinError.
///
/// The descriptor identity is unknown here; callers that know it use
/// [`DolphinError::with_identity`].
impl From<mysql_async::Error> for DolphinError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Server(server) => match server.code {
                ER_ACCESS_DENIED | ER_DBACCESS_DENIED => DolphinError::Authentication {
                    identity: String::new(),
                    message: server.message,
                    hint: Some("Access denied - check your credentials".to_string()),
                },
                _ => DolphinError::Query {
                    message: server.message,
                    code: Some(server.code),
                    state: Some(server.state),
                },
            },
            other => DolphinError::Connection {
                identity: String::new(),
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

/// Convert from serde_json::Error to DolphinError.
impl From<serde_json::Error> for DolphinError {
    fn from(err: serde_json::Error) -> Self {
        DolphinError::Config {
            message: format!("JSON error: {err}"),
            source: Some(Box::new(err)),
        }
    }
}
