//! Seams to the host UI.
//!
//! The core never renders anything itself. It asks for confirmation, opens
//! SQL text, signals tree refreshes and reports outcomes through these traits.
//! The default implementations make a headless context usable: prompts are
//! declined, and everything else is logged.

use crate::nodes::TableNode;

use async_trait::async_trait;

/// A prompt shown before a confirmation-gated operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Question shown to the user.
    pub prompt: String,
    /// Hint shown in an empty input.
    pub placeholder: String,
    /// Pre-filled value.
    pub value: Option<String>,
}

impl PromptRequest {
    /// Create a prompt without a pre-filled value.
    pub fn new(prompt: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), placeholder: placeholder.into(), value: None }
    }

    /// Pre-fill the input.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Asks the user for input.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    /// Returns the entered text, or `None` when dismissed.
    async fn ask(&self, request: PromptRequest) -> Option<String>;
}

/// The schema tree view.
pub trait TreeView: Send + Sync {
    /// Re-read the tree after a structural change.
    fn refresh(&self);
}

/// The SQL editor surface.
pub trait TextSurface: Send + Sync {
    /// Open SQL text in a new editor document.
    fn open_document(&self, sql: &str);

    /// Run SQL text right away against the node's connection.
    fn run_immediately(&self, sql: &str, node: &TableNode);
}

/// User-facing messages.
pub trait Notifier: Send + Sync {
    /// Informational message.
    fn info(&self, message: &str);

    /// Something the user should look at.
    fn warn(&self, message: &str);

    /// An operation failed.
    fn error(&self, message: &str);
}

/// Declines every prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclinePrompt;

#[async_trait]
impl ConfirmationPrompt for DeclinePrompt {
    async fn ask(&self, request: PromptRequest) -> Option<String> {
        tracing::debug!(prompt = %request.prompt, "No prompt available, declining");
        None
    }
}

/// Tree view that ignores refreshes.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedTree;

impl TreeView for DetachedTree {
    fn refresh(&self) {
        tracing::trace!("Tree refresh requested with no tree attached");
    }
}

/// Text surface that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSurface;

impl TextSurface for LoggingSurface {
    fn open_document(&self, sql: &str) {
        tracing::info!(sql, "Open document");
    }

    fn run_immediately(&self, sql: &str, node: &TableNode) {
        tracing::info!(sql, identity = %node.identity(), "Run immediately");
    }
}

/// Notifier that writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}
