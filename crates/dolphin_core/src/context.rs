//! Navigator context.
//!
//! Holds everything a node operation needs: settings, the connection
//! registry, the metadata cache, the statement runner and the host UI seams.
//! One context is created per navigator and shared by reference; nodes carry
//! no state of their own beyond their descriptor and names.

use crate::config::NavigatorSettings;
use crate::services::cache::MetadataCache;
use crate::services::connection::{ConnectionRegistry, Connector};
use crate::services::dump::{DumpTool, MysqldumpCommand};
use crate::services::interaction::{
    ConfirmationPrompt, DeclinePrompt, DetachedTree, LoggingSurface, Notifier, TextSurface,
    TracingNotifier, TreeView,
};
use crate::services::mutation::MutationCoordinator;
use crate::services::mysql::MySqlConnector;
use crate::services::query::{QueryRunner, QueryService};

use std::sync::Arc;

/// Shared state and collaborators for schema navigation.
pub struct NavigatorContext {
    /// Tunables
    settings: NavigatorSettings,
    /// Live connections by descriptor identity
    registry: Arc<ConnectionRegistry>,
    /// Child lists and expansion state
    cache: Arc<MetadataCache>,
    /// Executes every statement the core issues
    runner: Arc<dyn QueryRunner>,
    tree: Arc<dyn TreeView>,
    prompt: Arc<dyn ConfirmationPrompt>,
    surface: Arc<dyn TextSurface>,
    notifier: Arc<dyn Notifier>,
    dump: Arc<dyn DumpTool>,
}

impl NavigatorContext {
    /// Start building a context around a connector.
    pub fn builder(connector: Arc<dyn Connector>) -> NavigatorContextBuilder {
        NavigatorContextBuilder::new(connector)
    }

    /// A headless context talking to MySQL.
    ///
    /// Prompts are declined and UI output goes to the log until the host
    /// replaces the seams through [`NavigatorContext::builder`].
    pub fn mysql(settings: NavigatorSettings) -> Self {
        let connector = MySqlConnector::new(settings.connect_timeout());
        Self::builder(Arc::new(connector)).settings(settings).build()
    }

    /// Get the navigator settings.
    pub fn settings(&self) -> &NavigatorSettings {
        &self.settings
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the metadata cache.
    pub fn cache(&self) -> &Arc<MetadataCache> {
        &self.cache
    }

    /// Get the runner that executes every statement.
    pub fn runner(&self) -> &Arc<dyn QueryRunner> {
        &self.runner
    }

    /// Get the schema tree view.
    pub fn tree(&self) -> &dyn TreeView {
        self.tree.as_ref()
    }

    /// Get the prompt used to confirm mutations.
    pub fn prompt(&self) -> &dyn ConfirmationPrompt {
        self.prompt.as_ref()
    }

    /// Get the editor surface templates are opened in.
    pub fn surface(&self) -> &dyn TextSurface {
        self.surface.as_ref()
    }

    /// Get the user notification sink.
    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    /// Get the backup tool.
    pub fn dump(&self) -> &dyn DumpTool {
        self.dump.as_ref()
    }

    /// Coordinator for confirmation-gated mutations.
    pub fn mutations(&self) -> MutationCoordinator<'_> {
        MutationCoordinator::new(self)
    }

    /// Close every connection and forget all cached metadata.
    pub async fn reset(&self) {
        self.registry.reset().await;
        self.cache.reset();
        tracing::info!("Navigator context reset");
    }
}

/// Builder for [`NavigatorContext`].
pub struct NavigatorContextBuilder {
    connector: Arc<dyn Connector>,
    settings: NavigatorSettings,
    runner: Option<Arc<dyn QueryRunner>>,
    tree: Option<Arc<dyn TreeView>>,
    prompt: Option<Arc<dyn ConfirmationPrompt>>,
    surface: Option<Arc<dyn TextSurface>>,
    notifier: Option<Arc<dyn Notifier>>,
    dump: Option<Arc<dyn DumpTool>>,
}

impl NavigatorContextBuilder {
    fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            settings: NavigatorSettings::default(),
            runner: None,
            tree: None,
            prompt: None,
            surface: None,
            notifier: None,
            dump: None,
        }
    }

    /// Set the settings. Defaults are used otherwise.
    pub fn settings(mut self, settings: NavigatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the statement runner. Defaults to [`QueryService`].
    pub fn runner(mut self, runner: Arc<dyn QueryRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Set the tree view to refresh after mutations.
    pub fn tree(mut self, tree: Arc<dyn TreeView>) -> Self {
        self.tree = Some(tree);
        self
    }

    /// Set the confirmation prompt. Without one every prompt is declined.
    pub fn prompt(mut self, prompt: Arc<dyn ConfirmationPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Set the editor surface. Without one templates are only logged.
    pub fn surface(mut self, surface: Arc<dyn TextSurface>) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Set the notification sink. Defaults to tracing events.
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Set the backup tool. Defaults to `mysqldump` from the settings.
    pub fn dump(mut self, dump: Arc<dyn DumpTool>) -> Self {
        self.dump = Some(dump);
        self
    }

    /// Build the context. Unset seams get headless defaults.
    pub fn build(self) -> NavigatorContext {
        let dump_program = self.settings.dump_program.clone();
        tracing::debug!(page_size = self.settings.default_page_size, "Navigator context created");
        NavigatorContext {
            registry: Arc::new(ConnectionRegistry::new(self.connector)),
            cache: Arc::new(MetadataCache::new()),
            runner: self.runner.unwrap_or_else(|| Arc::new(QueryService)),
            tree: self.tree.unwrap_or_else(|| Arc::new(DetachedTree)),
            prompt: self.prompt.unwrap_or_else(|| Arc::new(DeclinePrompt)),
            surface: self.surface.unwrap_or_else(|| Arc::new(LoggingSurface)),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
            dump: self.dump.unwrap_or_else(|| Arc::new(MysqldumpCommand::new(dump_program))),
            settings: self.settings,
        }
    }
}
