//! In-memory fakes for unit tests.

use crate::context::NavigatorContext;
use crate::error::DolphinError;
use crate::models::{ConnectionDescriptor, Row};
use crate::nodes::TableNode;
use crate::services::connection::{ConnectionHandle, Connector, Session};
use crate::services::dump::{DumpRequest, DumpTool};
use crate::services::interaction::{
    ConfirmationPrompt, Notifier, PromptRequest, TextSurface, TreeView,
};
use crate::services::query::QueryRunner;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// `root@db1:3306` with password `secret` and no database.
pub fn descriptor() -> ConnectionDescriptor {
    let mut descriptor = ConnectionDescriptor::new("db1", "root");
    descriptor.credential = Some("secret".to_string());
    descriptor
}

/// Build a row from column/value pairs.
pub fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), Value::from(*v))).collect()
}

/// A row as returned by the column discovery query.
pub fn column_row(name: &str, column_type: &str, key: &str) -> Row {
    row(&[
        ("name", name),
        ("type", column_type),
        ("comment", ""),
        ("key", key),
        ("nullable", "NO"),
    ])
}

// ========== Connections ==========

/// Session that accepts every statement, optionally taking its time.
pub struct FakeSession {
    delay: Option<Duration>,
}

#[async_trait]
impl Session for FakeSession {
    async fn query(&self, _sql: &str) -> Result<Vec<Row>, DolphinError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Vec::new())
    }

    async fn close(&self) {}
}

/// Connector that counts connection attempts.
#[derive(Default)]
pub struct FakeConnector {
    connects: AtomicUsize,
    failure: Option<String>,
    query_delay: Option<Duration>,
}

impl FakeConnector {
    /// Every attempt fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self { failure: Some(message.to_string()), ..Default::default() }
    }

    /// Sessions sleep for `delay` inside every statement.
    pub fn with_query_delay(delay: Duration) -> Self {
        Self { query_delay: Some(delay), ..Default::default() }
    }

    /// Number of connection attempts so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _descriptor: &ConnectionDescriptor,
    ) -> Result<Arc<dyn Session>, DolphinError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(DolphinError::connection("", message.clone())),
            None => Ok(Arc::new(FakeSession { delay: self.query_delay })),
        }
    }
}

// ========== Statements ==========

/// Runner that records statements and answers from a script.
///
/// Responses and failures match on a substring of the SQL text.
#[derive(Default)]
pub struct FakeQueryRunner {
    executed: Mutex<Vec<String>>,
    responses: Mutex<Vec<(String, Vec<Row>)>>,
    failures: Mutex<Vec<(String, String)>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeQueryRunner {
    /// Answer statements containing `pattern` with `rows`.
    pub fn respond(&self, pattern: &str, rows: Vec<Row>) {
        self.responses.lock().push((pattern.to_string(), rows));
    }

    /// Fail statements containing `pattern` with a server message.
    pub fn fail_on(&self, pattern: &str, message: &str) {
        self.failures.lock().push((pattern.to_string(), message.to_string()));
    }

    /// Sleep this long inside every statement.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Every statement executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.executed.lock().len()
    }

    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.executed.lock().iter().filter(|sql| sql.contains(pattern)).count()
    }
}

#[async_trait]
impl QueryRunner for FakeQueryRunner {
    async fn execute(
        &self,
        _handle: &ConnectionHandle,
        sql: &str,
    ) -> Result<Vec<Row>, DolphinError> {
        self.executed.lock().push(sql.to_string());
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .lock()
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, message)| message.clone());
        if let Some(message) = failure {
            return Err(DolphinError::query(message, Some(1146), Some("42S02".to_string())));
        }

        Ok(self
            .responses
            .lock()
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }
}

// ========== Host UI ==========

/// Prompt that replays queued answers, then dismisses.
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    requests: Mutex<Vec<PromptRequest>>,
}

impl ScriptedPrompt {
    pub fn push(&self, answer: Option<&str>) {
        self.answers.lock().push_back(answer.map(String::from));
    }

    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ConfirmationPrompt for ScriptedPrompt {
    async fn ask(&self, request: PromptRequest) -> Option<String> {
        self.requests.lock().push(request);
        self.answers.lock().pop_front().flatten()
    }
}

#[derive(Default)]
pub struct RecordingTree {
    refreshes: AtomicUsize,
}

impl RecordingTree {
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl TreeView for RecordingTree {
    fn refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    documents: Mutex<Vec<String>>,
    runs: Mutex<Vec<String>>,
}

impl RecordingSurface {
    pub fn documents(&self) -> Vec<String> {
        self.documents.lock().clone()
    }

    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().clone()
    }
}

impl TextSurface for RecordingSurface {
    fn open_document(&self, sql: &str) {
        self.documents.lock().push(sql.to_string());
    }

    fn run_immediately(&self, sql: &str, _node: &TableNode) {
        self.runs.lock().push(sql.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    infos: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.infos.lock().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }
}

/// Dump tool that records requests and optionally fails.
#[derive(Default)]
pub struct FakeDump {
    requests: Mutex<Vec<DumpRequest>>,
    failure: Mutex<Option<String>>,
}

impl FakeDump {
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    pub fn requests(&self) -> Vec<DumpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DumpTool for FakeDump {
    async fn dump(&self, request: &DumpRequest) -> Result<(), DolphinError> {
        self.requests.lock().push(request.clone());
        match self.failure.lock().clone() {
            Some(message) => Err(DolphinError::dump(message)),
            None => Ok(()),
        }
    }
}

// ========== Harness ==========

/// A context wired to fakes, with the fakes kept at hand for assertions.
pub struct Harness {
    pub ctx: NavigatorContext,
    pub connector: Arc<FakeConnector>,
    pub runner: Arc<FakeQueryRunner>,
    pub prompt: Arc<ScriptedPrompt>,
    pub tree: Arc<RecordingTree>,
    pub surface: Arc<RecordingSurface>,
    pub notifier: Arc<RecordingNotifier>,
    pub dump: Arc<FakeDump>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_connector(FakeConnector::default())
    }

    /// A harness whose connections come from `connector`.
    pub fn with_connector(connector: FakeConnector) -> Self {
        let connector = Arc::new(connector);
        let runner = Arc::new(FakeQueryRunner::default());
        let prompt = Arc::new(ScriptedPrompt::default());
        let tree = Arc::new(RecordingTree::default());
        let surface = Arc::new(RecordingSurface::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let dump = Arc::new(FakeDump::default());

        let ctx = NavigatorContext::builder(connector.clone())
            .runner(runner.clone())
            .prompt(prompt.clone())
            .tree(tree.clone())
            .surface(surface.clone())
            .notifier(notifier.clone())
            .dump(dump.clone())
            .build();

        Self { ctx, connector, runner, prompt, tree, surface, notifier, dump }
    }

    /// Queue the next prompt answer.
    pub fn answer(self, answer: Option<&str>) -> Self {
        self.prompt.push(answer);
        self
    }

    /// `shop.orders` on the test descriptor.
    pub fn orders(&self) -> TableNode {
        TableNode::new(descriptor(), "shop", "orders")
    }

    /// Script the column discovery of `shop.orders` as `id` (PRI), `name`, `age`.
    pub fn with_orders_columns(self) -> Self {
        self.runner.respond(
            "information_schema.COLUMNS",
            vec![
                column_row("id", "int", "PRI"),
                column_row("name", "varchar(64)", ""),
                column_row("age", "int", "MUL"),
            ],
        );
        self
    }
}
