//! Confirmation-gated schema mutations.
//!
//! Every mutation runs the same sequence: ask the user, build the statement,
//! execute it on a freshly opened connection, invalidate the affected cache
//! entries, refresh the tree and report the outcome. Nothing after the prompt
//! happens when the user declines, and nothing after execution happens when
//! the statement fails.

use crate::context::NavigatorContext;
use crate::error::DolphinError;
use crate::models::{ConnectionDescriptor, NodeIdentity};
use crate::services::interaction::PromptRequest;

/// How a confirmation-gated operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The statement ran and the cache was updated.
    Applied,
    /// The user declined; nothing was executed.
    Cancelled,
}

/// Cache entries made stale by a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidationScope {
    /// Metadata is unchanged.
    None,
    /// Exactly one entry.
    Point(NodeIdentity),
    /// Every entry strictly below the identity.
    Prefix(NodeIdentity),
    /// The entry itself and every entry below it.
    Database(NodeIdentity),
}

/// What the user must enter to proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The affirmative token `y`, case-insensitive.
    Affirm,
    /// Any non-empty text other than the pre-filled value, passed on to the
    /// statement builder.
    Input,
}

/// One confirmation-gated operation.
#[derive(Debug, Clone)]
pub struct Mutation<'a> {
    /// Connection the statement runs on.
    pub descriptor: &'a ConnectionDescriptor,
    /// Prompt shown to the user.
    pub request: PromptRequest,
    /// Required response.
    pub gate: Gate,
    /// Entries to invalidate on success.
    pub scope: InvalidationScope,
    /// Short description used in notifications, e.g. `drop table orders`.
    pub subject: String,
}

/// Runs [`Mutation`]s against a navigator context.
pub struct MutationCoordinator<'a> {
    ctx: &'a NavigatorContext,
}

impl<'a> MutationCoordinator<'a> {
    /// Create a coordinator borrowing the context's registry, cache and UI seams.
    pub fn new(ctx: &'a NavigatorContext) -> Self {
        Self { ctx }
    }

    /// Prompt, then build and execute the statement.
    ///
    /// `build` receives the trimmed user input. Input identical to the
    /// pre-filled value cancels like an empty answer.
    pub async fn run<B>(
        &self,
        mutation: Mutation<'_>,
        build: B,
    ) -> Result<MutationOutcome, DolphinError>
    where
        B: FnOnce(&str) -> String,
    {
        let answer = self.ctx.prompt().ask(mutation.request.clone()).await;
        let Some(input) = answer.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            tracing::debug!(subject = %mutation.subject, "Prompt dismissed");
            return Ok(MutationOutcome::Cancelled);
        };

        if mutation.gate == Gate::Affirm && !input.eq_ignore_ascii_case("y") {
            tracing::debug!(subject = %mutation.subject, "Confirmation declined");
            self.ctx.notifier().info(&format!("Cancel {}", mutation.subject));
            return Ok(MutationOutcome::Cancelled);
        }

        if mutation.gate == Gate::Input && mutation.request.value.as_deref() == Some(input) {
            tracing::debug!(subject = %mutation.subject, "Input left unchanged");
            return Ok(MutationOutcome::Cancelled);
        }

        let sql = build(input);
        self.execute(mutation.descriptor, &sql, &mutation.scope, &mutation.subject).await
    }

    /// Execute an already confirmed statement.
    pub async fn execute(
        &self,
        descriptor: &ConnectionDescriptor,
        sql: &str,
        scope: &InvalidationScope,
        subject: &str,
    ) -> Result<MutationOutcome, DolphinError> {
        let result = async {
            let handle = self.ctx.registry().get_connection(descriptor, true).await?;
            self.ctx.runner().execute(&handle, sql).await
        }
        .await;

        if let Err(e) = result {
            tracing::error!(subject, error = %e, "Mutation failed");
            self.ctx.notifier().error(&format!("Failed to {subject}: {e}"));
            return Err(e);
        }

        self.invalidate(scope);
        self.ctx.tree().refresh();
        tracing::info!(subject, "Mutation applied");
        self.ctx.notifier().info(&format!("Success: {subject}"));
        Ok(MutationOutcome::Applied)
    }

    fn invalidate(&self, scope: &InvalidationScope) {
        let cache = self.ctx.cache();
        match scope {
            InvalidationScope::None => {}
            InvalidationScope::Point(identity) => {
                cache.invalidate(identity);
            }
            InvalidationScope::Prefix(identity) => {
                cache.invalidate_prefix(identity);
            }
            InvalidationScope::Database(identity) => {
                cache.invalidate(identity);
                cache.invalidate_prefix(identity);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{InfoNode, SchemaNode};
    use crate::test_support::{descriptor, Harness};

    fn marker() -> Vec<SchemaNode> {
        vec![SchemaNode::Info(InfoNode { message: "cached".to_string(), hint: None })]
    }

    fn drop_mutation<'a>(descriptor: &'a ConnectionDescriptor, scope: NodeIdentity) -> Mutation<'a> {
        Mutation {
            descriptor,
            request: PromptRequest::new("Drop table orders?", "Input y to confirm."),
            gate: Gate::Affirm,
            scope: InvalidationScope::Database(scope),
            subject: "drop table orders".to_string(),
        }
    }

    #[tokio::test]
    async fn test_affirm_gate_accepts_uppercase_y() {
        let harness = Harness::new().answer(Some("Y"));
        let descriptor = descriptor().with_database("shop");
        let shop = descriptor.database_identity("shop");
        harness.ctx.cache().put(shop.clone(), marker());

        let outcome = harness
            .ctx
            .mutations()
            .run(drop_mutation(&descriptor, shop.clone()), |_| "DROP TABLE `shop`.`orders`;".into())
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(harness.runner.calls_matching("DROP TABLE"), 1);
        assert!(harness.ctx.cache().get(&shop).is_none());
        assert_eq!(harness.tree.refreshes(), 1);
        assert_eq!(harness.connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_other_input_cancels_with_notice() {
        let harness = Harness::new().answer(Some("yes please"));
        let descriptor = descriptor().with_database("shop");
        let shop = descriptor.database_identity("shop");
        harness.ctx.cache().put(shop.clone(), marker());

        let outcome = harness
            .ctx
            .mutations()
            .run(drop_mutation(&descriptor, shop.clone()), |_| "DROP TABLE `shop`.`orders`;".into())
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Cancelled);
        assert_eq!(harness.runner.calls(), 0);
        assert!(harness.ctx.cache().get(&shop).is_some());
        assert_eq!(harness.notifier.infos(), vec!["Cancel drop table orders".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_statement_keeps_cache() {
        let harness = Harness::new().answer(Some("y"));
        harness.runner.fail_on("DROP TABLE", "Unknown table 'shop.orders'");
        let descriptor = descriptor().with_database("shop");
        let shop = descriptor.database_identity("shop");
        harness.ctx.cache().put(shop.clone(), marker());

        let err = harness
            .ctx
            .mutations()
            .run(drop_mutation(&descriptor, shop.clone()), |_| "DROP TABLE `shop`.`orders`;".into())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Unknown table 'shop.orders'");
        assert!(harness.ctx.cache().get(&shop).is_some());
        assert_eq!(harness.tree.refreshes(), 0);
        assert_eq!(harness.notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_input_gate_passes_trimmed_value() {
        let harness = Harness::new().answer(Some("  orders2 "));
        let descriptor = descriptor().with_database("shop");
        let mutation = Mutation {
            descriptor: &descriptor,
            request: PromptRequest::new("Rename", "newTableName"),
            gate: Gate::Input,
            scope: InvalidationScope::None,
            subject: "rename table orders".to_string(),
        };

        let outcome = harness
            .ctx
            .mutations()
            .run(mutation, |name| format!("RENAME TABLE `shop`.`orders` TO `shop`.`{name}`;"))
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Applied);
        assert_eq!(harness.runner.calls_matching("TO `shop`.`orders2`;"), 1);
    }

    #[tokio::test]
    async fn test_input_gate_cancels_unchanged_prefill() {
        let harness = Harness::new().answer(Some(" orders "));
        let descriptor = descriptor().with_database("shop");
        let mutation = Mutation {
            descriptor: &descriptor,
            request: PromptRequest::new("Rename", "newTableName").with_value("orders"),
            gate: Gate::Input,
            scope: InvalidationScope::None,
            subject: "rename table orders".to_string(),
        };

        let outcome = harness
            .ctx
            .mutations()
            .run(mutation, |name| format!("RENAME TABLE `shop`.`orders` TO `shop`.`{name}`;"))
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Cancelled);
        assert_eq!(harness.connector.connects(), 0);
        assert!(harness.notifier.infos().is_empty());
    }
}
