// Trait abstractions for workflow dependencies.
//
// IntentClassifier replaces the two-tier router — goal text in, intent out.
// FactFetcher replaces GraphClient — every registry query behind one trait.
// EvidenceAnalyst replaces the per-intent Claude calls — labeled evidence
//   payload in, structured finding out.
//
// These enable deterministic testing with MockClassifier, MockFetcher and
// MockAnalyst: no network, no database, no Docker. `cargo test` in seconds.

use async_trait::async_trait;

use floorsight_common::{FetchNodeId, Finding, FloorsightError, Intent, QueryResult, TemplateId};
use floorsight_graph::{GraphClient, TemplateArgs};

use crate::scope::ScopeSelection;

// ---------------------------------------------------------------------------
// IntentClassifier — replaces Router
// ---------------------------------------------------------------------------

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Map a free-text goal onto the closed intent set.
    /// Fails with `UnroutableGoal` when the goal fits none of the intents;
    /// never invents an intent outside the set.
    async fn classify(&self, goal: &str) -> Result<Intent, FloorsightError>;
}

// ---------------------------------------------------------------------------
// FactFetcher — replaces GraphClient
// ---------------------------------------------------------------------------

#[async_trait]
pub trait FactFetcher: Send + Sync {
    /// Execute one fetch node's registry template under the given scope.
    /// A failure carries the node identity so the abort can name its origin.
    async fn fetch(
        &self,
        node: FetchNodeId,
        scope: &ScopeSelection,
    ) -> Result<QueryResult, FloorsightError>;

    /// Run the scope probe: production lines ranked by current-job due date,
    /// most urgent first.
    async fn urgent_lines(&self, limit: i64) -> Result<QueryResult, FloorsightError>;
}

#[async_trait]
impl FactFetcher for GraphClient {
    async fn fetch(
        &self,
        node: FetchNodeId,
        scope: &ScopeSelection,
    ) -> Result<QueryResult, FloorsightError> {
        let template = node.template();
        let args = TemplateArgs::for_scope(scope.line_id.clone(), scope.job_id.clone());
        self.run_template(template, &args)
            .await
            .map_err(|source| FloorsightError::Fetch {
                node,
                template,
                source,
            })
    }

    async fn urgent_lines(&self, limit: i64) -> Result<QueryResult, FloorsightError> {
        let args = TemplateArgs {
            line_id: None,
            job_id: None,
            limit: Some(limit),
        };
        self.run_template(TemplateId::MostUrgentLines, &args)
            .await
            .map_err(|source| FloorsightError::ScopeResolution {
                template: TemplateId::MostUrgentLines,
                source,
            })
    }
}

// ---------------------------------------------------------------------------
// EvidenceAnalyst — replaces the Claude analyst calls
// ---------------------------------------------------------------------------

#[async_trait]
pub trait EvidenceAnalyst: Send + Sync {
    /// Produce a finding for the run's intent from the labeled evidence
    /// payload. The payload is the only context the analyst gets — claims can
    /// only cite rows that appear in it.
    async fn analyze(&self, intent: Intent, payload: &str) -> Result<Finding, FloorsightError>;
}
