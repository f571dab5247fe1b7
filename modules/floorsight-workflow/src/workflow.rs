//! The run orchestrator.
//!
//! One run = route → plan → scope → fetch → analyze → verify → render, with
//! strict stage barriers: a stage starts only after the previous one has
//! fully finished. Fetches within the fetch stage run concurrently; the
//! first failure cancels its in-flight siblings and aborts the run, so the
//! analyst never sees partial evidence.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::info;
use typed_builder::TypedBuilder;

use ai_client::Claude;
use floorsight_common::{Config, FloorsightError, Intent};
use floorsight_graph::GraphClient;

use crate::analyst::{self, Analyst};
use crate::answer::render_answer;
use crate::router::Router;
use crate::scope;
use crate::state::WorkflowState;
use crate::traits::{EvidenceAnalyst, FactFetcher, IntentClassifier};
use crate::verifier;

/// Per-run options from the caller (CLI flags or REPL commands).
#[derive(Debug, Clone, Default, TypedBuilder)]
pub struct RunOptions {
    /// Pin the run to one production line instead of probing by urgency.
    #[builder(default, setter(strip_option, into))]
    pub line: Option<String>,

    /// Pin the run to one job.
    #[builder(default, setter(strip_option, into))]
    pub job: Option<String>,

    /// Skip routing and force an intent.
    #[builder(default, setter(strip_option))]
    pub intent: Option<Intent>,
}

pub struct Workflow {
    classifier: Arc<dyn IntentClassifier>,
    fetcher: Arc<dyn FactFetcher>,
    analyst: Arc<dyn EvidenceAnalyst>,
}

impl Workflow {
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        fetcher: Arc<dyn FactFetcher>,
        analyst: Arc<dyn EvidenceAnalyst>,
    ) -> Self {
        Self {
            classifier,
            fetcher,
            analyst,
        }
    }

    /// Build the production workflow: Neo4j-backed fetcher, two-tier router
    /// and Claude analyst.
    pub async fn connect(config: &Config) -> Result<Self, FloorsightError> {
        let graph = GraphClient::connect(
            &config.neo4j_uri,
            &config.neo4j_user,
            &config.neo4j_password,
            &config.neo4j_database,
        )
        .await
        .map_err(anyhow::Error::from)?;

        let claude = Claude::new(&config.anthropic_api_key, &config.llm_model);

        Ok(Self::new(
            Arc::new(Router::new(claude.clone())),
            Arc::new(graph),
            Arc::new(Analyst::new(claude)),
        ))
    }

    /// Execute one goal end to end. Returns the full final state; the caller
    /// picks out the answer, evidence or stats it needs.
    pub async fn run(
        &self,
        goal: &str,
        options: &RunOptions,
    ) -> Result<WorkflowState, FloorsightError> {
        let mut state = WorkflowState::new(goal);

        // Route. A forced intent skips the classifier entirely.
        let intent = match options.intent {
            Some(intent) => intent,
            None => self.classifier.classify(goal).await?,
        };
        state = state.with_intent(intent);

        // Plan. Static table, total over the intent enum.
        let plan = scope::plan(intent);
        state = state.with_plan(plan);
        info!(run_id = %state.run_id, %intent, nodes = plan.len(), "Goal routed");

        // Scope.
        let resolved = scope::resolve(
            self.fetcher.as_ref(),
            intent,
            options.line.clone(),
            options.job.clone(),
        )
        .await?;
        info!(run_id = %state.run_id, scope = %resolved.selection.label(), "Scope resolved");
        if let Some(probe) = resolved.probe {
            state = state.with_scope_probe(probe);
        }
        let selection = resolved.selection;
        state = state.with_scope(selection.clone());

        // Fetch. Nodes run concurrently; try_join_all keeps results in plan
        // order and drops the in-flight rest on the first error.
        let fetches = plan.iter().map(|node| {
            let fetcher = Arc::clone(&self.fetcher);
            let scope = selection.clone();
            let node = *node;
            async move {
                let result = fetcher.fetch(node, &scope).await?;
                Ok::<_, FloorsightError>((node, result))
            }
        });
        for (node, result) in try_join_all(fetches).await? {
            state = state.with_evidence(node, result);
        }
        info!(
            run_id = %state.run_id,
            rows = state.total_rows(),
            empty = state.empty_results(),
            "Evidence collected"
        );

        // Analyze. The payload is everything the analyst gets.
        let payload = analyst::evidence_payload(&state);
        let finding = self.analyst.analyze(intent, &payload).await?;
        analyst::validate_finding(intent, &finding, &state)?;
        state = state.with_finding(finding);

        // Verify. Deterministic; contradictions become verdicts, not errors.
        let summary = verifier::verify(&state);
        info!(
            run_id = %state.run_id,
            status = %summary.status,
            claims = summary.verdicts.len(),
            "Claims verified"
        );
        state = state.with_verification(summary);

        // Render.
        let answer = render_answer(&state);
        Ok(state.with_answer(answer))
    }
}
