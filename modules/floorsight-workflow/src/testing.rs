// Test mocks for the workflow pipeline.
//
// Three mocks matching the three trait boundaries:
// - MockClassifier (IntentClassifier) — fixed intent or always-unroutable
// - MockFetcher (FactFetcher) — per-node registered rows, optional failures
// - MockAnalyst (EvidenceAnalyst) — fixed finding, records every payload
//
// Plus fixture helpers for building evidence rows, claims and findings by
// hand. All mocks record their calls behind a Mutex so tests can assert on
// what ran and in which order.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use floorsight_common::{
    Claim, ClaimKind, EvidenceRef, FetchNodeId, Finding, FloorsightError, Intent, QueryResult,
    Record,
};

use crate::scope::ScopeSelection;
use crate::traits::{EvidenceAnalyst, FactFetcher, IntentClassifier};

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Returns one fixed intent, or `UnroutableGoal` for every goal.
pub struct MockClassifier {
    intent: Option<Intent>,
    goals: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn fixed(intent: Intent) -> Self {
        Self {
            intent: Some(intent),
            goals: Mutex::new(Vec::new()),
        }
    }

    pub fn unroutable() -> Self {
        Self {
            intent: None,
            goals: Mutex::new(Vec::new()),
        }
    }

    /// Goals passed to `classify`, in call order.
    pub fn goals(&self) -> Vec<String> {
        self.goals.lock().unwrap().clone()
    }
}

#[async_trait]
impl IntentClassifier for MockClassifier {
    async fn classify(&self, goal: &str) -> Result<Intent, FloorsightError> {
        self.goals.lock().unwrap().push(goal.to_string());
        self.intent.ok_or_else(|| FloorsightError::UnroutableGoal {
            goal: goal.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Per-node registered rows. Fetching an unregistered node is an error so a
/// typo in a test fails loudly; register an empty `vec![]` to simulate a
/// valid empty result. The probe defaults to empty (no urgent lines).
pub struct MockFetcher {
    results: HashMap<FetchNodeId, Vec<Record>>,
    failures: HashMap<FetchNodeId, String>,
    probe_rows: Vec<Record>,
    probe_failure: Option<String>,
    fetches: Mutex<Vec<(FetchNodeId, ScopeSelection)>>,
    probe_calls: Mutex<u32>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            results: HashMap::new(),
            failures: HashMap::new(),
            probe_rows: Vec::new(),
            probe_failure: None,
            fetches: Mutex::new(Vec::new()),
            probe_calls: Mutex::new(0),
        }
    }

    pub fn on_node(mut self, node: FetchNodeId, rows: Vec<Record>) -> Self {
        self.results.insert(node, rows);
        self
    }

    pub fn failing_node(mut self, node: FetchNodeId, message: &str) -> Self {
        self.failures.insert(node, message.to_string());
        self
    }

    pub fn on_probe(mut self, rows: Vec<Record>) -> Self {
        self.probe_rows = rows;
        self
    }

    pub fn failing_probe(mut self, message: &str) -> Self {
        self.probe_failure = Some(message.to_string());
        self
    }

    /// Fetches seen so far, with the scope each ran under, in call order.
    pub fn fetches(&self) -> Vec<(FetchNodeId, ScopeSelection)> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn fetched_nodes(&self) -> Vec<FetchNodeId> {
        self.fetches().into_iter().map(|(n, _)| n).collect()
    }

    pub fn probe_calls(&self) -> u32 {
        *self.probe_calls.lock().unwrap()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FactFetcher for MockFetcher {
    async fn fetch(
        &self,
        node: FetchNodeId,
        scope: &ScopeSelection,
    ) -> Result<QueryResult, FloorsightError> {
        self.fetches.lock().unwrap().push((node, scope.clone()));

        if let Some(message) = self.failures.get(&node) {
            return Err(FloorsightError::Fetch {
                node,
                template: node.template(),
                source: anyhow::anyhow!("{message}"),
            });
        }

        let rows = self
            .results
            .get(&node)
            .cloned()
            .ok_or_else(|| FloorsightError::Fetch {
                node,
                template: node.template(),
                source: anyhow::anyhow!("MockFetcher: no rows registered for {node}"),
            })?;

        let mut parameters = serde_json::Map::new();
        parameters.insert(
            "line_id".to_string(),
            scope.line_id.clone().unwrap_or_default().into(),
        );
        parameters.insert(
            "job_id".to_string(),
            scope.job_id.clone().unwrap_or_default().into(),
        );
        Ok(QueryResult::new(node.template(), parameters, rows))
    }

    async fn urgent_lines(&self, limit: i64) -> Result<QueryResult, FloorsightError> {
        *self.probe_calls.lock().unwrap() += 1;

        if let Some(message) = &self.probe_failure {
            return Err(FloorsightError::ScopeResolution {
                template: floorsight_common::TemplateId::MostUrgentLines,
                source: anyhow::anyhow!("{message}"),
            });
        }

        let rows: Vec<Record> = self
            .probe_rows
            .iter()
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        let mut parameters = serde_json::Map::new();
        parameters.insert("limit".to_string(), limit.into());
        Ok(QueryResult::new(
            floorsight_common::TemplateId::MostUrgentLines,
            parameters,
            rows,
        ))
    }
}

// ---------------------------------------------------------------------------
// MockAnalyst
// ---------------------------------------------------------------------------

/// Returns one fixed finding, or an `UnparseableFinding`, recording every
/// payload it was shown.
pub struct MockAnalyst {
    finding: Option<Finding>,
    payloads: Mutex<Vec<(Intent, String)>>,
}

impl MockAnalyst {
    pub fn returning(finding: Finding) -> Self {
        Self {
            finding: Some(finding),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn unparseable() -> Self {
        Self {
            finding: None,
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn payloads(&self) -> Vec<(Intent, String)> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.payloads.lock().unwrap().len()
    }
}

#[async_trait]
impl EvidenceAnalyst for MockAnalyst {
    async fn analyze(&self, intent: Intent, payload: &str) -> Result<Finding, FloorsightError> {
        self.payloads
            .lock()
            .unwrap()
            .push((intent, payload.to_string()));
        self.finding
            .clone()
            .ok_or_else(|| FloorsightError::UnparseableFinding {
                intent,
                reason: "MockAnalyst: response did not match the finding schema".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// Build an evidence row from column/value pairs.
pub fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Build a claim citing one evidence row.
pub fn claim(
    kind: ClaimKind,
    subject: &str,
    metric: Option<&str>,
    value: Option<&str>,
    node: FetchNodeId,
    row: usize,
) -> Claim {
    Claim {
        kind,
        subject: subject.to_string(),
        metric: metric.map(ToString::to_string),
        value: value.map(ToString::to_string),
        severity: None,
        statement: match (metric, value) {
            (Some(metric), Some(value)) => format!("{subject}: {metric} is {value}"),
            _ => format!("{subject} appears in the evidence"),
        },
        evidence: vec![EvidenceRef::new(node, row)],
    }
}

/// Wrap claims in a minimal well-formed finding.
pub fn finding_with(claims: Vec<Claim>) -> Finding {
    Finding {
        headline: "Test finding".to_string(),
        narrative: "Narrative for a test finding.".to_string(),
        claims,
        actions: Vec::new(),
        diagram: None,
    }
}
