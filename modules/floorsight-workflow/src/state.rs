//! Immutable run state.
//!
//! `WorkflowState` flows stage to stage by copy-with-update: each `with_*`
//! method consumes the previous state and returns the extended one, so a
//! stage can only add to what came before. Evidence is append-only and
//! appended in plan order, which keeps every (fetch node, row index)
//! reference stable for the life of the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use floorsight_common::{
    Answer, EvidenceRef, FetchNodeId, Finding, Intent, QueryResult, Record, VerificationSummary,
};

use crate::scope::ScopeSelection;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub run_id: Uuid,
    pub goal: String,
    pub started_at: DateTime<Utc>,

    /// Routed intent. Set once, never rewritten.
    pub intent: Option<Intent>,

    /// Fetch nodes for the intent, in execution order.
    pub plan: Vec<FetchNodeId>,

    /// Which line/job the run is about.
    pub scope: Option<ScopeSelection>,

    /// The urgency-probe result, kept for audit. Deliberately outside
    /// `evidence`: probe rows are not citable by claims.
    pub scope_probe: Option<QueryResult>,

    /// Collected query results, one per executed fetch node, in plan order.
    pub evidence: Vec<(FetchNodeId, QueryResult)>,

    /// Analyst output, in the order the analysts ran.
    pub findings: Vec<Finding>,

    pub verification: Option<VerificationSummary>,

    pub answer: Option<Answer>,
}

impl WorkflowState {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            goal: goal.into(),
            started_at: Utc::now(),
            intent: None,
            plan: Vec::new(),
            scope: None,
            scope_probe: None,
            evidence: Vec::new(),
            findings: Vec::new(),
            verification: None,
            answer: None,
        }
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_plan(mut self, plan: &[FetchNodeId]) -> Self {
        self.plan = plan.to_vec();
        self
    }

    pub fn with_scope(mut self, scope: ScopeSelection) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_scope_probe(mut self, probe: QueryResult) -> Self {
        self.scope_probe = Some(probe);
        self
    }

    /// Append one fetch node's result. Each node appears at most once.
    pub fn with_evidence(mut self, node: FetchNodeId, result: QueryResult) -> Self {
        debug_assert!(
            self.evidence.iter().all(|(n, _)| *n != node),
            "evidence for {node} appended twice"
        );
        self.evidence.push((node, result));
        self
    }

    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }

    pub fn with_verification(mut self, summary: VerificationSummary) -> Self {
        self.verification = Some(summary);
        self
    }

    pub fn with_answer(mut self, answer: Answer) -> Self {
        self.answer = Some(answer);
        self
    }

    /// The result a fetch node produced, if that node has run.
    pub fn evidence_for(&self, node: FetchNodeId) -> Option<&QueryResult> {
        self.evidence
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, r)| r)
    }

    /// Resolve an evidence reference to the exact row it names.
    pub fn row(&self, evidence: EvidenceRef) -> Option<&Record> {
        self.evidence_for(evidence.node)
            .and_then(|r| r.rows.get(evidence.row))
    }

    /// Total rows across all collected evidence.
    pub fn total_rows(&self) -> usize {
        self.evidence.iter().map(|(_, r)| r.row_count()).sum()
    }

    /// Fetch results that came back empty. Valid results — zero rows means
    /// the query matched nothing, not that the fetch failed.
    pub fn empty_results(&self) -> usize {
        self.evidence.iter().filter(|(_, r)| r.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use floorsight_common::TemplateId;
    use serde_json::json;

    fn result_with_rows(template: TemplateId, rows: Vec<Record>) -> QueryResult {
        QueryResult::new(template, serde_json::Map::new(), rows)
    }

    #[test]
    fn copy_with_update_preserves_prior_fields() {
        let state = WorkflowState::new("is line one keeping up")
            .with_intent(Intent::CapacityWip)
            .with_plan(&[FetchNodeId::Backbone, FetchNodeId::Workers]);
        let run_id = state.run_id;

        let state = state.with_evidence(
            FetchNodeId::Backbone,
            result_with_rows(TemplateId::OperationBackbone, vec![]),
        );

        assert_eq!(state.run_id, run_id);
        assert_eq!(state.goal, "is line one keeping up");
        assert_eq!(state.intent, Some(Intent::CapacityWip));
        assert_eq!(state.plan.len(), 2);
        assert_eq!(state.evidence.len(), 1);
    }

    #[test]
    fn evidence_refs_resolve_to_the_exact_row() {
        let rows = vec![
            record(&[("op_id", json!("OP1")), ("wip_units", json!(4))]),
            record(&[("op_id", json!("OP2")), ("wip_units", json!(31))]),
            record(&[("op_id", json!("OP3")), ("wip_units", json!(0))]),
        ];
        let state = WorkflowState::new("wip check").with_evidence(
            FetchNodeId::Backbone,
            result_with_rows(TemplateId::OperationBackbone, rows),
        );

        let row = state
            .row(EvidenceRef::new(FetchNodeId::Backbone, 1))
            .unwrap();
        assert_eq!(row.get("op_id"), Some(&json!("OP2")));
        assert_eq!(row.get("wip_units"), Some(&json!(31)));

        // Out of range and unknown node both resolve to nothing.
        assert!(state.row(EvidenceRef::new(FetchNodeId::Backbone, 3)).is_none());
        assert!(state.row(EvidenceRef::new(FetchNodeId::Workers, 0)).is_none());
    }

    #[test]
    fn evidence_keeps_append_order() {
        let state = WorkflowState::new("order check")
            .with_evidence(
                FetchNodeId::Backbone,
                result_with_rows(TemplateId::OperationBackbone, vec![]),
            )
            .with_evidence(
                FetchNodeId::Parts,
                result_with_rows(TemplateId::PartsAndSuppliers, vec![]),
            )
            .with_evidence(
                FetchNodeId::SupplierRisk,
                result_with_rows(TemplateId::SupplierExposure, vec![]),
            );

        let order: Vec<FetchNodeId> = state.evidence.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            order,
            vec![
                FetchNodeId::Backbone,
                FetchNodeId::Parts,
                FetchNodeId::SupplierRisk
            ]
        );
        assert_eq!(state.empty_results(), 3);
        assert_eq!(state.total_rows(), 0);
    }
}
