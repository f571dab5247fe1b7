//! Evidence analysis: labeled rows in, structured finding out.
//!
//! The payload renderer is the analyst's entire world — every row the run
//! fetched, tagged `[node#index]`, plus the goal and scope. The model returns
//! a `Finding` whose claims cite those tags; `validate_finding` then rejects
//! any citation that points outside the run's own evidence, so everything
//! reaching the verifier is at least well-addressed.

use async_trait::async_trait;
use serde_json::Value;

use ai_client::Claude;
use floorsight_common::{Finding, FloorsightError, Intent, Record};

use crate::state::WorkflowState;
use crate::traits::EvidenceAnalyst;

/// Payload cap. Registry templates are bounded, so real payloads sit far
/// below this; the cap only guards against a runaway graph.
const MAX_PAYLOAD_CHARS: usize = 60_000;

/// Render the run's evidence as the labeled block the analyst sees. Rows are
/// tagged `[node#index]` — the same addresses claims must cite.
pub fn evidence_payload(state: &WorkflowState) -> String {
    let mut out = String::new();

    out.push_str("# Goal\n");
    out.push_str(state.goal.trim());
    out.push('\n');

    if let Some(scope) = &state.scope {
        out.push_str("\n# Scope\n");
        out.push_str(&scope.label());
        out.push('\n');
    }

    out.push_str("\n# Evidence\n");
    for (node, result) in &state.evidence {
        out.push_str(&format!(
            "\n## [{node}] template={} ({} rows)\n",
            result.template,
            result.row_count()
        ));
        if result.is_empty() {
            out.push_str("(no rows)\n");
            continue;
        }
        for (index, row) in result.rows.iter().enumerate() {
            out.push_str(&format!("[{node}#{index}] {}\n", render_row(row)));
        }
    }

    truncate_on_char_boundary(out, MAX_PAYLOAD_CHARS)
}

fn render_row(row: &Record) -> String {
    let fields: Vec<String> = row
        .iter()
        .map(|(key, value)| format!("{key}={}", render_value(value)))
        .collect();
    fields.join(" | ")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", parts.join(", "))
        }
        other => other.to_string(),
    }
}

fn truncate_on_char_boundary(s: String, max: usize) -> String {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// Reject findings whose citations point outside the run's own evidence.
/// A malformed citation means the analyst output cannot be trusted as
/// addressed — the same failure class as unparseable JSON.
pub fn validate_finding(
    intent: Intent,
    finding: &Finding,
    state: &WorkflowState,
) -> Result<(), FloorsightError> {
    for (index, claim) in finding.claims.iter().enumerate() {
        if claim.evidence.is_empty() {
            return Err(FloorsightError::UnparseableFinding {
                intent,
                reason: format!("claim {index} ({:?}) cites no evidence rows", claim.kind),
            });
        }
        for reference in &claim.evidence {
            let Some(result) = state.evidence_for(reference.node) else {
                return Err(FloorsightError::UnparseableFinding {
                    intent,
                    reason: format!(
                        "claim {index} cites node '{}' which is not in this run's plan",
                        reference.node
                    ),
                });
            };
            if reference.row >= result.row_count() {
                return Err(FloorsightError::UnparseableFinding {
                    intent,
                    reason: format!(
                        "claim {index} cites row {} of '{}' which has only {} rows",
                        reference.row,
                        reference.node,
                        result.row_count()
                    ),
                });
            }
        }
    }
    Ok(())
}

const LINE_STATUS_BRIEF: &str = r#"You are a production supervisor's assistant summarizing the state of every line on the floor.

## What to report
- Which lines are running, down, idle or blocked, and what each is building.
- Job progress: completed vs planned quantity, and the due date.
- Flag any job due within 24 hours that is under 80% complete as at risk (severity high if under 50%, medium otherwise).
- Lead with whatever needs a supervisor's attention first."#;

const CAPACITY_WIP_BRIEF: &str = r#"You are a capacity analyst for one production line and its current job.

## What to report
- The bottleneck: the operation where WIP has accumulated most relative to the others, or whose machine type is short of qualified workers.
- Staffing: compare qualified workers per machine type against the machines of that type; any type with fewer qualified workers than machines is a staffing gap (severity high if zero qualified workers, medium otherwise).
- WIP levels per operation, and whether the line can keep up with the job's remaining quantity.
- Concrete rebalancing actions: who could move where, based on the skills in evidence."#;

const WORK_INSTRUCTIONS_BRIEF: &str = r#"You write step-by-step operator instructions for the job currently running on one line.

## What to write
- One numbered step per operation, in backbone order: machine to use, standard minutes, parts consumed with per-unit quantities.
- Name qualified workers for each step's machine type where the evidence lists them.
- Call out steps whose parts are running low on stock so the operator checks with materials first.
- Keep each step to the point — an operator reads this standing at the machine."#;

const SUPPLIER_RISK_BRIEF: &str = r#"You are a materials analyst assessing supplier exposure for one job.

## What to report
- Per supplier: lead time in days and reliability score, worst exposure first.
- Reliability below 0.92 is a medium-severity risk; below 0.85 is high.
- Tie each risky supplier to the parts it supplies and the operations that consume them, so the reader sees what actually stops.
- Suggest mitigations only when the evidence supports them (alternate supplier present for the same part, stock on hand)."#;

const VSM_BRIEF: &str = r#"You draw a value-stream map of one line's operation flow.

## What to produce
- A mermaid `flowchart LR` in the `diagram` field: one node per operation in backbone order, labeled with the operation name, standard minutes and WIP; edges follow the flow.
- A short narrative naming where flow stalls (the largest WIP buildup between steps).
- One flow_step claim per operation so the map stays checkable against the rows."#;

/// Rules appended to every intent brief. They pin the claim wire format the
/// verifier depends on.
const CLAIM_RULES: &str = r#"## Claim rules
- Every number or named fact in your narrative must appear as a claim.
- `subject` is the entity's identifier exactly as written in the evidence (operation id, supplier name, line id, part name, worker id). Never paraphrase it.
- `metric` is the evidence column name the claim asserts (e.g. "lead_time_days", "wip_units"). Omit it for purely qualitative claims.
- `value` is the asserted value in plain decimal form ("25", "0.83"). Omit when no metric is asserted.
- `evidence` cites the rows the claim rests on by their `[node#index]` tags.
- Claim only what the evidence shows. If the rows are empty, say so — do not fill gaps from general knowledge."#;

fn system_prompt(intent: Intent) -> String {
    let brief = match intent {
        Intent::LineStatus => LINE_STATUS_BRIEF,
        Intent::CapacityWip => CAPACITY_WIP_BRIEF,
        Intent::WorkInstructions => WORK_INSTRUCTIONS_BRIEF,
        Intent::SupplierRisk => SUPPLIER_RISK_BRIEF,
        Intent::Vsm => VSM_BRIEF,
    };
    format!("{brief}\n\n{CLAIM_RULES}")
}

/// Production analyst: one Claude call per run, forced into the `Finding`
/// schema.
pub struct Analyst {
    claude: Claude,
}

impl Analyst {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }
}

#[async_trait]
impl EvidenceAnalyst for Analyst {
    async fn analyze(&self, intent: Intent, payload: &str) -> Result<Finding, FloorsightError> {
        self.claude
            .extract::<Finding>(system_prompt(intent), payload)
            .await
            .map_err(|e| FloorsightError::UnparseableFinding {
                intent,
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ScopeOrigin, ScopeSelection};
    use crate::testing::{claim, finding_with, record};
    use floorsight_common::{ClaimKind, FetchNodeId, QueryResult, TemplateId};
    use serde_json::json;

    fn scoped_state() -> WorkflowState {
        WorkflowState::new("supplier exposure for the chassis job")
            .with_intent(Intent::SupplierRisk)
            .with_plan(&[FetchNodeId::Backbone, FetchNodeId::SupplierRisk])
            .with_scope(ScopeSelection {
                line_id: Some("L1".into()),
                job_id: Some("J42".into()),
                origin: ScopeOrigin::Probed,
            })
            .with_evidence(
                FetchNodeId::Backbone,
                QueryResult::new(
                    TemplateId::OperationBackbone,
                    serde_json::Map::new(),
                    vec![record(&[
                        ("op_id", json!("OP1")),
                        ("op_name", json!("Laser Cut")),
                        ("wip_units", json!(12)),
                        ("machine_id", json!(null)),
                    ])],
                ),
            )
            .with_evidence(
                FetchNodeId::SupplierRisk,
                QueryResult::new(
                    TemplateId::SupplierExposure,
                    serde_json::Map::new(),
                    vec![
                        record(&[
                            ("supplier", json!("Apex Metals")),
                            ("lead_time_days", json!(25)),
                            ("reliability", json!(0.97)),
                            ("parts", json!(["Steel Sheet"])),
                        ]),
                        record(&[
                            ("supplier", json!("Borealis Wire")),
                            ("lead_time_days", json!(14)),
                            ("reliability", json!(0.83)),
                            ("parts", json!(["MIG Wire"])),
                        ]),
                    ],
                ),
            )
    }

    #[test]
    fn payload_tags_every_row_with_node_and_index() {
        let payload = evidence_payload(&scoped_state());
        assert!(payload.contains("# Goal"));
        assert!(payload.contains("line L1, job J42"));
        assert!(payload.contains("[backbone#0]"));
        assert!(payload.contains("[supplier_risk#0] "));
        assert!(payload.contains("[supplier_risk#1] "));
        assert!(payload.contains("supplier=Apex Metals"));
        assert!(payload.contains("lead_time_days=25"));
        assert!(payload.contains("parts=[MIG Wire]"));
        // Nulls render explicitly so the model does not hallucinate a value.
        assert!(payload.contains("machine_id=null"));
    }

    #[test]
    fn payload_marks_empty_results() {
        let state = WorkflowState::new("status").with_evidence(
            FetchNodeId::LineStatus,
            QueryResult::new(TemplateId::AllLinesStatus, serde_json::Map::new(), vec![]),
        );
        let payload = evidence_payload(&state);
        assert!(payload.contains("(no rows)"));
    }

    #[test]
    fn payload_is_deterministic_for_the_same_state() {
        let state = scoped_state();
        assert_eq!(evidence_payload(&state), evidence_payload(&state));
    }

    #[test]
    fn valid_citations_pass() {
        let state = scoped_state();
        let finding = finding_with(vec![claim(
            ClaimKind::LeadTime,
            "Apex Metals",
            Some("lead_time_days"),
            Some("25"),
            FetchNodeId::SupplierRisk,
            0,
        )]);
        validate_finding(Intent::SupplierRisk, &finding, &state).unwrap();
    }

    #[test]
    fn out_of_plan_citation_is_rejected() {
        let state = scoped_state();
        let finding = finding_with(vec![claim(
            ClaimKind::StaffingGap,
            "MIG Welder",
            None,
            None,
            FetchNodeId::Workers,
            0,
        )]);
        let err = validate_finding(Intent::SupplierRisk, &finding, &state).unwrap_err();
        match err {
            FloorsightError::UnparseableFinding { intent, reason } => {
                assert_eq!(intent, Intent::SupplierRisk);
                assert!(reason.contains("workers"), "reason: {reason}");
            }
            other => panic!("expected UnparseableFinding, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_row_citation_is_rejected() {
        let state = scoped_state();
        let finding = finding_with(vec![claim(
            ClaimKind::LeadTime,
            "Apex Metals",
            Some("lead_time_days"),
            Some("25"),
            FetchNodeId::SupplierRisk,
            7,
        )]);
        let err = validate_finding(Intent::SupplierRisk, &finding, &state).unwrap_err();
        assert!(err.to_string().contains("only 2 rows"));
    }

    #[test]
    fn claim_without_citations_is_rejected() {
        let state = scoped_state();
        let mut bad = claim(
            ClaimKind::Reliability,
            "Borealis Wire",
            Some("reliability"),
            Some("0.83"),
            FetchNodeId::SupplierRisk,
            1,
        );
        bad.evidence.clear();
        let err = validate_finding(Intent::SupplierRisk, &finding_with(vec![bad]), &state)
            .unwrap_err();
        assert!(err.to_string().contains("cites no evidence"));
    }

    #[test]
    fn every_intent_has_a_prompt_with_the_claim_rules() {
        for intent in Intent::ALL {
            let prompt = system_prompt(intent);
            assert!(prompt.contains("## Claim rules"), "{intent} prompt");
            assert!(prompt.len() > 300, "{intent} prompt too thin");
        }
    }
}
