//! Deterministic claim verification.
//!
//! Every claim in a finding is checked against the exact rows the run
//! fetched — the same rows the analyst saw, by identity, not a re-query.
//! No model calls happen here: given one state, the verdicts are
//! reproducible. A contradiction never aborts anything; it becomes a
//! verdict that flags the answer.
//!
//! Matching policy:
//! - Subjects match any scalar column value or string-list element,
//!   trimmed, ASCII case-insensitive.
//! - Claims without a metric are qualitative: confirmed iff the subject
//!   appears in evidence at all.
//! - Metric claims compare against the metric column on the subject's rows.
//!   Rows lacking the column cannot support or contradict the claim; if no
//!   subject row carries it, the claim is unsupported.

use serde_json::Value;

use floorsight_common::{
    Claim, ClaimRef, EvidenceRef, Intent, Record, VerdictStatus, VerificationSummary,
    VerificationVerdict,
};

use crate::state::WorkflowState;

/// Absolute tolerance when comparing claimed figures to evidence values.
/// Covers decimal-rendering jitter on values near zero.
pub const ABS_TOLERANCE: f64 = 0.005;

/// Relative tolerance, scaled by the evidence value's magnitude. Covers
/// rounding on large figures (minutes, quantities).
pub const REL_TOLERANCE: f64 = 0.001;

fn within_tolerance(claimed: f64, actual: f64) -> bool {
    (claimed - actual).abs() <= ABS_TOLERANCE.max(REL_TOLERANCE * actual.abs())
}

/// Check every claim in every finding against the run's evidence.
pub fn verify(state: &WorkflowState) -> VerificationSummary {
    let mut verdicts = Vec::new();
    for (finding_index, finding) in state.findings.iter().enumerate() {
        for (claim_index, claim) in finding.claims.iter().enumerate() {
            let (status, evidence, note) = check_claim(claim, state);
            verdicts.push(VerificationVerdict {
                claim: ClaimRef {
                    finding: finding_index,
                    claim: claim_index,
                },
                status,
                evidence,
                note,
            });
        }
    }
    VerificationSummary::from_verdicts(verdicts, diagram_warnings(state))
}

fn check_claim(
    claim: &Claim,
    state: &WorkflowState,
) -> (VerdictStatus, Vec<EvidenceRef>, Option<String>) {
    let subject = claim.subject.trim();

    // Subject lookup runs over the whole evidence set in plan order, so a
    // claim is judged by everything the run saw, not just the rows it cited.
    let subject_rows: Vec<(EvidenceRef, &Record)> = state
        .evidence
        .iter()
        .flat_map(|(node, result)| {
            result
                .rows
                .iter()
                .enumerate()
                .map(move |(index, row)| (EvidenceRef::new(*node, index), row))
        })
        .filter(|(_, row)| row.values().any(|v| mentions_subject(v, subject)))
        .collect();

    if subject_rows.is_empty() {
        return (
            VerdictStatus::Unsupported,
            Vec::new(),
            Some(format!("no evidence row mentions '{subject}'")),
        );
    }

    let Some(metric) = claim.metric.as_deref() else {
        // Qualitative claim: the subject's presence is all there is to check.
        let refs = subject_rows.iter().map(|(r, _)| *r).collect();
        return (VerdictStatus::Confirmed, refs, None);
    };

    let metric_rows: Vec<(EvidenceRef, &Value)> = subject_rows
        .iter()
        .filter_map(|(r, row)| {
            row.get(metric)
                .filter(|v| !v.is_null())
                .map(|v| (*r, v))
        })
        .collect();

    if metric_rows.is_empty() {
        return (
            VerdictStatus::Unsupported,
            Vec::new(),
            Some(format!(
                "evidence rows for '{subject}' carry no '{metric}' value"
            )),
        );
    }

    let Some(claimed) = claim.value.as_deref().map(str::trim) else {
        // Metric named but no value asserted — presence of the column is
        // the whole claim.
        let refs = metric_rows.iter().map(|(r, _)| *r).collect();
        return (VerdictStatus::Confirmed, refs, None);
    };

    let matching: Vec<EvidenceRef> = metric_rows
        .iter()
        .filter(|(_, actual)| value_matches(claimed, actual))
        .map(|(r, _)| *r)
        .collect();

    if !matching.is_empty() {
        return (VerdictStatus::Confirmed, matching, None);
    }

    let (_, first_actual) = metric_rows[0];
    let disagreeing = metric_rows.iter().map(|(r, _)| *r).collect();
    (
        VerdictStatus::Contradicted,
        disagreeing,
        Some(format!(
            "evidence says {metric}={} for '{subject}', claim says {claimed}",
            render_actual(first_actual)
        )),
    )
}

fn mentions_subject(value: &Value, subject: &str) -> bool {
    match value {
        Value::String(s) => s.trim().eq_ignore_ascii_case(subject),
        Value::Array(items) => items
            .iter()
            .any(|item| item.as_str().is_some_and(|s| s.trim().eq_ignore_ascii_case(subject))),
        _ => false,
    }
}

/// Numeric comparison when both sides parse as numbers, case-insensitive
/// string equality otherwise.
fn value_matches(claimed: &str, actual: &Value) -> bool {
    if let (Ok(claimed_num), Some(actual_num)) = (claimed.parse::<f64>(), as_number(actual)) {
        return within_tolerance(claimed_num, actual_num);
    }
    match actual {
        Value::String(s) => s.trim().eq_ignore_ascii_case(claimed),
        Value::Bool(b) => claimed.eq_ignore_ascii_case(if *b { "true" } else { "false" }),
        Value::Array(items) => items
            .iter()
            .any(|item| item.as_str().is_some_and(|s| s.trim().eq_ignore_ascii_case(claimed))),
        _ => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn render_actual(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Light structural check on value-stream diagrams. Produces warnings, never
/// verdicts — diagram prose is not row-checkable the way claims are.
fn diagram_warnings(state: &WorkflowState) -> Vec<String> {
    if state.intent != Some(Intent::Vsm) {
        return Vec::new();
    }
    let mut warnings = Vec::new();
    for (index, finding) in state.findings.iter().enumerate() {
        match finding.diagram.as_deref().map(str::trim_start) {
            None | Some("") => {
                warnings.push(format!("finding {index}: value-stream answer has no diagram"));
            }
            Some(markup) => {
                if !markup.starts_with("flowchart") && !markup.starts_with("graph") {
                    warnings.push(format!(
                        "finding {index}: diagram does not look like mermaid flow markup"
                    ));
                }
            }
        }
    }
    warnings
}
