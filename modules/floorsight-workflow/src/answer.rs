//! Answer rendering: findings + verdicts → operator-facing markdown.
//!
//! Contradictions are surfaced, never suppressed: a flagged answer says so
//! in its header and lists every contradicted claim with what the evidence
//! actually says.

use chrono::Utc;

use floorsight_common::{
    Answer, EvidenceRef, VerdictStatus, VerificationStatus, VerificationSummary,
};

use crate::state::WorkflowState;

pub fn render_answer(state: &WorkflowState) -> Answer {
    let verification = state
        .verification
        .clone()
        .unwrap_or_else(|| VerificationSummary::from_verdicts(Vec::new(), Vec::new()));

    let mut text = String::new();

    match state.findings.first() {
        Some(finding) => {
            text.push_str(&format!("# {}\n", finding.headline.trim()));
        }
        None => {
            text.push_str("# No findings\n");
        }
    }

    let mut header_parts = Vec::new();
    if let Some(intent) = state.intent {
        header_parts.push(format!("intent: {intent}"));
    }
    if let Some(scope) = &state.scope {
        header_parts.push(format!("scope: {}", scope.label()));
    }
    header_parts.push(verification.status.to_string());
    text.push_str(&format!("_{}_\n", header_parts.join(" · ")));

    if verification.status == VerificationStatus::Flagged {
        let count = verification.count(VerdictStatus::Contradicted);
        text.push_str(&format!(
            "\n**Flagged: {count} claim{} contradicted by the fetched evidence — details under Verification.**\n",
            if count == 1 { " is" } else { "s are" }
        ));
    }

    let mut diagram = None;
    for finding in &state.findings {
        text.push('\n');
        text.push_str(finding.narrative.trim());
        text.push('\n');

        if !finding.actions.is_empty() {
            text.push_str("\n## Recommended actions\n");
            for (index, action) in finding.actions.iter().enumerate() {
                text.push_str(&format!("{}. {}\n", index + 1, action.trim()));
            }
        }

        if let Some(markup) = &finding.diagram {
            text.push_str("\n## Flow\n```mermaid\n");
            text.push_str(markup.trim());
            text.push_str("\n```\n");
            if diagram.is_none() {
                diagram = Some(markup.clone());
            }
        }
    }

    text.push_str(&render_verification(state, &verification));

    Answer {
        text,
        diagram,
        verification,
        generated_at: Utc::now(),
    }
}

fn render_verification(state: &WorkflowState, verification: &VerificationSummary) -> String {
    let mut out = String::from("\n## Verification\n");

    if verification.verdicts.is_empty() {
        out.push_str("No checkable claims were made.\n");
    } else {
        out.push_str(&format!(
            "{} claims: {} confirmed, {} unsupported, {} contradicted.\n",
            verification.verdicts.len(),
            verification.count(VerdictStatus::Confirmed),
            verification.count(VerdictStatus::Unsupported),
            verification.count(VerdictStatus::Contradicted),
        ));
    }

    for verdict in &verification.verdicts {
        if verdict.status == VerdictStatus::Confirmed {
            continue;
        }
        let statement = state
            .findings
            .get(verdict.claim.finding)
            .and_then(|f| f.claims.get(verdict.claim.claim))
            .map(|c| c.statement.as_str())
            .unwrap_or("(statement unavailable)");
        out.push_str(&format!(
            "- {}: \"{}\"{}{}\n",
            verdict.status,
            statement,
            verdict
                .note
                .as_deref()
                .map(|n| format!(" — {n}"))
                .unwrap_or_default(),
            render_refs(&verdict.evidence),
        ));
    }

    for warning in &verification.warnings {
        out.push_str(&format!("- warning: {warning}\n"));
    }

    out
}

fn render_refs(refs: &[EvidenceRef]) -> String {
    if refs.is_empty() {
        return String::new();
    }
    let tags: Vec<String> = refs
        .iter()
        .map(|r| format!("[{}#{}]", r.node, r.row))
        .collect();
    format!(" {}", tags.join(" "))
}
