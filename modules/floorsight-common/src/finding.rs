use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::types::FetchNodeId;

/// How urgent a claim is, using the shop-floor triage scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// What kind of assertion a claim makes. Classification only — the verifier
/// treats all kinds the same way and matches on subject/metric/value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// An operation is the constraint limiting line throughput
    Bottleneck,
    /// A machine type lacks enough qualified workers
    StaffingGap,
    /// A job is unlikely to meet its due date
    DueDateRisk,
    /// WIP accumulated at an operation
    WipLevel,
    /// A supplier's lead time in days
    LeadTime,
    /// A supplier's reliability score
    Reliability,
    /// On-hand stock for a part
    PartStock,
    /// A production line's current state
    LineState,
    /// Completed vs planned quantity for a job
    Progress,
    /// A worker's machine or line assignment
    Assignment,
    /// One step in the value-stream flow
    FlowStep,
}

/// Pointer into the run's evidence: which fetch node produced the row, and the
/// row's index within that node's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceRef {
    /// Fetch node whose result contains the row
    pub node: FetchNodeId,
    /// Zero-based row index within that result
    pub row: usize,
}

impl EvidenceRef {
    pub fn new(node: FetchNodeId, row: usize) -> Self {
        Self { node, row }
    }
}

/// One verifiable assertion extracted from an analyst's summary.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Claim {
    /// What kind of assertion this is
    pub kind: ClaimKind,
    /// The entity the claim is about, exactly as it appears in the evidence
    /// (an operation id, supplier name, line id, part name or worker id) —
    /// never an invented identifier
    pub subject: String,
    /// The evidence column the claim asserts a value for (e.g. "lead_time_days",
    /// "wip_units"). Omit for purely qualitative claims.
    #[serde(default)]
    pub metric: Option<String>,
    /// The asserted value, as a string (numbers in plain decimal form).
    /// Omit when no metric is asserted.
    #[serde(default)]
    pub value: Option<String>,
    /// Triage severity, when the claim describes a problem
    #[serde(default)]
    pub severity: Option<Severity>,
    /// One human-readable sentence stating the claim
    pub statement: String,
    /// Rows that support the claim, cited by fetch node and row index
    pub evidence: Vec<EvidenceRef>,
}

/// Structured output of one analyst run: a short narrative for humans plus the
/// typed claims the verifier checks row by row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Finding {
    /// One-line summary of the situation
    pub headline: String,
    /// Markdown narrative expanding on the headline
    pub narrative: String,
    /// Every checkable assertion made in the narrative
    pub claims: Vec<Claim>,
    /// Concrete recommended actions, most urgent first
    pub actions: Vec<String>,
    /// Flow-diagram markup (mermaid), only for value-stream-map requests
    #[serde(default)]
    pub diagram: Option<String>,
}
