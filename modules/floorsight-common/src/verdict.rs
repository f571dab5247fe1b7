use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::finding::EvidenceRef;

/// Outcome of checking one claim against the run's evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    /// At least one evidence row carries the claimed values
    Confirmed,
    /// No evidence row references the claimed entity (or carries the metric)
    Unsupported,
    /// Evidence exists for the entity but the values disagree
    Contradicted,
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerdictStatus::Confirmed => "confirmed",
            VerdictStatus::Unsupported => "unsupported",
            VerdictStatus::Contradicted => "contradicted",
        };
        write!(f, "{s}")
    }
}

/// Position of a claim within the run's findings sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimRef {
    pub finding: usize,
    pub claim: usize,
}

/// The verifier's judgement on one claim. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub claim: ClaimRef,
    pub status: VerdictStatus,
    /// Rows that decided the verdict: the matching rows for a confirmation,
    /// the disagreeing rows for a contradiction, empty when unsupported.
    pub evidence: Vec<EvidenceRef>,
    /// Short operator-facing note, e.g. what the evidence actually says
    #[serde(default)]
    pub note: Option<String>,
}

/// Overall confidence label for an answer, derived from its verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Every claim confirmed
    Verified,
    /// No contradictions, but some claims could not be supported
    Partial,
    /// At least one claim is contradicted by the evidence
    Flagged,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Partial => "partially verified",
            VerificationStatus::Flagged => "flagged",
        };
        write!(f, "{s}")
    }
}

/// Everything the caller needs to judge an answer: per-claim verdicts, the
/// derived status, and any non-verdict warnings (e.g. a malformed diagram).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub status: VerificationStatus,
    pub verdicts: Vec<VerificationVerdict>,
    pub warnings: Vec<String>,
}

impl VerificationSummary {
    /// Derive the status from the verdicts. A contradiction always flags the
    /// answer; warnings are reported but do not change the status.
    pub fn from_verdicts(verdicts: Vec<VerificationVerdict>, warnings: Vec<String>) -> Self {
        let any_contradicted = verdicts
            .iter()
            .any(|v| v.status == VerdictStatus::Contradicted);
        let any_unsupported = verdicts
            .iter()
            .any(|v| v.status == VerdictStatus::Unsupported);
        let status = if any_contradicted {
            VerificationStatus::Flagged
        } else if any_unsupported {
            VerificationStatus::Partial
        } else {
            VerificationStatus::Verified
        };
        Self {
            status,
            verdicts,
            warnings,
        }
    }

    pub fn count(&self, status: VerdictStatus) -> usize {
        self.verdicts.iter().filter(|v| v.status == status).count()
    }

    pub fn contradictions(&self) -> impl Iterator<Item = &VerificationVerdict> {
        self.verdicts
            .iter()
            .filter(|v| v.status == VerdictStatus::Contradicted)
    }
}

/// The final product of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Rendered answer text (markdown)
    pub text: String,
    /// Flow-diagram markup, present only for value-stream-map runs
    pub diagram: Option<String>,
    pub verification: VerificationSummary,
    pub generated_at: DateTime<Utc>,
}
