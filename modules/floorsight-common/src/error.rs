use thiserror::Error;

use crate::types::{FetchNodeId, Intent, TemplateId};

/// Run-level failure taxonomy. Contradictions are deliberately absent: a
/// contradicted claim is a reportable verdict that flows through to the answer,
/// not an error that aborts the run.
#[derive(Error, Debug)]
pub enum FloorsightError {
    #[error("Unroutable goal: could not map {goal:?} to a known intent")]
    UnroutableGoal { goal: String },

    #[error("Unknown intent '{token}' (valid: line_status, capacity_wip, work_instructions, supplier_risk, vsm)")]
    UnknownIntent { token: String },

    #[error("Scope resolution failed on template '{template}': {source}")]
    ScopeResolution {
        template: TemplateId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Fetch node '{node}' failed on template '{template}': {source}")]
    Fetch {
        node: FetchNodeId,
        template: TemplateId,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unparseable finding for intent '{intent}': {reason}")]
    UnparseableFinding { intent: Intent, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FloorsightError {
    /// The fetch node a failure is attributable to, if any. Lets callers and
    /// tests check abort attribution without matching the whole variant.
    pub fn fetch_node(&self) -> Option<FetchNodeId> {
        match self {
            FloorsightError::Fetch { node, .. } => Some(*node),
            _ => None,
        }
    }
}
