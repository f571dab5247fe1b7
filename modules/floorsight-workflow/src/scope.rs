//! Intent → fetch plan, and scope resolution.
//!
//! The plan table is static: each intent maps to a fixed, ordered list of
//! fetch nodes, and the match is exhaustive over the intent enum, so adding
//! an intent without a plan is a compile error. Scope resolution decides
//! which line/job a scoped run is about — pinned by the caller, or picked by
//! the urgency probe.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use floorsight_common::{FetchNodeId, FloorsightError, Intent, QueryResult, Record};

use crate::traits::FactFetcher;

/// How many probe rows to pull when picking a line by urgency.
pub const SCOPE_PROBE_LIMIT: i64 = 5;

/// The fetch nodes a run executes for its intent, in plan order. Evidence is
/// later collected in exactly this order, so row references stay stable.
pub fn plan(intent: Intent) -> &'static [FetchNodeId] {
    match intent {
        Intent::LineStatus => &[FetchNodeId::LineStatus],
        Intent::CapacityWip => &[
            FetchNodeId::Backbone,
            FetchNodeId::Workers,
            FetchNodeId::Capacity,
        ],
        Intent::WorkInstructions => &[
            FetchNodeId::Backbone,
            FetchNodeId::Parts,
            FetchNodeId::Workers,
            FetchNodeId::Instructions,
        ],
        Intent::SupplierRisk => &[
            FetchNodeId::Backbone,
            FetchNodeId::Parts,
            FetchNodeId::SupplierRisk,
        ],
        Intent::Vsm => &[FetchNodeId::Backbone],
    }
}

/// Whether the intent is about one specific line/job (and so needs a scope)
/// or spans the whole floor.
pub fn needs_scope(intent: Intent) -> bool {
    !matches!(intent, Intent::LineStatus)
}

/// Where the run's scope came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeOrigin {
    /// Caller pinned both line and job
    Pinned,
    /// The urgency probe picked the line/job
    Probed,
    /// Probe found nothing usable; scoped queries will match no rows
    Unresolved,
    /// The intent spans the whole floor, no scope consulted
    NotRequired,
}

/// The line/job a scoped run is about. Unresolved values stay `None` and bind
/// as empty strings downstream, which match nothing — an honest empty answer,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSelection {
    pub line_id: Option<String>,
    pub job_id: Option<String>,
    pub origin: ScopeOrigin,
}

impl Default for ScopeSelection {
    fn default() -> Self {
        Self {
            line_id: None,
            job_id: None,
            origin: ScopeOrigin::NotRequired,
        }
    }
}

impl ScopeSelection {
    /// Short human label for logs and answer headers.
    pub fn label(&self) -> String {
        match (&self.line_id, &self.job_id) {
            (Some(line), Some(job)) => format!("line {line}, job {job}"),
            (Some(line), None) => format!("line {line}"),
            (None, Some(job)) => format!("job {job}"),
            (None, None) => match self.origin {
                ScopeOrigin::NotRequired => "all lines".to_string(),
                _ => "unresolved".to_string(),
            },
        }
    }
}

/// Outcome of scope resolution: the selection itself plus the probe result
/// (kept for audit, never indexed as claim evidence).
#[derive(Debug, Clone)]
pub struct ResolvedScope {
    pub selection: ScopeSelection,
    pub probe: Option<QueryResult>,
}

/// Resolve the run's scope. Caller pins win outright; otherwise the urgency
/// probe runs and the first matching row decides. A probe that yields nothing
/// usable leaves the scope unresolved rather than failing the run.
pub async fn resolve(
    fetcher: &dyn FactFetcher,
    intent: Intent,
    pinned_line: Option<String>,
    pinned_job: Option<String>,
) -> Result<ResolvedScope, FloorsightError> {
    if !needs_scope(intent) {
        return Ok(ResolvedScope {
            selection: ScopeSelection::default(),
            probe: None,
        });
    }

    if pinned_line.is_some() && pinned_job.is_some() {
        return Ok(ResolvedScope {
            selection: ScopeSelection {
                line_id: pinned_line,
                job_id: pinned_job,
                origin: ScopeOrigin::Pinned,
            },
            probe: None,
        });
    }

    let probe = fetcher.urgent_lines(SCOPE_PROBE_LIMIT).await?;

    // A partial pin narrows the probe to its row; otherwise most urgent wins.
    let row = probe.rows.iter().find(|r| match (&pinned_line, &pinned_job) {
        (Some(line), _) => text_column(r, "line_id").as_deref() == Some(line.as_str()),
        (None, Some(job)) => text_column(r, "job_id").as_deref() == Some(job.as_str()),
        (None, None) => true,
    });

    let selection = match row {
        Some(row) => ScopeSelection {
            line_id: pinned_line.or_else(|| text_column(row, "line_id")),
            job_id: pinned_job.or_else(|| text_column(row, "job_id")),
            origin: ScopeOrigin::Probed,
        },
        None => ScopeSelection {
            line_id: pinned_line,
            job_id: pinned_job,
            origin: ScopeOrigin::Unresolved,
        },
    };

    Ok(ResolvedScope {
        selection,
        probe: Some(probe),
    })
}

fn text_column(row: &Record, column: &str) -> Option<String> {
    row.get(column)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{record, MockFetcher};
    use serde_json::json;

    #[test]
    fn plan_table_matches_the_intent_contract() {
        assert_eq!(plan(Intent::LineStatus), &[FetchNodeId::LineStatus]);
        assert_eq!(
            plan(Intent::CapacityWip),
            &[
                FetchNodeId::Backbone,
                FetchNodeId::Workers,
                FetchNodeId::Capacity
            ]
        );
        assert_eq!(
            plan(Intent::WorkInstructions),
            &[
                FetchNodeId::Backbone,
                FetchNodeId::Parts,
                FetchNodeId::Workers,
                FetchNodeId::Instructions
            ]
        );
        assert_eq!(
            plan(Intent::SupplierRisk),
            &[
                FetchNodeId::Backbone,
                FetchNodeId::Parts,
                FetchNodeId::SupplierRisk
            ]
        );
        assert_eq!(plan(Intent::Vsm), &[FetchNodeId::Backbone]);
    }

    #[test]
    fn every_plan_is_nonempty_and_duplicate_free() {
        for intent in Intent::ALL {
            let nodes = plan(intent);
            assert!(!nodes.is_empty(), "{intent} has an empty plan");
            let mut seen = nodes.to_vec();
            seen.sort_by_key(|n| n.as_str());
            seen.dedup();
            assert_eq!(seen.len(), nodes.len(), "{intent} plan repeats a node");
        }
    }

    #[test]
    fn only_line_status_skips_scope() {
        for intent in Intent::ALL {
            assert_eq!(needs_scope(intent), intent != Intent::LineStatus);
        }
    }

    fn probe_row(line: &str, job: &str) -> Record {
        record(&[
            ("line_id", json!(line)),
            ("line_name", json!(format!("Line {line}"))),
            ("job_id", json!(job)),
            ("product", json!("Box Chassis")),
            ("due_dt", json!("2025-03-02T06:00:00Z")),
            ("qty_planned", json!(400)),
            ("qty_completed", json!(120)),
        ])
    }

    #[tokio::test]
    async fn most_urgent_probe_row_wins() {
        let fetcher = MockFetcher::new().on_probe(vec![
            probe_row("L2", "J7"),
            probe_row("L1", "J3"),
        ]);
        let resolved = resolve(&fetcher, Intent::CapacityWip, None, None)
            .await
            .unwrap();
        assert_eq!(resolved.selection.line_id.as_deref(), Some("L2"));
        assert_eq!(resolved.selection.job_id.as_deref(), Some("J7"));
        assert_eq!(resolved.selection.origin, ScopeOrigin::Probed);
        assert!(resolved.probe.is_some());
    }

    #[tokio::test]
    async fn pinned_line_narrows_the_probe() {
        let fetcher = MockFetcher::new().on_probe(vec![
            probe_row("L2", "J7"),
            probe_row("L1", "J3"),
        ]);
        let resolved = resolve(&fetcher, Intent::SupplierRisk, Some("L1".into()), None)
            .await
            .unwrap();
        assert_eq!(resolved.selection.line_id.as_deref(), Some("L1"));
        assert_eq!(resolved.selection.job_id.as_deref(), Some("J3"));
        assert_eq!(resolved.selection.origin, ScopeOrigin::Probed);
    }

    #[tokio::test]
    async fn fully_pinned_scope_skips_the_probe() {
        let fetcher = MockFetcher::new();
        let resolved = resolve(
            &fetcher,
            Intent::Vsm,
            Some("L9".into()),
            Some("J99".into()),
        )
        .await
        .unwrap();
        assert_eq!(resolved.selection.origin, ScopeOrigin::Pinned);
        assert!(resolved.probe.is_none());
        assert_eq!(fetcher.probe_calls(), 0);
    }

    #[tokio::test]
    async fn empty_probe_leaves_scope_unresolved() {
        let fetcher = MockFetcher::new();
        let resolved = resolve(&fetcher, Intent::CapacityWip, None, None)
            .await
            .unwrap();
        assert_eq!(resolved.selection.origin, ScopeOrigin::Unresolved);
        assert!(resolved.selection.line_id.is_none());
        assert!(resolved.selection.job_id.is_none());
        // The empty probe is still recorded for audit.
        assert!(resolved.probe.unwrap().is_empty());
    }

    #[tokio::test]
    async fn line_status_never_consults_scope() {
        let fetcher = MockFetcher::new();
        let resolved = resolve(&fetcher, Intent::LineStatus, None, None)
            .await
            .unwrap();
        assert_eq!(resolved.selection.origin, ScopeOrigin::NotRequired);
        assert_eq!(fetcher.probe_calls(), 0);
        assert_eq!(resolved.selection.label(), "all lines");
    }
}
