use floorsight_common::VerdictStatus;

use crate::state::WorkflowState;

/// Stats from one workflow run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub fetch_nodes: u32,
    pub rows_fetched: u32,
    pub empty_results: u32,
    pub probe_rows: u32,
    pub findings: u32,
    pub claims_checked: u32,
    pub confirmed: u32,
    pub unsupported: u32,
    pub contradicted: u32,
    pub warnings: u32,
    pub elapsed_ms: u128,
}

impl RunStats {
    /// Derive run metrics from a finished (or aborted) state.
    pub fn collect(state: &WorkflowState, elapsed_ms: u128) -> Self {
        let mut stats = Self {
            fetch_nodes: state.evidence.len() as u32,
            rows_fetched: state.total_rows() as u32,
            empty_results: state.empty_results() as u32,
            probe_rows: state
                .scope_probe
                .as_ref()
                .map(|p| p.row_count() as u32)
                .unwrap_or(0),
            findings: state.findings.len() as u32,
            elapsed_ms,
            ..Self::default()
        };
        if let Some(verification) = &state.verification {
            stats.claims_checked = verification.verdicts.len() as u32;
            stats.confirmed = verification.count(VerdictStatus::Confirmed) as u32;
            stats.unsupported = verification.count(VerdictStatus::Unsupported) as u32;
            stats.contradicted = verification.count(VerdictStatus::Contradicted) as u32;
            stats.warnings = verification.warnings.len() as u32;
        }
        stats
    }
}

impl std::fmt::Display for RunStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Floorsight Run Complete ===")?;
        writeln!(f, "Fetch nodes run:  {}", self.fetch_nodes)?;
        writeln!(f, "Rows fetched:     {}", self.rows_fetched)?;
        writeln!(f, "Empty results:    {}", self.empty_results)?;
        writeln!(f, "Probe rows:       {}", self.probe_rows)?;
        writeln!(f, "Findings:         {}", self.findings)?;
        writeln!(f, "Claims checked:   {}", self.claims_checked)?;
        writeln!(f, "  Confirmed:    {}", self.confirmed)?;
        writeln!(f, "  Unsupported:  {}", self.unsupported)?;
        writeln!(f, "  Contradicted: {}", self.contradicted)?;
        if self.warnings > 0 {
            writeln!(f, "Warnings:         {}", self.warnings)?;
        }
        writeln!(f, "Elapsed:          {} ms", self.elapsed_ms)
    }
}
