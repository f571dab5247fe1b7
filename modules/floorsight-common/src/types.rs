use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FloorsightError;

/// The closed set of goal intents. Determined once per run, immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Current state of every production line
    LineStatus,
    /// Capacity, WIP and staffing pressure for one line/job
    CapacityWip,
    /// Step-by-step operator instructions for the running job
    WorkInstructions,
    /// Supplier lead-time and reliability exposure
    SupplierRisk,
    /// Value-stream map of the operation flow
    Vsm,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::LineStatus,
        Intent::CapacityWip,
        Intent::WorkInstructions,
        Intent::SupplierRisk,
        Intent::Vsm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::LineStatus => "line_status",
            Intent::CapacityWip => "capacity_wip",
            Intent::WorkInstructions => "work_instructions",
            Intent::SupplierRisk => "supplier_risk",
            Intent::Vsm => "vsm",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Intent {
    type Err = FloorsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "line_status" => Ok(Intent::LineStatus),
            "capacity_wip" => Ok(Intent::CapacityWip),
            "work_instructions" => Ok(Intent::WorkInstructions),
            "supplier_risk" => Ok(Intent::SupplierRisk),
            "vsm" => Ok(Intent::Vsm),
            other => Err(FloorsightError::UnknownIntent {
                token: other.to_string(),
            }),
        }
    }
}

/// Identity of one data-fetch node. Every evidence row in a run is addressed by
/// (fetch node, row index), so these stay stable across the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FetchNodeId {
    /// Ordered operation chain for the scoped line/job
    Backbone,
    /// Operators and supervisors staffing the line
    Workers,
    /// Skill coverage per machine type (staffing capacity)
    Capacity,
    /// Parts consumed by the scoped job, with their suppliers
    Parts,
    /// Per-operation context for writing work instructions
    Instructions,
    /// Per-supplier lead-time/reliability exposure
    SupplierRisk,
    /// Status board across all production lines
    LineStatus,
}

impl FetchNodeId {
    pub const ALL: [FetchNodeId; 7] = [
        FetchNodeId::Backbone,
        FetchNodeId::Workers,
        FetchNodeId::Capacity,
        FetchNodeId::Parts,
        FetchNodeId::Instructions,
        FetchNodeId::SupplierRisk,
        FetchNodeId::LineStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FetchNodeId::Backbone => "backbone",
            FetchNodeId::Workers => "workers",
            FetchNodeId::Capacity => "capacity",
            FetchNodeId::Parts => "parts",
            FetchNodeId::Instructions => "instructions",
            FetchNodeId::SupplierRisk => "supplier_risk",
            FetchNodeId::LineStatus => "line_status",
        }
    }

    /// The registry template this node executes. Exactly one per node, so a
    /// (node, row index) pair always addresses an unambiguous row.
    pub fn template(&self) -> TemplateId {
        match self {
            FetchNodeId::Backbone => TemplateId::OperationBackbone,
            FetchNodeId::Workers => TemplateId::LineWorkers,
            FetchNodeId::Capacity => TemplateId::SkillCoverage,
            FetchNodeId::Parts => TemplateId::PartsAndSuppliers,
            FetchNodeId::Instructions => TemplateId::InstructionContext,
            FetchNodeId::SupplierRisk => TemplateId::SupplierExposure,
            FetchNodeId::LineStatus => TemplateId::AllLinesStatus,
        }
    }
}

impl fmt::Display for FetchNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable keys of the Cypher template registry. The registry is fixed at compile
/// time; user text never reaches query construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    MostUrgentLines,
    OperationBackbone,
    LineWorkers,
    SkillCoverage,
    PartsAndSuppliers,
    InstructionContext,
    SupplierExposure,
    AllLinesStatus,
}

impl TemplateId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::MostUrgentLines => "most_urgent_lines",
            TemplateId::OperationBackbone => "operation_backbone",
            TemplateId::LineWorkers => "line_workers",
            TemplateId::SkillCoverage => "skill_coverage",
            TemplateId::PartsAndSuppliers => "parts_and_suppliers",
            TemplateId::InstructionContext => "instruction_context",
            TemplateId::SupplierExposure => "supplier_exposure",
            TemplateId::AllLinesStatus => "all_lines_status",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One returned row, flattened to column name -> JSON scalar or list of strings.
/// Keys are canonically ordered (serde_json map), so rendering is deterministic.
pub type Record = serde_json::Map<String, Value>;

/// Everything needed to audit one query after the fact: which template ran, with
/// which parameters, and exactly which rows came back. Created by a fetch node,
/// read-only afterward, owned by the state that collected it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub template: TemplateId,
    pub parameters: serde_json::Map<String, Value>,
    pub rows: Vec<Record>,
}

impl QueryResult {
    pub fn new(
        template: TemplateId,
        parameters: serde_json::Map<String, Value>,
        rows: Vec<Record>,
    ) -> Self {
        Self {
            template,
            parameters,
            rows,
        }
    }

    /// Empty results are valid — a zero here is "the query matched nothing",
    /// which is a different thing from a failed fetch.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
