//! The fixed Cypher template registry.
//!
//! Every query the system can run lives here, keyed by [`TemplateId`]. Templates
//! bind named parameters only — user text never reaches query construction.
//! Each template also declares its column spec, which drives typed row
//! extraction and keeps what analysts see identical to what the verifier sees.

use floorsight_common::TemplateId;

/// Scope values a template may bind. Missing values bind as empty strings
/// (match nothing); a missing limit defaults to 5.
#[derive(Debug, Clone, Default)]
pub struct TemplateArgs {
    pub line_id: Option<String>,
    pub job_id: Option<String>,
    pub limit: Option<i64>,
}

impl TemplateArgs {
    pub fn for_scope(line_id: Option<String>, job_id: Option<String>) -> Self {
        Self {
            line_id,
            job_id,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Text,
    Integer,
    Float,
    Bool,
    TextList,
}

pub(crate) struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

pub struct Template {
    pub id: TemplateId,
    pub cypher: &'static str,
    pub params: &'static [&'static str],
    pub(crate) columns: &'static [Column],
}

/// Registry lookup. Total over the closed template set.
pub fn template(id: TemplateId) -> &'static Template {
    match id {
        TemplateId::MostUrgentLines => &MOST_URGENT_LINES,
        TemplateId::OperationBackbone => &OPERATION_BACKBONE,
        TemplateId::LineWorkers => &LINE_WORKERS,
        TemplateId::SkillCoverage => &SKILL_COVERAGE,
        TemplateId::PartsAndSuppliers => &PARTS_AND_SUPPLIERS,
        TemplateId::InstructionContext => &INSTRUCTION_CONTEXT,
        TemplateId::SupplierExposure => &SUPPLIER_EXPOSURE,
        TemplateId::AllLinesStatus => &ALL_LINES_STATUS,
    }
}

use ColumnKind::{Bool, Float, Integer, Text, TextList};

/// Scope probe: lines ranked by their current job's due date.
static MOST_URGENT_LINES: Template = Template {
    id: TemplateId::MostUrgentLines,
    cypher: r#"
MATCH (pl:ProductionLine)-[:CURRENT_JOB]->(j:Job)
OPTIONAL MATCH (j)-[:FOR_PRODUCT]->(p:Product)
RETURN pl.id AS line_id, pl.name AS line_name, j.id AS job_id,
       p.name AS product, toString(j.due_dt) AS due_dt,
       j.qty_planned AS qty_planned, j.qty_completed AS qty_completed
ORDER BY j.due_dt ASC
LIMIT $limit
"#,
    params: &["limit"],
    columns: &[
        col("line_id", Text),
        col("line_name", Text),
        col("job_id", Text),
        col("product", Text),
        col("due_dt", Text),
        col("qty_planned", Integer),
        col("qty_completed", Integer),
    ],
};

/// The ordered operation chain for the scoped line/job, with each operation's
/// machine. Chains are capped at 20 hops; real lines here are far shorter.
static OPERATION_BACKBONE: Template = Template {
    id: TemplateId::OperationBackbone,
    cypher: r#"
MATCH (pl:ProductionLine {id: $line_id})-[:CURRENT_JOB]->(:Job {id: $job_id})
MATCH (pl)-[:HAS_FIRST_OPERATION]->(first:Operation)
MATCH (first)-[:NEXT_OPERATION*0..20]->(op:Operation)
WITH DISTINCT op
OPTIONAL MATCH (op)-[:RUNS_ON]->(m:Machine)-[:OF_TYPE]->(mt:MachineType)
RETURN op.id AS op_id, op.name AS op_name, op.seq AS seq, op.status AS status,
       op.wip_units AS wip_units, op.std_minutes AS std_minutes,
       m.id AS machine_id, m.name AS machine_name, mt.name AS machine_type
ORDER BY seq
"#,
    params: &["line_id", "job_id"],
    columns: &[
        col("op_id", Text),
        col("op_name", Text),
        col("seq", Integer),
        col("status", Text),
        col("wip_units", Integer),
        col("std_minutes", Integer),
        col("machine_id", Text),
        col("machine_name", Text),
        col("machine_type", Text),
    ],
};

/// Operators assigned to the line's machines plus the line's supervisors, as
/// one result so a (workers, row) reference is unambiguous. Supervisor rows
/// carry a null machine and an empty skill list.
static LINE_WORKERS: Template = Template {
    id: TemplateId::LineWorkers,
    cypher: r#"
CALL {
    MATCH (w:Worker)-[:ASSIGNED_TO]->(m:Machine)-[:ON_LINE]->(:ProductionLine {id: $line_id})
    OPTIONAL MATCH (w)-[:HAS_SKILL]->(s:Skill)
    WITH w, m, collect(DISTINCT s.name) AS skills
    RETURN w.id AS worker_id, w.name AS worker_name, 'operator' AS role,
           m.name AS machine, w.shift AS shift, skills
    UNION ALL
    MATCH (w:Worker)-[:SUPERVISES]->(:ProductionLine {id: $line_id})
    RETURN w.id AS worker_id, w.name AS worker_name, 'supervisor' AS role,
           null AS machine, w.shift AS shift, [] AS skills
}
RETURN worker_id, worker_name, role, machine, shift, skills
ORDER BY role, worker_name
"#,
    params: &["line_id"],
    columns: &[
        col("worker_id", Text),
        col("worker_name", Text),
        col("role", Text),
        col("machine", Text),
        col("shift", Text),
        col("skills", TextList),
    ],
};

/// Qualified-operator coverage per machine type on the line. A machine type is
/// understaffed when fewer distinct qualified workers than machines exist.
static SKILL_COVERAGE: Template = Template {
    id: TemplateId::SkillCoverage,
    cypher: r#"
MATCH (m:Machine)-[:ON_LINE]->(:ProductionLine {id: $line_id})
MATCH (m)-[:OF_TYPE]->(mt:MachineType)
OPTIONAL MATCH (w:Worker)-[:ASSIGNED_TO]->(m)
    WHERE (w)-[:HAS_SKILL]->(:Skill {name: mt.required_skill})
WITH mt.name AS machine_type, mt.required_skill AS required_skill,
     count(DISTINCT m) AS machines, count(DISTINCT w) AS qualified_workers
RETURN machine_type, required_skill, machines, qualified_workers,
       qualified_workers < machines AS understaffed
ORDER BY machine_type
"#,
    params: &["line_id"],
    columns: &[
        col("machine_type", Text),
        col("required_skill", Text),
        col("machines", Integer),
        col("qualified_workers", Integer),
        col("understaffed", Bool),
    ],
};

/// Parts consumed along the scoped job's operation chain, one row per
/// (part, supplier) pair.
static PARTS_AND_SUPPLIERS: Template = Template {
    id: TemplateId::PartsAndSuppliers,
    cypher: r#"
MATCH (pl:ProductionLine {id: $line_id})-[:CURRENT_JOB]->(:Job {id: $job_id})
MATCH (pl)-[:HAS_FIRST_OPERATION]->(first:Operation)
MATCH (first)-[:NEXT_OPERATION*0..20]->(op:Operation)
MATCH (op)-[c:CONSUMES]->(part:Part)
OPTIONAL MATCH (sup:Supplier)-[s:SUPPLIES]->(part)
RETURN DISTINCT part.id AS part_id, part.name AS part_name, op.id AS op_id,
       c.qty_per_unit AS qty_per_unit, part.stock_units AS stock_units,
       sup.name AS supplier, s.lead_time_days AS lead_time_days,
       toFloat(s.reliability) AS reliability
ORDER BY part_id, supplier
"#,
    params: &["line_id", "job_id"],
    columns: &[
        col("part_id", Text),
        col("part_name", Text),
        col("op_id", Text),
        col("qty_per_unit", Integer),
        col("stock_units", Integer),
        col("supplier", Text),
        col("lead_time_days", Integer),
        col("reliability", Float),
    ],
};

/// Everything an instruction writer needs per operation: machine, machine-type
/// safety class, setup notes, and the parts the step consumes.
static INSTRUCTION_CONTEXT: Template = Template {
    id: TemplateId::InstructionContext,
    cypher: r#"
MATCH (pl:ProductionLine {id: $line_id})-[:CURRENT_JOB]->(:Job {id: $job_id})
MATCH (pl)-[:HAS_FIRST_OPERATION]->(first:Operation)
MATCH (first)-[:NEXT_OPERATION*0..20]->(op:Operation)
WITH DISTINCT op
OPTIONAL MATCH (op)-[:RUNS_ON]->(m:Machine)-[:OF_TYPE]->(mt:MachineType)
OPTIONAL MATCH (op)-[c:CONSUMES]->(part:Part)
WITH op, m, mt,
     collect(part.name + ' x' + toString(c.qty_per_unit)) AS parts_used
RETURN op.id AS op_id, op.name AS op_name, op.seq AS seq, op.status AS status,
       m.name AS machine, mt.name AS machine_type, mt.safety_class AS safety_class,
       op.setup_notes AS setup_notes, parts_used
ORDER BY seq
"#,
    params: &["line_id", "job_id"],
    columns: &[
        col("op_id", Text),
        col("op_name", Text),
        col("seq", Integer),
        col("status", Text),
        col("machine", Text),
        col("machine_type", Text),
        col("safety_class", Text),
        col("setup_notes", Text),
        col("parts_used", TextList),
    ],
};

/// Per-supplier exposure for the scoped job: worst lead time and reliability
/// across everything they supply into the chain, ranked worst-first.
static SUPPLIER_EXPOSURE: Template = Template {
    id: TemplateId::SupplierExposure,
    cypher: r#"
MATCH (pl:ProductionLine {id: $line_id})-[:CURRENT_JOB]->(j:Job {id: $job_id})
MATCH (pl)-[:HAS_FIRST_OPERATION]->(first:Operation)
MATCH (first)-[:NEXT_OPERATION*0..20]->(op:Operation)
MATCH (op)-[:CONSUMES]->(part:Part)<-[s:SUPPLIES]-(sup:Supplier)
WITH j, sup, collect(DISTINCT part.name) AS parts,
     max(s.lead_time_days) AS max_lead_time_days,
     min(toFloat(s.reliability)) AS min_reliability
RETURN sup.id AS supplier_id, sup.name AS supplier, sup.country AS country,
       parts, max_lead_time_days, min_reliability, toString(j.due_dt) AS job_due_dt
ORDER BY min_reliability, supplier
"#,
    params: &["line_id", "job_id"],
    columns: &[
        col("supplier_id", Text),
        col("supplier", Text),
        col("country", Text),
        col("parts", TextList),
        col("max_lead_time_days", Integer),
        col("min_reliability", Float),
        col("job_due_dt", Text),
    ],
};

/// The status board: every line with its current job, product, progress and
/// whatever operations are running right now.
static ALL_LINES_STATUS: Template = Template {
    id: TemplateId::AllLinesStatus,
    cypher: r#"
MATCH (pl:ProductionLine)
OPTIONAL MATCH (pl)-[:CURRENT_JOB]->(j:Job)
OPTIONAL MATCH (j)-[:FOR_PRODUCT]->(p:Product)
OPTIONAL MATCH (pl)-[:HAS_FIRST_OPERATION]->(:Operation)-[:NEXT_OPERATION*0..20]->(running:Operation {status: 'RUNNING'})
WITH pl, j, p, collect(DISTINCT running.name) AS running_ops
RETURN pl.id AS line_id, pl.name AS line_name, pl.status AS line_status,
       j.id AS job_id, j.status AS job_status, p.name AS product,
       j.qty_planned AS qty_planned, j.qty_completed AS qty_completed,
       toString(j.due_dt) AS due_dt, running_ops
ORDER BY line_id
"#,
    params: &[],
    columns: &[
        col("line_id", Text),
        col("line_name", Text),
        col("line_status", Text),
        col("job_id", Text),
        col("job_status", Text),
        col("product", Text),
        col("qty_planned", Integer),
        col("qty_completed", Integer),
        col("due_dt", Text),
        col("running_ops", TextList),
    ],
};
