use neo4rs::{query, ConfigBuilder, Graph};
use tracing::debug;

use floorsight_common::{QueryResult, TemplateId};

use crate::rows::record_from_row;
use crate::templates::{template, TemplateArgs};

/// Thin wrapper around neo4rs::Graph providing connection setup and registry
/// template execution. All registry templates are read-only and idempotent, so
/// the pooled connection is safe to share across concurrent fetches.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given credentials and database.
    pub async fn connect(
        uri: &str,
        user: &str,
        password: &str,
        database: &str,
    ) -> Result<Self, neo4rs::Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .db(database)
            .fetch_size(500)
            .max_connections(10)
            .build()?;
        let graph = Graph::connect(config).await?;
        Ok(Self { graph })
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Execute one registry template and wrap the returned rows for audit.
    ///
    /// Unresolved scope values bind as empty strings, which match no node —
    /// the query then returns zero rows, which is a valid (empty) result, not
    /// a failure.
    pub async fn run_template(
        &self,
        id: TemplateId,
        args: &TemplateArgs,
    ) -> anyhow::Result<QueryResult> {
        let template = template(id);
        let mut q = query(template.cypher);
        let mut parameters = serde_json::Map::new();

        for name in template.params {
            match *name {
                "limit" => {
                    let limit = args.limit.unwrap_or(5);
                    q = q.param(name, limit);
                    parameters.insert(name.to_string(), limit.into());
                }
                "line_id" => {
                    let line_id = args.line_id.clone().unwrap_or_default();
                    q = q.param(name, line_id.clone());
                    parameters.insert(name.to_string(), line_id.into());
                }
                "job_id" => {
                    let job_id = args.job_id.clone().unwrap_or_default();
                    q = q.param(name, job_id.clone());
                    parameters.insert(name.to_string(), job_id.into());
                }
                other => anyhow::bail!("template '{id}' declares unbound parameter '{other}'"),
            }
        }

        let mut rows = Vec::new();
        let mut stream = self.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            rows.push(record_from_row(&row, template.columns)?);
        }

        debug!(template = %id, rows = rows.len(), "Template executed");
        Ok(QueryResult::new(id, parameters, rows))
    }
}
