use neo4rs::Row;
use serde_json::Value;

use floorsight_common::Record;

use crate::templates::{Column, ColumnKind};

/// Extract one row into a flat JSON record using the template's column spec.
///
/// Nulls stay as JSON nulls; a column that fails typed extraction is a template
/// bug and surfaces as an error rather than a silently-dropped value, because
/// analysts and the verifier must see exactly what the database returned.
pub(crate) fn record_from_row(row: &Row, columns: &[Column]) -> anyhow::Result<Record> {
    let mut record = Record::new();
    for column in columns {
        let value = match column.kind {
            ColumnKind::Text => json_from(get::<String>(row, column.name)?),
            ColumnKind::Integer => json_from(get::<i64>(row, column.name)?),
            ColumnKind::Float => json_from(get::<f64>(row, column.name)?),
            ColumnKind::Bool => json_from(get::<bool>(row, column.name)?),
            ColumnKind::TextList => json_from(get::<Vec<String>>(row, column.name)?),
        };
        record.insert(column.name.to_string(), value);
    }
    Ok(record)
}

fn get<'a, T: serde::Deserialize<'a>>(row: &'a Row, name: &str) -> anyhow::Result<Option<T>> {
    row.get::<Option<T>>(name)
        .map_err(|e| anyhow::anyhow!("column '{name}': {e}"))
}

fn json_from<T: Into<Value>>(value: Option<T>) -> Value {
    match value {
        Some(v) => v.into(),
        None => Value::Null,
    }
}
