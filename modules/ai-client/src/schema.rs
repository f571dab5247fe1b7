use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Types that can ride through the forced-tool structured output path.
///
/// Automatically implemented for any `JsonSchema + DeserializeOwned` type.
/// The generated schema is massaged into the shape tool-use responds best to:
/// 1. fully inlined (no `$ref` into `definitions`)
/// 2. `additionalProperties: false` on every object
/// 3. every property listed in `required`, optional ones included — absent
///    optionals come back as explicit nulls, which serde maps to `None`
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn tool_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        if let Some(definitions) = value.get("definitions").cloned() {
            inline_definitions(&mut value, &definitions);
        }
        close_object_schemas(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("definitions");
            map.remove("$schema");
        }
        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Replace `$ref` nodes with their definition bodies, and collapse the
/// single-element `allOf` wrappers schemars emits around referenced types.
fn inline_definitions(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("$ref").cloned() {
                if let Some(name) = path.strip_prefix("#/definitions/") {
                    if let Some(definition) = definitions.get(name) {
                        *value = definition.clone();
                        inline_definitions(value, definitions);
                        return;
                    }
                }
            }
            let wrapped = match map.get("allOf") {
                Some(Value::Array(items)) if items.len() == 1 => Some(items[0].clone()),
                _ => None,
            };
            if let Some(inner) = wrapped {
                *value = inner;
                inline_definitions(value, definitions);
                return;
            }
            for (_, nested) in map.iter_mut() {
                inline_definitions(nested, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                inline_definitions(item, definitions);
            }
        }
        _ => {}
    }
}

fn close_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(properties)) = map.get("properties") {
                    let all_keys: Vec<Value> = properties
                        .keys()
                        .map(|k| Value::String(k.clone()))
                        .collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }
            for (_, nested) in map.iter_mut() {
                close_object_schemas(nested);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                close_object_schemas(item);
            }
        }
        _ => {}
    }
}
