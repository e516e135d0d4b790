//! YAML spec parser
//!
//! Uses serde_yaml and converts the result into the same `serde_json::Value`
//! tree the JSON parser yields. Mapping keys are stringified, which matters
//! for OpenAPI `responses` blocks where status codes are written as bare
//! integers (`200:`). Merge keys (`<<: *anchor`) are applied before the
//! conversion.

use super::SpecParser;
use crate::error::ParseFailure;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

/// YAML parser
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl SpecParser for YamlParser {
    fn parse(&self, content: &str) -> Result<Value, ParseFailure> {
        let mut documents = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(content) {
            let mut value = YamlValue::deserialize(doc)
                .map_err(|e| ParseFailure(format!("YAML parse error: {e}")))?;
            value
                .apply_merge()
                .map_err(|e| ParseFailure(format!("YAML merge error: {e}")))?;
            if !value.is_null() {
                documents.push(value);
            }
        }

        match documents.len() {
            0 => Ok(Value::Null),
            1 => yaml_to_json(&documents[0]),
            n => Err(ParseFailure(format!(
                "expected a single YAML document, found {n}"
            ))),
        }
    }

    fn extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

/// Convert a YAML tree into a JSON tree
///
/// # Errors
/// Returns error for mapping keys that are sequences or mappings
pub fn yaml_to_json(value: &YamlValue) -> Result<Value, ParseFailure> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(*b),
        YamlValue::Number(n) => number_to_json(n),
        YamlValue::String(s) => Value::String(s.clone()),
        YamlValue::Sequence(items) => {
            Value::Array(items.iter().map(yaml_to_json).collect::<Result<_, _>>()?)
        }
        YamlValue::Mapping(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                out.insert(key_to_string(key)?, yaml_to_json(val)?);
            }
            Value::Object(out)
        }
        // Custom tags carry no meaning for OpenAPI; keep the tagged value
        YamlValue::Tagged(tagged) => yaml_to_json(&tagged.value)?,
    })
}

fn number_to_json(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            // .nan / .inf have no JSON encoding
            .unwrap_or_else(|| Value::String(n.to_string()))
    }
}

fn key_to_string(key: &YamlValue) -> Result<String, ParseFailure> {
    match key {
        YamlValue::String(s) => Ok(s.clone()),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        YamlValue::Tagged(tagged) => key_to_string(&tagged.value),
        YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(ParseFailure(
            "complex mapping keys are not supported".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_openapi_yaml() {
        let content = r#"
openapi: 3.0.3
paths:
  /pet:
    get:
      responses:
        200:
          description: ok
        "404":
          description: missing
"#;
        let value = YamlParser.parse(content).unwrap();
        assert_eq!(
            value["paths"]["/pet"]["get"]["responses"],
            json!({"200": {"description": "ok"}, "404": {"description": "missing"}})
        );
    }

    #[test]
    fn empty_input_is_null() {
        assert_eq!(YamlParser.parse("").unwrap(), Value::Null);
        assert_eq!(YamlParser.parse("---\n").unwrap(), Value::Null);
    }

    #[test]
    fn multiple_documents_are_rejected() {
        let err = YamlParser.parse("---\na: 1\n---\nb: 2\n").unwrap_err();
        assert!(err.0.contains("found 2"));
    }

    #[test]
    fn anchors_are_expanded() {
        let content = r#"
base: &base
  type: string
copy: *base
"#;
        let value = YamlParser.parse(content).unwrap();
        assert_eq!(value["copy"], json!({"type": "string"}));
    }

    #[test]
    fn merge_keys_are_applied() {
        let content = r#"
base: &base
  type: string
  format: uuid
id:
  <<: *base
  description: x
"#;
        let value = YamlParser.parse(content).unwrap();
        assert_eq!(
            value["id"],
            json!({"type": "string", "format": "uuid", "description": "x"})
        );
    }

    #[test]
    fn local_keys_win_over_merged_ones() {
        let content = r#"
defaults: &defaults
  description: shared
  deprecated: false
get:
  <<: *defaults
  description: local
"#;
        let value = YamlParser.parse(content).unwrap();
        assert_eq!(
            value["get"],
            json!({"description": "local", "deprecated": false})
        );
    }

    #[test]
    fn numbers_keep_their_kind() {
        let value = YamlParser.parse("a: 1\nb: -2\nc: 1.5\n").unwrap();
        assert_eq!(value, json!({"a": 1, "b": -2, "c": 1.5}));
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let err = YamlParser.parse("paths: [unclosed").unwrap_err();
        assert!(err.0.starts_with("YAML parse error"));
    }
}
