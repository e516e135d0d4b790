//! JSON spec parser
//!
//! Strict serde_json first. YAML is a superset of JSON, so content that
//! serde_json rejects (comments, trailing commas written by hand-edited
//! exports) gets a second chance through the YAML parser.

use super::yaml::YamlParser;
use super::SpecParser;
use crate::error::ParseFailure;
use serde_json::Value;

/// JSON parser
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl SpecParser for JsonParser {
    fn parse(&self, content: &str) -> Result<Value, ParseFailure> {
        if content.trim().is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str::<Value>(content) {
            Ok(value) => Ok(value),
            Err(json_err) => {
                tracing::debug!("strict JSON parse failed ({json_err}), retrying as YAML");
                YamlParser.parse(content).map_err(|yaml_err| {
                    ParseFailure(format!("JSON parse error: {json_err}; YAML fallback: {yaml_err}"))
                })
            }
        }
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strict_json() {
        let value = JsonParser
            .parse(r#"{"openapi": "3.0.0", "paths": {"/pet": {"get": {}}}}"#)
            .unwrap();
        assert_eq!(value["openapi"], "3.0.0");
        assert!(value["paths"]["/pet"]["get"].is_object());
    }

    #[test]
    fn falls_back_to_yaml() {
        let value = JsonParser.parse("openapi: 3.0.0\npaths: {}\n").unwrap();
        assert_eq!(value["openapi"], "3.0.0");
    }

    #[test]
    fn blank_input_is_null() {
        assert_eq!(JsonParser.parse("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn garbage_reports_both_attempts() {
        let err = JsonParser.parse("{\"paths\": [}").unwrap_err();
        assert!(err.0.contains("JSON parse error"));
        assert!(err.0.contains("YAML fallback"));
    }
}
