//! Testing utilities for apidelta workspace
//!
//! Shared fixture specs and helpers for writing timestamped spec folders.

#![allow(missing_docs)]

use apidelta_spec::SpecDocument;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const OLDER_TS: &str = "20240101_120000";
pub const NEWER_TS: &str = "20240215_093000";

/// Petstore, first revision
///
/// `/pet` {get, post}, `/pet/{petId}` {get, delete} with path-level
/// parameters, schemas reached through `$ref`.
pub fn petstore_v1() -> Value {
    json!({
        "openapi": "3.0.3",
        "info": {"title": "Petstore", "version": "1.0.0"},
        "servers": [{"url": "https://petstore.example.com/v1"}],
        "security": [{"api_key": []}],
        "paths": {
            "/pet": {
                "get": {
                    "operationId": "listPets",
                    "parameters": [{
                        "name": "status",
                        "in": "query",
                        "schema": {"type": "string", "enum": ["available", "pending", "sold"]}
                    }],
                    "responses": {"200": {
                        "description": "pets",
                        "content": {"application/json": {"schema": {
                            "type": "array",
                            "items": {"$ref": "#/components/schemas/Pet"}
                        }}}
                    }}
                },
                "post": {
                    "operationId": "addPet",
                    "requestBody": {"content": {"application/json": {
                        "schema": {"$ref": "#/components/schemas/Pet"}
                    }}},
                    "responses": {"201": {"description": "created"}}
                }
            },
            "/pet/{petId}": {
                "parameters": [{"name": "petId", "in": "path", "required": true, "schema": {"type": "integer"}}],
                "get": {
                    "operationId": "getPet",
                    "description": "Find pet by ID",
                    "responses": {"200": {
                        "description": "pet",
                        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                    }}
                },
                "delete": {
                    "operationId": "deletePet",
                    "responses": {"204": {"description": "deleted"}}
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": {"type": "integer"},
                        "name": {"type": "string"},
                        "category": {"$ref": "#/components/schemas/Category"}
                    }
                },
                "Category": {"type": "object", "properties": {"name": {"type": "string"}}}
            },
            "securitySchemes": {"api_key": {"type": "apiKey", "name": "api_key", "in": "header"}}
        }
    })
}

/// Petstore, second revision
///
/// Against [`petstore_v1`]: `POST /pet` removed, `GET /pet/{petId}`
/// description changed, `/store/inventory` added, enum and `required`
/// lists reordered without changing membership.
pub fn petstore_v2() -> Value {
    let mut spec = petstore_v1();
    let paths = &mut spec["paths"];

    if let Some(pet) = paths["/pet"].as_object_mut() {
        pet.remove("post");
    }
    paths["/pet"]["get"]["parameters"][0]["schema"]["enum"] = json!(["sold", "available", "pending"]);
    paths["/pet/{petId}"]["get"]["description"] = json!("Returns a single pet");
    paths["/store/inventory"] = json!({
        "get": {
            "operationId": "getInventory",
            "responses": {"200": {"description": "inventory"}}
        }
    });
    spec["components"]["schemas"]["Pet"]["required"] = json!(["name", "id"]);
    spec
}

/// Wrap a tree as a document
pub fn spec_doc(value: Value) -> SpecDocument {
    SpecDocument::new(value).unwrap()
}

/// `<prefix>_<timestamp>.<ext>`
pub fn timestamped_name(prefix: &str, timestamp: &str, ext: &str) -> String {
    format!("{prefix}_{timestamp}.{ext}")
}

/// Write `value` to `dir/name`, as YAML for `.yaml`/`.yml`, JSON otherwise
pub fn write_spec(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::to_string(value).unwrap(),
        _ => serde_json::to_string_pretty(value).unwrap(),
    };
    std::fs::write(&path, content).unwrap();
    path
}

/// Temporary spec folder
pub struct SpecFolder {
    dir: TempDir,
}

impl SpecFolder {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a `Swagger_<timestamp>.<ext>` revision
    pub fn add_revision(&self, timestamp: &str, ext: &str, value: &Value) -> PathBuf {
        write_spec(self.path(), &timestamped_name("Swagger", timestamp, ext), value)
    }

    /// Write a file with arbitrary name and content
    pub fn add_raw(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Folder holding [`petstore_v1`] then [`petstore_v2`]
    pub fn petstore_pair() -> Self {
        let folder = Self::new();
        folder.add_revision(OLDER_TS, "yaml", &petstore_v1());
        folder.add_revision(NEWER_TS, "json", &petstore_v2());
        folder
    }
}

impl Default for SpecFolder {
    fn default() -> Self {
        Self::new()
    }
}
