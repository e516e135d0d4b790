//! End-to-end reconciliation across successive spec revisions

use apidelta_core::{
    DriverState, GenerateError, LlmClient, LlmTestGenerator, PipelineConfig, ReconciliationDriver,
    RunReport, TargetLanguage,
};
use apidelta_test_utils::{petstore_v1, petstore_v2, SpecFolder, NEWER_TS, OLDER_TS};
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Answers every prompt with a fenced test naming the operation slug
#[derive(Default)]
struct CannedClient {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmClient for CannedClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let slug = prompt
            .split('`')
            .nth(1)
            .ok_or_else(|| GenerateError::Llm("prompt names no operation".into()))?;
        Ok(format!(
            "```javascript\nimport {{ test, expect }} from '@playwright/test';\n\ntest('{slug}', async ({{ request }}) => {{}});\n```"
        ))
    }
}

struct Project {
    specs: SpecFolder,
    target: TempDir,
    fragments: TempDir,
    client: Arc<CannedClient>,
}

impl Project {
    fn new() -> Self {
        Self {
            specs: SpecFolder::new(),
            target: tempfile::tempdir().unwrap(),
            fragments: tempfile::tempdir().unwrap(),
            client: Arc::new(CannedClient::default()),
        }
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_spec_folder(self.specs.path())
            .with_target_folder(self.target.path())
            .with_fragment_root(self.fragments.path())
            .with_language(TargetLanguage::JavaScript)
    }

    fn tests_dir(&self) -> PathBuf {
        self.config().tests_path()
    }

    async fn run(&self) -> RunReport {
        let generator = LlmTestGenerator::new(self.client.clone(), self.tests_dir());
        ReconciliationDriver::new(self.config())
            .with_generator(Arc::new(generator))
            .run()
            .await
            .unwrap()
    }

    fn tests(&self) -> BTreeSet<String> {
        file_names(&self.tests_dir())
    }
}

fn file_names(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn names(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn successive_revisions_keep_tests_in_sync() {
    let project = Project::new();

    project.specs.add_revision(OLDER_TS, "yaml", &petstore_v1());
    let first = project.run().await;

    assert_eq!(first.final_state(), DriverState::Done);
    assert_eq!(first.fragment_count(), 4);
    assert_eq!(
        project.tests(),
        names(&[
            "pet_GET.spec.js",
            "pet_POST.spec.js",
            "pet_petId_DELETE.spec.js",
            "pet_petId_GET.spec.js",
        ])
    );

    project.specs.add_revision(NEWER_TS, "json", &petstore_v2());
    let second = project.run().await;

    assert_eq!(
        second.states,
        vec![
            DriverState::Init,
            DriverState::Compare,
            DriverState::SelectiveExtract,
            DriverState::Done
        ]
    );
    assert_eq!(second.pruned.removed.len(), 1);
    assert_eq!(second.generated.len(), 3);
    assert_eq!(
        project.tests(),
        names(&[
            "pet_GET.spec.js",
            "pet_petId_DELETE.spec.js",
            "pet_petId_GET.spec.js",
            "store_inventory_GET.spec.js",
        ])
    );
    assert_eq!(project.client.calls.load(Ordering::SeqCst), 7);

    let inventory =
        std::fs::read_to_string(project.tests_dir().join("store_inventory_GET.spec.js")).unwrap();
    assert!(inventory.starts_with("import { test, expect }"));
    assert!(inventory.contains("test('store_inventory_GET'"));
    assert!(!inventory.contains("```"));
}

#[tokio::test]
async fn runs_never_share_a_fragment_directory() {
    let project = Project::new();
    project.specs.add_revision(OLDER_TS, "json", &petstore_v1());

    let a = project.run().await;
    let b = project.run().await;

    let dir_a = &a.extraction.as_ref().unwrap().output_dir;
    let dir_b = &b.extraction.as_ref().unwrap().output_dir;
    assert_ne!(dir_a, dir_b);
    assert_eq!(file_names(dir_a).len(), 4);
    assert_eq!(file_names(dir_b).len(), 4);
}

#[tokio::test]
async fn manifest_matches_written_fragments() {
    let project = Project::new();
    for (ts, doc) in [(OLDER_TS, petstore_v1()), (NEWER_TS, petstore_v2())] {
        project.specs.add_revision(ts, "json", &doc);
    }

    let report = ReconciliationDriver::new(project.config()).run().await.unwrap();
    let extraction = report.extraction.unwrap();

    let mut manifest_path = extraction.output_dir.clone().into_os_string();
    manifest_path.push(".manifest.json");
    let manifest: Value =
        serde_json::from_str(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();

    assert_eq!(manifest["mode"], "selective");
    let slugs: BTreeSet<String> = manifest["written"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        slugs,
        names(&["pet_petId_DELETE", "pet_petId_GET", "store_inventory_GET"])
    );
    assert_eq!(manifest["failed"], Value::Array(Vec::new()));
}

#[tokio::test]
async fn fragments_are_standalone_documents() {
    let project = Project::new();
    project.specs.add_revision(OLDER_TS, "yaml", &petstore_v1());

    let report = ReconciliationDriver::new(project.config()).run().await.unwrap();
    let dir = &report.extraction.as_ref().unwrap().output_dir;

    let fragment: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("pet_petId_GET.json")).unwrap())
            .unwrap();
    let paths = fragment["paths"].as_object().unwrap();
    assert_eq!(paths.len(), 1);
    let item = paths["/pet/{petId}"].as_object().unwrap();
    assert!(item.contains_key("get"));
    assert!(!item.contains_key("delete"));
    assert!(item.contains_key("parameters"));
    assert!(fragment["components"]["schemas"]["Pet"].is_object());
    assert_eq!(fragment["info"], petstore_v1()["info"]);
}
