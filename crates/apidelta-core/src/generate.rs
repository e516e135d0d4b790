//! Test generation collaborator
//!
//! The model is an opaque prompt-in/text-out oracle behind [`LlmClient`].
//! A client handle is built once at process start and passed in; nothing
//! here reads global state.

use crate::config::TargetLanguage;
use crate::error::GenerateError;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Default time limit for one completion
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 300;

/// Text-generation oracle
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete `prompt`
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Runs an external program per completion
///
/// The prompt is written to the program's stdin; its stdout is the completion.
#[derive(Debug, Clone)]
pub struct CommandLlmClient {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandLlmClient {
    /// Create client for `program`
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }

    /// With extra arguments
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// With time limit per completion
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, prompt: &str) -> Result<String, GenerateError> {
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GenerateError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        // Feed stdin while draining stdout so large prompts cannot fill both pipes
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(prompt.as_bytes()).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|source| GenerateError::Pipe {
            command: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(GenerateError::CommandFailed {
                command: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        // A program may exit without consuming its input
        if let Err(source) = fed {
            if source.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(GenerateError::Pipe {
                    command: self.program.clone(),
                    source,
                });
            }
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl LlmClient for CommandLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerateError> {
        tokio::time::timeout(self.timeout, self.run(prompt))
            .await
            .map_err(|_| GenerateError::Timeout {
                command: self.program.clone(),
                secs: self.timeout.as_secs(),
            })?
    }
}

/// One generated test file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    /// Fragment it was generated from
    pub fragment: PathBuf,
    /// Written test file
    pub file: PathBuf,
}

/// Turns one fragment file into one test artifact
#[async_trait]
pub trait TestGenerator: Send + Sync {
    /// Generate the artifact for `fragment`
    async fn generate(
        &self,
        fragment: &Path,
        language: TargetLanguage,
    ) -> Result<GeneratedArtifact, GenerateError>;
}

/// [`TestGenerator`] backed by an [`LlmClient`]
///
/// Writes `<output_dir>/<slug>.spec.<ext>`, where the slug is the fragment
/// file stem.
pub struct LlmTestGenerator {
    client: Arc<dyn LlmClient>,
    output_dir: PathBuf,
}

impl std::fmt::Debug for LlmTestGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTestGenerator")
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl LlmTestGenerator {
    /// Create generator writing into `output_dir`
    #[must_use]
    pub fn new(client: Arc<dyn LlmClient>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    /// Directory receiving artifacts
    #[inline]
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl TestGenerator for LlmTestGenerator {
    async fn generate(
        &self,
        fragment: &Path,
        language: TargetLanguage,
    ) -> Result<GeneratedArtifact, GenerateError> {
        let spec = tokio::fs::read_to_string(fragment)
            .await
            .map_err(|source| GenerateError::ReadFragment {
                path: fragment.to_path_buf(),
                source,
            })?;
        let slug = fragment
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("fragment")
            .to_string();

        let prompt = build_prompt(&slug, &spec, language);
        tracing::debug!(slug = %slug, prompt_len = prompt.len(), "requesting completion");
        let completion = self.client.complete(&prompt).await?;
        let code = strip_code_fences(&completion, language);
        if code.trim().is_empty() {
            return Err(GenerateError::EmptyCompletion { slug });
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| GenerateError::WriteArtifact {
                path: self.output_dir.clone(),
                source,
            })?;
        let file = self
            .output_dir
            .join(format!("{slug}.spec.{}", language.extension()));
        tokio::fs::write(&file, code)
            .await
            .map_err(|source| GenerateError::WriteArtifact {
                path: file.clone(),
                source,
            })?;
        tracing::info!(file = %file.display(), "generated test");

        Ok(GeneratedArtifact {
            fragment: fragment.to_path_buf(),
            file,
        })
    }
}

/// Prompt asking for one Playwright API test file covering one fragment
#[must_use]
pub fn build_prompt(slug: &str, spec: &str, language: TargetLanguage) -> String {
    let lang = language.display_name();
    let ext = language.extension();
    format!(
        "You are an expert in Playwright and API testing.\n\
         \n\
         Generate a single Playwright test file in {lang} (.spec.{ext}) for the \
         OpenAPI fragment `{slug}` below.\n\
         \n\
         Rules:\n\
         - Use `import {{ test, expect }} from '@playwright/test'` and the `request` fixture.\n\
         - Every test has the signature `async ({{ request, baseURL }})` and builds URLs from `baseURL`.\n\
         - One `test.describe` block per request/response content-type combination in the spec.\n\
         - One `test` per documented response status code; use spec examples for success cases \
         and invalid or missing data for error cases.\n\
         - Assert `response.status()` and, for JSON bodies, required properties.\n\
         - Add authentication headers for any scheme in `securitySchemes`.\n\
         - Do not generate tests for operations outside the fragment.\n\
         - Return only the code, no explanations.\n\
         \n\
         OpenAPI fragment:\n\
         {spec}\n"
    )
}

/// Drop a leading ```` ```lang ```` line and a trailing ```` ``` ```` line
#[must_use]
pub fn strip_code_fences(text: &str, language: TargetLanguage) -> String {
    let mut lines: Vec<&str> = text.trim().lines().collect();
    if let Some(first) = lines.first() {
        let tag = first.trim().strip_prefix("```");
        if tag.is_some_and(|t| t.is_empty() || language.fence_tags().contains(&t.trim())) {
            lines.remove(0);
        }
    }
    if lines.last().is_some_and(|l| l.trim() == "```") {
        lines.pop();
    }
    let mut code = lines.join("\n");
    code.push('\n');
    code
}
