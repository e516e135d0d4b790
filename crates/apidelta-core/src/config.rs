//! Pipeline configuration
//!
//! Built in code through `with_*` methods or read from a TOML file; every
//! field has a default so a file only needs the settings it changes.

use crate::error::ConfigError;
use apidelta_spec::FragmentContext;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default spec file name prefix
pub const DEFAULT_PREFIX: &str = "Swagger";

/// Default generated-tests subdirectory under the target folder
pub const DEFAULT_TESTS_DIR: &str = "tests";

/// Language of generated test artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLanguage {
    #[default]
    #[serde(alias = "js")]
    JavaScript,
    #[serde(alias = "ts")]
    TypeScript,
}

impl TargetLanguage {
    /// Source file extension, without dot
    #[inline]
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::JavaScript => "js",
            Self::TypeScript => "ts",
        }
    }

    /// Human-readable name used in prompts
    #[inline]
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
        }
    }

    /// Markdown code fence tags a model may wrap output in
    #[must_use]
    pub fn fence_tags(self) -> &'static [&'static str] {
        match self {
            Self::JavaScript => &["javascript", "js"],
            Self::TypeScript => &["typescript", "ts"],
        }
    }
}

impl Display for TargetLanguage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TargetLanguage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "javascript" | "js" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            other => Err(ConfigError::UnknownLanguage(other.to_string())),
        }
    }
}

/// Reconciliation pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Folder holding timestamped spec revisions
    pub spec_folder: PathBuf,
    /// Spec file name prefix
    pub prefix: String,
    /// Project folder receiving generated tests
    pub target_folder: PathBuf,
    /// Generated tests subdirectory, relative to `target_folder`
    pub tests_dir: PathBuf,
    /// Parent of per-run fragment directories
    pub fragment_root: PathBuf,
    /// Language of generated tests
    pub language: TargetLanguage,
    /// Extract every operation even when a previous revision exists
    pub force_full: bool,
    /// Carry `openapi`/`info`/`servers`/`security` into fragments
    pub include_context: bool,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML or mistyped fields
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read a TOML config file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if unreadable, [`ConfigError::Parse`] if malformed
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// With spec folder
    #[inline]
    #[must_use]
    pub fn with_spec_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.spec_folder = folder.into();
        self
    }

    /// With file prefix
    #[inline]
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// With target folder
    #[inline]
    #[must_use]
    pub fn with_target_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.target_folder = folder.into();
        self
    }

    /// With tests subdirectory
    #[inline]
    #[must_use]
    pub fn with_tests_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tests_dir = dir.into();
        self
    }

    /// With fragment root
    #[inline]
    #[must_use]
    pub fn with_fragment_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fragment_root = root.into();
        self
    }

    /// With target language
    #[inline]
    #[must_use]
    pub fn with_language(mut self, language: TargetLanguage) -> Self {
        self.language = language;
        self
    }

    /// With forced full extraction
    #[inline]
    #[must_use]
    pub fn with_force_full(mut self, force: bool) -> Self {
        self.force_full = force;
        self
    }

    /// With or without document context in fragments
    #[inline]
    #[must_use]
    pub fn with_context(mut self, include: bool) -> Self {
        self.include_context = include;
        self
    }

    /// Directory holding generated tests, where stale files are pruned
    #[must_use]
    pub fn tests_path(&self) -> PathBuf {
        self.target_folder.join(&self.tests_dir)
    }

    /// Fragment context matching `include_context`
    #[inline]
    #[must_use]
    pub fn fragment_context(&self) -> FragmentContext {
        if self.include_context {
            FragmentContext::Document
        } else {
            FragmentContext::Minimal
        }
    }

    /// Check required settings
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] for an empty spec folder, target
    /// folder or prefix
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spec_folder.as_os_str().is_empty() {
            return Err(ConfigError::Missing("spec_folder"));
        }
        if self.target_folder.as_os_str().is_empty() {
            return Err(ConfigError::Missing("target_folder"));
        }
        if self.prefix.is_empty() {
            return Err(ConfigError::Missing("prefix"));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            spec_folder: PathBuf::new(),
            prefix: DEFAULT_PREFIX.to_string(),
            target_folder: PathBuf::new(),
            tests_dir: PathBuf::from(DEFAULT_TESTS_DIR),
            fragment_root: std::env::temp_dir(),
            language: TargetLanguage::default(),
            force_full: false,
            include_context: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_documented_values() {
        let config = PipelineConfig::new();
        assert_eq!(config.prefix, "Swagger");
        assert_eq!(config.tests_dir, PathBuf::from("tests"));
        assert_eq!(config.language, TargetLanguage::JavaScript);
        assert!(config.include_context);
        assert!(!config.force_full);
        assert_eq!(config.fragment_context(), FragmentContext::Document);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
spec_folder = "specs"
target_folder = "playwright"
language = "ts"
include_context = false
"#,
            Path::new("apidelta.toml"),
        )
        .unwrap();
        assert_eq!(config.spec_folder, PathBuf::from("specs"));
        assert_eq!(config.language, TargetLanguage::TypeScript);
        assert_eq!(config.prefix, "Swagger");
        assert_eq!(config.tests_path(), PathBuf::from("playwright/tests"));
        assert_eq!(config.fragment_context(), FragmentContext::Minimal);
    }

    #[test]
    fn malformed_toml_names_file() {
        let err = PipelineConfig::from_toml_str("language = 5", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apidelta.toml");
        let config = PipelineConfig::new()
            .with_spec_folder("specs")
            .with_target_folder("out")
            .with_force_full(true);
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();
        assert_eq!(PipelineConfig::from_toml_file(&path).unwrap(), config);
    }

    #[test]
    fn validate_requires_folders() {
        assert!(matches!(
            PipelineConfig::new().validate(),
            Err(ConfigError::Missing("spec_folder"))
        ));
        let config = PipelineConfig::new().with_spec_folder("specs");
        assert!(matches!(config.validate(), Err(ConfigError::Missing("target_folder"))));
        assert!(config.with_target_folder("out").validate().is_ok());
    }

    #[test]
    fn language_parsing() {
        assert_eq!("JavaScript".parse::<TargetLanguage>().unwrap(), TargetLanguage::JavaScript);
        assert_eq!(" ts ".parse::<TargetLanguage>().unwrap(), TargetLanguage::TypeScript);
        assert!(matches!(
            "python".parse::<TargetLanguage>(),
            Err(ConfigError::UnknownLanguage(name)) if name == "python"
        ));
        assert_eq!(TargetLanguage::TypeScript.extension(), "ts");
    }
}
