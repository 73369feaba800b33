//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge serialized defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_CHUNKING__SIZE=500`). Provides helpers to expand `~` and `${VAR}` and
//! to resolve relative paths against the config base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::classify::ClassifierRules;

pub struct Config {
    figment: Figment,
    base_dir: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&env::current_dir()?)
    }

    /// Same as [`Config::load`] with config files looked up in `base_dir`.
    /// Relative data paths are later resolved against the same directory.
    pub fn load_from(base_dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base_dir.join("config.toml")));
        let env_file = match env_name.as_str() {
            "dev" | "development" => Some("config.dev.toml"),
            "prod" | "production" => Some("config.prod.toml"),
            "test" | "testing" => Some("config.test.toml"),
            _ => None,
        };
        if let Some(file) = env_file {
            figment = figment.merge(Toml::file(base_dir.join(file)));
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self {
            figment,
            base_dir: base_dir.to_path_buf(),
        };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment, base_dir: &Path) -> Self {
        Self {
            figment,
            base_dir: base_dir.to_path_buf(),
        }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))?;
        settings.chunking.validate()?;
        Ok(settings)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve(&self, p: &str) -> PathBuf {
        resolve_with_base(&self.base_dir, p)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let settings = self.settings()?;
        match env {
            "prod" | "production" if settings.embedding.backend == EmbeddingBackend::Hash => {
                anyhow::bail!("the hash embedder is for tests and development only")
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub prompt: PromptSettings,
    pub classifier: ClassifierRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    pub docs_dir: String,
    pub index_dir: String,
    /// File extensions (without the dot) picked up from `docs_dir`.
    pub extensions: Vec<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            docs_dir: "data/docs".to_string(),
            index_dir: "index".to_string(),
            extensions: vec!["tex".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    MiniLm,
    Hash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub model_name: String,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub batch_size: usize,
    /// Output dimension of the hash embedder.
    pub hash_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::MiniLm,
            model_name: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            model_dir: None,
            max_len: 256,
            batch_size: 32,
            hash_dim: 384,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Canonical keyword with the query phrases that trigger it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    pub triggers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSettings {
    pub max_chunks: usize,
    pub max_chars: usize,
    pub keyword_groups: Vec<KeywordGroup>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        let group = |name: &str, triggers: &[&str]| KeywordGroup {
            name: name.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        };
        Self {
            max_chunks: 10,
            max_chars: 900,
            keyword_groups: vec![
                group(
                    "resume",
                    &["resume", "cv", "curriculum vitae", "cover letter", "application letter"],
                ),
                group(
                    "manual",
                    &[
                        "manual",
                        "guide",
                        "handbook",
                        "playbook",
                        "godsheet",
                        "trading manual",
                        "developer manual",
                    ],
                ),
                group("hw", &["hw", "homework", "pset", "problem set", "assignment"]),
                group(
                    "cheat_sheet",
                    &[
                        "cheat sheet",
                        "cheatsheet",
                        "godsheet",
                        "exam master",
                        "study outline",
                        "warmup",
                        "drill set",
                        "practice midterm",
                    ],
                ),
            ],
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
