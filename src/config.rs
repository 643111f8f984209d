//! Configuration file support for logictree
//!
//! Reads from .logictree/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file name inside the store directory
pub const CONFIG_FILE: &str = "config.toml";

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Tree defaults
    #[serde(default)]
    pub tree: TreeConfig,

    /// Idea generator settings
    #[serde(default)]
    pub ai: AiConfig,

    /// Web editor settings
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Text used when creating nodes
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TreeConfig {
    /// Root text for `logictree init`
    #[serde(default = "default_root_text")]
    pub root_text: String,

    /// Placeholder text for a freshly added child
    #[serde(default = "default_new_node_text")]
    pub new_node_text: String,
}

/// Generative-language API settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AiConfig {
    /// API base URL, without the `/models/...` suffix
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Language the suggestions should be written in
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_min_ideas")]
    pub min_ideas: usize,

    #[serde(default = "default_max_ideas")]
    pub max_ideas: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServeConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_root_text() -> String {
    "Increase company revenue".to_string()
}

fn default_new_node_text() -> String {
    "New element".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

fn default_min_ideas() -> usize {
    3
}

fn default_max_ideas() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_port() -> u16 {
    3000
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_text: default_root_text(),
            new_node_text: default_new_node_text(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            language: default_language(),
            min_ideas: default_min_ideas(),
            max_ideas: default_max_ideas(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Config {
    /// Load config from .logictree/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        match Self::find_config_path() {
            Some(path) => Self::load_file(&path),
            None => Self::default(),
        }
    }

    /// Load the config that belongs to a tree file: `config.toml` next to it
    /// wins, otherwise fall back to the usual directory walk
    pub fn load_for(tree_path: &Path) -> Self {
        if let Some(dir) = tree_path.parent() {
            let sibling = dir.join(CONFIG_FILE);
            if sibling.exists() {
                return Self::load_file(&sibling);
            }
        }
        Self::load()
    }

    fn load_file(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config, using defaults");
                return Self::default();
            }
        };
        match Self::from_toml(&contents) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Parse and normalize a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(contents)?;
        Ok(config.normalized())
    }

    /// Default config rendered as TOML (written by `logictree init`)
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }

    /// Keep idea counts sane: 1 <= min <= max
    pub fn normalized(mut self) -> Self {
        self.ai.min_ideas = self.ai.min_ideas.max(1);
        self.ai.max_ideas = self.ai.max_ideas.max(self.ai.min_ideas);
        self
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(crate::store::STORE_DIR).join(CONFIG_FILE);
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ai.min_ideas, 3);
        assert_eq!(config.ai.max_ideas, 5);
        assert_eq!(config.ai.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.tree.new_node_text, "New element");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[tree]
root_text = "Reduce churn"

[ai]
model = "gemini-1.5-pro"
language = "Japanese"
max_ideas = 4
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.tree.root_text, "Reduce churn");
        assert_eq!(config.tree.new_node_text, "New element");
        assert_eq!(config.ai.model, "gemini-1.5-pro");
        assert_eq!(config.ai.language, "Japanese");
        assert_eq!(config.ai.max_ideas, 4);
        assert_eq!(config.ai.endpoint, default_endpoint());
    }

    #[test]
    fn test_idea_counts_are_normalized() {
        let config = Config::from_toml("[ai]\nmin_ideas = 0\nmax_ideas = 0\n").unwrap();
        assert_eq!(config.ai.min_ideas, 1);
        assert_eq!(config.ai.max_ideas, 1);

        let config = Config::from_toml("[ai]\nmin_ideas = 6\nmax_ideas = 2\n").unwrap();
        assert_eq!(config.ai.min_ideas, 6);
        assert_eq!(config.ai.max_ideas, 6);
    }

    #[test]
    fn test_default_toml_round_trips() {
        let rendered = Config::default_toml();
        assert!(rendered.contains("[ai]"));
        assert_eq!(Config::from_toml(&rendered).unwrap(), Config::default());
    }

    #[test]
    fn test_load_for_prefers_sibling_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[serve]\nport = 4100\n").unwrap();
        let config = Config::load_for(&dir.path().join("tree.json"));
        assert_eq!(config.serve.port, 4100);
    }

    #[test]
    fn test_invalid_sibling_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[serve\nport = ").unwrap();
        let config = Config::load_for(&dir.path().join("tree.json"));
        assert_eq!(config, Config::default());
    }
}
