use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `user_dir`, where personal word lists and exclusion lists live.
pub const CONFIG_DIR_ENV: &str = "SPELLBROKER_CONFIG_DIR";
/// Extra provider search directories, in the platform's `PATH` syntax.
pub const PROVIDER_PATH_ENV: &str = "SPELLBROKER_PROVIDER_PATH";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_user_dir")]
    pub user_dir: PathBuf,

    /// Directories scanned for `*.provider` manifests, in order.
    #[serde(default)]
    pub provider_dirs: Vec<PathBuf>,

    /// Shared dictionary roots; each provider looks in `<dir>/<provider name>`.
    #[serde(default)]
    pub dictionary_dirs: Vec<PathBuf>,

    /// Language tag (or `*`) to a comma separated provider list.
    #[serde(default)]
    pub ordering: BTreeMap<String, String>,

    #[serde(default = "default_cache_dictionaries")]
    pub cache_dictionaries: bool,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_user_dir() -> PathBuf {
    Config::config_dir().unwrap_or_else(|| PathBuf::from(".spellbroker"))
}

fn default_cache_dictionaries() -> bool {
    true
}

fn default_max_suggestions() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_dir: default_user_dir(),
            provider_dirs: Self::default_provider_dirs(),
            dictionary_dirs: Self::data_dir().into_iter().collect(),
            ordering: BTreeMap::new(),
            cache_dictionaries: default_cache_dictionaries(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

impl Config {
    /// Load configuration with priority: environment > global config > defaults
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global_config = Self::from_file(&global_path)?;
                config = config.merge(global_config);
            }
        }

        config.apply_env(
            env::var_os(CONFIG_DIR_ENV).map(PathBuf::from),
            env::var_os(PROVIDER_PATH_ENV)
                .map(|paths| env::split_paths(&paths).collect())
                .unwrap_or_default(),
        );

        Ok(config)
    }

    /// A configuration rooted at `user_dir` with no system-wide search paths.
    pub fn isolated(user_dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: user_dir.into(),
            provider_dirs: Vec::new(),
            dictionary_dirs: Vec::new(),
            ..Default::default()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn merge(mut self, other: Self) -> Self {
        if other.user_dir != default_user_dir() {
            self.user_dir = other.user_dir;
        }
        if !other.provider_dirs.is_empty() {
            self.provider_dirs = other.provider_dirs;
        }
        if !other.dictionary_dirs.is_empty() {
            self.dictionary_dirs = other.dictionary_dirs;
        }
        self.ordering.extend(other.ordering);
        if other.max_suggestions != default_max_suggestions() {
            self.max_suggestions = other.max_suggestions;
        }
        self.cache_dictionaries = other.cache_dictionaries;
        self
    }

    fn apply_env(&mut self, user_dir: Option<PathBuf>, provider_path: Vec<PathBuf>) {
        if let Some(dir) = user_dir {
            self.user_dir = dir;
        }
        if !provider_path.is_empty() {
            let mut dirs = provider_path;
            dirs.append(&mut self.provider_dirs);
            self.provider_dirs = dirs;
        }
    }

    /// Personal word list for a language dictionary.
    pub fn personal_word_list(&self, tag: &str) -> PathBuf {
        self.user_dir.join(format!("{}.dic", tag))
    }

    /// Persistent exclusion list for a language dictionary.
    pub fn exclusion_list(&self, tag: &str) -> PathBuf {
        self.user_dir.join(format!("{}.exc", tag))
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellbroker").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn data_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "spellbroker").map(|dirs| dirs.data_dir().to_path_buf())
    }

    fn default_provider_dirs() -> Vec<PathBuf> {
        [Self::config_dir(), Self::data_dir()]
            .into_iter()
            .flatten()
            .map(|dir| dir.join("providers"))
            .collect()
    }
}
