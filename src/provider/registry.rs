use crate::config::Config;
use crate::error::ProviderError;
use crate::provider::myspell::{self, MyspellProvider};
use crate::provider::wordlist::{self, WordlistProvider};
use crate::provider::{DictionaryInfo, Provider, ProviderInfo};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const MANIFEST_EXTENSION: &str = "provider";

/// On-disk description of a provider module.
#[derive(Debug, Deserialize)]
struct Manifest {
    engine: String,
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    dictionary_dirs: Vec<PathBuf>,
}

/// Providers in discovery order.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every configured provider directory for manifests.
    ///
    /// A broken manifest only costs its own provider; the scan carries on.
    pub fn discover(config: &Config) -> Self {
        let mut registry = Self::new();

        for dir in &config.provider_dirs {
            if !dir.is_dir() {
                continue;
            }

            let manifests = WalkDir::new(dir)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .filter(|entry| {
                    entry.path().extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXTENSION)
                });

            for entry in manifests {
                let loaded = Self::load_manifest(entry.path(), config)
                    .and_then(|provider| registry.register(provider));
                if let Err(e) = loaded {
                    warn!(manifest = %entry.path().display(), error = %e, "skipping provider");
                }
            }
        }

        debug!(providers = registry.providers.len(), "provider discovery finished");
        registry
    }

    /// Instantiate the engine a manifest names.
    pub fn load_manifest(path: &Path, config: &Config) -> Result<Arc<dyn Provider>, ProviderError> {
        let contents = fs::read_to_string(path).map_err(|source| ProviderError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Manifest =
            toml::from_str(&contents).map_err(|source| ProviderError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;

        let name = manifest
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .unwrap_or_else(|| manifest.engine.clone());

        let dirs = if manifest.dictionary_dirs.is_empty() {
            std::iter::once(&config.user_dir)
                .chain(&config.dictionary_dirs)
                .map(|root| root.join(&name))
                .collect()
        } else {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            manifest
                .dictionary_dirs
                .iter()
                .map(|dir| base.join(dir))
                .collect()
        };

        let default_description = match manifest.engine.as_str() {
            wordlist::ENGINE => wordlist::DESCRIPTION,
            myspell::ENGINE => myspell::DESCRIPTION,
            other => {
                return Err(ProviderError::UnknownEngine {
                    path: path.to_path_buf(),
                    engine: other.to_string(),
                })
            }
        };

        let info = ProviderInfo {
            name,
            description: manifest
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| default_description.to_string()),
            origin: path.to_path_buf(),
        };

        let provider: Arc<dyn Provider> = match manifest.engine.as_str() {
            wordlist::ENGINE => Arc::new(WordlistProvider::new(info, dirs)),
            _ => Arc::new(MyspellProvider::new(info, dirs)),
        };
        Ok(provider)
    }

    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<(), ProviderError> {
        let name = &provider.info().name;
        if self.get(name).is_some() {
            return Err(ProviderError::Duplicate(name.clone()));
        }
        debug!(provider = %name, origin = %provider.info().origin.display(), "registered provider");
        self.providers.push(provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.info().name == name)
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    pub fn list(&self) -> Vec<ProviderInfo> {
        self.providers.iter().map(|p| p.info().clone()).collect()
    }

    /// Every (language, provider) pair on offer.
    pub fn list_dictionaries(&self) -> Vec<DictionaryInfo> {
        self.providers
            .iter()
            .flat_map(|provider| {
                provider.languages().into_iter().map(move |language| DictionaryInfo {
                    language,
                    provider: provider.info().clone(),
                })
            })
            .collect()
    }

    pub fn dictionary_exists(&self, tag: &str) -> bool {
        self.providers.iter().any(|p| p.dictionary_exists(tag))
    }
}
