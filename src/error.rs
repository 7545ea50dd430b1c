use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = BrokerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BrokerError {
    /// No provider can serve the requested language.
    #[error("no provider can supply a dictionary for '{0}'")]
    DictionaryNotFound(String),

    /// The broker or dictionary was already disposed.
    #[error("{0} has been disposed")]
    UseAfterDispose(&'static str),

    #[error("invalid language tag '{0}'")]
    InvalidTag(String),

    #[error("invalid word {0:?}")]
    InvalidWord(String),

    #[error(transparent)]
    ProviderLoad(#[from] ProviderError),

    #[error("personal word list {}: {source}", path.display())]
    WordList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load configuration")]
    Config(#[source] anyhow::Error),
}

/// Failure of a single provider. Discovery and resolution log these and move on.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to read provider manifest {}", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed provider manifest {}", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown engine '{engine}' in {}", path.display())]
    UnknownEngine { path: PathBuf, engine: String },

    #[error("provider '{0}' is already registered")]
    Duplicate(String),

    #[error("{engine}: cannot load '{tag}' from {}", path.display())]
    DictionaryLoad {
        engine: String,
        tag: String,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{provider} has no dictionary for '{tag}'")]
    Unsupported { provider: String, tag: String },
}

impl ProviderError {
    pub(crate) fn load(
        engine: &str,
        tag: &str,
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ProviderError::DictionaryLoad {
            engine: engine.to_string(),
            tag: tag.to_string(),
            path: path.into(),
            source: source.into(),
        }
    }
}
