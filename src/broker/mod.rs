pub mod cache;
pub mod ordering;
pub mod tag;

use crate::config::Config;
use crate::dictionary::Dictionary;
use crate::error::{BrokerError, Result};
use crate::provider::{DictionaryInfo, ProviderInfo, ProviderRegistry};
use cache::DictionaryCache;
use lazy_static::lazy_static;
use ordering::OrderingTable;
use parking_lot::Mutex;
use std::fmt;
use std::mem;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

lazy_static! {
    static ref DEFAULT_BROKER: Mutex<Option<Arc<Broker>>> = Mutex::new(None);
}

/// State shared by a broker and every dictionary it hands out.
///
/// Dictionaries hold a strong reference, so providers stay loaded until the
/// last handle is gone even if the `Broker` itself was dropped.
pub(crate) struct BrokerContext {
    config: Config,
    registry: ProviderRegistry,
    ordering: OrderingTable,
    cache: DictionaryCache,
    cache_enabled: AtomicBool,
    issued: Mutex<Vec<Weak<Dictionary>>>,
    // Set when dispose starts. `disposed` follows once every issued
    // handle has been torn down.
    disposing: AtomicBool,
    disposed: AtomicBool,
}

impl BrokerContext {
    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.disposed.load(Ordering::Acquire) {
            return Err(BrokerError::UseAfterDispose("broker"));
        }
        Ok(())
    }
}

impl Drop for BrokerContext {
    fn drop(&mut self) {
        debug!(providers = self.registry.providers().len(), "releasing broker providers");
    }
}

/// Entry point: finds providers, resolves languages to dictionaries and
/// optionally caches them.
///
/// Dropping a `Broker` leaves outstanding dictionaries usable; call
/// [`Broker::dispose`] to invalidate them.
pub struct Broker {
    context: Arc<BrokerContext>,
}

impl Broker {
    /// Broker over the providers found through [`Config::load`].
    pub fn new() -> Result<Self> {
        let config = Config::load().map_err(BrokerError::Config)?;
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        let registry = ProviderRegistry::discover(&config);
        Self::with_registry(config, registry)
    }

    pub fn with_registry(config: Config, registry: ProviderRegistry) -> Self {
        let ordering = OrderingTable::default();
        for (language, names) in &config.ordering {
            match tag::normalize(language) {
                Ok(language) => ordering.set(&language, names),
                Err(e) => warn!(error = %e, "ignoring configured ordering"),
            }
        }

        let cache_enabled = AtomicBool::new(config.cache_dictionaries);
        Self {
            context: Arc::new(BrokerContext {
                config,
                registry,
                ordering,
                cache: DictionaryCache::default(),
                cache_enabled,
                issued: Mutex::new(Vec::new()),
                disposing: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    /// The process-wide broker. A disposed default is replaced on the next call.
    pub fn default_instance() -> Result<Arc<Broker>> {
        let mut slot = DEFAULT_BROKER.lock();
        if let Some(broker) = slot.as_ref().filter(|b| !b.is_disposed()) {
            return Ok(Arc::clone(broker));
        }

        let broker = Arc::new(Broker::new()?);
        debug!("created default broker");
        *slot = Some(Arc::clone(&broker));
        Ok(broker)
    }

    pub fn providers(&self) -> Result<Vec<ProviderInfo>> {
        self.context.ensure_live()?;
        Ok(self.context.registry.list())
    }

    pub fn dictionaries(&self) -> Result<Vec<DictionaryInfo>> {
        self.context.ensure_live()?;
        Ok(self.context.registry.list_dictionaries())
    }

    /// Whether any provider can serve `language` or its base language.
    pub fn dictionary_exists(&self, language: &str) -> Result<bool> {
        self.context.ensure_live()?;
        let language = match tag::normalize(language) {
            Ok(language) if language != ordering::WILDCARD => language,
            _ => return Ok(false),
        };
        Ok(tag::candidates(&language)
            .into_iter()
            .any(|candidate| self.context.registry.dictionary_exists(candidate)))
    }

    /// Dictionary for `language` from the first provider, in preference
    /// order, that can load it.
    pub fn request_dictionary(&self, language: &str) -> Result<Arc<Dictionary>> {
        self.context.ensure_live()?;
        let language = tag::normalize(language)?;
        if language == ordering::WILDCARD {
            return Err(BrokerError::InvalidTag(language));
        }

        if self.cache_dictionaries() {
            self.context
                .cache
                .get_or_try_insert_with(&language, || self.load(&language))
        } else {
            self.load(&language)
        }
    }

    /// Dictionary backed only by the word list at `path`, which is created
    /// if missing. Never cached.
    pub fn request_pwl_dictionary(&self, path: impl AsRef<Path>) -> Result<Arc<Dictionary>> {
        self.context.ensure_live()?;
        let dictionary = Arc::new(Dictionary::for_word_list(
            Arc::clone(&self.context),
            path.as_ref(),
        )?);
        self.track(&dictionary);
        Ok(dictionary)
    }

    /// Prefer providers in the comma separated `ordering` for `language`
    /// (`*` for every language). Unknown provider names are ignored.
    pub fn set_ordering(&self, language: &str, ordering: &str) -> Result<()> {
        self.context.ensure_live()?;
        let language = tag::normalize(language)?;
        self.context.ordering.set(&language, ordering);
        Ok(())
    }

    pub fn cache_dictionaries(&self) -> bool {
        self.context.cache_enabled.load(Ordering::Acquire)
    }

    /// Handles already given out are not affected.
    pub fn set_cache_dictionaries(&self, enabled: bool) {
        self.context.cache_enabled.store(enabled, Ordering::Release);
        if !enabled {
            self.context.cache.clear();
        }
    }

    /// Invalidate this broker and every dictionary it issued. Idempotent.
    pub fn dispose(&self) {
        if self.context.disposing.swap(true, Ordering::AcqRel) {
            return;
        }

        let issued = mem::take(&mut *self.context.issued.lock());
        for dictionary in issued.iter().filter_map(Weak::upgrade) {
            dictionary.dispose();
        }
        self.context.disposed.store(true, Ordering::Release);
        self.context.cache.clear();
        debug!(dictionaries = issued.len(), "broker disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.context.disposing.load(Ordering::Acquire)
    }

    fn load(&self, language: &str) -> Result<Arc<Dictionary>> {
        let providers = self
            .context
            .ordering
            .arrange(language, self.context.registry.providers());

        for candidate in tag::candidates(language) {
            for provider in &providers {
                if !provider.dictionary_exists(candidate) {
                    continue;
                }

                match provider.request_dictionary(candidate) {
                    Ok(backend) => {
                        let info = DictionaryInfo {
                            language: candidate.to_string(),
                            provider: provider.info().clone(),
                        };
                        debug!(language, served = candidate, provider = %info.provider.name, "resolved dictionary");
                        let dictionary = Arc::new(Dictionary::for_language(
                            Arc::clone(&self.context),
                            language,
                            info,
                            backend,
                        ));
                        self.track(&dictionary);
                        return Ok(dictionary);
                    }
                    Err(e) => {
                        warn!(provider = %provider.info().name, language = candidate, error = %e, "provider failed to load dictionary");
                    }
                }
            }
        }

        Err(BrokerError::DictionaryNotFound(language.to_string()))
    }

    fn track(&self, dictionary: &Arc<Dictionary>) {
        let mut issued = self.context.issued.lock();
        issued.retain(|d| d.strong_count() > 0);
        issued.push(Arc::downgrade(dictionary));
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("providers", &self.context.registry.list())
            .field("cache_dictionaries", &self.cache_dictionaries())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
