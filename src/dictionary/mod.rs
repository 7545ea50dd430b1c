pub mod pwl;
pub mod session;

use crate::broker::BrokerContext;
use crate::error::{BrokerError, Result};
use crate::provider::{DictionaryInfo, ProviderDictionary, ProviderInfo};
use parking_lot::Mutex;
use pwl::PersonalWordList;
use session::Session;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;
use std::mem;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Language and provider name reported by personal word list dictionaries.
pub const PERSONAL_WORDLIST: &str = "Personal Wordlist";

type DisposeObserver = Box<dyn FnOnce(&DictionaryInfo) + Send>;

/// A handle to one loaded dictionary.
///
/// Session overrides and the personal word list are layered on top of the
/// provider's answer. Once the handle or its broker is disposed every
/// operation fails with [`BrokerError::UseAfterDispose`].
pub struct Dictionary {
    context: Arc<BrokerContext>,
    info: DictionaryInfo,
    state: Mutex<State>,
    observers: Mutex<Vec<DisposeObserver>>,
    disposing: AtomicBool,
}

struct State {
    released: bool,
    backend: Option<Box<dyn ProviderDictionary>>,
    personal: PersonalWordList,
    exclusions: Option<PersonalWordList>,
    session: Session,
    // Most recent correction first
    replacements: HashMap<String, Vec<String>>,
}

impl State {
    fn is_excluded(&mut self, word: &str) -> bool {
        self.session.is_removed(word)
            || self.exclusions.as_mut().is_some_and(|list| list.contains(word))
    }

    fn check(&mut self, word: &str) -> bool {
        if self.is_excluded(word) {
            return false;
        }
        if self.session.is_added(word) || self.personal.contains(word) {
            return true;
        }
        self.backend.as_ref().is_some_and(|backend| backend.check(word))
    }
}

impl Dictionary {
    pub(crate) fn for_language(
        context: Arc<BrokerContext>,
        tag: &str,
        info: DictionaryInfo,
        backend: Box<dyn ProviderDictionary>,
    ) -> Self {
        let personal = PersonalWordList::open(context.config().personal_word_list(tag));
        let exclusions = PersonalWordList::open(context.config().exclusion_list(tag));
        Self::new(context, info, Some(backend), personal, Some(exclusions))
    }

    pub(crate) fn for_word_list(context: Arc<BrokerContext>, path: &Path) -> Result<Self> {
        ensure_file(path).map_err(|source| BrokerError::WordList {
            path: path.to_path_buf(),
            source,
        })?;

        let info = DictionaryInfo {
            language: PERSONAL_WORDLIST.to_string(),
            provider: ProviderInfo {
                name: PERSONAL_WORDLIST.to_string(),
                description: PERSONAL_WORDLIST.to_string(),
                origin: path.to_path_buf(),
            },
        };
        Ok(Self::new(context, info, None, PersonalWordList::open(path), None))
    }

    fn new(
        context: Arc<BrokerContext>,
        info: DictionaryInfo,
        backend: Option<Box<dyn ProviderDictionary>>,
        personal: PersonalWordList,
        exclusions: Option<PersonalWordList>,
    ) -> Self {
        Self {
            context,
            info,
            state: Mutex::new(State {
                released: false,
                backend,
                personal,
                exclusions,
                session: Session::default(),
                replacements: HashMap::new(),
            }),
            observers: Mutex::new(Vec::new()),
            disposing: AtomicBool::new(false),
        }
    }

    /// Whether `word` is spelled correctly.
    pub fn check(&self, word: &str) -> Result<bool> {
        validate(word)?;
        self.with_state(|state| Ok(state.check(word)))
    }

    /// Corrections for `word`: stored replacements, then personal words,
    /// then whatever the provider proposes.
    pub fn suggest(&self, word: &str) -> Result<Vec<String>> {
        validate(word)?;
        let max_suggestions = self.context.config().max_suggestions;

        self.with_state(|state| {
            let mut candidates = Vec::new();
            if let Some(stored) = state.replacements.get(word) {
                candidates.extend(stored.iter().cloned());
            }
            candidates.extend(state.personal.suggest(word, max_suggestions));
            if let Some(backend) = &state.backend {
                candidates.extend(backend.suggest(word, max_suggestions));
            }

            let mut seen = HashSet::new();
            let mut suggestions = Vec::new();
            for candidate in candidates {
                if suggestions.len() == max_suggestions {
                    break;
                }
                if seen.insert(candidate.clone()) && !state.is_excluded(&candidate) {
                    suggestions.push(candidate);
                }
            }
            Ok(suggestions)
        })
    }

    /// Add `word` to the personal word list on disk.
    pub fn add(&self, word: &str) -> Result<()> {
        validate(word)?;
        self.with_state(|state| {
            state.personal.add(word).map_err(|e| list_error(&state.personal, e))?;
            if let Some(exclusions) = state.exclusions.as_mut() {
                exclusions.remove(word).map_err(|e| list_error(exclusions, e))?;
            }
            state.session.unremove(word);
            Ok(())
        })
    }

    /// Accept `word` until this handle is disposed.
    pub fn add_to_session(&self, word: &str) -> Result<()> {
        validate(word)?;
        self.with_state(|state| {
            state.session.add(word);
            Ok(())
        })
    }

    /// Reject `word` from now on, across sessions.
    pub fn remove(&self, word: &str) -> Result<()> {
        validate(word)?;
        self.with_state(|state| {
            state.personal.remove(word).map_err(|e| list_error(&state.personal, e))?;
            if let Some(exclusions) = state.exclusions.as_mut() {
                exclusions.add(word).map_err(|e| list_error(exclusions, e))?;
            }
            state.session.unadd(word);
            Ok(())
        })
    }

    /// Reject `word` until this handle is disposed.
    pub fn remove_from_session(&self, word: &str) -> Result<()> {
        validate(word)?;
        self.with_state(|state| {
            state.session.remove(word);
            Ok(())
        })
    }

    /// Whether `word` was added in this session.
    pub fn is_added(&self, word: &str) -> Result<bool> {
        validate(word)?;
        self.with_state(|state| Ok(state.session.is_added(word)))
    }

    /// Whether `word` was removed in this session.
    pub fn is_removed(&self, word: &str) -> Result<bool> {
        validate(word)?;
        self.with_state(|state| Ok(state.session.is_removed(word)))
    }

    /// Remember that `misspelled` was corrected to `corrected`.
    pub fn store_replacement(&self, misspelled: &str, corrected: &str) -> Result<()> {
        validate(misspelled)?;
        validate(corrected)?;
        self.with_state(|state| {
            let stored = state.replacements.entry(misspelled.to_string()).or_default();
            stored.retain(|w| w != corrected);
            stored.insert(0, corrected.to_string());
            if let Some(backend) = state.backend.as_mut() {
                backend.store_replacement(misspelled, corrected);
            }
            Ok(())
        })
    }

    pub fn info(&self) -> Result<DictionaryInfo> {
        self.with_state(|_| Ok(self.info.clone()))
    }

    /// Run `observer` when this handle is disposed.
    pub fn on_disposed<F>(&self, observer: F) -> Result<()>
    where
        F: FnOnce(&DictionaryInfo) + Send + 'static,
    {
        self.context.ensure_live()?;
        let mut observers = self.observers.lock();
        if self.disposing.load(Ordering::Acquire) {
            return Err(BrokerError::UseAfterDispose("dictionary"));
        }
        observers.push(Box::new(observer));
        Ok(())
    }

    /// Release the backend and session state. Safe to call more than once.
    pub fn dispose(&self) {
        let observers = {
            let mut observers = self.observers.lock();
            if self.disposing.swap(true, Ordering::AcqRel) {
                return;
            }
            mem::take(&mut *observers)
        };

        // Observers still see a usable handle
        for observer in observers {
            observer(&self.info);
        }

        let mut state = self.state.lock();
        state.released = true;
        state.backend = None;
        state.session.clear();
        state.replacements.clear();
        debug!(language = %self.info.language, provider = %self.info.provider.name, "dictionary disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposing.load(Ordering::Acquire)
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> Result<R>) -> Result<R> {
        self.context.ensure_live()?;
        let mut state = self.state.lock();
        if state.released {
            return Err(BrokerError::UseAfterDispose("dictionary"));
        }
        f(&mut state)
    }
}

impl Drop for Dictionary {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("info", &self.info)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

fn validate(word: &str) -> Result<()> {
    if word.is_empty() || word.contains(['\n', '\r']) {
        return Err(BrokerError::InvalidWord(word.to_string()));
    }
    Ok(())
}

fn list_error(list: &PersonalWordList, source: io::Error) -> BrokerError {
    BrokerError::WordList {
        path: list.path().to_path_buf(),
        source,
    }
}

fn ensure_file(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Broker;
    use crate::config::Config;
    use crate::provider::{Provider, ProviderRegistry};
    use crate::error::ProviderError;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    struct Fixed;

    struct FixedDictionary {
        stored: Arc<Mutex<Vec<(String, String)>>>,
    }

    lazy_static::lazy_static! {
        static ref STORED: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    }

    impl Provider for Fixed {
        fn info(&self) -> &ProviderInfo {
            lazy_static::lazy_static! {
                static ref INFO: ProviderInfo = ProviderInfo {
                    name: "fixed".to_string(),
                    description: "Fixed test words".to_string(),
                    origin: PathBuf::from("fixed.provider"),
                };
            }
            &INFO
        }

        fn languages(&self) -> Vec<String> {
            vec!["en_US".to_string()]
        }

        fn request_dictionary(&self, _tag: &str) -> Result<Box<dyn ProviderDictionary>, ProviderError> {
            Ok(Box::new(FixedDictionary { stored: Arc::clone(&STORED) }))
        }
    }

    impl ProviderDictionary for FixedDictionary {
        fn check(&self, word: &str) -> bool {
            matches!(word, "hello" | "world" | "their")
        }

        fn suggest(&self, word: &str, _max: usize) -> Vec<String> {
            match word {
                "helo" => vec!["hello".to_string(), "halo".to_string()],
                _ => Vec::new(),
            }
        }

        fn store_replacement(&mut self, misspelled: &str, corrected: &str) {
            self.stored
                .lock()
                .push((misspelled.to_string(), corrected.to_string()));
        }
    }

    fn broker(user_dir: &Path) -> Broker {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Fixed)).unwrap();
        Broker::with_registry(Config::isolated(user_dir), registry)
    }

    #[test]
    fn test_session_overrides_layer_over_backend() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        let dict = broker.request_dictionary("en_US").unwrap();

        assert!(dict.check("hello").unwrap());
        dict.remove_from_session("hello").unwrap();
        assert!(!dict.check("hello").unwrap());
        assert!(dict.is_removed("hello").unwrap());

        dict.add_to_session("hello").unwrap();
        assert!(dict.check("hello").unwrap());
        assert!(!dict.is_removed("hello").unwrap());
        assert!(dict.is_added("hello").unwrap());
    }

    #[test]
    fn test_remove_persists_as_exclusion() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        let dict = broker.request_dictionary("en_US").unwrap();

        dict.remove("world").unwrap();
        assert!(!dict.check("world").unwrap());
        assert_eq!(
            fs::read_to_string(dir.path().join("en_US.exc")).unwrap(),
            "world\n"
        );

        dict.add("world").unwrap();
        assert!(dict.check("world").unwrap());
        assert_eq!(fs::read_to_string(dir.path().join("en_US.exc")).unwrap(), "");
        assert_eq!(fs::read_to_string(dir.path().join("en_US.dic")).unwrap(), "world\n");
    }

    #[test]
    fn test_suggest_merges_sources_and_filters_exclusions() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        let dict = broker.request_dictionary("en_US").unwrap();

        dict.add("helot").unwrap();
        dict.store_replacement("helo", "hallo").unwrap();
        dict.remove_from_session("halo").unwrap();

        let suggestions = dict.suggest("helo").unwrap();
        assert_eq!(suggestions, vec!["hallo", "helot", "hello"]);
    }

    #[test]
    fn test_store_replacement_reaches_backend() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        let dict = broker.request_dictionary("en_US").unwrap();

        dict.store_replacement("theirs", "their's").unwrap();
        assert!(STORED
            .lock()
            .contains(&("theirs".to_string(), "their's".to_string())));
    }

    #[test]
    fn test_invalid_words_are_rejected() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        let dict = broker.request_dictionary("en_US").unwrap();

        assert!(matches!(dict.check(""), Err(BrokerError::InvalidWord(_))));
        assert!(matches!(dict.add("two\nlines"), Err(BrokerError::InvalidWord(_))));
        assert!(matches!(
            dict.store_replacement("", "x"),
            Err(BrokerError::InvalidWord(_))
        ));
    }

    #[test]
    fn test_dispose_runs_observers_once_while_usable() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        let dict = broker.request_dictionary("en_US").unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        dict.on_disposed(move |info| {
            assert_eq!(info.language, "en_US");
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        dict.dispose();
        dict.dispose();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(dict.is_disposed());
        assert!(matches!(dict.info(), Err(BrokerError::UseAfterDispose(_))));
        assert!(matches!(dict.check("hello"), Err(BrokerError::UseAfterDispose(_))));
        assert!(dict.on_disposed(|_| {}).is_err());
    }

    #[test]
    fn test_observer_can_query_handle() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        let dict = broker.request_dictionary("en_US").unwrap();
        dict.add_to_session("ferris").unwrap();

        let observed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed);
        let handle = Arc::clone(&dict);
        dict.on_disposed(move |_| {
            flag.store(handle.is_added("ferris").unwrap_or(false), Ordering::SeqCst);
        })
        .unwrap();

        dict.dispose();
        assert!(observed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_disposes() {
        let dir = tempdir().unwrap();
        let broker = broker(dir.path());
        broker.set_cache_dictionaries(false);
        let dict = broker.request_dictionary("en_US").unwrap();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        dict.on_disposed(move |_| flag.store(true, Ordering::SeqCst)).unwrap();

        drop(dict);
        assert!(fired.load(Ordering::SeqCst));
    }
}
