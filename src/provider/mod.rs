pub mod myspell;
pub mod registry;
pub mod suggestions;
pub mod wordlist;

use crate::error::ProviderError;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use registry::ProviderRegistry;

/// Metadata describing one backend engine instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub description: String,
    /// Manifest (or other source) the provider was loaded from.
    pub origin: PathBuf,
}

/// Snapshot of the language and provider behind a dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DictionaryInfo {
    pub language: String,
    pub provider: ProviderInfo,
}

/// A spell-checking engine able to open dictionaries for some languages.
pub trait Provider: Send + Sync {
    fn info(&self) -> &ProviderInfo;

    /// Language tags this provider can currently serve.
    fn languages(&self) -> Vec<String>;

    fn dictionary_exists(&self, tag: &str) -> bool {
        self.languages().iter().any(|lang| lang == tag)
    }

    fn request_dictionary(&self, tag: &str) -> Result<Box<dyn ProviderDictionary>, ProviderError>;
}

/// One loaded language dictionary inside a provider.
pub trait ProviderDictionary: Send {
    fn check(&self, word: &str) -> bool;

    /// Candidate corrections, most relevant first.
    fn suggest(&self, word: &str, max_suggestions: usize) -> Vec<String>;

    /// Hint that `misspelled` was corrected to `corrected`.
    fn store_replacement(&mut self, _misspelled: &str, _corrected: &str) {}
}

/// Spellings a lookup should also accept: `Hello` matches `hello`,
/// `HELLO` matches `hello` and `Hello`.
pub(crate) fn case_variants(word: &str) -> Vec<String> {
    let mut variants = vec![word.to_string()];
    let mut chars = word.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return variants,
    };
    let rest: String = chars.collect();

    let all_caps = word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase);
    let title = first.is_uppercase() && !rest.chars().any(char::is_uppercase);

    if all_caps || title {
        variants.push(word.to_lowercase());
    }
    if all_caps && !rest.is_empty() {
        variants.push(format!("{}{}", first, rest.to_lowercase()));
    }
    variants.dedup();
    variants
}

/// Strip up to two extensions (`en_US.txt.gz` -> `en_US`) when they match `exts`.
pub(crate) fn tag_from_file(path: &Path, exts: &[&str]) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    exts.iter().find_map(|ext| {
        name.strip_suffix(ext)
            .and_then(|stem| stem.strip_suffix('.'))
            .filter(|stem| !stem.is_empty())
            .map(str::to_string)
    })
}
