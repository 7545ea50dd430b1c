use crate::error::ProviderError;
use crate::provider::{
    case_variants, suggestions, tag_from_file, Provider, ProviderDictionary, ProviderInfo,
};
use flate2::read::GzDecoder;
use fst::{Automaton, IntoStreamer, Set, SetBuilder, Streamer};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const ENGINE: &str = "wordlist";
pub const DESCRIPTION: &str = "FST word list provider";

// Preferred first when several files exist for one language.
const EXTENSIONS: [&str; 3] = ["dict", "txt.gz", "txt"];

enum FstBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl AsRef<[u8]> for FstBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FstBytes::Mapped(map) => &map[..],
            FstBytes::Owned(bytes) => bytes.as_slice(),
        }
    }
}

/// Sorted, lowercased word set stored as an FST.
pub struct WordSet {
    set: Set<FstBytes>,
}

impl WordSet {
    /// Load a word set from a `.dict`, `.txt` or `.txt.gz` file
    pub fn open(path: &Path) -> Result<Self, fst::Error> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(".dict") {
            Self::load_compiled(path)
        } else if name.ends_with(".gz") {
            let file = File::open(path)?;
            Self::from_reader(GzDecoder::new(file))
        } else {
            Self::from_reader(File::open(path)?)
        }
    }

    /// Memory-map a prebuilt FST
    pub fn load_compiled(path: &Path) -> Result<Self, fst::Error> {
        let file = File::open(path)?;
        // SAFETY: dictionary files are treated as read-only for the lifetime of the map.
        let map = unsafe { Mmap::map(&file)? };
        let set = Set::new(FstBytes::Mapped(map))?;
        Ok(Self { set })
    }

    fn from_reader(reader: impl Read) -> Result<Self, fst::Error> {
        let mut words = Vec::new();
        for line in BufReader::new(reader).lines() {
            let word = line?;
            let word = word.trim();
            if !word.is_empty() && !word.starts_with('#') {
                words.push(word.to_string());
            }
        }
        Self::from_words(words)
    }

    /// Build an in-memory set from arbitrary words
    pub fn from_words<I>(words: I) -> Result<Self, fst::Error>
    where
        I: IntoIterator<Item = String>,
    {
        let mut builder = SetBuilder::memory();
        for word in normalize(words) {
            builder.insert(word.as_bytes())?;
        }
        let bytes = builder.into_inner()?;
        let set = Set::new(FstBytes::Owned(bytes))?;
        Ok(Self { set })
    }

    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Get all words with a given prefix
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut results = Vec::new();
        let mut stream = self
            .set
            .search(fst::automaton::Str::new(prefix).starts_with())
            .into_stream();

        while let Some(key) = stream.next() {
            if let Ok(word) = String::from_utf8(key.to_vec()) {
                results.push(word);
            }
        }

        results
    }
}

/// Write a compiled `.dict` file from a word list
pub fn compile<I>(words: I, output_path: &Path) -> Result<(), fst::Error>
where
    I: IntoIterator<Item = String>,
{
    let file = File::create(output_path)?;
    let mut builder = SetBuilder::new(BufWriter::new(file))?;
    for word in normalize(words) {
        builder.insert(word.as_bytes())?;
    }
    builder.finish()
}

fn normalize<I>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut sorted: Vec<String> = words
        .into_iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    sorted.sort();
    sorted.dedup();
    sorted
}

pub struct WordlistProvider {
    info: ProviderInfo,
    dirs: Vec<PathBuf>,
}

impl WordlistProvider {
    pub fn new(info: ProviderInfo, dirs: Vec<PathBuf>) -> Self {
        Self { info, dirs }
    }

    fn dictionary_files(&self) -> impl Iterator<Item = (String, PathBuf)> + '_ {
        self.dirs.iter().flat_map(|dir| {
            WalkDir::new(dir)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| {
                    let path = entry.into_path();
                    tag_from_file(&path, &EXTENSIONS).map(|tag| (tag, path))
                })
        })
    }

    fn find(&self, tag: &str) -> Option<PathBuf> {
        self.dirs.iter().find_map(|dir| {
            EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}.{}", tag, ext)))
                .find(|path| path.is_file())
        })
    }
}

impl Provider for WordlistProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    fn languages(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for (tag, _) in self.dictionary_files() {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        tags
    }

    fn dictionary_exists(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    fn request_dictionary(&self, tag: &str) -> Result<Box<dyn ProviderDictionary>, ProviderError> {
        let path = self.find(tag).ok_or_else(|| ProviderError::Unsupported {
            provider: self.info.name.clone(),
            tag: tag.to_string(),
        })?;

        let words = WordSet::open(&path).map_err(|e| ProviderError::load(ENGINE, tag, &path, e))?;
        debug!(provider = %self.info.name, tag, words = words.len(), "loaded word list");

        Ok(Box::new(WordlistDictionary { words }))
    }
}

struct WordlistDictionary {
    words: WordSet,
}

impl ProviderDictionary for WordlistDictionary {
    fn check(&self, word: &str) -> bool {
        // Entries are stored lowercase
        case_variants(word).iter().any(|w| self.words.contains(w))
    }

    fn suggest(&self, word: &str, max_suggestions: usize) -> Vec<String> {
        suggestions::generate(&word.to_lowercase(), &self.words, max_suggestions)
    }
}
