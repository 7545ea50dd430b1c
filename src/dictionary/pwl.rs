use crate::provider::{case_variants, suggestions};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

/// A flat one-word-per-line file, reloaded whenever it changes on disk.
///
/// The file is only created on the first write.
#[derive(Debug)]
pub struct PersonalWordList {
    path: PathBuf,
    words: HashSet<String>,
    stamp: Option<Stamp>,
}

/// Modification time and length, used to notice edits by other writers.
type Stamp = (SystemTime, u64);

impl PersonalWordList {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut list = Self {
            path: path.into(),
            words: HashSet::new(),
            stamp: None,
        };
        list.refresh();
        list
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&mut self, word: &str) -> bool {
        self.refresh();
        case_variants(word).iter().any(|w| self.words.contains(w))
    }

    pub fn add(&mut self, word: &str) -> io::Result<()> {
        self.refresh();
        if self.words.contains(word) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let needs_newline = fs::read(&self.path)
            .map(|bytes| bytes.last().is_some_and(|b| *b != b'\n'))
            .unwrap_or(false);

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if needs_newline {
            file.write_all(b"\n")?;
        }
        writeln!(file, "{}", word)?;
        drop(file);

        self.words.insert(word.to_string());
        self.stamp = stamp(&self.path);
        Ok(())
    }

    /// Drop every entry `contains(word)` would match.
    pub fn remove(&mut self, word: &str) -> io::Result<()> {
        self.refresh();
        let matching: HashSet<String> = case_variants(word)
            .into_iter()
            .filter(|variant| self.words.contains(variant))
            .collect();
        if matching.is_empty() {
            return Ok(());
        }

        let content = fs::read_to_string(&self.path)?;
        let kept: String = content
            .lines()
            .filter(|line| !matching.contains(line.trim()))
            .map(|line| format!("{}\n", line))
            .collect();
        fs::write(&self.path, kept)?;

        self.words.retain(|entry| !matching.contains(entry));
        self.stamp = stamp(&self.path);
        Ok(())
    }

    /// Entries within two edits of `word`, closest first.
    pub fn suggest(&mut self, word: &str, max_suggestions: usize) -> Vec<String> {
        self.refresh();
        let mut ranked = suggestions::rank(word, self.words.iter().cloned(), 2);
        ranked.truncate(max_suggestions);
        ranked
    }

    pub fn len(&mut self) -> usize {
        self.refresh();
        self.words.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    fn refresh(&mut self) {
        let current = stamp(&self.path);
        if current.is_some() && current == self.stamp {
            return;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => {
                self.words = parse(&content);
                self.stamp = current;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.words.clear();
                self.stamp = None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read word list");
            }
        }
    }
}

fn parse(content: &str) -> HashSet<String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(str::trim)
        .filter(|word| !word.is_empty() && !word.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn stamp(path: &Path) -> Option<Stamp> {
    let metadata = fs::metadata(path).ok()?;
    Some((metadata.modified().ok()?, metadata.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty_and_created_on_add() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("en_US.dic");

        let mut list = PersonalWordList::open(&path);
        assert!(list.is_empty());
        assert!(!path.exists());

        list.add("QWERTY").unwrap();
        list.add("QWERTY").unwrap();
        assert!(list.contains("QWERTY"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "QWERTY\n");
    }

    #[test]
    fn test_remove_rewrites_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.dic");
        fs::write(&path, "\u{feff}# my words\nalpha\nbeta\ngamma").unwrap();

        let mut list = PersonalWordList::open(&path);
        assert_eq!(list.len(), 3);

        list.remove("beta").unwrap();
        assert!(!list.contains("beta"));
        list.add("delta").unwrap();

        let reopened = PersonalWordList::open(&path).words;
        assert!(reopened.contains("alpha"));
        assert!(reopened.contains("gamma"));
        assert!(reopened.contains("delta"));
        assert!(!reopened.contains("beta"));
    }

    #[test]
    fn test_case_variants_match() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.dic");
        fs::write(&path, "rustacean\n").unwrap();

        let mut list = PersonalWordList::open(&path);
        assert!(list.contains("Rustacean"));
        assert!(list.contains("RUSTACEAN"));
        assert!(!list.words.contains("Rustacean"));
    }

    #[test]
    fn test_remove_matches_like_contains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.dic");
        fs::write(&path, "hello\nHello\nParis\n").unwrap();

        let mut list = PersonalWordList::open(&path);
        list.remove("HELLO").unwrap();
        assert!(!list.contains("HELLO"));
        assert!(!list.contains("hello"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "Paris\n");

        // A lowercase removal leaves the capitalized entry alone
        list.remove("paris").unwrap();
        assert!(list.contains("Paris"));
        assert!(!list.contains("paris"));
    }

    #[test]
    fn test_picks_up_external_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.dic");

        let mut list = PersonalWordList::open(&path);
        assert!(!list.contains("ferris"));

        fs::write(&path, "ferris\n").unwrap();
        assert!(list.contains("ferris"));
    }

    #[test]
    fn test_suggest_from_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("words.dic");
        fs::write(&path, "ferris\nrustacean\n").unwrap();

        let mut list = PersonalWordList::open(&path);
        assert_eq!(list.suggest("feris", 5), vec!["ferris"]);
    }
}
