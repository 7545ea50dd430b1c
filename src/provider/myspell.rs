use crate::error::ProviderError;
use crate::provider::{case_variants, suggestions, tag_from_file, Provider, ProviderDictionary, ProviderInfo};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const ENGINE: &str = "myspell";
pub const DESCRIPTION: &str = "Hunspell-format word list provider";

/// Directives read from a `.aff` file. Affix classes are not expanded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AffixHints {
    /// Characters to try when generating suggestions, in priority order.
    pub try_chars: Vec<char>,
    /// Common misspelling patterns: (from, to).
    pub replacements: Vec<(String, String)>,
}

impl AffixHints {
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut hints = AffixHints::default();

        for line in content.lines() {
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("SET") => {
                    let encoding = fields.next().unwrap_or("");
                    if !encoding.eq_ignore_ascii_case("UTF-8") {
                        return Err(format!("unsupported encoding {}", encoding));
                    }
                }
                Some("TRY") => {
                    hints.try_chars = fields.next().unwrap_or("").chars().collect();
                }
                Some("REP") => {
                    // The first REP line only carries the entry count.
                    if let (Some(from), Some(to)) = (fields.next(), fields.next()) {
                        hints
                            .replacements
                            .push((from.replace('_', " "), to.replace('_', " ")));
                    }
                }
                _ => {}
            }
        }

        Ok(hints)
    }
}

/// Parse `.dic` content: optional count line, then `word[/FLAGS]` entries.
pub fn parse_words(content: &str) -> HashSet<String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().peekable();

    if let Some(first) = lines.peek() {
        if first.trim().parse::<usize>().is_ok() {
            lines.next();
        }
    }

    lines
        .filter_map(|line| {
            let entry = line.split(['/', '\t', ' ']).next()?.trim();
            (!entry.is_empty()).then(|| entry.to_string())
        })
        .collect()
}

pub struct MyspellProvider {
    info: ProviderInfo,
    dirs: Vec<PathBuf>,
}

impl MyspellProvider {
    pub fn new(info: ProviderInfo, dirs: Vec<PathBuf>) -> Self {
        Self { info, dirs }
    }

    /// Both halves of a dictionary must sit in the same directory.
    fn find(&self, tag: &str) -> Option<(PathBuf, PathBuf)> {
        self.dirs.iter().find_map(|dir| {
            let dic = dir.join(format!("{}.dic", tag));
            let aff = dir.join(format!("{}.aff", tag));
            (dic.is_file() && aff.is_file()).then_some((dic, aff))
        })
    }
}

impl Provider for MyspellProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    fn languages(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for dir in &self.dirs {
            let entries = WalkDir::new(dir)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok);
            for entry in entries {
                if let Some(tag) = tag_from_file(entry.path(), &["dic"]) {
                    if dir.join(format!("{}.aff", tag)).is_file() && !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
            }
        }
        tags
    }

    fn dictionary_exists(&self, tag: &str) -> bool {
        self.find(tag).is_some()
    }

    fn request_dictionary(&self, tag: &str) -> Result<Box<dyn ProviderDictionary>, ProviderError> {
        let (dic, aff) = self.find(tag).ok_or_else(|| ProviderError::Unsupported {
            provider: self.info.name.clone(),
            tag: tag.to_string(),
        })?;

        let affix = fs::read_to_string(&aff).map_err(|e| ProviderError::load(ENGINE, tag, &aff, e))?;
        let hints = AffixHints::parse(&affix).map_err(|e| ProviderError::load(ENGINE, tag, &aff, e))?;
        let words = read_dic(&dic).map_err(|e| ProviderError::load(ENGINE, tag, &dic, e))?;
        debug!(provider = %self.info.name, tag, words = words.len(), "loaded myspell dictionary");

        Ok(Box::new(MyspellDictionary::new(words, hints)))
    }
}

fn read_dic(path: &Path) -> std::io::Result<HashSet<String>> {
    fs::read_to_string(path).map(|content| parse_words(&content))
}

pub struct MyspellDictionary {
    words: HashSet<String>,
    hints: AffixHints,
    alphabet: Vec<char>,
}

impl MyspellDictionary {
    pub fn new(words: HashSet<String>, hints: AffixHints) -> Self {
        let mut alphabet = hints.try_chars.clone();
        if alphabet.is_empty() {
            let mut seen: Vec<char> = words.iter().flat_map(|w| w.chars()).collect();
            seen.sort_unstable();
            seen.dedup();
            alphabet = seen;
        }
        Self { words, hints, alphabet }
    }

    fn accepts(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

impl ProviderDictionary for MyspellDictionary {
    fn check(&self, word: &str) -> bool {
        case_variants(word).iter().any(|w| self.accepts(w))
    }

    fn suggest(&self, word: &str, max_suggestions: usize) -> Vec<String> {
        let mut candidates = Vec::new();

        for (from, to) in &self.hints.replacements {
            for (idx, _) in word.match_indices(from.as_str()) {
                let candidate = format!("{}{}{}", &word[..idx], to, &word[idx + from.len()..]);
                if self.check(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        let lower = word.to_lowercase();
        candidates.extend(
            suggestions::single_edits(&lower, &self.alphabet)
                .into_iter()
                .filter(|edit| self.accepts(edit)),
        );

        let mut ranked = suggestions::rank(word, candidates, 2);
        ranked.truncate(max_suggestions);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const AFF: &str = "SET UTF-8\nTRY esianrtolcdugmphbyfvkwz\nREP 2\nREP f ph\nREP ph f\n";
    const DIC: &str = "5\nhello/S\nhelp/SM\nworld\nParis\nphone/S\n";

    fn provider(dir: &Path) -> MyspellProvider {
        MyspellProvider::new(
            ProviderInfo {
                name: "myspell".to_string(),
                description: DESCRIPTION.to_string(),
                origin: dir.join("myspell.provider"),
            },
            vec![dir.to_path_buf()],
        )
    }

    #[test]
    fn test_parse_words_strips_flags_and_count() {
        let words = parse_words(DIC);
        assert_eq!(words.len(), 5);
        assert!(words.contains("hello"));
        assert!(words.contains("help"));
        assert!(!words.contains("5"));
    }

    #[test]
    fn test_parse_affix_hints() {
        let hints = AffixHints::parse(AFF).unwrap();
        assert_eq!(hints.try_chars.first(), Some(&'e'));
        assert_eq!(
            hints.replacements,
            vec![
                ("f".to_string(), "ph".to_string()),
                ("ph".to_string(), "f".to_string())
            ]
        );
        assert!(AffixHints::parse("SET ISO8859-1\n").is_err());
    }

    #[test]
    fn test_check_case_rules() {
        let dict = MyspellDictionary::new(parse_words(DIC), AffixHints::parse(AFF).unwrap());
        assert!(dict.check("hello"));
        assert!(dict.check("Hello"));
        assert!(dict.check("HELLO"));
        assert!(dict.check("Paris"));
        assert!(dict.check("PARIS"));
        assert!(!dict.check("paris"));
        assert!(!dict.check("helo"));
    }

    #[test]
    fn test_suggest_uses_try_and_rep() {
        let dict = MyspellDictionary::new(parse_words(DIC), AffixHints::parse(AFF).unwrap());
        assert!(dict.suggest("helo", 5).contains(&"hello".to_string()));
        assert!(dict.suggest("fone", 5).contains(&"phone".to_string()));
        assert_eq!(dict.suggest("helo", 1).len(), 1);
    }

    #[test]
    fn test_requires_aff_and_dic() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("en_US.dic"), DIC).unwrap();
        fs::write(dir.path().join("de_DE.dic"), DIC).unwrap();
        fs::write(dir.path().join("en_US.aff"), AFF).unwrap();

        let provider = provider(dir.path());
        assert_eq!(provider.languages(), vec!["en_US"]);
        assert!(!provider.dictionary_exists("de_DE"));
        assert!(provider.request_dictionary("en_US").unwrap().check("world"));
    }

    #[test]
    fn test_bad_encoding_is_load_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("en_US.dic"), DIC).unwrap();
        fs::write(dir.path().join("en_US.aff"), "SET KOI8-R\n").unwrap();

        let err = provider(dir.path()).request_dictionary("en_US").err().unwrap();
        assert!(matches!(err, ProviderError::DictionaryLoad { .. }));
    }
}
