use crate::provider::wordlist::WordSet;
use std::cmp::Ordering;

/// Generate spelling suggestions from an FST word set
pub fn generate(word: &str, words: &WordSet, max_suggestions: usize) -> Vec<String> {
    if max_suggestions == 0 || word.is_empty() {
        return Vec::new();
    }

    // Try progressively more expensive operations
    let mut candidates = Vec::new();

    // 1. Words sharing a three character prefix (fast)
    if let Some(prefix) = char_prefix(word, 3) {
        candidates.extend(
            words
                .words_with_prefix(prefix)
                .into_iter()
                .filter(|w| strsim::damerau_levenshtein(word, w) <= 2),
        );
    }

    // 2. Single edits that land in the dictionary
    for edit in single_edits(word, &alphabet(word)) {
        if words.contains(&edit) {
            candidates.push(edit);
        }
    }

    // 3. Shorter prefix for short words
    if candidates.len() < max_suggestions && word.chars().count() <= 5 {
        if let Some(prefix) = char_prefix(word, 2) {
            candidates.extend(
                words
                    .words_with_prefix(prefix)
                    .into_iter()
                    .filter(|w| strsim::damerau_levenshtein(word, w) <= 3),
            );
        }
    }

    let mut ranked = rank(word, candidates, 3);
    ranked.truncate(max_suggestions);
    ranked
}

/// Order candidates by edit distance, then by similarity, dropping
/// duplicates, the word itself and anything further than `max_distance`.
pub fn rank<I>(word: &str, candidates: I, max_distance: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut scored: Vec<(usize, f64, String)> = Vec::new();
    for candidate in candidates {
        if candidate == word || scored.iter().any(|(_, _, c)| *c == candidate) {
            continue;
        }
        let distance = strsim::damerau_levenshtein(word, &candidate);
        if distance <= max_distance {
            let similarity = strsim::jaro_winkler(word, &candidate);
            scored.push((distance, similarity, candidate));
        }
    }

    scored.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
    });
    scored.into_iter().map(|(_, _, c)| c).collect()
}

/// All strings one deletion, transposition, replacement or insertion away.
pub fn single_edits(word: &str, alphabet: &[char]) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    let mut edits = Vec::new();

    // Deletions
    for i in 0..chars.len() {
        let mut new_word = chars.clone();
        new_word.remove(i);
        edits.push(new_word.iter().collect());
    }

    // Transpositions (swap adjacent)
    for i in 0..chars.len().saturating_sub(1) {
        if chars[i] != chars[i + 1] {
            let mut new_word = chars.clone();
            new_word.swap(i, i + 1);
            edits.push(new_word.iter().collect());
        }
    }

    // Replacements
    for i in 0..chars.len() {
        for &ch in alphabet {
            if ch != chars[i] {
                let mut new_word = chars.clone();
                new_word[i] = ch;
                edits.push(new_word.iter().collect());
            }
        }
    }

    // Insertions
    for i in 0..=chars.len() {
        for &ch in alphabet {
            let mut new_word = chars.clone();
            new_word.insert(i, ch);
            edits.push(new_word.iter().collect());
        }
    }

    edits
}

/// ASCII lowercase letters plus any other letters the word already uses.
fn alphabet(word: &str) -> Vec<char> {
    let mut letters: Vec<char> = ('a'..='z').collect();
    for ch in word.chars() {
        if ch.is_alphabetic() && !letters.contains(&ch) {
            letters.push(ch);
        }
    }
    letters
}

fn char_prefix(word: &str, n: usize) -> Option<&str> {
    word.char_indices()
        .nth(n)
        .map(|(idx, _)| &word[..idx])
        .or_else(|| (word.chars().count() == n).then_some(word))
}
