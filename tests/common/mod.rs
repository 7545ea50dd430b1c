#![allow(dead_code)]

use spellbroker::{Broker, Config};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const AFF: &str = "SET UTF-8\nTRY esianrtolcdugmphbyfvkwz\nREP 1\nREP f ph\n";
pub const DIC: &str = "8\nhello/S\nhelp/SM\nworld/S\nword/S\nspell/SG\ncheck/SG\nphone/S\nParis\n";
pub const WORDS: &str = "hello\nhelp\nworld\nword\nspell\nchecker\n";

/// A throwaway environment with two providers that both serve `en_US`:
/// `myspell` (sorted first) and `wordlist`.
pub struct Fixture {
    root: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let fixture = Self { root };

        let providers = fixture.providers_dir();
        fs::create_dir_all(&providers).unwrap();
        fs::write(
            providers.join("myspell.provider"),
            "engine = \"myspell\"\ndescription = \"Fixture myspell\"\ndictionary_dirs = [\"../dicts/myspell\"]\n",
        )
        .unwrap();
        fs::write(
            providers.join("wordlist.provider"),
            "engine = \"wordlist\"\ndictionary_dirs = [\"../dicts/wordlist\"]\n",
        )
        .unwrap();

        let myspell = fixture.path().join("dicts").join("myspell");
        fs::create_dir_all(&myspell).unwrap();
        fs::write(myspell.join("en_US.dic"), DIC).unwrap();
        fs::write(myspell.join("en_US.aff"), AFF).unwrap();

        let wordlist = fixture.path().join("dicts").join("wordlist");
        fs::create_dir_all(&wordlist).unwrap();
        fs::write(wordlist.join("en_US.txt"), WORDS).unwrap();
        fs::write(wordlist.join("de.txt"), "hallo\nwelt\n").unwrap();

        fixture
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn providers_dir(&self) -> PathBuf {
        self.path().join("providers")
    }

    pub fn user_dir(&self) -> PathBuf {
        self.path().join("user")
    }

    pub fn config(&self) -> Config {
        let mut config = Config::isolated(self.user_dir());
        config.provider_dirs = vec![self.providers_dir()];
        config
    }

    pub fn broker(&self) -> Broker {
        Broker::with_config(self.config())
    }
}

/// A word no dictionary will know about.
pub fn random_word() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let mut state = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
        .wrapping_add(COUNTER.fetch_add(1, Ordering::Relaxed));

    (0..12)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            char::from(b'A' + ((state >> 33) % 26) as u8)
        })
        .collect()
}
