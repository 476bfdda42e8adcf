//! AFINN-165 lexicon scorer.
//!
//! Each known word carries an integer valence in -5..=5; the comment's score
//! is the sum over its tokens. A negator immediately before a word flips that
//! word's valence ("not good" scores -3). Emoji are scored from their own
//! table so that "😍" counts like "love".

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::{ScorerError, SentimentScorer};

/// AFINN-165 word list, one `word<TAB>valence` entry per line.
const AFINN_165: &str = include_str!("afinn-165.txt");

/// Restaurant vocabulary missing from AFINN-165. AFINN entries win on overlap.
const RESTAURANT_WORDS: &[(&str, i32)] = &[
    ("attentive", 2),
    ("bland", -2),
    ("cozy", 2),
    ("mediocre", -3),
    ("slow", -2),
    ("stale", -2),
    ("tasty", 2),
    ("unfriendly", -2),
    ("welcoming", 2),
];

const EMOJI: &[(&str, i32)] = &[
    ("😀", 2),
    ("😃", 2),
    ("😄", 2),
    ("😊", 2),
    ("🙂", 1),
    ("😋", 2),
    ("😍", 3),
    ("🥰", 3),
    ("❤", 3),
    ("❤️", 3),
    ("👍", 2),
    ("😕", -1),
    ("🙁", -1),
    ("☹️", -2),
    ("😞", -2),
    ("😢", -2),
    ("😭", -2),
    ("😠", -3),
    ("😡", -3),
    ("🤮", -3),
    ("👎", -2),
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "non", "cant", "can't", "cannot", "dont", "don't", "doesnt", "doesn't",
    "didnt", "didn't", "isnt", "isn't", "wasnt", "wasn't", "arent", "aren't", "werent", "weren't",
    "wont", "won't", "wouldnt", "wouldn't", "hardly",
];

/// Characters stripped before tokenizing.
const PUNCTUATION: &str = r#"[.,/#!?$%^&*;:{}=_`"~()\r\n]"#;

/// Default scorer: sums word and emoji valences with single-token negation.
pub struct LexiconScorer {
    valences: HashMap<String, i32>,
    negators: Vec<&'static str>,
    punctuation: Option<Regex>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    pub fn new() -> Self {
        let mut valences: HashMap<String, i32> = afinn()
            .iter()
            .map(|(&word, &score)| (word.to_string(), score))
            .collect();
        for &(word, score) in RESTAURANT_WORDS {
            valences.entry(word.to_string()).or_insert(score);
        }
        for &(emoji, score) in EMOJI {
            valences.insert(emoji.to_string(), score);
        }

        let punctuation = match Regex::new(PUNCTUATION) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Punctuation pattern failed to compile, tokenizing on whitespace only"
                );
                None
            }
        };

        Self {
            valences,
            negators: NEGATORS.to_vec(),
            punctuation,
        }
    }

    /// Add or replace entries. Keys are lowercased.
    #[must_use]
    pub fn with_overrides<I, S>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (S, i32)>,
        S: AsRef<str>,
    {
        for (word, score) in overrides {
            self.valences.insert(word.as_ref().to_lowercase(), score);
        }
        self
    }

    pub fn valence(&self, token: &str) -> Option<i32> {
        self.valences.get(token).copied()
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let cleaned = match &self.punctuation {
            Some(re) => re.replace_all(&lower, " ").into_owned(),
            None => lower,
        };
        cleaned.split_whitespace().map(str::to_string).collect()
    }

    fn is_negator(&self, token: &str) -> bool {
        self.negators.contains(&token)
    }

    /// Integer score of `text`.
    pub fn score_text(&self, text: &str) -> i32 {
        let tokens = self.tokenize(text);
        let mut total = 0;

        for (i, token) in tokens.iter().enumerate() {
            let Some(valence) = self.valence(token) else {
                continue;
            };
            let negated = i > 0 && self.is_negator(&tokens[i - 1]);
            total += if negated { -valence } else { valence };
        }

        total
    }
}

/// Parsed AFINN-165 table, built on first use.
fn afinn() -> &'static HashMap<&'static str, i32> {
    static TABLE: OnceLock<HashMap<&'static str, i32>> = OnceLock::new();
    TABLE.get_or_init(|| parse_word_list(AFINN_165))
}

/// Parse `word<TAB>valence` lines. Phrases are skipped since tokens never
/// contain whitespace; malformed lines are logged and skipped.
fn parse_word_list(text: &'static str) -> HashMap<&'static str, i32> {
    let mut table = HashMap::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let parsed = line
            .rsplit_once('\t')
            .and_then(|(word, score)| Some((word, score.parse::<i32>().ok()?)));
        match parsed {
            Some((word, _)) if word.contains(' ') => {}
            Some((word, score)) => {
                table.insert(word, score);
            }
            None => {
                tracing::warn!(line = idx + 1, entry = line, "Skipping malformed lexicon line");
            }
        }
    }
    table
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> Result<f64, ScorerError> {
        Ok(f64::from(self.score_text(text)))
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}
