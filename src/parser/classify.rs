use anyhow::Result;
use regex::Regex;

use super::sentences;

/// Obligation tokens recognized in whole-sentence matching.
pub const SENTENCE_TOKENS: &[&str] = &[
    "shall",
    "should",
    "must",
    "will",
    "required",
    "need to",
    "required to",
];

/// Narrower token set used by fragment matching, kept separate because the
/// two ingestion modes historically diverged.
pub const FRAGMENT_TOKENS: &[&str] =
    &["shall", "should", "must", "will", "need to", "required to"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Granularity {
    /// Split the block into sentences and keep those containing a token.
    Sentence,
    /// Match token-bearing runs between terminal punctuation marks directly.
    Fragment,
}

/// Classification policy: which tokens count as an obligation, at what
/// granularity they are matched, and whether matching is case-sensitive.
#[derive(Debug, Clone)]
pub struct Policy {
    pub granularity: Granularity,
    pub tokens: Vec<String>,
    pub case_sensitive: bool,
}

impl Policy {
    pub fn for_granularity(granularity: Granularity) -> Self {
        let defaults = match granularity {
            Granularity::Sentence => SENTENCE_TOKENS,
            Granularity::Fragment => FRAGMENT_TOKENS,
        };
        Policy {
            granularity,
            tokens: defaults.iter().map(|t| t.to_string()).collect(),
            case_sensitive: false,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::for_granularity(Granularity::Sentence)
    }
}

pub struct Classifier {
    granularity: Granularity,
    token_re: Regex,
    fragment_re: Regex,
}

impl Classifier {
    pub fn new(policy: &Policy) -> Result<Self> {
        let alternation = policy
            .tokens
            .iter()
            .map(|t| regex::escape(t.trim()))
            .collect::<Vec<_>>()
            .join("|");
        let flags = if policy.case_sensitive { "" } else { "(?i)" };
        let token_re = Regex::new(&format!(r"{flags}\b(?:{alternation})\b"))?;
        let fragment_re = Regex::new(&format!(
            r"{flags}[^.?!]*\b(?:{alternation})\b[^.?!]*[.?!]"
        ))?;
        Ok(Classifier {
            granularity: policy.granularity,
            token_re,
            fragment_re,
        })
    }

    /// Candidate requirement statements from one cadence block, lazily, in
    /// appearance order. Calling again restarts from the top of the block.
    pub fn candidates<'a>(&'a self, block: &'a str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self.granularity {
            Granularity::Sentence => Box::new(
                sentences::split(block).filter(|sentence| self.token_re.is_match(sentence)),
            ),
            Granularity::Fragment => {
                Box::new(self.fragment_re.find_iter(block).map(|m| m.as_str()))
            }
        }
    }
}

// ── Tests ──
