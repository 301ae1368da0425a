use std::collections::HashSet;

/// Collapse runs of whitespace (including newlines left by PDF reflow) to
/// single spaces and trim the ends.
pub fn normalize(sentence: &str) -> String {
    sentence.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Within-pass deduplication keyed on (cadence, normalized description),
/// insertion order preserved. Local to one ingestion call; cross-document
/// dedup is the store's uniqueness constraint.
#[derive(Debug, Default)]
pub struct PassDedup {
    seen: HashSet<(String, String)>,
}

impl PassDedup {
    pub fn new() -> Self {
        PassDedup::default()
    }

    /// True if this (cadence, description) pair has not been seen yet.
    pub fn admit(&mut self, cadence: &str, description: &str) -> bool {
        self.seen
            .insert((cadence.to_string(), description.to_string()))
    }
}

// ── Tests ──
