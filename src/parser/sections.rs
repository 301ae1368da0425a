use std::sync::LazyLock;

use regex::Regex;

// Marker consumes its trailing whitespace so each block starts at the first
// real character after the cadence token.
static CADENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Cadence:\s*([0-9.]+)\s*").unwrap());

/// One cadence-labeled block of raw text. Transient: consumed by the
/// classifier, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceSection {
    pub cadence: String,
    pub text: String,
}

/// Split full document text into cadence-labeled blocks. Text before the
/// first marker is preamble and is dropped. A document with no marker yields
/// an empty sequence, not an error.
pub fn split_cadences(text: &str) -> Vec<CadenceSection> {
    let markers: Vec<(String, usize, usize)> = CADENCE_RE
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            (caps[1].trim().to_string(), whole.start(), whole.end())
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, (cadence, _, block_start))| {
            let block_end = markers.get(i + 1).map(|m| m.1).unwrap_or(text.len());
            CadenceSection {
                cadence: cadence.clone(),
                text: text[*block_start..block_end].to_string(),
            }
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sections_preamble_dropped() {
        let sections = split_cadences("preamble Cadence: 1.0 textA Cadence: 2.0 textB");
        assert_eq!(
            sections,
            vec![
                CadenceSection {
                    cadence: "1.0".to_string(),
                    text: "textA ".to_string(),
                },
                CadenceSection {
                    cadence: "2.0".to_string(),
                    text: "textB".to_string(),
                },
            ]
        );
    }

    #[test]
    fn no_marker_yields_empty() {
        assert!(split_cadences("just prose with no markers at all").is_empty());
        assert!(split_cadences("").is_empty());
    }

    #[test]
    fn marker_on_its_own_line() {
        let sections = split_cadences("intro\nCadence: 3.1\nThe system shall respond.\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].cadence, "3.1");
        assert_eq!(sections[0].text, "The system shall respond.\n");
    }

    #[test]
    fn last_block_runs_to_end_of_text() {
        let sections = split_cadences("Cadence: 1.0 a Cadence: 2.0 b c d");
        assert_eq!(sections[1].text, "b c d");
    }

    #[test]
    fn repeated_label_emitted_twice() {
        let sections = split_cadences("Cadence: 1.0 a Cadence: 1.0 b");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].cadence, "1.0");
        assert_eq!(sections[1].cadence, "1.0");
    }
}
