use std::collections::HashMap;

use super::types::{ChannelDefinition, DirectoryEntry};

/// Minimum fuzzy score (exclusive) for a candidate to be accepted.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/**
    Reduce a channel name to its comparable canonical form.

    Lower-cases, turns punctuation into separators, drops trailing `HD`
    qualifiers and joins what remains without whitespace, so
    `"Sky Uno HD"`, `"SKY UNO"` and `"skyuno"` all become `"skyuno"`.
    A lone `HD` token is kept. Idempotent.
*/
pub fn normalize(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    // Lowering can yield combining marks (`İ` -> `i` U+0307); filter after.
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            cleaned.push(c);
        } else {
            cleaned.push(' ');
        }
    }

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while tokens.len() > 1 && tokens.last() == Some(&"hd") {
        tokens.pop();
    }

    tokens.concat()
}

/**
    Lookup structure over one directory listing.

    Keys are normalized entry names and aliases; insertion order follows the
    directory so fuzzy ties resolve to the first entry seen.
*/
pub struct DirectoryIndex<'a> {
    exact: HashMap<String, &'a DirectoryEntry>,
    ordered: Vec<(String, &'a DirectoryEntry)>,
}

impl<'a> DirectoryIndex<'a> {
    pub fn build(entries: &'a [DirectoryEntry]) -> Self {
        let mut exact = HashMap::new();
        let mut ordered = Vec::new();

        for entry in entries {
            let names = std::iter::once(&entry.name).chain(entry.aliases.iter());
            for name in names {
                let key = normalize(name);
                if key.is_empty() {
                    continue;
                }
                exact.entry(key.clone()).or_insert(entry);
                ordered.push((key, entry));
            }
        }

        Self { exact, ordered }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// A directory entry chosen for a configured name.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub entry: &'a DirectoryEntry,
    pub kind: MatchKind,
    pub score: f64,
}

/// Exact-then-fuzzy name matcher with a configurable acceptance threshold.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    threshold: f64,
}

impl Matcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Match a single configured name against the index.
    pub fn find<'a>(&self, index: &DirectoryIndex<'a>, name: &str) -> Option<Match<'a>> {
        let key = normalize(name);
        if key.is_empty() {
            return None;
        }

        if let Some(&entry) = index.exact.get(&key) {
            return Some(Match {
                entry,
                kind: MatchKind::Exact,
                score: 1.0,
            });
        }

        self.best_fuzzy(index, &key)
    }

    /**
        Match a channel by its display name and then its aliases.

        Any exact hit wins; otherwise the best fuzzy candidate across all
        names is taken, earlier names winning ties.
    */
    pub fn match_channel<'a>(
        &self,
        index: &DirectoryIndex<'a>,
        channel: &ChannelDefinition,
    ) -> Option<Match<'a>> {
        let mut best: Option<Match<'a>> = None;
        for name in channel.match_names() {
            let Some(found) = self.find(index, name) else {
                continue;
            };
            if found.kind == MatchKind::Exact {
                return Some(found);
            }
            if best.is_none_or(|b| found.score > b.score) {
                best = Some(found);
            }
        }
        best
    }

    fn best_fuzzy<'a>(&self, index: &DirectoryIndex<'a>, key: &str) -> Option<Match<'a>> {
        let key_len = key.chars().count();
        let mut best: Option<(f64, &'a DirectoryEntry)> = None;

        for (candidate, entry) in &index.ordered {
            if !(candidate.contains(key) || key.contains(candidate.as_str())) {
                continue;
            }
            let candidate_len = candidate.chars().count();
            let score = key_len.min(candidate_len) as f64 / key_len.max(candidate_len) as f64;
            if best.is_none_or(|(s, _)| score > s) {
                best = Some((score, *entry));
            }
        }

        best.filter(|(score, _)| *score > self.threshold)
            .map(|(score, entry)| Match {
                entry,
                kind: MatchKind::Fuzzy,
                score,
            })
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}
