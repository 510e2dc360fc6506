//! Query parsing and exact / fuzzy / grouped-fuzzy matching.

use sieve_core::types::config::CaseMatching;

/// One matching item, with the keys the sort engine buckets on.
///
/// `start` is a byte offset into the text that was searched (the folded
/// display string under case-insensitive matching, the display string
/// otherwise). Exact-mode records carry `group_count = 0` and `width = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MatchRecord {
    pub(crate) group_count: usize,
    pub(crate) width: usize,
    pub(crate) start: usize,
    pub(crate) item: usize,
}

/// How the stripped query is applied to candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Stripped query is empty: every candidate matches, original order,
    /// no sort pass.
    Unsorted,
    Fuzzy,
    /// Space-separated subqueries, each fuzzy-matched in order.
    Grouped(Vec<Vec<char>>),
    Exact(Anchor),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    None,
    Start,
    End,
    Both,
}

/// A query parsed once per match pass: mode, stripped tokens, sensitivity.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    pub(crate) mode: Mode,
    /// Stripped tokens, pre-folded when matching insensitively.
    tokens: Vec<char>,
    /// Stripped tokens as a string, for the exact-substring path.
    text: String,
    pub(crate) sensitive: bool,
}

impl Pattern {
    /// Detects the mode from the first and last tokens (checked before any
    /// stripping), strips the mode markers, and resolves case sensitivity
    /// from the stripped content.
    pub(crate) fn parse(tokens: &[char], case: CaseMatching) -> Self {
        let mut tokens = tokens.to_vec();
        let mut forced_fuzzy = false;
        let mut exact = false;
        let mut anchor_start = false;
        let mut anchor_end = false;

        match tokens.first() {
            Some('*') => {
                forced_fuzzy = true;
                tokens.remove(0);
            }
            Some('\'') => {
                exact = true;
                tokens.remove(0);
            }
            Some('^') => {
                exact = true;
                anchor_start = true;
                tokens.remove(0);
            }
            _ => {}
        }
        if !forced_fuzzy && tokens.last() == Some(&'$') {
            exact = true;
            anchor_end = true;
            tokens.pop();
        }

        let sensitive = match case {
            CaseMatching::Sensitive => true,
            CaseMatching::Insensitive => false,
            CaseMatching::Smart => tokens.iter().any(|t| t.is_uppercase()),
        };
        if !sensitive {
            for token in &mut tokens {
                *token = token.to_lowercase().next().unwrap_or(*token);
            }
        }

        let (mode, tokens) = if tokens.is_empty() {
            (Mode::Unsorted, tokens)
        } else if exact {
            let anchor = match (anchor_start, anchor_end) {
                (true, true) => Anchor::Both,
                (true, false) => Anchor::Start,
                (false, true) => Anchor::End,
                (false, false) => Anchor::None,
            };
            (Mode::Exact(anchor), tokens)
        } else if !forced_fuzzy && tokens.contains(&' ') {
            let mut groups: Vec<Vec<char>> = tokens
                .split(|t| *t == ' ')
                .filter(|group| !group.is_empty())
                .map(|group| group.to_vec())
                .collect();
            match groups.len() {
                // Separators only: behaves like an empty query.
                0 => (Mode::Unsorted, Vec::new()),
                // A single subgroup collapses to plain fuzzy on that group.
                1 => (Mode::Fuzzy, groups.pop().unwrap_or_default()),
                _ => (Mode::Grouped(groups), tokens),
            }
        } else {
            (Mode::Fuzzy, tokens)
        };
        let text: String = tokens.iter().collect();

        Self {
            mode,
            tokens,
            text,
            sensitive,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.mode == Mode::Unsorted
    }

    /// Matches one candidate. Candidates that cannot satisfy the pattern
    /// yield `None` and are simply excluded.
    pub(crate) fn match_item(&self, text: &str, item: usize) -> Option<MatchRecord> {
        match &self.mode {
            Mode::Unsorted => Some(MatchRecord {
                group_count: 0,
                width: 0,
                start: 0,
                item,
            }),
            Mode::Exact(anchor) => self.match_exact(text, *anchor, item),
            Mode::Fuzzy => {
                let positions = fuzzy_align(text, &self.tokens, 0)?;
                Some(record_for(&positions, item))
            }
            Mode::Grouped(groups) => {
                let positions = grouped_align(text, groups)?;
                Some(record_for(&positions, item))
            }
        }
    }

    fn match_exact(&self, text: &str, anchor: Anchor, item: usize) -> Option<MatchRecord> {
        let pattern = self.text.as_str();
        let start = match anchor {
            Anchor::Both => (text == pattern).then_some(0)?,
            Anchor::Start => text.starts_with(pattern).then_some(0)?,
            Anchor::End => {
                if !text.ends_with(pattern) {
                    return None;
                }
                text.len() - pattern.len()
            }
            Anchor::None => text.find(pattern)?,
        };
        Some(MatchRecord {
            group_count: 0,
            width: 0,
            start,
            item,
        })
    }
}

/// Matched character positions: absolute byte offset plus UTF-8 length.
type Positions = Vec<(usize, usize)>;

fn record_for(positions: &Positions, item: usize) -> MatchRecord {
    let first = positions[0].0;
    let last = positions[positions.len() - 1].0;
    MatchRecord {
        group_count: contiguous_runs(positions),
        width: last - first,
        start: first,
        item,
    }
}

fn contiguous_runs(positions: &Positions) -> usize {
    let mut runs = 1;
    for pair in positions.windows(2) {
        if pair[1].0 != pair[0].0 + pair[0].1 {
            runs += 1;
        }
    }
    runs
}

/// Leftmost ordered occurrence of `tokens` in `text[from..]`.
fn chain(text: &str, tokens: &[char], from: usize) -> Option<Positions> {
    let mut positions = Vec::with_capacity(tokens.len());
    let mut search_from = from;
    for &token in tokens {
        let (offset, found) = text[search_from..]
            .char_indices()
            .find(|&(_, c)| c == token)?;
        let absolute = search_from + offset;
        positions.push((absolute, found.len_utf8()));
        search_from = absolute + found.len_utf8();
    }
    Some(positions)
}

/// Greedy width-minimizing alignment.
///
/// Finds the leftmost occurrence chain, then re-scans by advancing the first
/// token past its previous hit and recomputing the rest; keeps the chain
/// with the smallest width, ties going to the smaller start. The re-scan
/// optimizes width only; it may settle on a sub-optimal contiguous-run
/// count for exotic inputs, and that behavior is part of the contract.
fn fuzzy_align(text: &str, tokens: &[char], from: usize) -> Option<Positions> {
    let mut best = chain(text, tokens, from)?;
    let mut best_width = best[best.len() - 1].0 - best[0].0;

    let mut next_from = best[0].0 + best[0].1;
    while let Some(candidate) = chain(text, tokens, next_from) {
        let width = candidate[candidate.len() - 1].0 - candidate[0].0;
        next_from = candidate[0].0 + candidate[0].1;
        if width < best_width {
            best_width = width;
            best = candidate;
        }
    }

    Some(best)
}

/// Applies the greedy alignment transitively across subgroups: subgroup N
/// starts strictly after subgroup N-1's last matched character. Contiguity
/// is counted over the concatenated positions, so a subgroup boundary with
/// adjacent characters is not a break.
fn grouped_align(text: &str, groups: &[Vec<char>]) -> Option<Positions> {
    let mut all = Positions::new();
    let mut from = 0;
    for group in groups {
        let positions = fuzzy_align(text, group, from)?;
        let (last, len) = positions[positions.len() - 1];
        from = last + len;
        all.extend(positions);
    }
    Some(all)
}

#[cfg(test)]
mod tests;
