//! Mutable query: an ordered token sequence plus a caret.

/// The live-typed query.
///
/// The caret is 1-based and always within `[1, len + 1]`; it marks the
/// insertion point. Mutations report whether the token sequence changed so
/// the session knows when to bump the cancellation tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Query {
    tokens: Vec<char>,
    caret: usize,
}

impl Query {
    pub(crate) fn new() -> Self {
        Self {
            tokens: Vec::new(),
            caret: 1,
        }
    }

    pub(crate) fn tokens(&self) -> &[char] {
        &self.tokens
    }

    pub(crate) fn caret(&self) -> usize {
        self.caret
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    pub(crate) fn as_string(&self) -> String {
        self.tokens.iter().collect()
    }

    /// Inserts a token at the caret and advances it.
    pub(crate) fn insert(&mut self, token: char) {
        self.tokens.insert(self.caret - 1, token);
        self.caret += 1;
    }

    /// Deletes up to `n` tokens left of the caret. Returns the removed count.
    pub(crate) fn delete_left(&mut self, n: usize) -> usize {
        let n = n.min(self.caret - 1);
        if n == 0 {
            return 0;
        }
        let end = self.caret - 1;
        self.tokens.drain(end - n..end);
        self.caret -= n;
        n
    }

    /// Deletes up to `n` tokens right of the caret. Returns the removed count.
    pub(crate) fn delete_right(&mut self, n: usize) -> usize {
        let start = self.caret - 1;
        let n = n.min(self.tokens.len() - start);
        if n == 0 {
            return 0;
        }
        self.tokens.drain(start..start + n);
        n
    }

    /// Deletes the maximal run of one character class (word or non-word)
    /// left of the caret. Returns the removed count.
    pub(crate) fn delete_word(&mut self) -> usize {
        let end = self.caret - 1;
        if end == 0 {
            return 0;
        }
        let class = is_word(self.tokens[end - 1]);
        let mut start = end;
        while start > 0 && is_word(self.tokens[start - 1]) == class {
            start -= 1;
        }
        self.tokens.drain(start..end);
        self.caret = start + 1;
        end - start
    }

    /// Moves the caret by `delta`, clamped to `[1, len + 1]`.
    pub(crate) fn move_caret(&mut self, delta: isize) {
        let target = self.caret as isize + delta;
        self.caret = target.clamp(1, self.tokens.len() as isize + 1) as usize;
    }

    /// Moves the caret to `pos`, clamped to `[1, len + 1]`.
    pub(crate) fn move_caret_to(&mut self, pos: usize) {
        self.caret = pos.clamp(1, self.tokens.len() + 1);
    }

    /// Replaces the whole token sequence; the caret lands after the end.
    pub(crate) fn set(&mut self, tokens: Vec<char>) {
        self.tokens = tokens;
        self.caret = self.tokens.len() + 1;
    }
}

fn is_word(token: char) -> bool {
    token.is_alphanumeric() || token == '_'
}
