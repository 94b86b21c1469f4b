//! Positional reader over a sequence of input fragments.
//!
//! The [`TextReader`] is the single source of input for the whole parse. It
//! tracks a `(fragment, offset)` cursor, supports exact backtracking through
//! [`RestorePoint`]s, and exposes two tokenization modes:
//!
//! - **greedy** — each fragment is one already-delimited argv element; reads
//!   take the fragment's remaining text whole.
//! - **lazy** — a single fragment is scanned character by character and
//!   [`text_until_break`](TextReader::text_until_break) stops at the first
//!   break character (whitespace by default), so adjacent tokens are not
//!   over-consumed.
//!
//! Break characters can be extended for the duration of a closure (collection
//! parsing pushes its delimiters this way), and the mode can likewise be
//! forced to lazy for a scope. Both revert automatically, so nested scopes
//! compose.

use thiserror::Error;

use crate::source::{Fragment, Point};

/// Sentinel returned by [`TextReader::peek`] past the end of the current
/// fragment.
pub const END_OF_FRAGMENT: char = '\0';

/// Reader precondition violations.
///
/// These are programmer errors, not user-input errors: malformed user input
/// never surfaces here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// The input fragment collection was empty.
    #[error("input fragment collection cannot be empty")]
    EmptyInput,
    /// `next_fragment` was called on the last fragment.
    #[error("already at the last fragment")]
    AtLastFragment,
    /// A restore target lies outside the fragment sequence.
    #[error("restore target out of range: fragment {fragment}, offset {offset}")]
    RestoreOutOfRange {
        /// Requested fragment index.
        fragment: usize,
        /// Requested character offset.
        offset: usize,
    },
}

/// Tokenization mode of a [`TextReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// One pre-delimited token per fragment (argv-style input).
    Greedy,
    /// Character-by-character scanning with break characters (REPL-style
    /// input).
    Lazy,
}

/// A saved reader position for exact backtracking.
///
/// Captured with [`TextReader::save`] before a speculative match; handing it
/// back to [`TextReader::restore`] rewinds the reader to the exact captured
/// position, including fragment selection, with no observable side effect
/// from the failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestorePoint {
    fragment: usize,
    offset: usize,
    spent: bool,
}

impl RestorePoint {
    /// Fragment index of the saved position.
    pub fn fragment(&self) -> usize {
        self.fragment
    }

    /// Character offset of the saved position.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Positional reader over an ordered sequence of text fragments.
///
/// # Examples
///
/// ```
/// use argtree_core::reader::{ReadMode, TextReader};
///
/// let mut reader = TextReader::from_line("run --fast").unwrap();
/// assert_eq!(reader.mode(), ReadMode::Lazy);
/// assert_eq!(reader.text_until_break(), "run");
///
/// reader.advance(3);
/// reader.skip_trivia();
/// assert_eq!(reader.text_until_break(), "--fast");
/// ```
#[derive(Debug)]
pub struct TextReader {
    fragments: Vec<Fragment>,
    chars: Vec<Vec<char>>,
    fragment: usize,
    offset: usize,
    // An empty fragment is a real, explicitly supplied token. This marks it
    // consumed, since offsets cannot express that for zero-length text.
    spent: bool,
    mode: ReadMode,
    extra_breaks: Vec<Vec<char>>,
}

impl TextReader {
    /// Creates a reader over the given fragments.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::EmptyInput`] when `fragments` is empty.
    pub fn new(fragments: Vec<Fragment>, mode: ReadMode) -> Result<Self, ReaderError> {
        if fragments.is_empty() {
            return Err(ReaderError::EmptyInput);
        }
        let chars = fragments
            .iter()
            .map(|f| f.text().chars().collect())
            .collect();
        Ok(Self {
            fragments,
            chars,
            fragment: 0,
            offset: 0,
            spent: false,
            mode,
            extra_breaks: Vec::new(),
        })
    }

    /// Creates a greedy reader from argv-style pre-split arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::EmptyInput`] when `args` is empty.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ReaderError> {
        let fragments = args
            .iter()
            .enumerate()
            .map(|(i, a)| Fragment::new(a.as_ref(), i))
            .collect();
        Self::new(fragments, ReadMode::Greedy)
    }

    /// Creates a lazy reader over a single raw command string.
    ///
    /// # Errors
    ///
    /// Never fails for any `line` content; the `Result` only mirrors the
    /// fragment-collection precondition shared with [`TextReader::new`].
    pub fn from_line(line: &str) -> Result<Self, ReaderError> {
        Self::new(vec![Fragment::new(line, 0)], ReadMode::Lazy)
    }

    /// Current tokenization mode.
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Current cursor position.
    pub fn position(&self) -> Point {
        Point::new(self.fragment, self.offset)
    }

    /// The fragments this reader was built over.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    fn current_len(&self) -> usize {
        self.chars[self.fragment].len()
    }

    /// Whether the cursor sits on the last fragment.
    pub fn is_last_fragment(&self) -> bool {
        self.fragment + 1 == self.fragments.len()
    }

    /// Whether no consumable input remains.
    ///
    /// An empty fragment that has not yet been consumed still counts as
    /// input: the user explicitly supplied an empty token there.
    pub fn is_at_end(&self) -> bool {
        self.is_last_fragment()
            && self.offset >= self.current_len()
            && (self.current_len() > 0 || self.spent)
    }

    /// Whether the cursor has consumed the current fragment entirely.
    pub fn fragment_exhausted(&self) -> bool {
        self.offset >= self.current_len() && (self.current_len() > 0 || self.spent)
    }

    /// Whether the cursor sits on an explicitly supplied empty fragment that
    /// has not been consumed yet.
    pub fn at_empty_fragment(&self) -> bool {
        self.current_len() == 0 && !self.spent
    }

    /// Consumes the current empty fragment.
    ///
    /// No-op unless [`at_empty_fragment`](TextReader::at_empty_fragment).
    pub fn consume_empty_fragment(&mut self) {
        if self.at_empty_fragment() {
            self.spent = true;
        }
    }

    /// Character at the cursor, or [`END_OF_FRAGMENT`] past the fragment end.
    pub fn current(&self) -> char {
        self.peek(0)
    }

    /// Character one past the cursor, or [`END_OF_FRAGMENT`].
    pub fn next(&self) -> char {
        self.peek(1)
    }

    /// Character `n` past the cursor, or [`END_OF_FRAGMENT`] when that falls
    /// outside the current fragment.
    pub fn peek(&self, n: usize) -> char {
        self.chars[self.fragment]
            .get(self.offset + n)
            .copied()
            .unwrap_or(END_OF_FRAGMENT)
    }

    /// Remaining text of the current fragment, from the cursor onward.
    pub fn text(&self) -> String {
        self.chars[self.fragment][self.offset.min(self.current_len())..]
            .iter()
            .collect()
    }

    /// Remaining text of the current fragment, truncated at the first break
    /// character when in lazy mode.
    ///
    /// In greedy mode the whole remaining fragment is one token, so this is
    /// identical to [`text`](TextReader::text).
    pub fn text_until_break(&self) -> String {
        match self.mode {
            ReadMode::Greedy => self.text(),
            ReadMode::Lazy => self.chars[self.fragment][self.offset.min(self.current_len())..]
                .iter()
                .take_while(|c| !self.is_break(**c))
                .collect(),
        }
    }

    /// Whether `c` terminates a lazily scanned token in the current scope.
    pub fn is_break(&self, c: char) -> bool {
        c.is_whitespace() || self.extra_breaks.iter().any(|scope| scope.contains(&c))
    }

    /// Advances the cursor by `n ≥ 1` characters, clamped to the current
    /// fragment's length. Never crosses a fragment boundary.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n >= 1, "advance distance must be at least 1");
        self.offset = (self.offset + n).min(self.current_len());
    }

    /// Moves the cursor to the start of the next fragment.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::AtLastFragment`] when there is no next fragment.
    pub fn next_fragment(&mut self) -> Result<(), ReaderError> {
        if self.is_last_fragment() {
            return Err(ReaderError::AtLastFragment);
        }
        self.fragment += 1;
        self.offset = 0;
        self.spent = false;
        Ok(())
    }

    /// Captures the exact cursor position for later backtracking.
    pub fn save(&self) -> RestorePoint {
        RestorePoint {
            fragment: self.fragment,
            offset: self.offset,
            spent: self.spent,
        }
    }

    /// Rewinds the reader to a previously captured position.
    pub fn restore(&mut self, point: RestorePoint) {
        // Saved points are valid by construction; no range check needed.
        self.fragment = point.fragment;
        self.offset = point.offset;
        self.spent = point.spent;
    }

    /// Rewinds the reader to an explicit `(fragment, offset)` position.
    ///
    /// # Errors
    ///
    /// Returns [`ReaderError::RestoreOutOfRange`] when the target lies outside
    /// the fragment sequence or past the target fragment's length.
    pub fn restore_to(&mut self, fragment: usize, offset: usize) -> Result<(), ReaderError> {
        if fragment >= self.fragments.len() || offset > self.chars[fragment].len() {
            return Err(ReaderError::RestoreOutOfRange { fragment, offset });
        }
        self.fragment = fragment;
        self.offset = offset;
        self.spent = false;
        Ok(())
    }

    /// Skips whitespace within the current fragment only.
    pub fn skip_whitespace(&mut self) {
        while self.offset < self.current_len() && self.peek(0).is_whitespace() {
            self.offset += 1;
        }
    }

    /// Skips whitespace, crossing into following fragments when the current
    /// one is exhausted. Never crosses past the last fragment, and never
    /// skips over an unconsumed empty fragment.
    pub fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            if self.fragment_exhausted() && !self.is_last_fragment() {
                // Errors are impossible here: we just checked for a successor.
                let _ = self.next_fragment();
                continue;
            }
            break;
        }
    }

    /// Runs `f` with `breaks` added to the break-character set, reverting the
    /// set afterwards. Scopes nest, so inner collections can push their own
    /// delimiters on top of an outer collection's.
    pub fn with_extra_breaks<R>(
        &mut self,
        breaks: &[char],
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.extra_breaks.push(breaks.to_vec());
        let out = f(self);
        self.extra_breaks.pop();
        out
    }

    /// Runs `f` with the reader forced into lazy mode, reverting afterwards.
    ///
    /// Collection parsing uses this so that delimiters split a single greedy
    /// fragment like `[1,2,3]` into elements.
    pub fn with_lazy_mode<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.mode;
        self.mode = ReadMode::Lazy;
        let out = f(self);
        self.mode = previous;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fragment_collection_is_rejected() {
        let err = TextReader::new(Vec::new(), ReadMode::Greedy).unwrap_err();
        assert_eq!(err, ReaderError::EmptyInput);
    }

    #[test]
    fn test_greedy_text_until_break_takes_whole_fragment() {
        let reader = TextReader::from_args(&["hello world", "next"]).unwrap();
        assert_eq!(reader.text_until_break(), "hello world");
    }

    #[test]
    fn test_lazy_text_until_break_stops_at_whitespace() {
        let reader = TextReader::from_line("hello world").unwrap();
        assert_eq!(reader.text_until_break(), "hello");
    }

    #[test]
    fn test_restore_returns_to_exact_position() {
        let mut reader = TextReader::from_args(&["abc", "def"]).unwrap();
        reader.advance(2);
        let saved = reader.save();

        reader.advance(1);
        reader.next_fragment().unwrap();
        reader.advance(3);
        assert!(reader.is_at_end());

        reader.restore(saved);
        assert_eq!(reader.position(), crate::source::Point::new(0, 2));
        assert_eq!(reader.text(), "c");
    }

    #[test]
    fn test_restore_to_rejects_out_of_range_targets() {
        let mut reader = TextReader::from_args(&["ab"]).unwrap();
        assert!(matches!(
            reader.restore_to(3, 0),
            Err(ReaderError::RestoreOutOfRange { .. })
        ));
        assert!(matches!(
            reader.restore_to(0, 5),
            Err(ReaderError::RestoreOutOfRange { .. })
        ));
        assert!(reader.restore_to(0, 2).is_ok());
    }

    #[test]
    fn test_next_fragment_fails_on_last() {
        let mut reader = TextReader::from_args(&["only"]).unwrap();
        assert_eq!(reader.next_fragment(), Err(ReaderError::AtLastFragment));
    }

    #[test]
    fn test_skip_trivia_crosses_exhausted_fragments() {
        let mut reader = TextReader::from_args(&["ab", "cd"]).unwrap();
        reader.advance(2);
        reader.skip_trivia();
        assert_eq!(reader.position(), crate::source::Point::new(1, 0));
        assert_eq!(reader.text(), "cd");
    }

    #[test]
    fn test_skip_trivia_stops_at_unconsumed_empty_fragment() {
        let mut reader = TextReader::from_args(&["ab", "", "cd"]).unwrap();
        reader.advance(2);
        reader.skip_trivia();
        assert!(reader.at_empty_fragment());
        assert!(!reader.is_at_end());

        reader.consume_empty_fragment();
        reader.skip_trivia();
        assert_eq!(reader.text(), "cd");
    }

    #[test]
    fn test_single_empty_fragment_is_explicit_not_end() {
        let mut reader = TextReader::from_args(&[""]).unwrap();
        assert!(reader.at_empty_fragment());
        assert!(!reader.is_at_end());

        reader.consume_empty_fragment();
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_peek_returns_sentinel_past_fragment_end() {
        let reader = TextReader::from_args(&["x"]).unwrap();
        assert_eq!(reader.current(), 'x');
        assert_eq!(reader.next(), END_OF_FRAGMENT);
        assert_eq!(reader.peek(10), END_OF_FRAGMENT);
    }

    #[test]
    fn test_extra_breaks_scope_and_revert() {
        let mut reader = TextReader::from_line("a,b c").unwrap();
        let first = reader.with_extra_breaks(&[','], |r| r.text_until_break());
        assert_eq!(first, "a");
        // Scope ended: ',' no longer breaks.
        assert_eq!(reader.text_until_break(), "a,b");
    }

    #[test]
    fn test_nested_break_scopes_compose() {
        let mut reader = TextReader::from_line("a;b,c").unwrap();
        reader.with_extra_breaks(&[','], |r| {
            let inner = r.with_extra_breaks(&[';'], |r| r.text_until_break());
            assert_eq!(inner, "a");
            assert_eq!(r.text_until_break(), "a;b");
        });
    }

    #[test]
    fn test_with_lazy_mode_reverts() {
        let mut reader = TextReader::from_args(&["1,2"]).unwrap();
        let lazy = reader.with_lazy_mode(|r| {
            r.with_extra_breaks(&[','], |r| r.text_until_break())
        });
        assert_eq!(lazy, "1");
        assert_eq!(reader.text_until_break(), "1,2");
    }

    #[test]
    fn test_advance_clamps_to_fragment_length() {
        let mut reader = TextReader::from_args(&["ab", "cd"]).unwrap();
        reader.advance(99);
        assert_eq!(reader.position(), crate::source::Point::new(0, 2));
        assert!(!reader.is_at_end());
    }
}
