//! Source model for command-line input: fragments, points, locations, tokens.
//!
//! Input arrives either as an argv-style array (one [`Fragment`] per element)
//! or as a single raw command string (one fragment covering the whole line).
//! Every token the parser produces carries a [`Location`] back into this
//! fragment sequence, so diagnostics and tooling can point at the exact span
//! of input that produced them.

use serde::{Deserialize, Serialize};

/// One atomic unit of input text.
///
/// Fragments form a 0-indexed, strictly increasing sequence. In greedy mode
/// each fragment is one pre-delimited argv element; in lazy mode a single
/// fragment holds the entire command string.
///
/// # Examples
///
/// ```
/// use argtree_core::source::Fragment;
///
/// let frag = Fragment::new("--verbose", 0);
/// assert_eq!(frag.text(), "--verbose");
/// assert_eq!(frag.len(), 9);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    text: String,
    index: usize,
}

impl Fragment {
    /// Creates a fragment at the given sequence index.
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            index,
        }
    }

    /// The fragment's text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Position of this fragment in the input sequence.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Length of the fragment text in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the fragment text is empty (e.g., an empty argv element).
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A position inside the fragment sequence: `(fragment index, char offset)`.
///
/// Offsets are clamped to `0..=fragment.len()`; the offset one past the last
/// character marks the fragment's end. Points order first by fragment, then
/// by offset, which gives tokens a total order over the whole input.
///
/// # Examples
///
/// ```
/// use argtree_core::source::Point;
///
/// let a = Point::new(0, 3);
/// let b = Point::new(1, 0);
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Index of the fragment this point lies in.
    pub fragment: usize,
    /// Character offset within the fragment.
    pub offset: usize,
}

impl Point {
    /// Creates a point.
    pub fn new(fragment: usize, offset: usize) -> Self {
        Self { fragment, offset }
    }
}

/// A half-open span of input, `start ≤ end`.
///
/// Locations may cross fragment boundaries (a multi-fragment collection, for
/// instance, spans every fragment its elements came from).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Where the span begins (inclusive).
    pub start: Point,
    /// Where the span ends (exclusive).
    pub end: Point,
}

impl Location {
    /// Creates a location from two points.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`; spans are constructed by the parser from
    /// monotonically advancing reader positions, so an inverted span is a
    /// programmer error.
    pub fn new(start: Point, end: Point) -> Self {
        assert!(start <= end, "inverted location: {start:?} > {end:?}");
        Self { start, end }
    }

    /// A zero-width location at a single point.
    pub fn at(point: Point) -> Self {
        Self {
            start: point,
            end: point,
        }
    }

    /// Smallest location covering both `self` and `other`.
    pub fn join(self, other: Location) -> Location {
        Location {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Location) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Classification of a consumed span of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
    /// Input that was consumed but could not be matched to the schema.
    Error,
    /// Trailing input left over after the parse completed.
    Unprocessed,
    /// A name that matched a command group.
    GroupName,
    /// A name that matched a command.
    CommandName,
    /// A flag name, including its prefix (e.g., `--verbose`, `-abc`).
    FlagName,
    /// A value consumed by a value parser.
    Value,
    /// Structural punctuation: flag/value separators, collection delimiters.
    Symbol,
}

/// A located, classified span of consumed input.
///
/// The `value` field holds the matched text where it is useful downstream
/// (names, values, symbols); `Error`/`Unprocessed` tokens keep the raw text
/// that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// What this span of input was classified as.
    pub kind: TokenKind,
    /// Where the span lies in the fragment sequence.
    pub location: Location,
    /// The matched text, when meaningful for the kind.
    pub value: Option<String>,
}

impl Token {
    /// Creates a token with an attached text value.
    pub fn new(kind: TokenKind, location: Location, value: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            value: Some(value.into()),
        }
    }

    /// Creates a token without a text value.
    pub fn bare(kind: TokenKind, location: Location) -> Self {
        Self {
            kind,
            location,
            value: None,
        }
    }

    /// The token text, or `""` when none was recorded.
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}
