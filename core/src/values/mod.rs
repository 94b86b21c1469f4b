//! The value-parsing protocol.
//!
//! Every flag and argument in a schema carries a value parser implementing
//! [`ValueParser`]. Parsers consume input from the shared [`TextReader`] and
//! report through [`ValueParseResult`] — never through `Err` or panics, since
//! every value-level failure is a recoverable user-input problem.
//!
//! Two missing-value situations are kept distinct throughout:
//!
//! - **missing** — the reader is exhausted where a value was required;
//! - **empty** — the user explicitly supplied an empty token (an empty argv
//!   element, an empty quoted string, or adjacent collection delimiters).
//!
//! Empty is only accepted by the [`NullableParser`](nullable::NullableParser)
//! wrapper; everywhere else it is an error even though something was
//! technically provided.
//!
//! Concrete parsers live in [`primitives`], [`nullable`], and [`collection`].

pub mod collection;
pub mod nullable;
pub mod primitives;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::reader::{ReadMode, TextReader};
use crate::source::{Location, Point, Token, TokenKind};

/// A parsed value, closed over every type the built-in parsers produce.
///
/// Heterogeneously typed flags and arguments store their results through this
/// tagged union rather than through per-type erased boxes; consumers match on
/// the variant they declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Explicit null, produced by a nullable target given an empty token.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// Single character.
    Char(char),
    /// String.
    Str(String),
    /// Ordered collection of element values.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the variant, for messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "decimal",
            Value::Char(_) => "character",
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }

    /// The string content, when this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer content, when this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Classification of a value-parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueErrorKind {
    /// The reader was exhausted where a value was required.
    Missing,
    /// The user supplied an explicitly empty token for a non-nullable target.
    Empty,
    /// Value text was present but failed the target's grammar.
    Malformed,
    /// The cooperative cancellation token fired.
    Cancelled,
}

/// A value-parse failure: classification plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueError {
    /// What went wrong, coarsely.
    pub kind: ValueErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ValueError {
    /// Creates a value error.
    pub fn new(kind: ValueErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

}

/// Per-call context handed to every value parser.
///
/// Carries the display name of the target (for messages) and the cooperative
/// cancellation token checked once at the entry of each parse call.
#[derive(Debug, Clone)]
pub struct ValueContext<'a> {
    /// Display name of the flag or argument being parsed.
    pub name: &'a str,
    /// Cooperative cancellation token.
    pub cancellation: &'a CancellationToken,
}

impl<'a> ValueContext<'a> {
    /// Creates a context.
    pub fn new(name: &'a str, cancellation: &'a CancellationToken) -> Self {
        Self { name, cancellation }
    }

    /// The single cancellation check each parse call performs on entry.
    /// Returns a ready-made failure result when the token has fired.
    pub fn check_cancelled(&self, reader: &TextReader) -> Option<ValueParseResult> {
        if self.cancellation.is_cancelled() {
            Some(ValueParseResult::failure(
                self.name,
                Location::at(reader.position()),
                ValueError::new(ValueErrorKind::Cancelled, "parsing was cancelled"),
            ))
        } else {
            None
        }
    }
}

/// Structural detail of a parsed collection: delimiters and element results.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDetail {
    /// Opening delimiter token (`None` for the inline form).
    pub prefix: Option<Token>,
    /// Closing delimiter token (`None` for the inline form or when missing).
    pub suffix: Option<Token>,
    /// Element separator tokens, in order.
    pub separators: Vec<Token>,
    /// Per-element parse results, in order.
    pub elements: Vec<ValueParseResult>,
}

/// Outcome of one value-parse call.
///
/// Success and failure travel through the same struct: `error` is `None` on
/// success and the produced `value` is `None` on failure. The location always
/// covers exactly the input the call consumed (zero-width when nothing was).
#[derive(Debug, Clone, PartialEq)]
pub struct ValueParseResult {
    /// Display name of the target this value was parsed for.
    pub name: String,
    /// Span of input this parse consumed.
    pub location: Location,
    /// The parsed value, on success.
    pub value: Option<Value>,
    /// The failure, if any.
    pub error: Option<ValueError>,
    /// The value token, for scalar parses.
    pub token: Option<Token>,
    /// Delimiter and element structure, for collection parses.
    pub collection: Option<Box<CollectionDetail>>,
}

impl ValueParseResult {
    /// A successful scalar parse.
    pub fn success(name: &str, location: Location, value: Value, token: Option<Token>) -> Self {
        Self {
            name: name.to_string(),
            location,
            value: Some(value),
            error: None,
            token,
            collection: None,
        }
    }

    /// A failed parse.
    pub fn failure(name: &str, location: Location, error: ValueError) -> Self {
        Self {
            name: name.to_string(),
            location,
            value: None,
            error: Some(error),
            token: None,
            collection: None,
        }
    }

    /// Whether the parse produced a value.
    pub fn is_successful(&self) -> bool {
        self.error.is_none()
    }

    /// Appends every token this result covers, elements included, to `out`.
    pub fn collect_tokens(&self, out: &mut Vec<Token>) {
        if let Some(token) = &self.token {
            out.push(token.clone());
        }
        if let Some(detail) = &self.collection {
            if let Some(prefix) = &detail.prefix {
                out.push(prefix.clone());
            }
            for separator in &detail.separators {
                out.push(separator.clone());
            }
            for element in &detail.elements {
                element.collect_tokens(out);
            }
            if let Some(suffix) = &detail.suffix {
                out.push(suffix.clone());
            }
        }
    }
}

/// A per-type value parsing strategy.
///
/// Implementations must not consume input on failure beyond what the failure
/// diagnoses, and must never panic or return early on malformed user input;
/// all failure travels through [`ValueParseResult::error`].
pub trait ValueParser: fmt::Debug + Send + Sync {
    /// Short name of the parsed type, for messages (`"integer"`,
    /// `"list of integer"`, ...).
    fn type_name(&self) -> String;

    /// Parses one value from the reader.
    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult;
}

/// The erased, shareable view of a value parser, stored in schema entries.
///
/// Built once at schema construction; cloning shares the parser. The typed
/// view is the concrete parser value the caller constructed.
pub type ValueParserHandle = Arc<dyn ValueParser>;

impl ValueParser for ValueParserHandle {
    fn type_name(&self) -> String {
        (**self).type_name()
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        (**self).parse(ctx, reader)
    }
}

/// One raw token scanned from the reader, before type interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RawToken {
    /// The reader had nothing left.
    Missing { position: Point },
    /// The user explicitly supplied an empty token.
    Empty { location: Location },
    /// Ordinary token text.
    Text { text: String, location: Location },
    /// A quoted token whose closing quote never arrived.
    Unterminated { text: String, location: Location },
}

/// Scans the next raw value token.
///
/// Skips trivia first. In lazy mode the token ends at the first break
/// character in scope, and double quotes group characters (including
/// whitespace and break characters) into one token; `""` is an explicitly
/// empty token. In greedy mode the fragment's remaining text is the token and
/// quotes are ordinary characters, since the shell already delimited it.
pub(crate) fn read_raw_token(reader: &mut TextReader) -> RawToken {
    reader.skip_trivia();

    if reader.at_empty_fragment() {
        let location = Location::at(reader.position());
        reader.consume_empty_fragment();
        return RawToken::Empty { location };
    }
    if reader.is_at_end() {
        return RawToken::Missing {
            position: reader.position(),
        };
    }

    if reader.mode() == ReadMode::Lazy && reader.current() == '"' {
        return read_quoted(reader);
    }

    let start = reader.position();
    let text = reader.text_until_break();
    if text.is_empty() {
        // Not at end and nothing before the next break: the cursor sits on a
        // scoped break character (e.g. adjacent collection delimiters), which
        // is an explicitly empty token.
        return RawToken::Empty {
            location: Location::at(start),
        };
    }
    reader.advance(text.chars().count());
    RawToken::Text {
        text,
        location: Location::new(start, reader.position()),
    }
}

fn read_quoted(reader: &mut TextReader) -> RawToken {
    let start = reader.position();
    reader.advance(1);
    let mut text = String::new();
    loop {
        match reader.current() {
            crate::reader::END_OF_FRAGMENT => {
                return RawToken::Unterminated {
                    text,
                    location: Location::new(start, reader.position()),
                };
            }
            '"' => {
                reader.advance(1);
                let location = Location::new(start, reader.position());
                if text.is_empty() {
                    return RawToken::Empty { location };
                }
                return RawToken::Text { text, location };
            }
            c => {
                text.push(c);
                reader.advance(1);
            }
        }
    }
}

/// Builds a `Value` token for a successfully scanned scalar.
pub(crate) fn value_token(location: Location, text: &str) -> Token {
    Token::new(TokenKind::Value, location, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TextReader;

    #[test]
    fn test_read_raw_token_lazy_stops_at_whitespace() {
        let mut reader = TextReader::from_line("abc def").unwrap();
        let token = read_raw_token(&mut reader);
        assert!(
            matches!(token, RawToken::Text { ref text, .. } if text == "abc"),
            "unexpected token: {token:?}"
        );
    }

    #[test]
    fn test_read_raw_token_quoted_spans_whitespace() {
        let mut reader = TextReader::from_line("\"hello world\" next").unwrap();
        let token = read_raw_token(&mut reader);
        assert!(matches!(token, RawToken::Text { ref text, .. } if text == "hello world"));
    }

    #[test]
    fn test_read_raw_token_empty_quotes_are_explicit_empty() {
        let mut reader = TextReader::from_line("\"\"").unwrap();
        assert!(matches!(
            read_raw_token(&mut reader),
            RawToken::Empty { .. }
        ));
    }

    #[test]
    fn test_read_raw_token_unterminated_quote() {
        let mut reader = TextReader::from_line("\"oops").unwrap();
        assert!(matches!(
            read_raw_token(&mut reader),
            RawToken::Unterminated { ref text, .. } if text == "oops"
        ));
    }

    #[test]
    fn test_read_raw_token_greedy_takes_fragment_whole() {
        let mut reader = TextReader::from_args(&["\"not special\""]).unwrap();
        let token = read_raw_token(&mut reader);
        assert!(matches!(token, RawToken::Text { ref text, .. } if text == "\"not special\""));
    }

    #[test]
    fn test_read_raw_token_exhausted_is_missing() {
        let mut reader = TextReader::from_args(&["x"]).unwrap();
        reader.advance(1);
        assert!(matches!(
            read_raw_token(&mut reader),
            RawToken::Missing { .. }
        ));
    }

    #[test]
    fn test_read_raw_token_empty_fragment_is_explicit_empty() {
        let mut reader = TextReader::from_args(&[""]).unwrap();
        assert!(matches!(
            read_raw_token(&mut reader),
            RawToken::Empty { .. }
        ));
        assert!(matches!(
            read_raw_token(&mut reader),
            RawToken::Missing { .. }
        ));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1,2]"
        );
        assert_eq!(Value::Null.to_string(), "null");
    }
}
