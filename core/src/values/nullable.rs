//! Nullable wrapping of an inner value parser.

use crate::reader::TextReader;
use crate::values::{
    RawToken, Value, ValueContext, ValueParseResult, ValueParser, read_raw_token,
};

/// Wraps an inner parser so that an explicitly empty token parses as
/// [`Value::Null`].
///
/// Only *explicit* emptiness is accepted — an empty argv element, an empty
/// quoted string, or adjacent collection delimiters. An exhausted reader is
/// still a missing value and delegates to the inner parser's failure, so
/// required-value diagnostics keep their type-specific wording.
///
/// # Examples
///
/// ```
/// use argtree_core::reader::TextReader;
/// use argtree_core::values::nullable::NullableParser;
/// use argtree_core::values::primitives::IntegerParser;
/// use argtree_core::values::{Value, ValueContext, ValueParser};
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let ctx = ValueContext::new("limit", &cancel);
/// let parser = NullableParser::new(IntegerParser);
///
/// let mut reader = TextReader::from_args(&[""]).unwrap();
/// let result = parser.parse(&ctx, &mut reader);
/// assert_eq!(result.value, Some(Value::Null));
/// assert!(result.is_successful());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NullableParser<P> {
    inner: P,
}

impl<P> NullableParser<P> {
    /// Wraps `inner`.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    /// The wrapped parser.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: ValueParser> ValueParser for NullableParser<P> {
    fn type_name(&self) -> String {
        format!("nullable {}", self.inner.type_name())
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        if let Some(cancelled) = ctx.check_cancelled(reader) {
            return cancelled;
        }

        let saved = reader.save();
        if let RawToken::Empty { location } = read_raw_token(reader) {
            return ValueParseResult::success(ctx.name, location, Value::Null, None);
        }

        // Anything non-empty belongs to the inner parser; rewind so it scans
        // the token itself.
        reader.restore(saved);
        self.inner.parse(ctx, reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::ValueErrorKind;
    use crate::values::primitives::IntegerParser;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_empty_quoted_string_parses_as_null() {
        let cancel = CancellationToken::new();
        let ctx = ValueContext::new("limit", &cancel);
        let mut reader = TextReader::from_line("\"\"").unwrap();

        let result = NullableParser::new(IntegerParser).parse(&ctx, &mut reader);
        assert_eq!(result.value, Some(Value::Null));
    }

    #[test]
    fn test_non_empty_token_delegates_to_inner() {
        let cancel = CancellationToken::new();
        let ctx = ValueContext::new("limit", &cancel);
        let mut reader = TextReader::from_line("42").unwrap();

        let result = NullableParser::new(IntegerParser).parse(&ctx, &mut reader);
        assert_eq!(result.value, Some(Value::Int(42)));
    }

    #[test]
    fn test_exhausted_reader_is_still_missing() {
        let cancel = CancellationToken::new();
        let ctx = ValueContext::new("limit", &cancel);
        let mut reader = TextReader::from_args(&["x"]).unwrap();
        reader.advance(1);

        let result = NullableParser::new(IntegerParser).parse(&ctx, &mut reader);
        assert_eq!(result.error.unwrap().kind, ValueErrorKind::Missing);
    }
}
