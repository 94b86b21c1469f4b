//! Delimited collection parsing, generic over the element parser.
//!
//! One parser covers both collection forms:
//!
//! - **surrounded** — `prefix elements suffix`, e.g. `[1,2,3]`;
//! - **inline** — a bare separator-delimited run, e.g. `1,2,3`, used for
//!   trailing variadic values.
//!
//! While elements are parsed, the reader is forced into lazy mode and the
//! collection's delimiter characters are pushed as scoped break characters,
//! so a permissive element parser (a bare string, say) cannot swallow the
//! separator or suffix. Both scopes revert on exit and nest, which is what
//! makes collections of collections compose.

use crate::options::ParserOptions;
use crate::reader::TextReader;
use crate::source::{Location, Token, TokenKind};
use crate::values::{
    CollectionDetail, Value, ValueContext, ValueError, ValueErrorKind, ValueParseResult,
    ValueParser,
};

/// Parses a delimited collection of values, one element parser for all
/// elements.
///
/// The erased schema boundary stores this behind
/// [`ValueParserHandle`](crate::values::ValueParserHandle) like any other
/// parser; element typing stays a compile-time parameter.
///
/// # Examples
///
/// ```
/// use argtree_core::reader::TextReader;
/// use argtree_core::values::collection::CollectionParser;
/// use argtree_core::values::primitives::IntegerParser;
/// use argtree_core::values::{Value, ValueContext, ValueParser};
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let ctx = ValueContext::new("ports", &cancel);
/// let parser = CollectionParser::new(IntegerParser);
///
/// let mut reader = TextReader::from_line("[1,2,3]").unwrap();
/// let result = parser.parse(&ctx, &mut reader);
/// assert_eq!(
///     result.value,
///     Some(Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CollectionParser<P> {
    element: P,
    prefix: String,
    suffix: String,
    separator: String,
}

impl<P> CollectionParser<P> {
    /// Creates a collection parser with the default `[`, `]`, `,` delimiters.
    pub fn new(element: P) -> Self {
        Self::with_delimiters(element, "[", "]", ",")
    }

    /// Creates a collection parser with the delimiter strings configured in
    /// the parser options.
    pub fn from_options(element: P, options: &ParserOptions) -> Self {
        Self::with_delimiters(
            element,
            options.collection_prefix.as_str(),
            options.collection_suffix.as_str(),
            options.collection_separator.as_str(),
        )
    }

    /// Creates a collection parser with explicit delimiter strings.
    pub fn with_delimiters(
        element: P,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            element,
            prefix: prefix.into(),
            suffix: suffix.into(),
            separator: separator.into(),
        }
    }

    /// The element parser.
    pub fn element(&self) -> &P {
        &self.element
    }

    fn break_chars(&self) -> Vec<char> {
        self.separator.chars().chain(self.suffix.chars()).collect()
    }
}

impl<P: ValueParser> CollectionParser<P> {
    fn starts_with(&self, reader: &TextReader, delimiter: &str) -> bool {
        !delimiter.is_empty() && reader.text().starts_with(delimiter)
    }

    fn consume_symbol(&self, reader: &mut TextReader, delimiter: &str) -> Token {
        let start = reader.position();
        reader.advance(delimiter.chars().count());
        Token::new(
            TokenKind::Symbol,
            Location::new(start, reader.position()),
            delimiter,
        )
    }

    fn failure_with_detail(
        &self,
        ctx: &ValueContext<'_>,
        location: Location,
        error: ValueError,
        detail: CollectionDetail,
    ) -> ValueParseResult {
        let mut result = ValueParseResult::failure(ctx.name, location, error);
        result.collection = Some(Box::new(detail));
        result
    }

    fn parse_surrounded(
        &self,
        ctx: &ValueContext<'_>,
        reader: &mut TextReader,
        prefix: Token,
    ) -> ValueParseResult {
        let start = prefix.location.start;
        let mut detail = CollectionDetail {
            prefix: Some(prefix),
            suffix: None,
            separators: Vec::new(),
            elements: Vec::new(),
        };

        loop {
            reader.skip_trivia();
            if self.starts_with(reader, &self.suffix) {
                let suffix = self.consume_symbol(reader, &self.suffix);
                let location = Location::new(start, suffix.location.end);
                detail.suffix = Some(suffix);
                return self.finish(ctx, location, detail);
            }
            if reader.is_at_end() {
                let location = Location::new(start, reader.position());
                return self.failure_with_detail(
                    ctx,
                    location,
                    ValueError::new(
                        ValueErrorKind::Malformed,
                        format!(
                            "expected collection suffix '{}' for '{}'",
                            self.suffix, ctx.name
                        ),
                    ),
                    detail,
                );
            }

            let element = self.element.parse(ctx, reader);
            let failed = element.error.clone();
            let element_end = element.location.end;
            detail.elements.push(element);
            if let Some(error) = failed {
                let location = Location::new(start, element_end);
                return self.failure_with_detail(ctx, location, error, detail);
            }

            reader.skip_trivia();
            if self.starts_with(reader, &self.separator) {
                detail
                    .separators
                    .push(self.consume_symbol(reader, &self.separator));
                continue;
            }
            if self.starts_with(reader, &self.suffix) {
                continue;
            }
            let location = Location::new(start, reader.position());
            let message = if reader.is_at_end() {
                format!(
                    "expected collection suffix '{}' for '{}'",
                    self.suffix, ctx.name
                )
            } else {
                format!(
                    "expected '{}' or '{}' in '{}'",
                    self.separator, self.suffix, ctx.name
                )
            };
            return self.failure_with_detail(
                ctx,
                location,
                ValueError::new(ValueErrorKind::Malformed, message),
                detail,
            );
        }
    }

    fn parse_inline(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        let start = reader.position();
        let mut detail = CollectionDetail {
            prefix: None,
            suffix: None,
            separators: Vec::new(),
            elements: Vec::new(),
        };

        loop {
            let element = self.element.parse(ctx, reader);
            let failed = element.error.clone();
            let element_end = element.location.end;
            detail.elements.push(element);
            if let Some(error) = failed {
                let location = Location::new(start, element_end);
                return self.failure_with_detail(ctx, location, error, detail);
            }

            if self.starts_with(reader, &self.separator) {
                detail
                    .separators
                    .push(self.consume_symbol(reader, &self.separator));
                continue;
            }
            let location = Location::new(start, reader.position());
            return self.finish(ctx, location, detail);
        }
    }

    fn finish(
        &self,
        ctx: &ValueContext<'_>,
        location: Location,
        detail: CollectionDetail,
    ) -> ValueParseResult {
        let values: Vec<Value> = detail
            .elements
            .iter()
            .filter_map(|e| e.value.clone())
            .collect();
        let mut result =
            ValueParseResult::success(ctx.name, location, Value::List(values), None);
        result.collection = Some(Box::new(detail));
        result
    }
}

impl<P: ValueParser> ValueParser for CollectionParser<P> {
    fn type_name(&self) -> String {
        format!("list of {}", self.element.type_name())
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        if let Some(cancelled) = ctx.check_cancelled(reader) {
            return cancelled;
        }

        reader.skip_trivia();
        if reader.is_at_end() {
            return ValueParseResult::failure(
                ctx.name,
                Location::at(reader.position()),
                ValueError::new(
                    ValueErrorKind::Missing,
                    format!("expected a {} value for '{}'", self.type_name(), ctx.name),
                ),
            );
        }

        let breaks = self.break_chars();
        reader.with_lazy_mode(|reader| {
            reader.with_extra_breaks(&breaks, |reader| {
                if self.starts_with(reader, &self.prefix) {
                    let prefix = self.consume_symbol(reader, &self.prefix);
                    self.parse_surrounded(ctx, reader, prefix)
                } else {
                    self.parse_inline(ctx, reader)
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::ValueErrorKind;
    use crate::values::nullable::NullableParser;
    use crate::values::primitives::{IntegerParser, StringParser};
    use tokio_util::sync::CancellationToken;

    fn parse_list(parser: &dyn ValueParser, input: &str) -> ValueParseResult {
        let cancel = CancellationToken::new();
        let ctx = ValueContext::new("items", &cancel);
        let mut reader = TextReader::from_line(input).unwrap();
        parser.parse(&ctx, &mut reader)
    }

    #[test]
    fn test_surrounded_collection_with_tokens_inside_span() {
        let parser = CollectionParser::new(IntegerParser);
        let result = parse_list(&parser, "[1,2,3]");

        assert_eq!(
            result.value,
            Some(Value::List(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3)
            ]))
        );

        let detail = result.collection.as_ref().unwrap();
        assert_eq!(detail.elements.len(), 3);
        assert_eq!(detail.separators.len(), 2);
        let span = result.location;
        assert!(span.contains(&detail.prefix.as_ref().unwrap().location));
        assert!(span.contains(&detail.suffix.as_ref().unwrap().location));
        for separator in &detail.separators {
            assert!(span.contains(&separator.location));
        }
    }

    #[test]
    fn test_missing_suffix_is_diagnosed() {
        let parser = CollectionParser::new(IntegerParser);
        let result = parse_list(&parser, "[1,2");

        let error = result.error.unwrap();
        assert_eq!(error.kind, ValueErrorKind::Malformed);
        assert!(error.message.contains("suffix"), "got: {}", error.message);
    }

    #[test]
    fn test_inline_collection() {
        let parser = CollectionParser::new(IntegerParser);
        let result = parse_list(&parser, "4,5,6");

        assert_eq!(
            result.value,
            Some(Value::List(vec![
                Value::Int(4),
                Value::Int(5),
                Value::Int(6)
            ]))
        );
        assert!(result.collection.as_ref().unwrap().prefix.is_none());
    }

    #[test]
    fn test_string_elements_do_not_swallow_delimiters() {
        let parser = CollectionParser::new(StringParser);
        let result = parse_list(&parser, "[ab,cd]");

        assert_eq!(
            result.value,
            Some(Value::List(vec![
                Value::Str("ab".to_string()),
                Value::Str("cd".to_string())
            ]))
        );
    }

    #[test]
    fn test_adjacent_separators_need_nullable_elements() {
        let strict = CollectionParser::new(IntegerParser);
        let failed = parse_list(&strict, "[1,,3]");
        assert_eq!(failed.error.unwrap().kind, ValueErrorKind::Empty);

        let lenient = CollectionParser::new(NullableParser::new(IntegerParser));
        let result = parse_list(&lenient, "[1,,3]");
        assert_eq!(
            result.value,
            Some(Value::List(vec![
                Value::Int(1),
                Value::Null,
                Value::Int(3)
            ]))
        );
    }

    #[test]
    fn test_nested_collections_compose() {
        let parser = CollectionParser::new(CollectionParser::new(IntegerParser));
        let result = parse_list(&parser, "[[1,2],[3]]");

        assert_eq!(
            result.value,
            Some(Value::List(vec![
                Value::List(vec![Value::Int(1), Value::Int(2)]),
                Value::List(vec![Value::Int(3)]),
            ]))
        );
    }

    #[test]
    fn test_delimiters_follow_parser_options() {
        let mut options = ParserOptions::default();
        options.collection_prefix = "(".to_string();
        options.collection_suffix = ")".to_string();
        options.collection_separator = ";".to_string();

        let parser = CollectionParser::from_options(IntegerParser, &options);
        let result = parse_list(&parser, "(1;2)");
        assert_eq!(
            result.value,
            Some(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn test_greedy_fragment_is_split_by_forced_lazy_mode() {
        let parser = CollectionParser::new(IntegerParser);
        let cancel = CancellationToken::new();
        let ctx = ValueContext::new("items", &cancel);
        let mut reader = TextReader::from_args(&["[7,8]"]).unwrap();

        let result = parser.parse(&ctx, &mut reader);
        assert_eq!(
            result.value,
            Some(Value::List(vec![Value::Int(7), Value::Int(8)]))
        );
    }

    #[test]
    fn test_malformed_element_reports_its_error() {
        let parser = CollectionParser::new(IntegerParser);
        let result = parse_list(&parser, "[1,x]");

        let error = result.error.unwrap();
        assert_eq!(error.kind, ValueErrorKind::Malformed);
        assert!(error.message.contains("'x'"));
    }
}
