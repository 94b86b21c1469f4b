//! Built-in scalar value parsers.
//!
//! All primitives share one scanning discipline (via the module-level raw
//! token reader) and differ only in how they interpret the token text:
//!
//! - integers accept `_` digit separators and `0x`/`0b` radix prefixes;
//! - booleans accept `true/false/yes/no/t/f/y/n`, case-insensitively;
//! - choices require an exact case-insensitive full-name match, never a
//!   partial one, so they cannot be confused with flag-combination syntax.

use crate::reader::TextReader;
use crate::source::Location;
use crate::values::{
    RawToken, Value, ValueContext, ValueError, ValueErrorKind, ValueParseResult, ValueParser,
    read_raw_token, value_token,
};

/// Runs the shared scan-then-convert discipline for a scalar parser.
fn parse_scalar(
    ctx: &ValueContext<'_>,
    reader: &mut TextReader,
    type_name: &str,
    convert: impl FnOnce(&str) -> Result<Value, String>,
) -> ValueParseResult {
    if let Some(cancelled) = ctx.check_cancelled(reader) {
        return cancelled;
    }

    match read_raw_token(reader) {
        RawToken::Missing { position } => ValueParseResult::failure(
            ctx.name,
            Location::at(position),
            ValueError::new(
                ValueErrorKind::Missing,
                format!("expected a {type_name} value for '{}'", ctx.name),
            ),
        ),
        RawToken::Empty { location } => ValueParseResult::failure(
            ctx.name,
            location,
            ValueError::new(
                ValueErrorKind::Empty,
                format!("empty value supplied for '{}'", ctx.name),
            ),
        ),
        RawToken::Unterminated { location, .. } => ValueParseResult::failure(
            ctx.name,
            location,
            ValueError::new(
                ValueErrorKind::Malformed,
                format!("unterminated quoted string for '{}'", ctx.name),
            ),
        ),
        RawToken::Text { text, location } => match convert(&text) {
            Ok(value) => {
                let token = value_token(location, &text);
                ValueParseResult::success(ctx.name, location, value, Some(token))
            }
            Err(message) => ValueParseResult::failure(
                ctx.name,
                location,
                ValueError::new(ValueErrorKind::Malformed, message),
            ),
        },
    }
}

/// Parses any token text as a string.
///
/// In lazy mode quoted tokens keep their inner whitespace; quotes themselves
/// are not part of the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringParser;

impl ValueParser for StringParser {
    fn type_name(&self) -> String {
        "string".to_string()
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        parse_scalar(ctx, reader, "string", |text| Ok(Value::Str(text.to_string())))
    }
}

/// Parses a single-character token.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharParser;

impl ValueParser for CharParser {
    fn type_name(&self) -> String {
        "character".to_string()
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        parse_scalar(ctx, reader, "character", |text| {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(format!("'{text}' is not a single character")),
            }
        })
    }
}

/// Parses case-insensitive boolean literals.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanParser;

impl ValueParser for BooleanParser {
    fn type_name(&self) -> String {
        "boolean".to_string()
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        parse_scalar(ctx, reader, "boolean", |text| {
            match text.to_ascii_lowercase().as_str() {
                "true" | "t" | "yes" | "y" => Ok(Value::Bool(true)),
                "false" | "f" | "no" | "n" => Ok(Value::Bool(false)),
                _ => Err(format!("'{text}' is not a boolean")),
            }
        })
    }
}

/// Parses signed integers with `_` digit separators and `0x`/`0b` prefixes.
///
/// # Examples
///
/// ```
/// use argtree_core::reader::TextReader;
/// use argtree_core::values::primitives::IntegerParser;
/// use argtree_core::values::{Value, ValueContext, ValueParser};
/// use tokio_util::sync::CancellationToken;
///
/// let cancel = CancellationToken::new();
/// let ctx = ValueContext::new("count", &cancel);
/// let mut reader = TextReader::from_line("1_000_000").unwrap();
///
/// let result = IntegerParser.parse(&ctx, &mut reader);
/// assert_eq!(result.value, Some(Value::Int(1_000_000)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerParser;

fn convert_integer(text: &str) -> Result<Value, String> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (sign, body) = match cleaned.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    let (radix, digits) = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        (16, hex)
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        (2, bin)
    } else {
        (10, body)
    };
    if digits.is_empty() {
        return Err(format!("'{text}' is not an integer"));
    }
    i64::from_str_radix(&format!("{sign}{digits}"), radix)
        .map(Value::Int)
        .map_err(|_| format!("'{text}' is not an integer"))
}

impl ValueParser for IntegerParser {
    fn type_name(&self) -> String {
        "integer".to_string()
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        parse_scalar(ctx, reader, "integer", convert_integer)
    }
}

/// Parses floating-point numbers using the standard decimal grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalParser;

impl ValueParser for DecimalParser {
    fn type_name(&self) -> String {
        "decimal".to_string()
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        parse_scalar(ctx, reader, "decimal", |text| {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("'{text}' is not a decimal number"))
        })
    }
}

/// Parses one of a fixed set of named choices.
///
/// Matching is case-insensitive but always against the full variant name;
/// partial or merged names are rejected so that choice values can never be
/// mistaken for combined short flags. The produced value is the canonical
/// variant spelling.
#[derive(Debug, Clone, Default)]
pub struct ChoiceParser {
    variants: Vec<String>,
}

impl ChoiceParser {
    /// Creates a parser over the given variant names.
    pub fn new<S: Into<String>>(variants: impl IntoIterator<Item = S>) -> Self {
        Self {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    /// The accepted variant names.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }
}

impl ValueParser for ChoiceParser {
    fn type_name(&self) -> String {
        format!("one of {}", self.variants.join("|"))
    }

    fn parse(&self, ctx: &ValueContext<'_>, reader: &mut TextReader) -> ValueParseResult {
        parse_scalar(ctx, reader, "choice", |text| {
            self.variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(text))
                .map(|v| Value::Str(v.clone()))
                .ok_or_else(|| {
                    format!(
                        "'{text}' is not one of {}",
                        self.variants.join(", ")
                    )
                })
        })
    }
}
