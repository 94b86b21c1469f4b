//! Core command-line parsing engine: schema-driven recursive descent with
//! precise source locations.
//!
//! The crate splits into a handful of layers:
//!
//! - [`source`] — fragments, points, locations, and tokens: the positional
//!   model every other layer reports against.
//! - [`reader`] — the [`TextReader`](reader::TextReader), a backtrackable
//!   cursor over the fragment sequence with greedy (argv) and lazy (raw line)
//!   tokenization modes.
//! - [`values`] — the value-parsing protocol: primitive parsers, the nullable
//!   wrapper, and nested collections.
//! - [`schema`] — the immutable command tree ([`CommandGroup`],
//!   [`Command`](schema::Command), [`Flag`](schema::Flag),
//!   [`Argument`](schema::Argument)) plus structural validation.
//! - [`parser`] — the descent itself, producing a located
//!   [`ParseResult`] and a [`DiagnosticLog`](diagnostics::DiagnosticLog).
//!
//! Malformed user input is never an `Err` and never a panic: it lands in the
//! result's diagnostics with the exact span that caused it. The `Result`
//! returned by the entry points only covers caller mistakes such as an empty
//! input collection.
//!
//! # Example
//!
//! ```
//! use argtree_core::options::ParserOptions;
//! use argtree_core::parse_arguments;
//! use argtree_core::schema::{Argument, Command, CommandGroup, Flag, FlagName};
//! use argtree_core::values::Value;
//! use argtree_core::values::primitives::StringParser;
//!
//! let schema = CommandGroup::root()
//!     .with_flag(Flag::repeat(FlagName::both("verbose", 'v')))
//!     .with_command(
//!         Command::named("greet")
//!             .with_argument(Argument::required("who", 0, StringParser)),
//!     );
//!
//! let result = parse_arguments(&schema, &["-vv", "greet", "world"], &ParserOptions::default())
//!     .unwrap();
//! assert!(result.is_successful());
//!
//! let command = result.leaf_command().unwrap();
//! assert_eq!(command.command.name(), Some("greet"));
//! assert_eq!(
//!     command.argument("who").unwrap().value.value,
//!     Some(Value::Str("world".to_string()))
//! );
//! ```

pub mod diagnostics;
pub mod options;
pub mod parser;
pub mod reader;
pub mod schema;
pub mod source;
pub mod values;

pub use parser::CommandParser;
pub use parser::tree::ParseResult;
pub use reader::{ReaderError, TextReader};
pub use schema::CommandGroup;
pub use tokio_util::sync::CancellationToken;

use options::ParserOptions;

/// Parses argv-style pre-split arguments against a schema.
///
/// Each element becomes one greedy fragment; empty elements are preserved as
/// explicitly empty tokens.
///
/// # Errors
///
/// Returns [`ReaderError::EmptyInput`] when `args` is empty. User-input
/// problems are reported through the result's diagnostics instead.
pub fn parse_arguments<'s, S: AsRef<str>>(
    root: &'s CommandGroup,
    args: &[S],
    options: &ParserOptions,
) -> Result<ParseResult<'s>, ReaderError> {
    let reader = TextReader::from_args(args)?;
    Ok(CommandParser::new(options, CancellationToken::new()).parse(reader, root))
}

/// Parses a single raw command line against a schema, tokenizing lazily.
///
/// # Errors
///
/// Mirrors the fragment-collection precondition of [`parse_arguments`];
/// never fails for any `line` content.
pub fn parse_command_line<'s>(
    root: &'s CommandGroup,
    line: &str,
    options: &ParserOptions,
) -> Result<ParseResult<'s>, ReaderError> {
    let reader = TextReader::from_line(line)?;
    Ok(CommandParser::new(options, CancellationToken::new()).parse(reader, root))
}

/// Parses with a caller-supplied reader and cancellation token.
///
/// Cancellation is cooperative: each value-parse call checks the token once
/// on entry, so a fired token stops the walk at the next value boundary and
/// surfaces as a diagnostic rather than an error.
pub fn parse_with_cancellation<'s>(
    root: &'s CommandGroup,
    reader: TextReader,
    options: &ParserOptions,
    cancellation: CancellationToken,
) -> ParseResult<'s> {
    CommandParser::new(options, cancellation).parse(reader, root)
}
