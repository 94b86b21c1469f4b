//! Recursive-descent command parser.
//!
//! The parser walks a [`CommandGroup`] schema against a [`TextReader`],
//! producing a located parse tree and a diagnostic log. The conceptual
//! grammar:
//!
//! ```text
//! Group   → Name (Group | Command) | ImplicitCommand | ε(error)
//! Command → Name? (Flag* Argument)* Flag*
//! ```
//!
//! Descent is speculative: a group-name lookup that misses restores the
//! reader to the exact position before the attempt, so the name can be
//! re-interpreted by an implicit command or reported as leftover input.
//! Malformed user input never aborts the walk — it is recorded as a
//! [`Diagnostic`] and parsing continues where that is meaningful.

pub mod tree;

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::options::ParserOptions;
use crate::reader::TextReader;
use crate::schema::{Argument, Command, CommandGroup, Flag, FlagKind};
use crate::source::{Location, Point, Token, TokenKind};
use crate::values::{ValueContext, ValueErrorKind, ValueParser};

use tree::{
    ArgumentParseResult, CommandParseResult, FlagParseResult, GroupChild, GroupParseResult,
    ParseResult,
};

/// Outcome of one flag-parse attempt.
enum FlagAttempt<'s> {
    /// The input at the cursor is not a flag; the caller restores.
    NotAFlag,
    /// A flag occurrence was parsed.
    Parsed(FlagParseResult<'s>),
    /// The input was consumed and diagnosed but produced no occurrence
    /// (unknown name, ambiguous cluster).
    Consumed,
}

/// One parse pass over one reader.
///
/// Construct per call via [`CommandParser::new`]; all state (diagnostics,
/// flag scope, cancellation latch) is owned by the pass and discarded into
/// the returned [`ParseResult`].
pub struct CommandParser<'s, 'o> {
    options: &'o ParserOptions,
    cancellation: CancellationToken,
    scope: Vec<&'s [Flag]>,
    log: DiagnosticLog,
    error_tokens: Vec<Token>,
    cancelled: bool,
}

impl<'s, 'o> CommandParser<'s, 'o> {
    /// Creates a parser pass with the given options and cancellation token.
    pub fn new(options: &'o ParserOptions, cancellation: CancellationToken) -> Self {
        Self {
            options,
            cancellation,
            scope: Vec::new(),
            log: DiagnosticLog::new(),
            error_tokens: Vec::new(),
            cancelled: false,
        }
    }

    /// Runs the pass: walks `root` against `reader` and returns the parse
    /// tree, diagnostics, and any trailing unprocessed input.
    pub fn parse(mut self, mut reader: TextReader, root: &'s CommandGroup) -> ParseResult<'s> {
        let tree = self.parse_group(&mut reader, root, None);
        let unprocessed = self.check_completion(&mut reader);
        ParseResult {
            root: tree,
            diagnostics: self.log,
            unprocessed,
            error_tokens: self.error_tokens,
        }
    }

    // ---- group descent -------------------------------------------------

    fn parse_group(
        &mut self,
        reader: &mut TextReader,
        group: &'s CommandGroup,
        name_token: Option<Token>,
    ) -> GroupParseResult<'s> {
        debug!(group = group.name().unwrap_or("<root>"), "descending into group");
        self.scope.push(group.flags());
        let flags = self.parse_flags(reader);
        let child = self.parse_group_child(reader, group);
        self.scope.pop();
        GroupParseResult {
            group,
            name_token,
            flags,
            child,
        }
    }

    fn parse_group_child(
        &mut self,
        reader: &mut TextReader,
        group: &'s CommandGroup,
    ) -> Option<Box<GroupChild<'s>>> {
        if self.cancelled {
            return None;
        }

        if group.has_children() {
            let saved = reader.save();
            if let Some((name, location)) = self.read_identifier(reader) {
                if let Some(child) = group.find_group(&name) {
                    let token = Token::new(TokenKind::GroupName, location, &name);
                    let nested = self.parse_group(reader, child, Some(token));
                    return Some(Box::new(GroupChild::Group(nested)));
                }
                if let Some(command) = group.find_command(&name) {
                    let token = Token::new(TokenKind::CommandName, location, &name);
                    let nested = self.parse_command(reader, command, Some(token));
                    return Some(Box::new(GroupChild::Command(nested)));
                }
                debug!(%name, "name matched no child; restoring reader");
                reader.restore(saved);
                return self.fall_through(reader, group, Some((name, location)));
            }
            return self.fall_through(reader, group, None);
        }

        self.fall_through(reader, group, None)
    }

    fn fall_through(
        &mut self,
        reader: &mut TextReader,
        group: &'s CommandGroup,
        attempted: Option<(String, Location)>,
    ) -> Option<Box<GroupChild<'s>>> {
        if let Some(implicit) = group.implicit_command() {
            let nested = self.parse_command(reader, implicit, None);
            return Some(Box::new(GroupChild::Command(nested)));
        }

        match attempted {
            Some((name, location)) => {
                self.log.push(Diagnostic::parsing(
                    location,
                    format!("Unknown command or group '{name}'"),
                ));
            }
            None => {
                self.log.push(Diagnostic::parsing(
                    Location::at(reader.position()),
                    "Expected a command or group name",
                ));
            }
        }
        None
    }

    /// Reads a bare identifier token: the next break-delimited run, provided
    /// it does not open with a flag prefix. Consumes it on success.
    fn read_identifier(&self, reader: &mut TextReader) -> Option<(String, Location)> {
        reader.skip_trivia();
        if reader.is_at_end() || reader.at_empty_fragment() {
            return None;
        }
        let text = reader.text_until_break();
        if text.is_empty()
            || text.starts_with(&self.options.long_flag_prefix)
            || text.starts_with(&self.options.short_flag_prefix)
        {
            return None;
        }
        let start = reader.position();
        reader.advance(text.chars().count());
        Some((text, Location::new(start, reader.position())))
    }

    // ---- command parsing -----------------------------------------------

    fn parse_command(
        &mut self,
        reader: &mut TextReader,
        command: &'s Command,
        name_token: Option<Token>,
    ) -> CommandParseResult<'s> {
        debug!(
            command = command.name().unwrap_or("<implicit>"),
            "parsing command"
        );
        self.scope.push(command.flags());
        let mut flags = Vec::new();
        let mut arguments = Vec::new();

        for argument in command.arguments() {
            flags.extend(self.parse_flags(reader));
            if self.cancelled {
                break;
            }
            if !self.parse_argument(reader, argument, &mut arguments) {
                break;
            }
        }
        if !self.cancelled {
            flags.extend(self.parse_flags(reader));
        }

        self.scope.pop();
        CommandParseResult {
            command,
            name_token,
            flags,
            arguments,
        }
    }

    /// Attempts one positional argument. Returns `false` when argument
    /// processing must stop (absence, malformed value, cancellation).
    fn parse_argument(
        &mut self,
        reader: &mut TextReader,
        argument: &'s Argument,
        arguments: &mut Vec<ArgumentParseResult<'s>>,
    ) -> bool {
        let saved = reader.save();
        let ctx = ValueContext::new(argument.name(), &self.cancellation);
        let result = argument.parser().parse(&ctx, reader);

        if result.is_successful() {
            arguments.push(ArgumentParseResult {
                argument,
                value: result,
            });
            return true;
        }

        // Parsers always set an error on failure.
        let Some(error) = result.error.clone() else {
            return false;
        };
        match error.kind {
            ValueErrorKind::Cancelled => {
                self.cancelled = true;
                self.log.push(Diagnostic::parsing(result.location, error.message));
                false
            }
            ValueErrorKind::Missing => {
                if argument.is_required() {
                    self.log.push(Diagnostic::parsing(
                        result.location,
                        format!("Expected value for the argument '{}'", argument.name()),
                    ));
                } else {
                    // Nothing was provided: stop silently and leave later
                    // arguments at their declared defaults.
                    reader.restore(saved);
                }
                false
            }
            ValueErrorKind::Empty => {
                // An empty token was explicitly provided; only nullable
                // targets accept it, required or not.
                self.log
                    .push(Diagnostic::parsing(result.location, error.message));
                arguments.push(ArgumentParseResult {
                    argument,
                    value: result,
                });
                false
            }
            ValueErrorKind::Malformed => {
                self.log
                    .push(Diagnostic::parsing(result.location, error.message));
                arguments.push(ArgumentParseResult {
                    argument,
                    value: result,
                });
                false
            }
        }
    }

    // ---- flag parsing --------------------------------------------------

    fn find_long(&self, name: &str) -> Option<&'s Flag> {
        self.scope
            .iter()
            .rev()
            .flat_map(|flags| flags.iter())
            .find(|f| f.matches_long(name))
    }

    fn find_short(&self, c: char) -> Option<&'s Flag> {
        self.scope
            .iter()
            .rev()
            .flat_map(|flags| flags.iter())
            .find(|f| f.matches_short(c))
    }

    fn parse_flags(&mut self, reader: &mut TextReader) -> Vec<FlagParseResult<'s>> {
        let mut out = Vec::new();
        loop {
            let saved = reader.save();
            reader.skip_trivia();
            match self.try_parse_flag(reader) {
                FlagAttempt::Parsed(flag) => out.push(flag),
                FlagAttempt::Consumed => {}
                FlagAttempt::NotAFlag => {
                    reader.restore(saved);
                    break;
                }
            }
            if self.cancelled {
                break;
            }
        }
        out
    }

    fn try_parse_flag(&mut self, reader: &mut TextReader) -> FlagAttempt<'s> {
        if reader.is_at_end() || reader.at_empty_fragment() {
            return FlagAttempt::NotAFlag;
        }

        let text = reader.text();
        let long = &self.options.long_flag_prefix;
        let short = &self.options.short_flag_prefix;
        let matches_long = !long.is_empty() && text.starts_with(long.as_str());
        let matches_short = !short.is_empty() && text.starts_with(short.as_str());

        if self.options.merged_prefixes() {
            if matches_long {
                return self.parse_merged_flag(reader);
            }
            return FlagAttempt::NotAFlag;
        }
        if matches_long && matches_short {
            // Both prefixes match textually; the longer one wins.
            if long.chars().count() >= short.chars().count() {
                return self.parse_long_flag(reader);
            }
            return self.parse_short_flag(reader);
        }
        if matches_long {
            return self.parse_long_flag(reader);
        }
        if matches_short {
            return self.parse_short_flag(reader);
        }
        FlagAttempt::NotAFlag
    }

    /// With merged prefixes the body is tried as a long name first, then
    /// falls back to short-cluster rules.
    fn parse_merged_flag(&mut self, reader: &mut TextReader) -> FlagAttempt<'s> {
        let saved = reader.save();
        reader.advance(self.options.long_flag_prefix.chars().count());
        let body = self.read_flag_body(reader);
        reader.restore(saved);
        if body.is_empty() {
            return FlagAttempt::NotAFlag;
        }
        if self.find_long(&body).is_some() {
            return self.parse_long_flag(reader);
        }
        self.parse_short_flag(reader)
    }

    fn parse_long_flag(&mut self, reader: &mut TextReader) -> FlagAttempt<'s> {
        let start = reader.position();
        reader.advance(self.options.long_flag_prefix.chars().count());
        let name = self.read_flag_body(reader);
        if name.is_empty() {
            return FlagAttempt::NotAFlag;
        }
        let location = Location::new(start, reader.position());
        let text = format!("{}{}", self.options.long_flag_prefix, name);

        match self.find_long(&name) {
            Some(flag) => {
                debug!(flag = %text, "matched long flag");
                self.dispatch_flag(reader, flag, Token::new(TokenKind::FlagName, location, &text))
            }
            None => {
                let trailing = self.consume_until_break(reader);
                let full = Location::new(start, reader.position());
                self.error_tokens
                    .push(Token::new(TokenKind::Error, full, format!("{text}{trailing}")));
                self.log.push(Diagnostic::parsing(
                    location,
                    format!("Unknown flag '{text}'"),
                ));
                FlagAttempt::Consumed
            }
        }
    }

    fn parse_short_flag(&mut self, reader: &mut TextReader) -> FlagAttempt<'s> {
        let start = reader.position();
        let prefix_len = self.options.short_flag_prefix.chars().count();
        reader.advance(prefix_len);
        let body = self.read_flag_body(reader);
        if body.is_empty() {
            return FlagAttempt::NotAFlag;
        }
        let location = Location::new(start, reader.position());
        let text = format!("{}{}", self.options.short_flag_prefix, body);
        let chars: Vec<char> = body.chars().collect();

        // A body opening with a digit is a negative number, not a flag,
        // unless a short flag is actually registered on that digit.
        if chars[0].is_ascii_digit() && self.find_short(chars[0]).is_none() {
            return FlagAttempt::NotAFlag;
        }

        if chars.len() == 1 {
            return match self.find_short(chars[0]) {
                Some(flag) => {
                    debug!(flag = %text, "matched short flag");
                    self.dispatch_flag(
                        reader,
                        flag,
                        Token::new(TokenKind::FlagName, location, &text),
                    )
                }
                None => {
                    self.error_tokens
                        .push(Token::new(TokenKind::Error, location, &text));
                    self.log.push(Diagnostic::parsing(
                        location,
                        format!("Unknown flag '{text}'"),
                    ));
                    FlagAttempt::Consumed
                }
            };
        }

        self.parse_short_cluster(start, prefix_len, location, &text, &chars)
    }

    /// Classifies a multi-character short body: a Repeat run (`-vvv`), a
    /// Chain of distinct toggles (`-abc`), or an ambiguous cluster.
    fn parse_short_cluster(
        &mut self,
        start: Point,
        prefix_len: usize,
        location: Location,
        text: &str,
        chars: &[char],
    ) -> FlagAttempt<'s> {
        let all_same = chars.windows(2).all(|w| w[0] == w[1]);
        let all_distinct = chars.iter().collect::<HashSet<_>>().len() == chars.len();

        if all_same {
            let display_name = format!("{}{}", self.options.short_flag_prefix, chars[0]);
            return match self.find_short(chars[0]) {
                Some(flag) if flag.kind() == FlagKind::Repeat => {
                    debug!(flag = %display_name, count = chars.len(), "matched repeat cluster");
                    FlagAttempt::Parsed(FlagParseResult::Repeat {
                        flag,
                        name_token: Token::new(TokenKind::FlagName, location, text),
                        count: chars.len(),
                    })
                }
                Some(_) => {
                    self.error_tokens
                        .push(Token::new(TokenKind::Error, location, text));
                    self.log.push(Diagnostic::parsing(
                        location,
                        format!("Flag '{display_name}' cannot be repeated"),
                    ));
                    FlagAttempt::Consumed
                }
                None => {
                    self.error_tokens
                        .push(Token::new(TokenKind::Error, location, text));
                    self.log.push(Diagnostic::parsing(
                        location,
                        format!("Unknown flag '{display_name}'"),
                    ));
                    FlagAttempt::Consumed
                }
            };
        }

        if all_distinct {
            let mut resolved = Vec::new();
            for (i, c) in chars.iter().enumerate() {
                let char_start = Point::new(start.fragment, start.offset + prefix_len + i);
                let char_location =
                    Location::new(char_start, Point::new(char_start.fragment, char_start.offset + 1));
                let display = format!("{}{}", self.options.short_flag_prefix, c);
                match self.find_short(*c) {
                    Some(flag) if flag.kind() == FlagKind::Toggle => resolved.push(flag),
                    Some(_) => {
                        self.log.push(Diagnostic::parsing(
                            char_location,
                            format!("Flag '{display}' takes a value and cannot be combined"),
                        ));
                    }
                    None => {
                        self.log.push(Diagnostic::parsing(
                            char_location,
                            format!("Unknown flag '{display}'"),
                        ));
                    }
                }
            }
            if resolved.is_empty() {
                self.error_tokens
                    .push(Token::new(TokenKind::Error, location, text));
                return FlagAttempt::Consumed;
            }
            debug!(cluster = %text, toggles = resolved.len(), "matched toggle chain");
            return FlagAttempt::Parsed(FlagParseResult::Chain {
                name_token: Token::new(TokenKind::FlagName, location, text),
                flags: resolved,
            });
        }

        // Neither all-same nor all-unique: always diagnosed, never silent.
        self.error_tokens
            .push(Token::new(TokenKind::Error, location, text));
        self.log.push(Diagnostic::parsing(
            location,
            format!("Ambiguous short flag cluster '{text}'"),
        ));
        FlagAttempt::Consumed
    }

    fn dispatch_flag(
        &mut self,
        reader: &mut TextReader,
        flag: &'s Flag,
        name_token: Token,
    ) -> FlagAttempt<'s> {
        match flag.kind() {
            FlagKind::Toggle => FlagAttempt::Parsed(FlagParseResult::Toggle { flag, name_token }),
            FlagKind::Repeat => FlagAttempt::Parsed(FlagParseResult::Repeat {
                flag,
                name_token,
                count: 1,
            }),
            FlagKind::Regular => self.parse_flag_value(reader, flag, name_token),
        }
    }

    fn parse_flag_value(
        &mut self,
        reader: &mut TextReader,
        flag: &'s Flag,
        name_token: Token,
    ) -> FlagAttempt<'s> {
        let separator = self.consume_separator(reader);
        let display = name_token.text().to_string();

        if separator.is_none() && !self.options.allows_whitespace_separator() {
            self.log.push(Diagnostic::parsing(
                Location::at(reader.position()),
                format!("Expected a value separator after '{display}'"),
            ));
            return FlagAttempt::Consumed;
        }

        // Every regular flag carries a parser; validation enforces it.
        let Some(parser) = flag.parser() else {
            return FlagAttempt::Consumed;
        };

        let ctx = ValueContext::new(&display, &self.cancellation);
        let result = parser.parse(&ctx, reader);

        if let Some(error) = &result.error {
            match error.kind {
                ValueErrorKind::Cancelled => {
                    self.cancelled = true;
                    self.log
                        .push(Diagnostic::parsing(result.location, error.message.clone()));
                }
                ValueErrorKind::Missing => {
                    self.log.push(Diagnostic::parsing(
                        result.location,
                        format!("Missing value for flag '{display}'"),
                    ));
                }
                ValueErrorKind::Empty | ValueErrorKind::Malformed => {
                    self.log
                        .push(Diagnostic::parsing(result.location, error.message.clone()));
                }
            }
        }

        FlagAttempt::Parsed(FlagParseResult::Value {
            flag,
            name_token,
            separator,
            value: result,
        })
    }

    fn consume_separator(&self, reader: &mut TextReader) -> Option<Token> {
        let text = reader.text();
        for separator in self.options.symbol_separators() {
            if text.starts_with(separator) {
                let start = reader.position();
                reader.advance(separator.chars().count());
                return Some(Token::new(
                    TokenKind::Symbol,
                    Location::new(start, reader.position()),
                    separator,
                ));
            }
        }
        None
    }

    /// Reads an identifier-like run: alphanumerics, `-`, `_`. Stops at
    /// separators, breaks, and fragment end.
    fn read_flag_body(&self, reader: &mut TextReader) -> String {
        let mut body = String::new();
        loop {
            let c = reader.current();
            if c == crate::reader::END_OF_FRAGMENT || !(c.is_alphanumeric() || c == '-' || c == '_')
            {
                break;
            }
            body.push(c);
            reader.advance(1);
        }
        body
    }

    fn consume_until_break(&self, reader: &mut TextReader) -> String {
        let text = reader.text_until_break();
        let count = text.chars().count();
        if count > 0 {
            reader.advance(count);
        }
        text
    }

    // ---- completion ----------------------------------------------------

    /// Reports trailing unconsumed input. A fresh "Not all input was parsed"
    /// diagnostic is only emitted when the log is otherwise clean; when
    /// earlier diagnostics already explain the stop, the leftover is recorded
    /// as an `Unprocessed` token without a duplicate root cause.
    fn check_completion(&mut self, reader: &mut TextReader) -> Option<Token> {
        reader.skip_trivia();
        if reader.is_at_end() {
            return None;
        }

        let start = reader.position();
        let mut rest = String::new();
        loop {
            let remaining = reader.text();
            if reader.at_empty_fragment() {
                reader.consume_empty_fragment();
            } else {
                let count = remaining.chars().count();
                if count > 0 {
                    rest.push_str(&remaining);
                    reader.advance(count);
                }
            }
            if reader.is_last_fragment() {
                break;
            }
            // A successor exists; this cannot fail.
            let _ = reader.next_fragment();
            rest.push(' ');
        }
        let location = Location::new(start, reader.position());
        debug!(leftover = %rest, "input not fully consumed");

        if self.log.is_empty() {
            self.log
                .push(Diagnostic::parsing(location, "Not all input was parsed"));
        }
        Some(Token::new(TokenKind::Unprocessed, location, rest))
    }
}
