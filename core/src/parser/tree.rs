//! Immutable parse-result tree produced by one parse call.
//!
//! Every node borrows the schema it was parsed against (`'s`), which both
//! avoids copying descriptors and encodes the rule that the schema must
//! outlive — and stay unchanged for — every parse result derived from it.

use crate::diagnostics::DiagnosticLog;
use crate::schema::{Argument, Command, CommandGroup, Flag};
use crate::source::Token;
use crate::values::{Value, ValueParseResult};

/// One parsed flag occurrence.
#[derive(Debug, Clone)]
pub enum FlagParseResult<'s> {
    /// A toggle flag was present.
    Toggle {
        /// The matched flag.
        flag: &'s Flag,
        /// The flag-name token, prefix included.
        name_token: Token,
    },
    /// A regular flag with its (possibly failed) value.
    Value {
        /// The matched flag.
        flag: &'s Flag,
        /// The flag-name token, prefix included.
        name_token: Token,
        /// The separator token; `None` when whitespace separated the value.
        separator: Option<Token>,
        /// The value-parse outcome.
        value: ValueParseResult,
    },
    /// A cluster of distinct toggle flags matched from one short token
    /// (`-abc`).
    Chain {
        /// The cluster token.
        name_token: Token,
        /// The toggles that resolved, in cluster order.
        flags: Vec<&'s Flag>,
    },
    /// A repeat flag with its repetition count (`-vvv` ⇒ 3).
    Repeat {
        /// The matched flag.
        flag: &'s Flag,
        /// The flag-name token.
        name_token: Token,
        /// Number of repetitions this occurrence contributes.
        count: usize,
    },
}

impl<'s> FlagParseResult<'s> {
    /// The token that named this flag occurrence.
    pub fn name_token(&self) -> &Token {
        match self {
            FlagParseResult::Toggle { name_token, .. }
            | FlagParseResult::Value { name_token, .. }
            | FlagParseResult::Chain { name_token, .. }
            | FlagParseResult::Repeat { name_token, .. } => name_token,
        }
    }

    /// Whether this occurrence involves the given flag.
    pub fn involves(&self, flag: &Flag) -> bool {
        match self {
            FlagParseResult::Toggle { flag: f, .. }
            | FlagParseResult::Value { flag: f, .. }
            | FlagParseResult::Repeat { flag: f, .. } => std::ptr::eq(*f, flag),
            FlagParseResult::Chain { flags, .. } => flags.iter().any(|f| std::ptr::eq(*f, flag)),
        }
    }

    fn collect_tokens(&self, out: &mut Vec<Token>) {
        out.push(self.name_token().clone());
        if let FlagParseResult::Value {
            separator, value, ..
        } = self
        {
            if let Some(separator) = separator {
                out.push(separator.clone());
            }
            value.collect_tokens(out);
        }
    }
}

/// One parsed positional argument.
#[derive(Debug, Clone)]
pub struct ArgumentParseResult<'s> {
    /// The schema argument this value was parsed for.
    pub argument: &'s Argument,
    /// The value-parse outcome.
    pub value: ValueParseResult,
}

impl<'s> ArgumentParseResult<'s> {
    /// The parsed value, or the argument's declared default when the parse
    /// failed.
    pub fn value_or_default(&self) -> Option<&Value> {
        self.value
            .value
            .as_ref()
            .or_else(|| self.argument.default_value())
    }
}

/// Result of parsing one command: name, flags, and arguments.
#[derive(Debug, Clone)]
pub struct CommandParseResult<'s> {
    /// The schema command that matched.
    pub command: &'s Command,
    /// The command-name token; `None` for implicit commands.
    pub name_token: Option<Token>,
    /// Flag occurrences, in input order.
    pub flags: Vec<FlagParseResult<'s>>,
    /// Argument results, in position order.
    pub arguments: Vec<ArgumentParseResult<'s>>,
}

impl<'s> CommandParseResult<'s> {
    /// Looks up an argument result by declared name.
    pub fn argument(&self, name: &str) -> Option<&ArgumentParseResult<'s>> {
        self.arguments.iter().find(|a| a.argument.name() == name)
    }

    /// Total repetition count contributed for `flag` across all occurrences
    /// (toggles count 1 each).
    pub fn flag_count(&self, flag: &Flag) -> usize {
        self.flags
            .iter()
            .map(|f| match f {
                FlagParseResult::Repeat { flag: g, count, .. } if std::ptr::eq(*g, flag) => *count,
                other if other.involves(flag) => 1,
                _ => 0,
            })
            .sum()
    }
}

/// A group-level match nested inside a [`GroupParseResult`].
#[derive(Debug, Clone)]
pub enum GroupChild<'s> {
    /// A child group matched and was descended into.
    Group(GroupParseResult<'s>),
    /// A child or implicit command matched.
    Command(CommandParseResult<'s>),
}

/// Result of parsing one command group.
#[derive(Debug, Clone)]
pub struct GroupParseResult<'s> {
    /// The schema group this node corresponds to.
    pub group: &'s CommandGroup,
    /// The group-name token; `None` for the root.
    pub name_token: Option<Token>,
    /// Shared-flag occurrences parsed at this group level, in input order.
    pub flags: Vec<FlagParseResult<'s>>,
    /// The nested match, if any name or implicit command resolved.
    pub child: Option<Box<GroupChild<'s>>>,
}

impl<'s> GroupParseResult<'s> {
    /// The deepest command result reached by the descent.
    pub fn leaf_command(&self) -> Option<&CommandParseResult<'s>> {
        match self.child.as_deref() {
            Some(GroupChild::Command(command)) => Some(command),
            Some(GroupChild::Group(group)) => group.leaf_command(),
            None => None,
        }
    }

    fn collect_tokens(&self, out: &mut Vec<Token>) {
        if let Some(token) = &self.name_token {
            out.push(token.clone());
        }
        for flag in &self.flags {
            flag.collect_tokens(out);
        }
        match self.child.as_deref() {
            Some(GroupChild::Group(group)) => group.collect_tokens(out),
            Some(GroupChild::Command(command)) => {
                if let Some(token) = &command.name_token {
                    out.push(token.clone());
                }
                for flag in &command.flags {
                    flag.collect_tokens(out);
                }
                for argument in &command.arguments {
                    argument.value.collect_tokens(out);
                }
            }
            None => {}
        }
    }
}

/// The complete outcome of one parse call: the result tree, the diagnostic
/// log, and any trailing unprocessed input.
///
/// # Examples
///
/// ```
/// use argtree_core::parse_arguments;
/// use argtree_core::options::ParserOptions;
/// use argtree_core::schema::{Argument, Command, CommandGroup};
/// use argtree_core::values::{Value, primitives::StringParser};
///
/// let schema = CommandGroup::root().with_implicit(
///     Command::implicit().with_argument(Argument::required("text", 0, StringParser)),
/// );
///
/// let result = parse_arguments(&schema, &["hello"], &ParserOptions::default()).unwrap();
/// assert!(result.is_successful());
/// let command = result.leaf_command().unwrap();
/// assert_eq!(
///     command.argument("text").unwrap().value.value,
///     Some(Value::Str("hello".to_string()))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ParseResult<'s> {
    /// The root of the parse tree.
    pub root: GroupParseResult<'s>,
    /// All diagnostics recorded during the parse.
    pub diagnostics: DiagnosticLog,
    /// Trailing input the parse did not consume, if any.
    pub unprocessed: Option<Token>,
    /// Spans that were consumed but matched nothing in the schema (unknown
    /// flags, ambiguous clusters), in input order.
    pub error_tokens: Vec<Token>,
}

impl<'s> ParseResult<'s> {
    /// Whether the parse completed without diagnostics.
    pub fn is_successful(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The deepest command result reached by the descent.
    pub fn leaf_command(&self) -> Option<&CommandParseResult<'s>> {
        self.root.leaf_command()
    }

    /// All flag occurrences across every level of the tree, in input order.
    pub fn all_flags(&self) -> Vec<&FlagParseResult<'s>> {
        let mut out = Vec::new();
        let mut node = Some(&self.root);
        while let Some(group) = node {
            out.extend(group.flags.iter());
            match group.child.as_deref() {
                Some(GroupChild::Group(inner)) => node = Some(inner),
                Some(GroupChild::Command(command)) => {
                    out.extend(command.flags.iter());
                    node = None;
                }
                None => node = None,
            }
        }
        out
    }

    /// Every consumed token, sorted by location start.
    ///
    /// The concatenated spans cover exactly the consumed subset of input;
    /// trailing unprocessed input appears as its own
    /// [`Unprocessed`](crate::source::TokenKind::Unprocessed) token.
    pub fn enumerate_tokens(&self) -> Vec<Token> {
        let mut out = Vec::new();
        self.root.collect_tokens(&mut out);
        out.extend(self.error_tokens.iter().cloned());
        if let Some(unprocessed) = &self.unprocessed {
            out.push(unprocessed.clone());
        }
        out.sort_by_key(|t| t.location.start);
        out
    }
}
