//! Schema type definitions for command-line structure modeling.
//!
//! A schema is an immutable tree of [`CommandGroup`]s, [`Command`]s,
//! [`Flag`]s, and [`Argument`]s that the parser walks against user input.
//! Each flag and argument carries its selected value parser behind the
//! erased [`ValueParserHandle`], built once at construction.
//!
//! # Immutability contract
//!
//! Build the schema once, then share it by `&` reference (or `Arc`) for the
//! lifetime of the parser. The parser performs no locking around schema
//! reads; concurrent parses over the same schema are safe exactly because
//! nothing can mutate it — all schema mutation goes through owning builder
//! methods, and every schema type is `Send + Sync`.

mod validate;

pub use validate::{ValidationError, validate_group};

use crate::values::nullable::NullableParser;
use crate::values::{Value, ValueParser, ValueParserHandle};
use std::sync::Arc;

/// How a flag consumes input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Takes a value through its value parser (`--output path`).
    Regular,
    /// Presence means `true`; no value is consumed (`--force`).
    Toggle,
    /// Occurrences are counted; a run of identical short characters adds its
    /// length (`-vvv` means 3).
    Repeat,
}

/// The name(s) of a flag: a long form, a short form, or both.
///
/// Constructed only through [`FlagName::long`], [`FlagName::short`], and
/// [`FlagName::both`], so a flag with neither form is unrepresentable.
///
/// Names are stored without their prefixes; prefixes belong to
/// [`ParserOptions`](crate::options::ParserOptions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagName {
    long: Option<String>,
    short: Option<char>,
}

impl FlagName {
    /// A long-form-only name (e.g. `verbose` for `--verbose`).
    pub fn long(name: impl Into<String>) -> Self {
        Self {
            long: Some(name.into()),
            short: None,
        }
    }

    /// A short-form-only name (e.g. `v` for `-v`).
    pub fn short(name: char) -> Self {
        Self {
            long: None,
            short: Some(name),
        }
    }

    /// Both forms.
    pub fn both(long: impl Into<String>, short: char) -> Self {
        Self {
            long: Some(long.into()),
            short: Some(short),
        }
    }

    /// The long form, if any.
    pub fn long_name(&self) -> Option<&str> {
        self.long.as_deref()
    }

    /// The short form, if any.
    pub fn short_name(&self) -> Option<char> {
        self.short
    }

    /// Canonical display form: long preferred, short as fallback.
    pub fn display(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => long.clone(),
            (None, Some(short)) => short.to_string(),
            // Unreachable by construction.
            (None, None) => String::new(),
        }
    }
}

/// Schema for a command flag.
///
/// # Examples
///
/// ```
/// use argtree_core::schema::{Flag, FlagKind, FlagName};
/// use argtree_core::values::primitives::IntegerParser;
///
/// let verbose = Flag::repeat(FlagName::both("verbose", 'v'));
/// assert_eq!(verbose.kind(), FlagKind::Repeat);
///
/// let port = Flag::value(FlagName::long("port"), IntegerParser).required();
/// assert!(port.is_required());
/// assert!(port.parser().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Flag {
    name: FlagName,
    kind: FlagKind,
    required: bool,
    nullable: bool,
    default: Option<Value>,
    parser: Option<ValueParserHandle>,
}

impl Flag {
    /// Creates a [`FlagKind::Regular`] flag with the given value parser.
    pub fn value(name: FlagName, parser: impl ValueParser + 'static) -> Self {
        Self {
            name,
            kind: FlagKind::Regular,
            required: false,
            nullable: false,
            default: None,
            parser: Some(Arc::new(parser)),
        }
    }

    /// Creates a [`FlagKind::Toggle`] flag.
    pub fn toggle(name: FlagName) -> Self {
        Self {
            name,
            kind: FlagKind::Toggle,
            required: false,
            nullable: false,
            default: None,
            parser: None,
        }
    }

    /// Creates a [`FlagKind::Repeat`] flag.
    pub fn repeat(name: FlagName) -> Self {
        Self {
            name,
            kind: FlagKind::Repeat,
            required: false,
            nullable: false,
            default: None,
            parser: None,
        }
    }

    /// Marks the flag required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Makes the flag's value nullable: an explicitly empty token parses as
    /// [`Value::Null`]. No effect on toggle/repeat flags.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self.parser = self
            .parser
            .take()
            .map(|p| Arc::new(NullableParser::new(p)) as ValueParserHandle);
        self
    }

    /// Sets the value used when the flag is absent.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// The flag's name(s).
    pub fn name(&self) -> &FlagName {
        &self.name
    }

    /// How this flag consumes input.
    pub fn kind(&self) -> FlagKind {
        self.kind
    }

    /// Whether the flag must be present.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether an explicitly empty value is accepted as null.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The default value, if configured.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The erased value parser; `None` for toggle/repeat flags.
    pub fn parser(&self) -> Option<&ValueParserHandle> {
        self.parser.as_ref()
    }

    /// Whether `name` matches this flag's long form.
    pub fn matches_long(&self, name: &str) -> bool {
        self.name.long_name() == Some(name)
    }

    /// Whether `c` matches this flag's short form.
    pub fn matches_short(&self, c: char) -> bool {
        self.name.short_name() == Some(c)
    }
}

/// Schema for a positional argument.
///
/// Arguments are consumed in `position` order, interleaved with flags.
/// Required arguments carry no default; use [`Argument::optional`] with
/// [`with_default`](Argument::with_default) for defaulted values
/// ([`validate_group`] rejects a defaulted required argument).
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    position: usize,
    required: bool,
    default: Option<Value>,
    parser: ValueParserHandle,
}

impl Argument {
    /// Creates a required positional argument.
    pub fn required(
        name: impl Into<String>,
        position: usize,
        parser: impl ValueParser + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            required: true,
            default: None,
            parser: Arc::new(parser),
        }
    }

    /// Creates an optional positional argument.
    pub fn optional(
        name: impl Into<String>,
        position: usize,
        parser: impl ValueParser + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            required: false,
            default: None,
            parser: Arc::new(parser),
        }
    }

    /// Sets the value used when the argument is absent.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Makes the argument's value nullable.
    pub fn nullable(mut self) -> Self {
        self.parser = Arc::new(NullableParser::new(self.parser));
        self
    }

    /// The argument's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Zero-based position among the command's arguments.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the argument must be supplied.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The default value, if configured.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The erased value parser.
    pub fn parser(&self) -> &ValueParserHandle {
        &self.parser
    }
}

/// Schema for a command: an optional name, flags, and ordered arguments.
///
/// A command with no name serves as a group's implicit command, used when no
/// child name matches the input.
///
/// # Examples
///
/// ```
/// use argtree_core::schema::{Argument, Command, Flag, FlagName};
/// use argtree_core::values::primitives::StringParser;
///
/// let add = Command::named("add")
///     .with_flag(Flag::toggle(FlagName::both("force", 'f')))
///     .with_argument(Argument::required("path", 0, StringParser));
/// assert_eq!(add.name(), Some("add"));
/// assert_eq!(add.arguments().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Command {
    name: Option<String>,
    flags: Vec<Flag>,
    arguments: Vec<Argument>,
}

impl Command {
    /// Creates a named command.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Creates an unnamed command, for use as a group's implicit command.
    pub fn implicit() -> Self {
        Self::default()
    }

    /// Adds a flag.
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Adds a positional argument, keeping arguments ordered by position.
    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self.arguments.sort_by_key(Argument::position);
        self
    }

    /// The command's name, `None` for an implicit command.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The command's flags.
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// The command's arguments, ordered by position.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }
}

/// Schema for a command group: shared flags, child groups and commands keyed
/// by name, and an optional implicit command.
///
/// The parse entry point takes the root group; nested groups form paths like
/// `net tcp connect`.
///
/// # Examples
///
/// ```
/// use argtree_core::schema::{Command, CommandGroup, Flag, FlagName};
///
/// let root = CommandGroup::root()
///     .with_flag(Flag::repeat(FlagName::short('v')))
///     .with_group(CommandGroup::named("remote").with_command(Command::named("add")))
///     .with_command(Command::named("status"));
///
/// assert!(root.find_group("remote").is_some());
/// assert!(root.find_command("status").is_some());
/// assert!(root.has_children());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandGroup {
    name: Option<String>,
    flags: Vec<Flag>,
    groups: Vec<CommandGroup>,
    commands: Vec<Command>,
    implicit: Option<Command>,
}

impl CommandGroup {
    /// Creates the unnamed root group.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a named group.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Adds a shared flag, available to everything nested under this group.
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Adds a child group.
    pub fn with_group(mut self, group: CommandGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds a child command.
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Sets the implicit command used when no child name matches.
    pub fn with_implicit(mut self, command: Command) -> Self {
        self.implicit = Some(command);
        self
    }

    /// The group's name, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The group's shared flags.
    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    /// Child groups.
    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    /// Child commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// The implicit command, if any.
    pub fn implicit_command(&self) -> Option<&Command> {
        self.implicit.as_ref()
    }

    /// Whether the group has any named children to descend into.
    pub fn has_children(&self) -> bool {
        !self.groups.is_empty() || !self.commands.is_empty()
    }

    /// Looks up a child group by exact name.
    pub fn find_group(&self, name: &str) -> Option<&CommandGroup> {
        self.groups.iter().find(|g| g.name.as_deref() == Some(name))
    }

    /// Looks up a child command by exact name.
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|c| c.name.as_deref() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::primitives::{IntegerParser, StringParser};

    #[test]
    fn test_flag_name_display_prefers_long() {
        assert_eq!(FlagName::both("verbose", 'v').display(), "verbose");
        assert_eq!(FlagName::short('v').display(), "v");
    }

    #[test]
    fn test_nullable_wraps_the_parser() {
        let flag = Flag::value(FlagName::long("limit"), IntegerParser).nullable();
        assert!(flag.is_nullable());
        assert_eq!(
            flag.parser().unwrap().type_name(),
            "nullable integer"
        );
    }

    #[test]
    fn test_toggle_flags_have_no_parser() {
        let flag = Flag::toggle(FlagName::short('f'));
        assert!(flag.parser().is_none());
        assert_eq!(flag.kind(), FlagKind::Toggle);
    }

    #[test]
    fn test_arguments_kept_in_position_order() {
        let command = Command::named("copy")
            .with_argument(Argument::optional("dest", 1, StringParser))
            .with_argument(Argument::required("source", 0, StringParser));

        let names: Vec<&str> = command.arguments().iter().map(Argument::name).collect();
        assert_eq!(names, vec!["source", "dest"]);
    }

    #[test]
    fn test_group_lookups() {
        let root = CommandGroup::root()
            .with_group(CommandGroup::named("net"))
            .with_command(Command::named("status"));

        assert!(root.find_group("net").is_some());
        assert!(root.find_group("status").is_none());
        assert!(root.find_command("status").is_some());
        assert!(root.find_command("missing").is_none());
    }
}
