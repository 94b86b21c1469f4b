//! Structural validation of command-group schemas.
//!
//! Catches programmer errors in schema construction — duplicate names,
//! impossible argument layouts — before a parse ever runs. Validation never
//! inspects user input; user-input problems are the parser's diagnostics.
//!
//! # Examples
//!
//! ```
//! use argtree_core::schema::{Command, CommandGroup, Flag, FlagName, validate_group};
//!
//! let ok = CommandGroup::root().with_command(Command::named("status"));
//! assert!(validate_group(&ok).is_empty());
//!
//! let dup = CommandGroup::root()
//!     .with_command(Command::named("status"))
//!     .with_command(Command::named("status"));
//! assert!(!validate_group(&dup).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::schema::{Command, CommandGroup, Flag};

/// Schema validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A named group or command has an empty name.
    #[error("empty name at path: {0}")]
    EmptyName(String),
    /// Two children of one group share a name.
    #[error("duplicate child name in scope: {0}")]
    DuplicateChildName(String),
    /// Two flags in one scope share a long or short form.
    #[error("duplicate flag in scope: {0}")]
    DuplicateFlag(String),
    /// Two arguments of one command share a position.
    #[error("duplicate argument position {position} in command: {command}")]
    DuplicateArgumentPosition {
        /// The command's display name.
        command: String,
        /// The clashing position.
        position: usize,
    },
    /// A required argument carries a default value.
    #[error("required argument cannot have a default: {0}")]
    RequiredArgumentWithDefault(String),
    /// A required argument is declared after an optional one.
    #[error("required argument after optional in command {command}: {argument}")]
    RequiredAfterOptional {
        /// The command's display name.
        command: String,
        /// The offending argument.
        argument: String,
    },
    /// A regular flag is missing its value parser.
    #[error("regular flag has no value parser: {0}")]
    MissingValueParser(String),
}

/// Validates a command-group tree.
///
/// Stops at the first error; one structural problem usually cascades into
/// follow-on noise.
pub fn validate_group(group: &CommandGroup) -> Vec<ValidationError> {
    let mut path = vec![group.name().unwrap_or("<root>").to_string()];
    validate_group_at(group, &mut path)
}

fn validate_group_at(group: &CommandGroup, path: &mut Vec<String>) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    errors.extend(validate_flags(group.flags()));
    if !errors.is_empty() {
        return errors;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for child in group.groups() {
        let Some(name) = child.name() else {
            errors.push(ValidationError::EmptyName(path.join(" ")));
            return errors;
        };
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(path.join(" ")));
            return errors;
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateChildName(name.to_string()));
            return errors;
        }
        path.push(name.to_string());
        errors.extend(validate_group_at(child, path));
        path.pop();
        if !errors.is_empty() {
            return errors;
        }
    }

    for command in group.commands() {
        let Some(name) = command.name() else {
            errors.push(ValidationError::EmptyName(path.join(" ")));
            return errors;
        };
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(path.join(" ")));
            return errors;
        }
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicateChildName(name.to_string()));
            return errors;
        }
        errors.extend(validate_command(command));
        if !errors.is_empty() {
            return errors;
        }
    }

    if let Some(implicit) = group.implicit_command() {
        errors.extend(validate_command(implicit));
    }

    errors
}

fn validate_command(command: &Command) -> Vec<ValidationError> {
    let command_name = command.name().unwrap_or("<implicit>").to_string();
    let mut errors = validate_flags(command.flags());
    if !errors.is_empty() {
        return errors;
    }

    let mut positions: HashSet<usize> = HashSet::new();
    let mut seen_optional = false;
    for argument in command.arguments() {
        if !positions.insert(argument.position()) {
            errors.push(ValidationError::DuplicateArgumentPosition {
                command: command_name,
                position: argument.position(),
            });
            return errors;
        }
        if argument.is_required() {
            if argument.default_value().is_some() {
                errors.push(ValidationError::RequiredArgumentWithDefault(
                    argument.name().to_string(),
                ));
                return errors;
            }
            if seen_optional {
                errors.push(ValidationError::RequiredAfterOptional {
                    command: command_name,
                    argument: argument.name().to_string(),
                });
                return errors;
            }
        } else {
            seen_optional = true;
        }
    }

    errors
}

fn validate_flags(flags: &[Flag]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for flag in flags {
        if let Some(long) = flag.name().long_name() {
            if !seen.insert(long.to_string()) {
                errors.push(ValidationError::DuplicateFlag(long.to_string()));
                return errors;
            }
        }
        if let Some(short) = flag.name().short_name() {
            if !seen.insert(short.to_string()) {
                errors.push(ValidationError::DuplicateFlag(short.to_string()));
                return errors;
            }
        }
        if flag.kind() == crate::schema::FlagKind::Regular && flag.parser().is_none() {
            errors.push(ValidationError::MissingValueParser(flag.name().display()));
            return errors;
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Argument, FlagName};
    use crate::values::Value;
    use crate::values::primitives::StringParser;

    #[test]
    fn test_duplicate_flag_detected() {
        let group = CommandGroup::root()
            .with_flag(Flag::toggle(FlagName::long("force")))
            .with_flag(Flag::toggle(FlagName::both("force", 'f')));

        let errors = validate_group(&group);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateFlag("force".to_string())]
        );
    }

    #[test]
    fn test_duplicate_child_name_across_groups_and_commands() {
        let group = CommandGroup::root()
            .with_group(CommandGroup::named("sync"))
            .with_command(Command::named("sync"));

        let errors = validate_group(&group);
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateChildName("sync".to_string())]
        );
    }

    #[test]
    fn test_required_argument_with_default_rejected() {
        let command = Command::named("run").with_argument(
            Argument::required("script", 0, StringParser).with_default(Value::Str("x".into())),
        );
        let group = CommandGroup::root().with_command(command);

        let errors = validate_group(&group);
        assert_eq!(
            errors,
            vec![ValidationError::RequiredArgumentWithDefault(
                "script".to_string()
            )]
        );
    }

    #[test]
    fn test_required_after_optional_rejected() {
        let command = Command::named("copy")
            .with_argument(Argument::optional("source", 0, StringParser))
            .with_argument(Argument::required("dest", 1, StringParser));
        let group = CommandGroup::root().with_command(command);

        let errors = validate_group(&group);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::RequiredAfterOptional { .. }]
        ));
    }

    #[test]
    fn test_valid_nested_schema_passes() {
        let group = CommandGroup::root()
            .with_flag(Flag::repeat(FlagName::short('v')))
            .with_group(
                CommandGroup::named("remote")
                    .with_command(Command::named("add"))
                    .with_command(Command::named("remove")),
            )
            .with_implicit(
                Command::implicit().with_argument(Argument::optional("query", 0, StringParser)),
            );

        assert!(validate_group(&group).is_empty());
    }
}
