//! On-disk schema definition files.
//!
//! A schema file describes a command tree declaratively in JSON or YAML and
//! is compiled into an [`argtree_core::CommandGroup`] with concrete value
//! parsers attached. The file extension selects the format: `.yaml`/`.yml`
//! deserialize as YAML, everything else as JSON.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use argtree_core::CommandGroup;
use argtree_core::options::ParserOptions;
use argtree_core::schema::{Argument, Command, Flag, FlagName, validate_group};
use argtree_core::values::collection::CollectionParser;
use argtree_core::values::primitives::{
    BooleanParser, CharParser, ChoiceParser, DecimalParser, IntegerParser, StringParser,
};
use argtree_core::values::{Value, ValueParserHandle};

/// Top-level schema file: parser options plus the root group definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Syntax configuration; defaults apply for omitted fields.
    #[serde(default)]
    pub options: ParserOptions,
    /// The root command group.
    pub root: GroupDef,
}

/// Declarative form of a command group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit: Option<CommandDef>,
}

/// Declarative form of a command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<ArgumentDef>,
}

/// Declarative form of a flag.
///
/// The kind may be omitted: a flag with a `value` type is regular, one
/// without is a toggle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FlagKindDef>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub value: Option<ValueTypeDef>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Flag kind names accepted in schema files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagKindDef {
    Value,
    Toggle,
    Repeat,
}

/// Declarative form of a positional argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentDef {
    pub name: String,
    pub position: usize,
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub value: ValueTypeDef,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

/// Value-type names accepted in schema files.
///
/// Scalar types are plain strings (`"integer"`); composites nest:
/// `{"choice": ["fast", "slow"]}`, `{"list": "integer"}`, and lists of lists
/// compose as `{"list": {"list": "integer"}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueTypeDef {
    String,
    Char,
    Boolean,
    Integer,
    Decimal,
    Choice(Vec<String>),
    List(Box<ValueTypeDef>),
}

/// Loads a schema file from disk, picking the format from the extension.
pub fn load(path: &Path) -> Result<SchemaFile, String> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read schema file '{}': {err}", path.display()))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&text)
            .map_err(|err| format!("Invalid YAML schema '{}': {err}", path.display()))
    } else {
        serde_json::from_str(&text)
            .map_err(|err| format!("Invalid JSON schema '{}': {err}", path.display()))
    }
}

/// Compiles a schema file into a validated command tree. Collection value
/// types pick up the delimiter strings from the file's parser options.
pub fn build(file: &SchemaFile) -> Result<CommandGroup, String> {
    let group = build_group(&file.root, &file.options)?;
    let errors = validate_group(&group);
    if !errors.is_empty() {
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(format!("Invalid schema: {joined}"));
    }
    Ok(group)
}

fn build_group(def: &GroupDef, options: &ParserOptions) -> Result<CommandGroup, String> {
    let mut group = match &def.name {
        Some(name) => CommandGroup::named(name),
        None => CommandGroup::root(),
    };
    for flag in &def.flags {
        group = group.with_flag(build_flag(flag, options)?);
    }
    for child in &def.groups {
        group = group.with_group(build_group(child, options)?);
    }
    for command in &def.commands {
        group = group.with_command(build_command(command, options)?);
    }
    if let Some(implicit) = &def.implicit {
        group = group.with_implicit(build_command(implicit, options)?);
    }
    Ok(group)
}

fn build_command(def: &CommandDef, options: &ParserOptions) -> Result<Command, String> {
    let mut command = match &def.name {
        Some(name) => Command::named(name),
        None => Command::implicit(),
    };
    for flag in &def.flags {
        command = command.with_flag(build_flag(flag, options)?);
    }
    for argument in &def.arguments {
        command = command.with_argument(build_argument(argument, options)?);
    }
    Ok(command)
}

fn build_flag(def: &FlagDef, options: &ParserOptions) -> Result<Flag, String> {
    let name = match (&def.long, def.short) {
        (Some(long), Some(short)) => FlagName::both(long, short),
        (Some(long), None) => FlagName::long(long),
        (None, Some(short)) => FlagName::short(short),
        (None, None) => return Err("A flag needs a long or short name".to_string()),
    };

    let kind = def.kind.unwrap_or(if def.value.is_some() {
        FlagKindDef::Value
    } else {
        FlagKindDef::Toggle
    });

    let mut flag = match kind {
        FlagKindDef::Toggle => Flag::toggle(name),
        FlagKindDef::Repeat => Flag::repeat(name),
        FlagKindDef::Value => {
            let value = def.value.as_ref().ok_or_else(|| {
                format!(
                    "Flag '{}' takes a value but declares no value type",
                    def.long.clone().unwrap_or_default()
                )
            })?;
            Flag::value(name, build_parser(value, options))
        }
    };

    if def.required {
        flag = flag.required();
    }
    if def.nullable {
        flag = flag.nullable();
    }
    if let Some(default) = &def.default {
        flag = flag.with_default(default.clone());
    }
    Ok(flag)
}

fn build_argument(def: &ArgumentDef, options: &ParserOptions) -> Result<Argument, String> {
    let parser = build_parser(&def.value, options);
    let mut argument = if def.required {
        Argument::required(&def.name, def.position, parser)
    } else {
        Argument::optional(&def.name, def.position, parser)
    };
    if def.nullable {
        argument = argument.nullable();
    }
    if let Some(default) = &def.default {
        argument = argument.with_default(default.clone());
    }
    Ok(argument)
}

fn build_parser(def: &ValueTypeDef, options: &ParserOptions) -> ValueParserHandle {
    match def {
        ValueTypeDef::String => Arc::new(StringParser),
        ValueTypeDef::Char => Arc::new(CharParser),
        ValueTypeDef::Boolean => Arc::new(BooleanParser),
        ValueTypeDef::Integer => Arc::new(IntegerParser),
        ValueTypeDef::Decimal => Arc::new(DecimalParser),
        ValueTypeDef::Choice(variants) => Arc::new(ChoiceParser::new(variants.clone())),
        ValueTypeDef::List(element) => Arc::new(CollectionParser::from_options(
            build_parser(element, options),
            options,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtree_core::values::ValueParser;

    #[test]
    fn test_json_schema_round_trips_into_a_command_tree() {
        let json = r#"{
            "root": {
                "flags": [{"long": "verbose", "short": "v", "kind": "repeat"}],
                "commands": [{
                    "name": "connect",
                    "flags": [{"long": "ports", "value": {"list": "integer"}}],
                    "arguments": [{"name": "host", "position": 0, "value": "string"}]
                }]
            }
        }"#;

        let file: SchemaFile = serde_json::from_str(json).unwrap();
        let group = build(&file).unwrap();

        let connect = group.find_command("connect").unwrap();
        assert_eq!(connect.arguments().len(), 1);
        assert_eq!(
            connect.flags()[0].parser().unwrap().type_name(),
            "list of integer"
        );
    }

    #[test]
    fn test_yaml_value_types_compose() {
        let yaml = r#"
root:
  commands:
    - name: run
      flags:
        - long: mode
          value:
            choice: [fast, slow]
      arguments:
        - name: matrix
          position: 0
          value:
            list:
              list: integer
"#;
        let file: SchemaFile = serde_yaml::from_str(yaml).unwrap();
        let group = build(&file).unwrap();
        let run = group.find_command("run").unwrap();
        assert_eq!(
            run.flags()[0].parser().unwrap().type_name(),
            "one of fast|slow"
        );
        assert_eq!(
            run.arguments()[0].parser().type_name(),
            "list of list of integer"
        );
    }

    #[test]
    fn test_collection_delimiters_follow_schema_options() {
        let json = r#"{
            "options": {"collection_separator": ";"},
            "root": {
                "commands": [{
                    "name": "run",
                    "arguments": [{"name": "items", "position": 0, "value": {"list": "integer"}}]
                }]
            }
        }"#;
        let file: SchemaFile = serde_json::from_str(json).unwrap();
        let group = build(&file).unwrap();

        let result =
            argtree_core::parse_arguments(&group, &["run", "[1;2]"], &file.options).unwrap();
        assert!(result.is_successful(), "{:?}", result.diagnostics);
        assert_eq!(
            result
                .leaf_command()
                .unwrap()
                .argument("items")
                .unwrap()
                .value
                .value,
            Some(Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn test_flag_without_any_name_is_rejected() {
        let def = FlagDef::default();
        assert!(build_flag(&def, &ParserOptions::default()).is_err());
    }

    #[test]
    fn test_structural_validation_runs_on_build() {
        let json = r#"{
            "root": {
                "commands": [
                    {"name": "dup"},
                    {"name": "dup"}
                ]
            }
        }"#;
        let file: SchemaFile = serde_json::from_str(json).unwrap();
        let err = build(&file).unwrap_err();
        assert!(err.contains("Invalid schema"), "{err}");
    }
}
