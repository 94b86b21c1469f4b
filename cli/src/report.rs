//! Serializable parse reports and output rendering.
//!
//! A [`ParseReport`] flattens the borrowed parse tree into an owned,
//! serializable summary suitable for printing or piping into other tools.

use serde::Serialize;

use argtree_core::ParseResult;
use argtree_core::diagnostics::Diagnostic;
use argtree_core::parser::tree::{FlagParseResult, GroupChild, GroupParseResult};
use argtree_core::source::Token;
use argtree_core::values::Value;

/// Supported output formats.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// One flag occurrence, flattened.
#[derive(Debug, Clone, Serialize)]
pub struct FlagReport {
    /// Flag text as written, prefix included.
    pub name: String,
    /// Occurrence kind: `toggle`, `value`, `chain`, or `repeat`.
    pub kind: &'static str,
    /// Repetition count contributed by this occurrence.
    pub count: usize,
    /// The parsed value, for value flags that succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// One positional argument, flattened.
#[derive(Debug, Clone, Serialize)]
pub struct ArgumentReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Owned summary of one parse call.
#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    /// Whether the parse produced no diagnostics.
    pub successful: bool,
    /// Names along the resolved descent, root group excluded.
    pub command_path: Vec<String>,
    /// Flag occurrences across every level, in input order.
    pub flags: Vec<FlagReport>,
    /// Leaf-command argument results.
    pub arguments: Vec<ArgumentReport>,
    /// All diagnostics, ordered by stage.
    pub diagnostics: Vec<Diagnostic>,
    /// Every consumed token, sorted by location.
    pub tokens: Vec<Token>,
    /// Trailing input the parse did not consume.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unprocessed: Option<String>,
}

impl ParseReport {
    /// Flattens a parse result into an owned report.
    pub fn from_result(result: &ParseResult<'_>) -> Self {
        let mut command_path = Vec::new();
        collect_path(&result.root, &mut command_path);

        let flags = result
            .all_flags()
            .into_iter()
            .map(|occurrence| {
                let (kind, count, value) = match occurrence {
                    FlagParseResult::Toggle { .. } => ("toggle", 1, None),
                    FlagParseResult::Value { value, .. } => ("value", 1, value.value.clone()),
                    FlagParseResult::Chain { flags, .. } => ("chain", flags.len(), None),
                    FlagParseResult::Repeat { count, .. } => ("repeat", *count, None),
                };
                FlagReport {
                    name: occurrence.name_token().text().to_string(),
                    kind,
                    count,
                    value,
                }
            })
            .collect();

        let arguments = result
            .leaf_command()
            .map(|command| {
                command
                    .arguments
                    .iter()
                    .map(|a| ArgumentReport {
                        name: a.argument.name().to_string(),
                        value: a.value_or_default().cloned(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            successful: result.is_successful(),
            command_path,
            flags,
            arguments,
            diagnostics: result.diagnostics.iter().cloned().collect(),
            tokens: result.enumerate_tokens(),
            unprocessed: result
                .unprocessed
                .as_ref()
                .map(|t| t.text().to_string()),
        }
    }
}

fn collect_path(group: &GroupParseResult<'_>, out: &mut Vec<String>) {
    if let Some(token) = &group.name_token {
        out.push(token.text().to_string());
    }
    match group.child.as_deref() {
        Some(GroupChild::Group(inner)) => collect_path(inner, out),
        Some(GroupChild::Command(command)) => {
            if let Some(token) = &command.name_token {
                out.push(token.text().to_string());
            }
        }
        None => {}
    }
}

/// Renders a report in the requested output format.
pub fn format_report(report: &ParseReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(report_to_table(report)),
    }
}

fn report_to_table(report: &ParseReport) -> String {
    let mut out = String::new();

    let path = if report.command_path.is_empty() {
        "<implicit>".to_string()
    } else {
        report.command_path.join(" ")
    };
    out.push_str(&format!(
        "Command: {path}  Status: {}\n",
        if report.successful { "ok" } else { "failed" }
    ));

    if !report.flags.is_empty() {
        out.push_str("Flags:\n");
        for flag in &report.flags {
            match &flag.value {
                Some(value) => out.push_str(&format!("  {} = {value}\n", flag.name)),
                None if flag.count > 1 => {
                    out.push_str(&format!("  {} (x{})\n", flag.name, flag.count));
                }
                None => out.push_str(&format!("  {}\n", flag.name)),
            }
        }
    }

    if !report.arguments.is_empty() {
        out.push_str("Arguments:\n");
        for argument in &report.arguments {
            match &argument.value {
                Some(value) => out.push_str(&format!("  {} = {value}\n", argument.name)),
                None => out.push_str(&format!("  {} = <failed>\n", argument.name)),
            }
        }
    }

    if !report.diagnostics.is_empty() {
        out.push_str("Diagnostics:\n");
        for diagnostic in &report.diagnostics {
            out.push_str(&format!(
                "  [{}:{}] {}\n",
                diagnostic.location.start.fragment,
                diagnostic.location.start.offset,
                diagnostic.message
            ));
        }
    }

    if let Some(unprocessed) = &report.unprocessed {
        out.push_str(&format!("Unprocessed: {unprocessed}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use argtree_core::options::ParserOptions;
    use argtree_core::parse_arguments;
    use argtree_core::schema::{Argument, Command, CommandGroup, Flag, FlagName};
    use argtree_core::values::primitives::StringParser;

    fn schema() -> CommandGroup {
        CommandGroup::root()
            .with_flag(Flag::repeat(FlagName::both("verbose", 'v')))
            .with_command(
                Command::named("run")
                    .with_argument(Argument::required("target", 0, StringParser)),
            )
    }

    #[test]
    fn test_report_flattens_path_flags_and_arguments() {
        let schema = schema();
        let result =
            parse_arguments(&schema, &["-vv", "run", "x"], &ParserOptions::default()).unwrap();
        let report = ParseReport::from_result(&result);

        assert!(report.successful);
        assert_eq!(report.command_path, vec!["run"]);
        assert_eq!(report.flags.len(), 1);
        assert_eq!(report.flags[0].count, 2);
        assert_eq!(report.arguments[0].name, "target");
    }

    #[test]
    fn test_table_output_lists_diagnostics() {
        let schema = schema();
        let result = parse_arguments(&schema, &["run"], &ParserOptions::default()).unwrap();
        let report = ParseReport::from_result(&result);

        let table = report_to_table(&report);
        assert!(table.contains("Status: failed"));
        assert!(table.contains("Expected value for the argument 'target'"));
    }

    #[test]
    fn test_json_output_is_machine_readable() {
        let schema = schema();
        let result =
            parse_arguments(&schema, &["run", "x"], &ParserOptions::default()).unwrap();
        let report = ParseReport::from_result(&result);

        let json = format_report(&report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["successful"], serde_json::Value::Bool(true));
        assert_eq!(parsed["command_path"][0], "run");
    }
}
