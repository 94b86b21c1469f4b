mod report;
mod schema_file;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;

use argtree_core::{parse_arguments, parse_command_line};
use report::{OutputFormat, ParseReport, format_report};

#[derive(Debug, Parser)]
#[command(name = "argtree")]
#[command(about = "Schema-driven command-line parsing")]
struct Cli {
    /// Enable debug logging on stderr.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a raw command line against a schema file.
    Parse(ParseArgs),
    /// Parse pre-split argv-style arguments against a schema file.
    ParseArgs(ParseArgvArgs),
    /// Validate one or more schema files.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Path to the schema file (JSON or YAML).
    #[arg(long)]
    schema: PathBuf,
    /// The command line to parse, as one string.
    line: String,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ParseArgvArgs {
    /// Path to the schema file (JSON or YAML).
    #[arg(long)]
    schema: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: OutputFormat,
    /// The arguments to parse, one fragment each.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Schema files to check.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::ParseArgs(args) => run_parse_args(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let file = schema_file::load(&args.schema)?;
    let schema = schema_file::build(&file)?;
    debug!(line = %args.line, "parsing raw command line");

    let result = parse_command_line(&schema, &args.line, &file.options)
        .map_err(|err| err.to_string())?;
    emit_report(&ParseReport::from_result(&result), args.format)
}

fn run_parse_args(args: ParseArgvArgs) -> Result<(), String> {
    let file = schema_file::load(&args.schema)?;
    let schema = schema_file::build(&file)?;
    debug!(count = args.args.len(), "parsing argv fragments");

    let result =
        parse_arguments(&schema, &args.args, &file.options).map_err(|err| err.to_string())?;
    emit_report(&ParseReport::from_result(&result), args.format)
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut failures = 0usize;
    for path in &args.inputs {
        match schema_file::load(path).and_then(|file| schema_file::build(&file)) {
            Ok(_) => println!("ok: {}", path.display()),
            Err(err) => {
                println!("invalid: {}: {err}", path.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(format!("{failures} schema file(s) failed validation"));
    }
    Ok(())
}

fn emit_report(report: &ParseReport, format: OutputFormat) -> Result<(), String> {
    println!("{}", format_report(report, format)?);
    if report.successful {
        Ok(())
    } else {
        Err(format!(
            "parsing produced {} diagnostic(s)",
            report.diagnostics.len()
        ))
    }
}
