use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn write_schema(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("failed to write schema file");
    path
}

fn run_argtree(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_argtree"))
        .args(args)
        .output()
        .expect("failed to run argtree")
}

fn schema_json() -> &'static str {
    r#"{
        "root": {
            "flags": [{"long": "verbose", "short": "v", "kind": "repeat"}],
            "groups": [{
                "name": "net",
                "commands": [{
                    "name": "connect",
                    "flags": [{"long": "ports", "value": {"list": "integer"}}],
                    "arguments": [{"name": "host", "position": 0, "value": "string"}]
                }]
            }],
            "commands": [{"name": "status"}]
        }
    }"#
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout was not JSON ({err}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

// ---------------------------------------------------------------------------
// parse-args
// ---------------------------------------------------------------------------

#[test]
fn parse_args_resolves_nested_command() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "schema.json", schema_json());

    let output = run_argtree(&[
        "parse-args",
        "--schema",
        schema.to_str().unwrap(),
        "--",
        "net",
        "connect",
        "example.org",
    ]);
    assert!(output.status.success(), "{output:?}");

    let report = stdout_json(&output);
    assert_eq!(report["successful"], serde_json::Value::Bool(true));
    assert_eq!(report["command_path"][0], "net");
    assert_eq!(report["command_path"][1], "connect");
    assert_eq!(report["arguments"][0]["value"], "example.org");
}

#[test]
fn parse_args_reports_collection_flag_value() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "schema.json", schema_json());

    let output = run_argtree(&[
        "parse-args",
        "--schema",
        schema.to_str().unwrap(),
        "--",
        "net",
        "connect",
        "--ports",
        "[80,443]",
        "example.org",
    ]);
    assert!(output.status.success(), "{output:?}");

    let report = stdout_json(&output);
    assert_eq!(report["flags"][0]["name"], "--ports");
    assert_eq!(report["flags"][0]["value"][0], 80);
    assert_eq!(report["flags"][0]["value"][1], 443);
}

#[test]
fn parse_args_fails_with_diagnostics_on_unknown_command() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(&dir, "schema.json", schema_json());

    let output = run_argtree(&[
        "parse-args",
        "--schema",
        schema.to_str().unwrap(),
        "--",
        "bogus",
    ]);
    assert!(!output.status.success());

    // The report is still printed before the failure exit.
    let report = stdout_json(&output);
    assert_eq!(report["successful"], serde_json::Value::Bool(false));
    assert!(
        report["diagnostics"][0]["message"]
            .as_str()
            .unwrap()
            .contains("Unknown command or group 'bogus'"),
        "{report}"
    );
}

// ---------------------------------------------------------------------------
// parse (raw line)
// ---------------------------------------------------------------------------

#[test]
fn parse_raw_line_honors_quotes() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(
        &dir,
        "schema.json",
        r#"{
            "root": {
                "commands": [{
                    "name": "greet",
                    "arguments": [{"name": "who", "position": 0, "value": "string"}]
                }]
            }
        }"#,
    );

    let output = run_argtree(&[
        "parse",
        "--schema",
        schema.to_str().unwrap(),
        "greet \"hello world\"",
    ]);
    assert!(output.status.success(), "{output:?}");

    let report = stdout_json(&output);
    assert_eq!(report["arguments"][0]["value"], "hello world");
}

#[test]
fn parse_supports_yaml_schemas_and_yaml_output() {
    let dir = TempDir::new().unwrap();
    let schema = write_schema(
        &dir,
        "schema.yaml",
        r#"
root:
  commands:
    - name: run
      arguments:
        - name: target
          position: 0
          value: string
"#,
    );

    let output = run_argtree(&[
        "parse",
        "--schema",
        schema.to_str().unwrap(),
        "--format",
        "yaml",
        "run x",
    ]);
    assert!(output.status.success(), "{output:?}");

    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("successful: true"), "{text}");
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

#[test]
fn validate_accepts_good_and_rejects_duplicate_names() {
    let dir = TempDir::new().unwrap();
    let good = write_schema(&dir, "good.json", schema_json());
    let bad = write_schema(
        &dir,
        "bad.json",
        r#"{"root": {"commands": [{"name": "dup"}, {"name": "dup"}]}}"#,
    );

    let output = run_argtree(&["validate", good.to_str().unwrap()]);
    assert!(output.status.success(), "{output:?}");

    let output = run_argtree(&["validate", good.to_str().unwrap(), bad.to_str().unwrap()]);
    assert!(!output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains(&format!("ok: {}", Path::new(&good).display())));
    assert!(text.contains("invalid:"), "{text}");
}
