use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("temp dir"),
        }
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("graphdiff").expect("graphdiff binary");
        cmd.env("XDG_CONFIG_HOME", self.path())
            .env("APPDATA", self.path())
            .env("HOME", self.path())
            .env("RUST_LOG", "warn");
        cmd
    }

    /// `compare` against a config path that does not exist unless written
    fn compare(&self, left: &Path, right: &Path) -> Command {
        let mut cmd = self.command();
        cmd.arg("compare")
            .arg(left)
            .arg(right)
            .arg("--config")
            .arg(self.path().join("graphdiff.toml"));
        cmd
    }
}

fn stdout_json(output: &std::process::Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).expect("stdout not utf-8");
    serde_json::from_str(&stdout).expect("invalid json output")
}

fn paths(report: &Value) -> Vec<String> {
    let mut paths: Vec<String> = report["differences"]
        .as_array()
        .expect("differences array missing")
        .iter()
        .map(|d| d["path"].as_str().unwrap_or("").to_string())
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_identical_documents_exit_zero() {
    let ws = Workspace::new();
    let left = ws.write("left.json", r#"{"name": "svc", "ports": [80, 443]}"#);
    let right = ws.write("right.json", r#"{"ports": [80, 443], "name": "svc"}"#);

    let output = ws.compare(&left, &right).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("No differences"));
}

#[test]
fn test_different_documents_exit_two_with_report() {
    let ws = Workspace::new();
    let left = ws.write("left.json", r#"{"name": "svc", "replicas": 2, "ports": [80, 443]}"#);
    let right = ws.write("right.json", r#"{"name": "api", "replicas": 3, "ports": [80]}"#);

    let output = ws.compare(&left, &right).arg("--json").output().unwrap();
    assert_eq!(
        output.status.code(),
        Some(2),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report = stdout_json(&output);
    assert_eq!(report["identical"], Value::Bool(false));
    assert_eq!(report["total"], Value::from(3));
    assert_eq!(paths(&report), vec![".name", ".ports[1]", ".replicas"]);

    let replicas = report["differences"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["path"] == ".replicas")
        .unwrap();
    assert_eq!(replicas["left"], "2");
    assert_eq!(replicas["right"], "3");
    assert_eq!(replicas["delta"], "+1");

    let port = report["differences"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["path"] == ".ports[1]")
        .unwrap();
    assert_eq!(port["array_index"], Value::from(1));
    assert!(port["right"].is_null());
}

#[test]
fn test_mixed_formats_and_type_changes() {
    let ws = Workspace::new();
    let left = ws.write("left.yaml", "name: svc\nreplicas: 2\n");
    let right = ws.write("right.toml", "name = \"svc\"\nreplicas = \"two\"\n");

    let output = ws.compare(&left, &right).arg("--json").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(paths(&stdout_json(&output)), vec![".replicas"]);
}

#[test]
fn test_exclude_and_include_lists() {
    let ws = Workspace::new();
    let left = ws.write("left.json", r#"{"a": 1, "b": {"c": 1, "d": 1}}"#);
    let right = ws.write("right.json", r#"{"a": 2, "b": {"c": 2, "d": 2}}"#);

    let excluded = ws
        .compare(&left, &right)
        .args(["--json", "--exclude", "a", "--exclude", ".b.d"])
        .output()
        .unwrap();
    assert_eq!(paths(&stdout_json(&excluded)), vec![".b.c"]);

    let included = ws
        .compare(&left, &right)
        .args(["--json", "--include", ".b"])
        .output()
        .unwrap();
    assert_eq!(paths(&stdout_json(&included)), vec![".b.c", ".b.d"]);

    let strict = ws
        .compare(&left, &right)
        .args(["--include", ".b", "--no-inherit"])
        .output()
        .unwrap();
    assert_eq!(strict.status.code(), Some(0));
}

#[test]
fn test_unordered_arrays() {
    let ws = Workspace::new();
    let left = ws.write("left.json", r#"{"tags": ["a", "b", "c"]}"#);
    let right = ws.write("right.json", r#"{"tags": ["c", "a", "b"]}"#);

    ws.compare(&left, &right).assert().code(2);
    ws.compare(&left, &right).arg("--unordered").assert().code(0);
}

#[test]
fn test_empty_and_missing_arrays() {
    let ws = Workspace::new();
    let left = ws.write("left.json", r#"{"tags": null}"#);
    let right = ws.write("right.json", r#"{"tags": []}"#);

    ws.compare(&left, &right).assert().code(2);
    ws.compare(&left, &right)
        .arg("--empty-equals-null")
        .assert()
        .code(0);
    ws.compare(&left, &right)
        .arg("--no-collections")
        .assert()
        .code(0);
}

#[test]
fn test_config_file_exclusions() {
    let ws = Workspace::new();
    ws.write("graphdiff.toml", "exclude = [\"version\"]\n");
    let left = ws.write("left.json", r#"{"version": 1, "name": "x"}"#);
    let right = ws.write("right.json", r#"{"version": 2, "name": "x"}"#);

    ws.compare(&left, &right).assert().code(0);
}

#[test]
fn test_config_with_unknown_option_fails() {
    let ws = Workspace::new();
    ws.write("graphdiff.toml", "options = [\"compare-everything\"]\n");
    let left = ws.write("left.json", "{}");
    let right = ws.write("right.json", "{}");

    ws.compare(&left, &right).assert().code(1);
}

#[test]
fn test_errors_exit_one() {
    let ws = Workspace::new();
    let good = ws.write("good.json", "{}");
    let broken = ws.write("broken.json", "{not json");
    let unknown = ws.write("notes.txt", "{}");

    ws.compare(&good, &broken).assert().code(1);
    ws.compare(&good, &unknown).assert().code(1);
    ws.compare(&good, &ws.path().join("missing.json")).assert().code(1);

    // explicit format overrides the extension
    ws.compare(&good, &unknown)
        .args(["--format", "json"])
        .assert()
        .code(0);

    ws.command().arg("compare").assert().code(1);
}

#[test]
fn test_text_line_diff() {
    let ws = Workspace::new();
    let left = ws.write("left.txt", "one\ntwo\nthree\n");
    let right = ws.write("right.txt", "one\n2\nthree\n");

    let output = ws
        .command()
        .arg("text")
        .arg(&left)
        .arg(&right)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-two"));
    assert!(stdout.contains("+2"));
    assert!(stdout.contains(" one"));

    ws.command()
        .arg("text")
        .arg(&left)
        .arg(&left)
        .assert()
        .code(0);
}

#[test]
fn test_text_normalisation_flags() {
    let ws = Workspace::new();
    let left = ws.write("left.txt", "  Hello   World\n");
    let right = ws.write("right.txt", "hello world\n");

    ws.command().arg("text").arg(&left).arg(&right).assert().code(2);
    ws.command()
        .arg("text")
        .arg(&left)
        .arg(&right)
        .args(["--trim", "--ignore-space", "--ignore-case"])
        .assert()
        .code(0);
}

#[test]
fn test_text_word_diff_json() {
    let ws = Workspace::new();
    let left = ws.write("left.txt", "lorem ipsum dolor sit amet");
    let right = ws.write("right.txt", "lorem ipsum dolor amet");

    let output = ws
        .command()
        .arg("text")
        .arg(&left)
        .arg(&right)
        .args(["--words", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let report = stdout_json(&output);
    assert_eq!(report["mode"], "words");
    assert_eq!(report["deletions"], serde_json::json!(["sit"]));
    assert_eq!(report["additions"], serde_json::json!([]));
}
