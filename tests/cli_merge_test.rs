//! Exit-status and output contract of the `merge` command.

use lsif_loom::ingest::RefObservation;
use lsif_loom::{Location, Range, RefKind, Shard, Symbol, SymbolId, SymbolKind};
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn shard_json() -> String {
    let id = SymbolId::from_usr("c:@F@foo#");
    let mut shard = Shard::new("src/foo.c");
    shard.symbols.push(
        Symbol::new(id, "foo", SymbolKind::Function)
            .with_definition(Location::new("src/foo.c", Range::new(10, 0, 12, 1)))
            .with_references(1),
    );
    shard.refs.push(RefObservation {
        symbol: id,
        location: Location::new("src/main.c", Range::new(5, 4, 5, 7)),
        kind: RefKind::CALL,
    });
    serde_json::to_string(&shard).unwrap()
}

#[test]
fn merge_writes_lsif_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("unit.json"), shard_json()).unwrap();
    let out_path = dir.path().join("dump.lsif");

    let output = Command::new(env!("CARGO_BIN_EXE_lsif-loom"))
        .arg("merge")
        .arg(dir.path())
        .arg("--output")
        .arg(&out_path)
        .arg("--project-root")
        .arg("file:///project")
        .current_dir(dir.path())
        .output()
        .expect("failed to run lsif-loom");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let dump = fs::read_to_string(&out_path).unwrap();
    let first: serde_json::Value = serde_json::from_str(dump.lines().next().unwrap()).unwrap();
    assert_eq!(first["label"], "metaData");
    assert_eq!(first["projectRoot"], "file:///project");

    // Summary goes to stderr, the stream to the file.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 symbols"), "stderr: {stderr}");
}

#[test]
fn merge_to_stdout_by_default() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("unit.json"), shard_json()).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lsif-loom"))
        .arg("merge")
        .arg(dir.path())
        .current_dir(dir.path())
        .output()
        .expect("failed to run lsif-loom");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().count() > 1);
    assert!(stdout.lines().next().unwrap().contains("metaData"));
}

#[test]
fn failed_unit_still_produces_a_graph_but_fails_the_run() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("good.json"), shard_json()).unwrap();
    fs::write(dir.path().join("broken.json"), "not a shard").unwrap();
    let out_path = dir.path().join("dump.lsif");

    let output = Command::new(env!("CARGO_BIN_EXE_lsif-loom"))
        .arg("merge")
        .arg(dir.path())
        .arg("--output")
        .arg(&out_path)
        .current_dir(dir.path())
        .output()
        .expect("failed to run lsif-loom");

    // Upstream failure propagates to the exit status...
    assert!(!output.status.success());
    // ...but the units that did load were still merged and written.
    let dump = fs::read_to_string(&out_path).unwrap();
    assert!(dump.lines().count() > 1);
}

#[test]
fn missing_inputs_fail_cleanly() {
    let dir = TempDir::new().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lsif-loom"))
        .arg("merge")
        .arg(dir.path()) // empty directory, no shards
        .current_dir(dir.path())
        .output()
        .expect("failed to run lsif-loom");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no shard files"), "stderr: {stderr}");
}

#[test]
fn config_command_prints_active_settings() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("loom.toml"), "format = \"json\"\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lsif-loom"))
        .arg("config")
        .current_dir(dir.path())
        .output()
        .expect("failed to run lsif-loom");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("format = \"json\""), "stdout: {stdout}");
}
