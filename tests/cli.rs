use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn lilc() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lilc"))
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

#[test]
fn prints_canonical_text() {
    let out = lilc().arg(fixture("messy.lilc")).output().unwrap();
    assert!(out.status.success());
    let expected = std::fs::read_to_string(fixture("messy.canonical")).unwrap();
    assert_eq!(String::from_utf8(out.stdout).unwrap(), expected);
}

#[test]
fn check_mode_accepts_canonical_sources() {
    let out = lilc().arg("--check").arg(fixture("points.lilc")).output().unwrap();
    assert!(out.status.success());
    assert!(out.stdout.is_empty());
}

#[test]
fn parse_errors_exit_with_one() {
    let out = lilc().arg(fixture("broken.lilc")).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("3:9: expected expression"), "{}", stderr);
}

#[test]
fn conflicting_modes_are_rejected() {
    let out = lilc().args(["--check", "--parse-only"]).arg(fixture("points.lilc")).output().unwrap();
    assert!(!out.status.success());
}

// Runs lilc over `src` written to a scratch file.
fn run_on(name: &str, src: &str) -> Output {
    let path = std::env::temp_dir().join(format!("lilc-{}-{}.lilc", std::process::id(), name));
    fs::write(&path, src).unwrap();
    let out = lilc().arg(&path).output().unwrap();
    fs::remove_file(&path).unwrap();
    out
}

#[test]
fn deeply_nested_source_is_rejected_cleanly() {
    let src = format!("void f() {{ write {}a{}; }}\n", "(".repeat(2_000), ")".repeat(2_000));
    let out = run_on("nested", &src);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("expression nested too deeply"), "{}", stderr);
}

#[test]
fn long_field_chains_are_formatted() {
    let chain = ".f".repeat(200_000);
    let out = run_on("chain", &format!("void f() {{ write a{}; }}\n", chain));
    assert!(out.status.success());
    let expected = format!("void f() {{\n    write a{};\n}}\n", chain);
    assert!(String::from_utf8(out.stdout).unwrap() == expected);
}
