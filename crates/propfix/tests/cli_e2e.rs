//! CLI end-to-end tests.
//!
//! These tests spawn the actual `propfix` binary against a temporary
//! workspace and validate stdout JSON and exit codes.
//!
//! Exit code expectations:
//! - 0: Success (including "ineligible" outcomes)
//! - 2: Invalid arguments
//! - 3: Resolution error (missing symbol, unsafe reference)
//! - 4: Apply error (cross-document path disabled)

use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Run propfix with given arguments and return (stdout, exit_code).
fn run_propfix(root: &Path, args: &[&str]) -> (String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_propfix"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("failed to execute propfix");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let exit_code = output.status.code().unwrap_or(-1);
    (stdout, exit_code)
}

fn workspace(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for (name, text) in files {
        std::fs::write(dir.path().join(name), text).expect("write fixture");
    }
    dir
}

#[test]
fn convert_dry_run_emits_patch_without_writing() {
    let ws = workspace(&[("Order.cs", "class Order { int Total() { return 10; } }")]);
    let (stdout, exit_code) = run_propfix(ws.path(), &["convert", "--at", "Order.cs:1:19"]);

    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).expect("stdout should be valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["applied"], false);
    assert_eq!(json["conversions"][0]["symbol"]["name"], "Total");
    assert!(json["conversions"][0]["patch"]["unified_diff"]
        .as_str()
        .unwrap()
        .contains("Order.cs"));

    // Dry run: the file on disk is untouched.
    let on_disk = std::fs::read_to_string(ws.path().join("Order.cs")).unwrap();
    assert_eq!(on_disk, "class Order { int Total() { return 10; } }");
}

#[test]
fn convert_apply_writes_the_property_form() {
    let ws = workspace(&[("Order.cs", "class Order { int Total() { return 10; } }")]);
    let (stdout, exit_code) =
        run_propfix(ws.path(), &["convert", "--at", "Order.cs:1:19", "--apply"]);

    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["applied"], true);
    assert_eq!(json["modified_files"][0], "Order.cs");

    let on_disk = std::fs::read_to_string(ws.path().join("Order.cs")).unwrap();
    assert_eq!(on_disk, "class Order { int Total { get { return 10; } } }");
}

#[test]
fn convert_rewrites_call_sites_across_files() {
    let ws = workspace(&[
        ("A.cs", "class A { public int N() => 1; }"),
        ("B.cs", "class B { int M(A a) => a.N(); }"),
    ]);
    let (stdout, exit_code) = run_propfix(ws.path(), &["convert", "--at", "A.cs:1:22", "--apply"]);

    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    assert_eq!(
        std::fs::read_to_string(ws.path().join("B.cs")).unwrap(),
        "class B { int M(A a) => a.N; }"
    );
}

#[test]
fn ineligible_target_exits_zero_with_reasons() {
    let ws = workspace(&[("C.cs", "class C { int Add(int a, int b) => a + b; }")]);
    let (stdout, exit_code) = run_propfix(ws.path(), &["convert", "--at", "C.cs:1:15"]);

    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "ineligible");
    assert_eq!(json["reasons"][0], "has_parameters");
}

#[test]
fn missing_symbol_exits_3() {
    let ws = workspace(&[("C.cs", "class C { int Foo() => 1; }")]);
    let (stdout, exit_code) = run_propfix(ws.path(), &["convert", "--at", "C.cs:1:1"]);

    assert_eq!(exit_code, 3, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
}

#[test]
fn bad_location_syntax_exits_2() {
    let ws = workspace(&[("C.cs", "class C { int Foo() => 1; }")]);
    let (stdout, exit_code) = run_propfix(ws.path(), &["convert", "--at", "nonsense"]);

    assert_eq!(exit_code, 2, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["code"], 2);
}

#[test]
fn no_cross_document_flag_exits_4() {
    let ws = workspace(&[
        ("A.cs", "class A { public int N() => 1; }"),
        ("B.cs", "class B { int M(A a) => a.N(); }"),
    ]);
    let (stdout, exit_code) = run_propfix(
        ws.path(),
        &["convert", "--at", "A.cs:1:22", "--no-cross-document"],
    );

    assert_eq!(exit_code, 4, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["error"]["code"], 4);
    assert_eq!(json["error"]["details"]["files"][0], "B.cs");
}

#[test]
fn same_named_member_in_another_type_exits_3() {
    let ws = workspace(&[
        ("A.cs", "class A { public int Foo() => 1; }"),
        ("Z.cs", "class Z { public int Foo() => 2; }"),
    ]);
    let (stdout, exit_code) = run_propfix(ws.path(), &["convert", "--at", "A.cs:1:22"]);

    assert_eq!(exit_code, 3, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
    assert_eq!(json["error"]["details"]["name"], "Foo");
    assert_eq!(json["error"]["location"]["file"], "Z.cs");
}

#[test]
fn diff_format_prints_a_unified_diff() {
    let ws = workspace(&[("C.cs", "class C { int Foo() => 1; }")]);
    let (stdout, exit_code) = run_propfix(
        ws.path(),
        &["convert", "--at", "C.cs:1:15", "--format", "diff"],
    );

    assert_eq!(exit_code, 0);
    assert!(stdout.contains("--- a/C.cs"));
    assert!(stdout.contains("+++ b/C.cs"));
}

#[test]
fn analyze_reports_references_without_touching_disk() {
    let ws = workspace(&[
        ("A.cs", "class A { public int N() => 1; }"),
        ("B.cs", "class B { int M(A a) => a.N(); }"),
    ]);
    let (stdout, exit_code) = run_propfix(ws.path(), &["analyze", "--at", "A.cs:1:22"]);

    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["eligible"], true);
    assert_eq!(json["impact"]["reference_count"], 1);
    assert_eq!(json["references"][0]["location"]["file"], "B.cs");
    assert_eq!(
        std::fs::read_to_string(ws.path().join("B.cs")).unwrap(),
        "class B { int M(A a) => a.N(); }"
    );
}

#[test]
fn batch_convert_applies_every_target() {
    let ws = workspace(&[(
        "A.cs",
        "class A\n{\n    public int One() => 1;\n    public int Two() => 2;\n}\n",
    )]);
    let (stdout, exit_code) = run_propfix(
        ws.path(),
        &[
            "convert",
            "--at",
            "A.cs:3:16",
            "--at",
            "A.cs:4:16",
            "--apply",
        ],
    );

    assert_eq!(exit_code, 0, "stdout: {}", stdout);
    let json: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["conversions"].as_array().unwrap().len(), 2);
    assert_eq!(
        std::fs::read_to_string(ws.path().join("A.cs")).unwrap(),
        "class A\n{\n    public int One => 1;\n    public int Two => 2;\n}\n"
    );
}
