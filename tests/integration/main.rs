//! End-to-end tests driving the ccgen binary

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

fn ccgen(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ccgen"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to run ccgen")
}

fn repo(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::Builder::new().prefix("repo").tempdir().unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "ccgen failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn package<'a>(packages: &'a Value, name: &str) -> &'a Value {
    packages
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["package"] == name)
        .unwrap_or_else(|| panic!("package {name} missing"))
}

fn rule<'a>(package: &'a Value, name: &str) -> &'a Value {
    package["rules"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .unwrap_or_else(|| panic!("rule {name} missing"))
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    let output = ccgen(dir.path(), &["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Bazel C/C++ rule generator"));
    assert!(stdout.contains("generate"));
    assert!(stdout.contains("index"));
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    let output = ccgen(dir.path(), &["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("ccgen v"));
}

#[test]
fn test_generate_unit_rules_with_cross_package_deps() {
    let dir = repo(&[
        ("lib/a.h", "#pragma once\nint a();\n"),
        ("lib/a.cc", "#include \"a.h\"\nint a() { return 1; }\n"),
        ("app/main.cc", "#include \"lib/a.h\"\nint main() { return a(); }\n"),
    ]);

    let packages = stdout_json(&ccgen(dir.path(), &["generate", "--grouping", "unit"]));

    let lib = rule(package(&packages, "lib"), "a");
    assert_eq!(lib["kind"], "cc_library");
    assert_eq!(lib["hdrs"], serde_json::json!(["a.h"]));
    assert_eq!(lib["srcs"], serde_json::json!(["a.cc"]));
    assert!(lib.get("deps").is_none());

    let main = rule(package(&packages, "app"), "main");
    assert_eq!(main["kind"], "cc_binary");
    assert_eq!(main["srcs"], serde_json::json!(["main.cc"]));
    assert_eq!(main["deps"], serde_json::json!(["//lib:a"]));
}

#[test]
fn test_generate_directory_rules_and_tests() {
    let dir = repo(&[
        ("net/socket.h", "#pragma once\n"),
        ("net/socket.cc", "#include \"socket.h\"\n"),
        ("net/buffer.h", "#pragma once\n"),
        ("net/socket_test.cc", "#include \"socket.h\"\n"),
    ]);

    let packages = stdout_json(&ccgen(dir.path(), &["generate", "--grouping", "directory"]));
    let net = package(&packages, "net");

    let lib = rule(net, "net");
    assert_eq!(lib["hdrs"], serde_json::json!(["buffer.h", "socket.h"]));
    assert_eq!(lib["srcs"], serde_json::json!(["socket.cc"]));

    let test = rule(net, "net_test");
    assert_eq!(test["kind"], "cc_test");
    assert_eq!(test["deps"], serde_json::json!(["//net"]));
}

#[test]
fn test_generate_reports_removed_rules_from_prior_state() {
    let dir = repo(&[("old/README.md", "moved to lib/\n")]);
    let prior = dir.path().join("prior.json");
    fs::write(
        &prior,
        r#"{"old": [{"name": "gone", "kind": "cc_library", "sources": ["old.cc"]}]}"#,
    )
    .unwrap();

    let packages = stdout_json(&ccgen(
        dir.path(),
        &["generate", "--grouping", "unit", "--prior", prior.to_str().unwrap()],
    ));
    let old = package(&packages, "old");
    assert!(old["rules"].as_array().unwrap().is_empty());
    let empty = &old["empty"];
    assert_eq!(empty, &serde_json::json!([{"kind": "cc_library", "name": "gone"}]));
}

#[test]
fn test_index_and_resolve() {
    let dir = TempDir::new().unwrap();
    let modules = dir.path().join("modules.json");
    fs::write(
        &modules,
        r#"[
            {
                "repository": "fmt",
                "targets": [
                    {
                        "name": "//:fmt",
                        "hdrs": ["//:include/fmt/core.h"],
                        "strip_include_prefix": "include"
                    }
                ]
            }
        ]"#,
    )
    .unwrap();
    let index = dir.path().join("out/index.json");

    let output = ccgen(
        dir.path(),
        &["index", "--modules", modules.to_str().unwrap(), "-o", index.to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let written: Value = serde_json::from_str(&fs::read_to_string(&index).unwrap()).unwrap();
    assert_eq!(written["fmt/core.h"], "@fmt//:fmt");
    assert_eq!(written["include/fmt/core.h"], "@fmt//:fmt");

    let output = ccgen(
        dir.path(),
        &["resolve", "--index", index.to_str().unwrap(), "fmt/core.h", "missing.h"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fmt/core.h\t@fmt//:fmt"));
    assert!(stdout.contains("missing.h\t-"));
}

#[test]
fn test_generate_rejects_missing_directory() {
    let dir = TempDir::new().unwrap();
    let output = ccgen(dir.path(), &["generate", "does-not-exist"]);
    assert!(!output.status.success());
}
