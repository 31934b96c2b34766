use php_interp::{Ini, Interpreter, Request};
use std::fs;
use std::path::PathBuf;

/// Drop the helper files into a per-test directory and return the path the
/// main script pretends to live at, so relative includes resolve there.
fn setup(test: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("php_interp_includes_{}", test));
    fs::create_dir_all(&dir).expect("create test dir");
    for (name, content) in files {
        fs::write(dir.join(name), content).expect("write fixture");
    }
    dir.join("main.php")
}

fn run_at(main: &PathBuf, source: &str) -> (String, Option<php_interp::PhpError>, i32) {
    let mut interp = Interpreter::new(
        Ini::dev(),
        Request::default(),
        main.to_string_lossy().as_ref(),
    );
    let (output, err) = interp.process(source.as_bytes());
    (
        String::from_utf8_lossy(&output).into_owned(),
        err,
        interp.exit_code(),
    )
}

#[test]
fn include_shares_scope_and_functions() {
    let main = setup(
        "scope",
        &[(
            "lib.php",
            "<?php $v = 41; function bump($x){ return $x + 1; }",
        )],
    );
    let (output, err, _) = run_at(&main, "<?php include 'lib.php'; echo bump($v);");
    assert!(err.is_none(), "{:?}", err);
    assert_eq!(output, "42");
}

#[test]
fn include_returns_the_scripts_return_value() {
    let main = setup("retval", &[("lib.php", "<?php return 7;")]);
    let (output, err, _) = run_at(&main, "<?php $r = include 'lib.php'; echo $r;");
    assert!(err.is_none());
    assert_eq!(output, "7");
}

#[test]
fn include_without_return_yields_one() {
    let main = setup("one", &[("lib.php", "<?php $x = 1;")]);
    let (output, err, _) = run_at(&main, "<?php var_dump(include 'lib.php');");
    assert!(err.is_none());
    assert_eq!(output, "int(1)\n");
}

#[test]
fn included_markup_is_emitted() {
    let main = setup("markup", &[("page.php", "head<?php echo \"!\";")]);
    let (output, err, _) = run_at(&main, "<?php include 'page.php'; echo \"tail\";");
    assert!(err.is_none());
    assert_eq!(output, "head!tail");
}

#[test]
fn include_once_runs_once() {
    let main = setup("once", &[("l.php", "<?php echo \"L\";")]);
    let (output, err, _) = run_at(
        &main,
        "<?php include_once 'l.php'; include_once 'l.php'; echo \"end\";",
    );
    assert!(err.is_none());
    assert_eq!(output, "Lend");
}

#[test]
fn require_once_after_include_is_a_no_op() {
    let main = setup("mixed_once", &[("l.php", "<?php echo \"L\";")]);
    let (output, err, _) = run_at(
        &main,
        "<?php include_once 'l.php'; var_dump(require_once 'l.php');",
    );
    assert!(err.is_none());
    assert_eq!(output, "Lbool(true)\n");
}

#[test]
fn plain_include_runs_every_time() {
    let main = setup("twice", &[("l.php", "<?php echo \"L\";")]);
    let (output, err, _) = run_at(&main, "<?php include 'l.php'; include 'l.php';");
    assert!(err.is_none());
    assert_eq!(output, "LL");
}

#[test]
fn missing_include_warns_and_continues() {
    let main = setup("missing_inc", &[]);
    let (output, err, code) = run_at(
        &main,
        "<?php $r = @include 'nope.php'; var_dump($r); echo \"after\";",
    );
    assert!(err.is_none());
    assert_eq!(code, 0);
    assert_eq!(output, "bool(false)\nafter");
}

#[test]
fn missing_include_warning_text() {
    let main = setup("missing_warn", &[]);
    let (output, err, _) = run_at(&main, "<?php include 'nope.php'; echo \"after\";");
    assert!(err.is_none());
    assert!(output.contains("Warning: include(nope.php): Failed to open stream: No such file or directory"));
    assert!(output.contains("Warning: include(): Failed opening 'nope.php'"));
    assert!(output.ends_with("after"));
}

#[test]
fn missing_require_is_fatal() {
    let main = setup("missing_req", &[]);
    let (output, err, code) = run_at(&main, "<?php require 'nope.php'; echo \"after\";");
    let err = err.expect("require failure is fatal");
    assert_eq!(code, 255);
    assert!(err.to_string().contains("Failed opening required 'nope.php'"));
    assert!(!output.ends_with("after"));
}

#[test]
fn nested_includes_resolve_relative_to_the_including_file() {
    let main = setup(
        "nested",
        &[
            ("outer.php", "<?php include 'inner.php'; echo \"o\";"),
            ("inner.php", "<?php echo \"i\";"),
        ],
    );
    let (output, err, _) = run_at(&main, "<?php include 'outer.php'; echo \"m\";");
    assert!(err.is_none());
    assert_eq!(output, "iom");
}

#[test]
fn parse_error_in_include_propagates() {
    let main = setup("bad", &[("bad.php", "<?php $x = ;")]);
    let (output, err, code) = run_at(&main, "<?php include 'bad.php';");
    assert!(err.is_some());
    assert_eq!(code, 255);
    assert!(output.contains("Parse error:"));
    assert!(output.contains("bad.php"));
}

#[test]
fn null_path_is_fatal() {
    let main = setup("nullpath", &[]);
    let (_, err, _) = run_at(&main, "<?php include null;");
    assert!(err
        .expect("fatal expected")
        .to_string()
        .contains("Path cannot be empty"));
}
