use std::fs;
use std::path::{Path, PathBuf};

use goscript::error::RuntimeError;
use goscript::evaluator::with_call_stack;
use goscript::{Environment, Error, Interpreter};
use walkdir::WalkDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn run_script(path: &Path) -> String {
    let source =
        fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"));
    let mut interpreter = Interpreter::with_io(&b""[..], Vec::new());
    if let Err(e) = interpreter.run(&source, &Environment::new()) {
        panic!("Script {path:?} failed: {e}");
    }
    String::from_utf8(interpreter.into_output()).unwrap()
}

#[test]
fn fixture_scripts_print_expected_output() {
    let mut count = 0;

    for entry in WalkDir::new(fixtures())
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "gos"))
    {
        let path = entry.path();
        let expected = fs::read_to_string(path.with_extension("out"))
            .unwrap_or_else(|e| panic!("Missing expected output for {path:?}: {e}"));
        assert_eq!(run_script(path), expected, "output of {path:?}");
        count += 1;
    }

    assert!(count > 0, "No scripts found in tests/fixtures");
}

#[test]
fn import_splices_into_the_callers_scope() {
    let library = fixtures().join("lib").join("geometry.gos");
    let source = format!("import({:?})\narea(2, 3)", library.display().to_string());
    let env = Environment::new();
    let mut interpreter = Interpreter::with_io(&b""[..], Vec::new());

    let value = interpreter.run(&source, &env).unwrap();
    assert_eq!(value, goscript::Value::Integer(6));
    assert_eq!(env.get_variable("unit"), Some(goscript::Value::String("cm2".to_string())));
}

#[test]
fn errors_inside_imports_name_the_file() {
    let broken = fixtures().join("lib").join("broken.gos");
    let source = format!("import({:?})", broken.display().to_string());
    let mut interpreter = Interpreter::with_io(&b""[..], Vec::new());

    match interpreter.run(&source, &Environment::new()) {
        Err(Error::Runtime(RuntimeError::Import { path, source })) => {
            assert_eq!(path, broken);
            assert!(matches!(*source, Error::Syntax(_)));
        }
        other => panic!("expected an import error, got {other:?}"),
    }
}

#[test]
fn syntax_errors_inside_imports_exit_as_syntax_errors() {
    let broken = fixtures().join("lib").join("broken.gos");
    let source = format!("import({:?})", broken.display().to_string());
    let err = Interpreter::with_io(&b""[..], Vec::new())
        .run(&source, &Environment::new())
        .unwrap_err();
    assert_eq!(err.exit_code(), 65);
}

#[test]
fn import_cycles_hit_the_call_depth_limit() {
    let script = fixtures().join("lib").join("self_import.gos");
    let (exit_code, innermost) = with_call_stack(move || {
        let source = fs::read_to_string(&script).unwrap();
        let err = Interpreter::with_io(&b""[..], Vec::new())
            .run(&source, &Environment::new())
            .unwrap_err();
        let mut innermost = &err;
        while let Error::Runtime(RuntimeError::Import { source, .. }) = innermost {
            innermost = &**source;
        }
        let found = matches!(innermost, Error::Runtime(RuntimeError::RecursionLimit(_)));
        (err.exit_code(), found)
    })
    .unwrap();
    assert_eq!(exit_code, 70);
    assert!(innermost, "expected the recursion limit at the bottom of the import chain");
}
