use goscript::error::RuntimeError;
use goscript::evaluator::{with_call_stack, MAX_CALL_DEPTH};
use goscript::{Environment, Error, Interpreter, Value};

const SUM: &str = "fn sum(n) { if n == 0 { 0 } else { n + sum(n - 1) } }";

/// Runs `src` on an interpreter call stack and renders the resulting value.
fn run_deep(src: String) -> Result<String, Error> {
    with_call_stack(move || run(&src).map(|value| value.to_string()))
        .unwrap_or_else(|e| panic!("Failed to spawn interpreter thread: {e}"))
}

fn run(src: &str) -> Result<Value, Error> {
    Interpreter::with_io(&b""[..], Vec::new()).run(src, &Environment::new())
}

fn assert_value(src: &str, expected: Value) {
    match run(src) {
        Ok(value) => assert_eq!(value, expected, "value of {src:?}"),
        Err(e) => panic!("Script {src:?} failed: {e}"),
    }
}

fn assert_output(src: &str, expected: &str) {
    let mut interpreter = Interpreter::with_io(&b""[..], Vec::new());
    if let Err(e) = interpreter.run(src, &Environment::new()) {
        panic!("Script {src:?} failed: {e}");
    }
    assert_eq!(String::from_utf8_lossy(interpreter.output()), expected);
}

fn assert_failure(src: &str) -> Error {
    match run(src) {
        Ok(value) => panic!("Script {src:?} succeeded with {value} but was expected to fail"),
        Err(e) => e,
    }
}

fn int(i: i64) -> Value {
    Value::Integer(i)
}

fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

#[test]
fn operator_precedence() {
    assert_value("1 + 2 * 3", int(7));
    assert_value("(1 + 2) * 3", int(9));
    assert_value("2 * 3 + 4 * 5", int(26));
    assert_value("x = 1 == 1; x", Value::Boolean(true));
}

#[test]
fn type_coercion() {
    assert_value("1 + 2.5", Value::Float(3.5));
    assert_value(r#""x=" + 1"#, string("x=1"));
    assert_value(r#""x=" + 1.5"#, string("x=1.5"));
}

#[test]
fn ranges_are_inclusive() {
    let ints = |xs: &[i64]| Value::Array(xs.iter().copied().map(Value::Integer).collect());
    assert_value("1..5", ints(&[1, 2, 3, 4, 5]));
    assert_value("5..1", ints(&[5, 4, 3, 2, 1]));
    assert_value("1..10:2", ints(&[1, 3, 5, 7, 9]));
    assert_value("5..1:-2", ints(&[5, 3, 1]));
    assert_value("1..5:-2", ints(&[1, 3, 5]));
}

#[test]
fn closures_see_their_definition_scope() {
    let src = "
        fn adder(n) { fn(x) { x + n } }
        add2 = adder(2)
        n = 40
        add3 = adder(3)
        n = 50
        add2(1) * 10 + add3(1)
    ";
    assert_value(src, int(34));
}

#[test]
fn recursion() {
    assert_value("fn f(n) { if n <= 1 { 1 } n * f(n-1) } f(5)", int(120));
    assert_value(
        "fn fib(n) { if n < 2 { return n } fib(n - 1) + fib(n - 2) } fib(15)",
        int(610),
    );
}

#[test]
fn collections() {
    assert_value("len([1,2,3])", int(3));
    assert_value(r#"len("hello")"#, int(5));
    assert_value("a = [1, 2, 3]\na[0] = 9\na[0]", int(9));
    assert_value(r#"m = {1: "one", "k": true}; m["k"]"#, Value::Boolean(true));
}

#[test]
fn swap() {
    assert_value("a = 1\nb = 2\nswap(a, b)\na * 10 + b", int(21));
    assert_value("xs = [1, 2]\nb = 5\nswap(xs[1], b)\nxs[1] * 10 + b", int(52));
    assert_value(r#"m = {"x": 1, "y": 2}; swap(m["x"], m["y"]); m["x"]"#, int(2));
}

#[test]
fn strings_and_comments() {
    assert_output(r#"println("tab\there", "quote\"d") // trailing"#, "tab\there quote\"d\n");
    assert_output("/* block\n comment */ print(\"a\\nb\")", "a\nb");
    assert_value("snake_case = 1; _x = 2; snake_case + _x", int(3));
}

#[test]
fn else_if_chains() {
    let src = r#"
        fn grade(score) {
            if score >= 90 { "A" } else if score >= 80 { "B" } else { "C" }
        }
        grade(95) + grade(85) + grade(10)
    "#;
    assert_value(src, string("ABC"));
}

#[test]
fn unmatched_brace_is_a_syntax_error() {
    let err = assert_failure("fn f() {\n  1\n");
    assert!(matches!(err, Error::Syntax(_)));
    assert_eq!(err.exit_code(), 65);
}

#[test]
fn error_classes() {
    assert!(matches!(assert_failure("\"open"), Error::Lexical(_)));
    assert!(matches!(assert_failure("1 @ 2"), Error::Lexical(_)));
    assert!(matches!(assert_failure("/* never closed"), Error::Lexical(_)));
    assert!(matches!(assert_failure("for x y { }"), Error::Syntax(_)));
    assert!(matches!(assert_failure("[1, 2"), Error::Syntax(_)));
    assert!(matches!(
        assert_failure("nope"),
        Error::Runtime(RuntimeError::Reference(_))
    ));
    assert!(matches!(
        assert_failure("10 / (5 - 5)"),
        Error::Runtime(RuntimeError::DivisionByZero)
    ));
    let err = assert_failure(r#""a" * 2"#);
    assert!(matches!(err, Error::Runtime(RuntimeError::Type(_))));
    assert_eq!(err.exit_code(), 70);
}

#[test]
fn repl_scope_survives_errors() {
    let env = Environment::new();
    let mut interpreter = Interpreter::with_io(&b""[..], Vec::new());
    interpreter.run("x = 1", &env).unwrap();
    assert!(interpreter.run("x = x + undefined", &env).is_err());
    assert_eq!(interpreter.run("x", &env).unwrap(), int(1));
}

#[test]
fn thousands_of_nested_calls() {
    assert_eq!(run_deep(format!("{SUM}\nsum(5000)")).unwrap(), "12502500");
}

#[test]
fn runaway_recursion_is_a_runtime_error() {
    let err = run_deep(format!("{SUM}\nsum(100000)")).unwrap_err();
    match &err {
        Error::Runtime(RuntimeError::RecursionLimit(limit)) => assert_eq!(*limit, MAX_CALL_DEPTH),
        other => panic!("expected the recursion limit, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 70);
}

#[test]
fn scope_survives_runaway_recursion() {
    let outcome = with_call_stack(|| {
        let env = Environment::new();
        let mut interpreter = Interpreter::with_io(&b""[..], Vec::new());
        interpreter.run(SUM, &env).unwrap();
        let failed = interpreter.run("sum(100000)", &env).is_err();
        (failed, interpreter.run("sum(10)", &env).map(|value| value.to_string()))
    })
    .unwrap();
    assert!(outcome.0);
    assert_eq!(outcome.1.unwrap(), "55");
}

#[test]
fn for_iterates_characters_not_bytes() {
    assert_value(
        r#"out = ""; n = 0; for c in "héllo✓" { out = c + out; n = n + 1 } out + n"#,
        string("✓olléh6"),
    );
    assert_value(r#"last = ""; for i, c in "añb" { last = "" + i + c } last"#, string("2b"));
}
