// repl.rs

use std::io::{self, BufRead, Write};

use crate::environment::Environment;
use crate::evaluator::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;

const PROMPT: &str = "> ";

/// Reads and runs one line at a time against a single root scope until end
/// of input or `exit`. Errors are reported and the loop carries on.
///
/// With `evaluate` unset, each line is only parsed and its syntax tree is
/// printed.
pub fn start<R: BufRead, W: Write>(
    interpreter: &mut Interpreter<R, W>,
    evaluate: bool,
) -> io::Result<()> {
    let env = Environment::new();
    loop {
        write!(interpreter.output_mut(), "{}", PROMPT)?;
        interpreter.output_mut().flush()?;

        let mut line = String::new();
        if interpreter.input_mut().read_line(&mut line)? == 0 {
            writeln!(interpreter.output_mut())?;
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") {
            break;
        }

        if !evaluate {
            match Parser::new(Lexer::new(line)).parse_program() {
                Ok(program) => writeln!(interpreter.output_mut(), "{:#?}", program)?,
                Err(err) => eprintln!("{}", err),
            }
            continue;
        }

        match interpreter.run(line, &env) {
            Ok(value) if value.is_nil() => {}
            Ok(value) => writeln!(interpreter.output_mut(), "{}", value)?,
            Err(err) => eprintln!("{}", err),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(lines: &str, evaluate: bool) -> String {
        let mut interpreter = Interpreter::with_io(lines.as_bytes(), Vec::new());
        start(&mut interpreter, evaluate).unwrap();
        String::from_utf8(interpreter.into_output()).unwrap()
    }

    #[test]
    fn state_persists_between_lines() {
        let out = session("x = 2\nfn sq(n) { n * n }\nsq(x) + 1\n", true);
        assert_eq!(out, "> 2\n> <fn sq>\n> 5\n> \n");
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let out = session("missing\n1 +\nprintln(\"ok\")\nexit\n42\n", true);
        assert_eq!(out, "> > > ok\n> ");
    }

    #[test]
    fn parse_only_mode_prints_the_tree() {
        let out = session("7\n", false);
        assert!(out.contains("Integer(\n        7,\n    )"));
    }
}
