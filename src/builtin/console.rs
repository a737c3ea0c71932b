use std::io::{self, BufRead};

use crate::object::Value;

/// Renders the operands of `print` / `println`.
///
/// `println` separates every operand with a space and ends the line. `print`
/// only puts a space between two neighbours when neither is a string.
pub fn format_print(arguments: &[Value], newline: bool) -> String {
    let mut out = String::new();
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            let previous = &arguments[i - 1];
            let strings =
                matches!(previous, Value::String(_)) || matches!(argument, Value::String(_));
            if newline || !strings {
                out.push(' ');
            }
        }
        out.push_str(&argument.to_string());
    }
    if newline {
        out.push('\n');
    }
    out
}

/// Reads one line for `input`, without its line terminator. End of input
/// reads as an empty line.
pub fn read_line<R: BufRead>(input: &mut R) -> io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}
