use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::environment::Environment;
use crate::evaluator::{self, Interpreter};
use crate::lexer::Lexer;
use crate::parser;
use crate::repl;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const ABOUT: &str = "GoScript - a small dynamically typed scripting language";

#[derive(Parser)]
#[command(
    name = "goscript",
    version = VERSION,
    about = ABOUT,
    long_about = None,
)]
pub struct Cli {
    /// Append a line per evaluated statement to FILE
    #[arg(long, value_name = "FILE", global = true)]
    trace: Option<PathBuf>,

    /// Script to run; shorthand for `run FILE`
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive prompt (the default)
    Repl,
    /// Run a script file
    Run {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Parse a script file and print its syntax tree
    Ast {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let outcome = evaluator::with_call_stack(move || execute(cli))
        .context("Unable to start the interpreter thread")
        .and_then(|outcome| outcome);
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut interpreter = Interpreter::new();
    if let Some(path) = &cli.trace {
        let file = File::create(path)
            .with_context(|| format!("Unable to create trace file '{}'", path.display()))?;
        interpreter.set_trace(Box::new(BufWriter::new(file)));
    }

    match (cli.file, cli.command) {
        (Some(_), Some(_)) => bail!("A script path cannot be combined with a command"),
        (Some(file), None) | (None, Some(Commands::Run { file })) => {
            let source = read_source(&file)?;
            match interpreter.run(&source, &Environment::new()) {
                Ok(_) => Ok(ExitCode::SUCCESS),
                Err(err) => {
                    eprintln!("{}", err);
                    Ok(ExitCode::from(err.exit_code()))
                }
            }
        }
        (None, None) | (None, Some(Commands::Repl)) => {
            println!("GoScript {} (type exit to quit)", VERSION);
            repl::start(&mut interpreter, true).context("Console I/O failed")?;
            Ok(ExitCode::SUCCESS)
        }
        (None, Some(Commands::Ast { file })) => {
            let source = read_source(&file)?;
            match parser::Parser::new(Lexer::new(&source)).parse_program() {
                Ok(program) => {
                    println!("{:#?}", program);
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    eprintln!("{}", err);
                    Ok(ExitCode::from(err.exit_code()))
                }
            }
        }
    }
}

fn read_source(file: &Path) -> anyhow::Result<String> {
    fs::read_to_string(file).with_context(|| format!("Error reading file '{}'", file.display()))
}
