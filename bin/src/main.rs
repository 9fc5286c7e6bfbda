use std::{
    io::{stdin, stdout, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;

use errors::{LoxError, Reporter};
use interpreter::Interpreter;

// Exit codes from sysexits.h
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;

#[derive(clap::Parser)]
#[command(about = "Tree-walking interpreter for the Lox language")]
struct Args {
    /// Script to run. Starts an interactive prompt if omitted.
    file: Option<PathBuf>,
}

/// Prints every diagnostic to stderr as soon as it's reported.
#[derive(Debug, Default)]
struct StderrReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl Reporter for StderrReporter {
    fn error(&mut self, error: LoxError) {
        eprintln!("{error}");
        self.had_error = true;
    }

    fn runtime_error(&mut self, error: LoxError) {
        eprintln!("{error}");
        self.had_runtime_error = true;
    }

    fn had_error(&self) -> bool {
        self.had_error
    }

    fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

fn run_file(
    path: PathBuf,
    interpreter: &mut Interpreter,
    reporter: &mut StderrReporter,
) -> anyhow::Result<ExitCode> {
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    interpreter.run_source(&source, reporter)?;

    Ok(if reporter.had_error() {
        ExitCode::from(EX_DATAERR)
    } else if reporter.had_runtime_error() {
        ExitCode::from(EX_SOFTWARE)
    } else {
        ExitCode::SUCCESS
    })
}

fn run_prompt(
    interpreter: &mut Interpreter,
    reporter: &mut StderrReporter,
) -> anyhow::Result<ExitCode> {
    let mut line = String::new();
    loop {
        print!("> ");
        stdout().flush()?;

        line.clear();
        if stdin().read_line(&mut line)? == 0 {
            log::debug!("Reached end of input, leaving prompt");
            return Ok(ExitCode::SUCCESS);
        }

        interpreter.run_source(&line, reporter)?;
        // A mistake on one line shouldn't end the session
        reporter.reset();
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    let mut interpreter = Interpreter::default();
    let mut reporter = StderrReporter::default();

    match args.file {
        Some(file) => run_file(file, &mut interpreter, &mut reporter),
        None => run_prompt(&mut interpreter, &mut reporter),
    }
}
