//! CLI entry point for the mipsmark grading binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use grader::plan::ScoringMode;
use grader::suite::{run_session, TestSource};

use circuit_core::{bind, CircuitSim};
use refsim::Simulator;
use thiserror as _;
#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: mipsmark [options] <design-file> <test-file>...

Arguments:
  <design-file>   Circuit description of the processor to grade
  <test-file>...  Directive-annotated test programs, in grading order

Options:
  --v0-only       Judge tests by the return-value register (2) only
  -h, --help      Show this help message

Examples:
  mipsmark mips32.circuit tests/01-add.t
  mipsmark mips32.circuit tests/*.t
  mipsmark --v0-only mips32.circuit progs/hailstone.t
";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    design: PathBuf,
    tests: Vec<PathBuf>,
    mode: ScoringMode,
}

#[derive(Debug)]
enum ParseResult {
    Command(CliArgs),
    Help,
}

fn parse_args(args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut design: Option<PathBuf> = None;
    let mut tests: Vec<PathBuf> = Vec::new();
    let mut mode = ScoringMode::AllRegisters;

    for arg in args {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--v0-only" {
            mode = ScoringMode::ReturnValueOnly;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        match design {
            None => design = Some(PathBuf::from(arg)),
            Some(_) => tests.push(PathBuf::from(arg)),
        }
    }

    let design = design.ok_or_else(|| "missing design file".to_string())?;
    if tests.is_empty() {
        return Err("missing test files".to_string());
    }
    Ok(ParseResult::Command(CliArgs {
        design,
        tests,
        mode,
    }))
}

fn read_file(path: &Path) -> Result<String, i32> {
    fs::read_to_string(path).map_err(|error| {
        eprintln!("error: failed to read {}: {error}", path.display());
        1
    })
}

fn run_grade(args: &CliArgs) -> Result<(), i32> {
    let design_text = read_file(&args.design)?;
    let design = match refsim::parse_design(&design_text) {
        Ok(design) => design,
        Err(error) => {
            eprintln!("error: {}: {error}", args.design.display());
            return Err(1);
        }
    };

    let mut sources = Vec::with_capacity(args.tests.len());
    for path in &args.tests {
        sources.push(TestSource::new(path.display().to_string(), read_file(path)?));
    }

    let mut sim = Simulator::new(design);
    let binding = match bind(sim.design()) {
        Ok(binding) => binding,
        Err(error) => {
            eprintln!("error: {error}");
            return Err(1);
        }
    };
    for warning in binding.warnings() {
        eprintln!("warning: {warning}");
    }

    let stdout = io::stdout();
    match run_session(&mut sim, &binding, args.mode, &sources, &mut stdout.lock()) {
        // Mismatched registers are results, not failures; the exit code
        // only reflects whether the session itself could run.
        Ok(_) => Ok(()),
        Err(error) => {
            eprintln!("error: {error}");
            Err(1)
        }
    }
}

fn main() {
    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(args)) => match run_grade(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
