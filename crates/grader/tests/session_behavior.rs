//! End-to-end grading sessions against the behavioral reference engine.

use grader::plan::ScoringMode;
use grader::runner::RunError;
use grader::suite::{run_session, SessionError, SessionOutcome, TestSource};

use circuit_core::{bind, CircuitSim, SimError};
use refsim::{parse_design, Simulator};

use proptest as _;
use rstest as _;
use tempfile as _;
use thiserror as _;

const DESIGN: &str = concat!(
    "current MIPS32\n",
    "circuit MIPS32\n",
    "  clock\n",
    "  rom\n",
    "  subcircuit Registers\n",
    "circuit Registers\n",
    "  regfile\n",
);

fn grade(
    mode: ScoringMode,
    sources: &[TestSource],
) -> (Result<SessionOutcome, SessionError>, String) {
    let mut sim = Simulator::new(parse_design(DESIGN).unwrap());
    let binding = bind(sim.design()).unwrap();
    let mut out = Vec::new();
    let outcome = run_session(&mut sim, &binding, mode, sources, &mut out);
    (outcome, String::from_utf8(out).unwrap())
}

#[test]
fn a_correct_add_program_passes() {
    let sources = [TestSource::new(
        "add.t",
        concat!(
            "## desc = add test\n",
            "## cycles = 1\n",
            "## start[1] = 5\n",
            "## start[2] = 7\n",
            "## expect[1] = 5\n",
            "## expect[2] = 7\n",
            "## expect[8] = 12\n",
            "add r8, r1, r2\n",
        ),
    )];

    let (outcome, output) = grade(ScoringMode::AllRegisters, &sources);
    assert_eq!(outcome.unwrap().total_errors(), 0);
    assert_eq!(
        output,
        "[ 0 errors ] add test\nTOTAL:  0 errors \nTests with no errors: 1/1\n"
    );
}

#[test]
fn a_wrong_expectation_prints_the_mismatch() {
    let sources = [TestSource::new(
        "add.t",
        concat!(
            "## desc = add test\n",
            "## cycles = 1\n",
            "## start[1] = 5\n",
            "## start[2] = 7\n",
            "## expect[1] = 5\n",
            "## expect[2] = 7\n",
            "## expect[8] = 13\n",
            "add r8, r1, r2\n",
        ),
    )];

    let (outcome, output) = grade(ScoringMode::AllRegisters, &sources);
    assert_eq!(outcome.unwrap().total_errors(), 1);
    assert_eq!(
        output,
        concat!(
            "[ 1 error ] add test\n",
            "    Error in register 8. Expected 0x0000000d, but got 0x0000000c.\n",
            "TOTAL:  1 error \n",
            "Tests with no errors: 0/1\n",
        )
    );
}

#[test]
fn the_cycle_budget_limits_how_far_the_program_runs() {
    // eight increments available, three cycles granted
    let mut text = String::from("## desc = cycle budget\n## cycles = 3\n## expect[1] = 3\n");
    for _ in 0..8 {
        text.push_str("addi r1, r1, 1\n");
    }
    let sources = [TestSource::new("budget.t", text)];

    let (outcome, output) = grade(ScoringMode::AllRegisters, &sources);
    assert_eq!(outcome.unwrap().total_errors(), 0);
    assert_eq!(
        output,
        "[ 0 errors ] cycle budget\nTOTAL:  0 errors \nTests with no errors: 1/1\n"
    );
}

#[test]
fn a_loop_program_grades_cycle_accurately() {
    let sources = [TestSource::new(
        "sum.t",
        concat!(
            "## desc = sum of 1..=5\n",
            "## cycles = 16\n",
            "## expect[2] = 15\n",
            "addi r1, r0, 5\n",
            "loop: add r2, r2, r1\n",
            "addi r1, r1, -1\n",
            "bne r1, r0, loop\n",
        ),
    )];

    let (outcome, output) = grade(ScoringMode::AllRegisters, &sources);
    assert_eq!(outcome.unwrap().total_errors(), 0);
    assert_eq!(
        output,
        "[ 0 errors ] sum of 1..=5\nTOTAL:  0 errors \nTests with no errors: 1/1\n"
    );
}

#[test]
fn hex_expectations_compare_as_bit_patterns() {
    let sources = [TestSource::new(
        "neg.t",
        concat!(
            "## desc = negative one\n",
            "## cycles = 1\n",
            "## expect[1] = 0xffffffff\n",
            "addi r1, r0, -1\n",
        ),
    )];

    let (outcome, _) = grade(ScoringMode::AllRegisters, &sources);
    assert_eq!(outcome.unwrap().total_errors(), 0);
}

#[test]
fn unset_expectations_demand_zero() {
    // r1 ends at 9 but the test only expects r2, so r1 must be zero
    let sources = [TestSource::new(
        "strict.t",
        concat!(
            "## desc = strict zeros\n",
            "## cycles = 2\n",
            "## expect[2] = 4\n",
            "addi r1, r0, 9\n",
            "addi r2, r0, 4\n",
        ),
    )];

    let (outcome, output) = grade(ScoringMode::AllRegisters, &sources);
    assert_eq!(outcome.unwrap().total_errors(), 1);
    assert!(output.starts_with("[ 1 error ] strict zeros\n"));
    assert!(output.contains(
        "    Error in register 1. Expected 0x00000000, but got 0x00000009.\n"
    ));
}

#[test]
fn a_malformed_directive_aborts_the_session() {
    let sources = [
        TestSource::new("ok.t", "## desc = fine\n## cycles = 1\nnop\n"),
        TestSource::new("bad.t", "## desc = broken\n## cycles = 1\n## cyclez = 5\nnop\n"),
    ];

    // only the flat return-value layout accepts two files
    let (outcome, _) = grade(ScoringMode::ReturnValueOnly, &sources);
    let error = outcome.unwrap_err();
    assert!(matches!(
        error,
        SessionError::Directive { ref name, .. } if name == "bad.t"
    ));
}

#[test]
fn an_unassemblable_program_aborts_the_session() {
    let sources = [TestSource::new(
        "bad.t",
        "## desc = bad opcode\n## cycles = 1\nfrobnicate r1, r2\n",
    )];

    let (outcome, _) = grade(ScoringMode::AllRegisters, &sources);
    assert!(matches!(
        outcome.unwrap_err(),
        SessionError::Run {
            source: RunError::Sim(SimError::ProgramRejected(_)),
            ..
        }
    ));
}

#[test]
fn return_value_scoring_ignores_scratch_registers() {
    let sources = [TestSource::new(
        "v0.t",
        concat!(
            "## desc = answer only\n",
            "## cycles = 2\n",
            "## expect[2] = 21\n",
            "addi r9, r0, 5\n",
            "addi r2, r0, 21\n",
        ),
    )];

    let (all, _) = grade(ScoringMode::AllRegisters, &sources);
    assert_eq!(all.unwrap().total_errors(), 1);

    let (v0, output) = grade(ScoringMode::ReturnValueOnly, &sources);
    assert_eq!(v0.unwrap().total_errors(), 0);
    assert_eq!(
        output,
        "[ 0 errors ] answer only\nTOTAL:  0 errors \nTests with no errors: 1/1\n"
    );
}
