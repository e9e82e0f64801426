//! Session orchestration: planning, driving, scoring, and reporting a
//! whole set of test files against one bound circuit.
//!
//! Tests run lazily in plan order. A file the plan never selects is never
//! even parsed, and the first directive or engine failure aborts the
//! session; mismatched registers are ordinary results, not failures.

use std::io::{self, Write};

use thiserror::Error;

use circuit_core::{CircuitBinding, CircuitSim, RETURN_VALUE_REG};

use crate::diff::StateDiff;
use crate::directive::{DirectiveError, TestCase};
use crate::plan::{GradingPlan, PlanError, ScoringMode, TestRole};
use crate::report::{self, Scoreboard};
use crate::runner::{run_test, RunError};

/// One test file handed to the session, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSource {
    /// Name used in diagnostics, normally the file path.
    pub name: String,
    /// The file's full text.
    pub text: String,
}

impl TestSource {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A failure that ends the session early, as opposed to a test that
/// merely scores badly.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A planned test file failed directive parsing.
    #[error("{name}: {source}")]
    Directive {
        /// The offending file's name.
        name: String,
        /// The parse failure.
        source: DirectiveError,
    },
    /// The engine failed while driving a test.
    #[error("{name}: {source}")]
    Run {
        /// The test file being driven.
        name: String,
        /// The run failure.
        source: RunError,
    },
    /// The file count fits no grading layout.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// Report output could not be written.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What a completed session did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    tests_run: usize,
    total_errors: usize,
}

impl SessionOutcome {
    /// Tests actually driven, advisory included.
    #[must_use]
    pub const fn tests_run(&self) -> usize {
        self.tests_run
    }

    /// Errors charged across all scored tests.
    #[must_use]
    pub const fn total_errors(&self) -> usize {
        self.total_errors
    }
}

/// Plans and runs a grading session over `sources`, writing per-test
/// reports and the final summary to `out`.
///
/// Every scored test prints its header line as it finishes, with one row
/// per mismatched register when it was charged errors. The advisory test
/// prints only its note, and only on failure.
///
/// # Errors
///
/// Returns [`SessionError::Plan`] when the source count fits no layout,
/// [`SessionError::Directive`] or [`SessionError::Run`] for the first bad
/// file or engine failure, and [`SessionError::Io`] when writing fails.
pub fn run_session<S: CircuitSim>(
    sim: &mut S,
    binding: &CircuitBinding,
    mode: ScoringMode,
    sources: &[TestSource],
    out: &mut impl Write,
) -> Result<SessionOutcome, SessionError> {
    let plan = GradingPlan::for_layout(sources.len(), mode)?;
    let mut scoreboard = Scoreboard::new(plan.tables().len());
    let mut tests_run = 0;

    for entry in plan.entries() {
        let source = &sources[entry.file_index];
        let test = TestCase::parse(&source.text).map_err(|error| SessionError::Directive {
            name: source.name.clone(),
            source: error,
        })?;
        let observed = run_test(sim, binding, &test).map_err(|error| SessionError::Run {
            name: source.name.clone(),
            source: error,
        })?;
        let diff = StateDiff::between(&test.expected_state(), &observed);
        tests_run += 1;

        match entry.role {
            TestRole::Scored { table } => {
                let errors = charged_errors(plan.mode(), &diff);
                report::write_test_report(out, test.description(), errors, &diff)?;
                scoreboard.record(table, errors);
            }
            TestRole::Advisory { failure_note } => {
                if !diff.is_match() {
                    writeln!(out, "{failure_note}")?;
                }
            }
        }
    }

    report::write_summary(out, &plan, &scoreboard)?;
    Ok(SessionOutcome {
        tests_run,
        total_errors: scoreboard.total_errors(),
    })
}

/// Errors to charge a scored test for its diff. All-register scoring
/// charges one per mismatch; return-value scoring charges a flat one
/// when register 2 is wrong and ignores every other register.
fn charged_errors(mode: ScoringMode, diff: &StateDiff) -> usize {
    match mode {
        ScoringMode::AllRegisters => diff.error_count(),
        ScoringMode::ReturnValueOnly => usize::from(
            diff.mismatches()
                .iter()
                .any(|mismatch| mismatch.register() == RETURN_VALUE_REG),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuit_core::{
        bind, CircuitDef, Component, ComponentId, ComponentKind, Design, RegIndex,
        RegisterFileHandle, SimError,
    };

    /// Engine double whose registers hold exactly what the test wrote:
    /// reset zeroes everything, the clock does nothing.
    struct EchoSim {
        design: Design,
        registers: [i32; 32],
        engine_calls: usize,
        reject_program: bool,
    }

    impl EchoSim {
        fn new() -> Self {
            Self {
                design: Design {
                    circuits: vec![CircuitDef {
                        name: "MIPS32".to_string(),
                        components: vec![
                            Component {
                                id: ComponentId::new(0),
                                kind: ComponentKind::RegisterFile,
                            },
                            Component {
                                id: ComponentId::new(1),
                                kind: ComponentKind::ProgramMemory,
                            },
                            Component {
                                id: ComponentId::new(2),
                                kind: ComponentKind::ClockSource,
                            },
                        ],
                    }],
                    current: None,
                },
                registers: [0; 32],
                engine_calls: 0,
                reject_program: false,
            }
        }
    }

    impl CircuitSim for EchoSim {
        fn design(&self) -> &Design {
            &self.design
        }

        fn reset(&mut self) {
            self.engine_calls += 1;
            self.registers = [0; 32];
        }

        fn load_program(&mut self, _memory: ComponentId, _text: &str) -> Result<(), SimError> {
            self.engine_calls += 1;
            if self.reject_program {
                return Err(SimError::ProgramRejected("bad program".to_string()));
            }
            Ok(())
        }

        fn write_register(
            &mut self,
            _register_file: RegisterFileHandle,
            index: RegIndex,
            value: i32,
        ) -> Result<(), SimError> {
            self.engine_calls += 1;
            self.registers[index.index()] = value;
            Ok(())
        }

        fn read_register(
            &self,
            _register_file: RegisterFileHandle,
            index: RegIndex,
        ) -> Result<Option<i32>, SimError> {
            Ok(Some(self.registers[index.index()]))
        }

        fn propagate(&mut self) {
            self.engine_calls += 1;
        }

        fn tick(&mut self) {
            self.engine_calls += 1;
        }
    }

    fn passing_source(name: &str) -> TestSource {
        TestSource::new(
            name,
            "## desc = echo pass\n## cycles = 1\n## start[1] = 1\n## expect[1] = 1\nnop\n",
        )
    }

    fn session(
        sim: &mut EchoSim,
        mode: ScoringMode,
        sources: &[TestSource],
    ) -> (Result<SessionOutcome, SessionError>, String) {
        let binding = bind(sim.design()).unwrap();
        let mut out = Vec::new();
        let outcome = run_session(sim, &binding, mode, sources, &mut out);
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn passing_test_prints_a_zero_error_header() {
        let mut sim = EchoSim::new();
        let sources = [passing_source("a.t")];
        let (outcome, output) = session(&mut sim, ScoringMode::AllRegisters, &sources);

        let outcome = outcome.unwrap();
        assert_eq!(outcome.tests_run(), 1);
        assert_eq!(outcome.total_errors(), 0);
        assert_eq!(
            output,
            "[ 0 errors ] echo pass\nTOTAL:  0 errors \nTests with no errors: 1/1\n"
        );
    }

    #[test]
    fn failing_test_reports_before_the_summary() {
        let mut sim = EchoSim::new();
        let sources = [TestSource::new(
            "a.t",
            "## desc = off by one\n## cycles = 1\n## start[3] = 7\n## expect[3] = 8\nnop\n",
        )];
        let (outcome, output) = session(&mut sim, ScoringMode::AllRegisters, &sources);

        assert_eq!(outcome.unwrap().total_errors(), 1);
        assert_eq!(
            output,
            concat!(
                "[ 1 error ] off by one\n",
                "    Error in register 3. Expected 0x00000008, but got 0x00000007.\n",
                "TOTAL:  1 error \n",
                "Tests with no errors: 0/1\n",
            )
        );
    }

    #[test]
    fn parse_failure_aborts_before_touching_the_engine() {
        let mut sim = EchoSim::new();
        let sources = [TestSource::new("bad.t", "## cycles = 1\nnop\n")];
        let (outcome, output) = session(&mut sim, ScoringMode::AllRegisters, &sources);

        assert!(matches!(
            outcome.unwrap_err(),
            SessionError::Directive { ref name, source: DirectiveError::MissingDescription } if name == "bad.t"
        ));
        assert_eq!(output, "");
        assert_eq!(sim.engine_calls, 0);
    }

    #[test]
    fn engine_rejection_aborts_the_session() {
        let mut sim = EchoSim::new();
        sim.reject_program = true;
        let sources = [passing_source("a.t")];
        let (outcome, _) = session(&mut sim, ScoringMode::AllRegisters, &sources);

        assert!(matches!(
            outcome.unwrap_err(),
            SessionError::Run {
                source: RunError::Sim(SimError::ProgramRejected(_)),
                ..
            }
        ));
    }

    #[test]
    fn unplanned_files_are_never_parsed() {
        let mut sim = EchoSim::new();
        let mut sources: Vec<TestSource> =
            (0..26).map(|i| passing_source(&format!("{i}.t"))).collect();
        sources[24] = TestSource::new("skipped.t", "this file is not even a test\n");

        let (outcome, output) = session(&mut sim, ScoringMode::AllRegisters, &sources);
        assert_eq!(outcome.unwrap().tests_run(), 25);
        assert_eq!(
            output,
            "[ 0 errors ] echo pass\n".repeat(25)
                + "TOTAL:  0 errors \nTests with no errors: 25/25\n"
        );
    }

    #[test]
    fn advisory_failure_prints_only_its_note() {
        let mut sim = EchoSim::new();
        let mut sources: Vec<TestSource> =
            (0..29).map(|i| passing_source(&format!("{i}.t"))).collect();
        // files 24, 27, and 28 never run; file 26 is the advisory check
        sources[26] = TestSource::new(
            "fwd.t",
            "## desc = forwarding\n## cycles = 1\n## expect[1] = 999\nnop\n",
        );

        let (outcome, output) = session(&mut sim, ScoringMode::AllRegisters, &sources);
        let outcome = outcome.unwrap();
        assert_eq!(outcome.tests_run(), 26);
        assert_eq!(outcome.total_errors(), 0);
        assert_eq!(
            output,
            "[ 0 errors ] echo pass\n".repeat(25)
                + concat!(
                    "May have forwarded output of RAM in MEM stage.\n",
                    "\n",
                    "TOTAL:  0 errors \n",
                    "Table A tests with no errors: 24/24\n",
                    "Table B tests with no errors: 1/1\n",
                )
        );
    }

    #[test]
    fn return_value_mode_judges_register_two_only() {
        let mut sim = EchoSim::new();
        let sources = [
            TestSource::new(
                "pass.t",
                "## desc = wrong elsewhere\n## cycles = 1\n## expect[5] = 123\nnop\n",
            ),
            TestSource::new(
                "fail.t",
                "## desc = wrong answer\n## cycles = 1\n## expect[2] = 4\n## expect[5] = 9\nnop\n",
            ),
        ];
        let (outcome, output) = session(&mut sim, ScoringMode::ReturnValueOnly, &sources);

        // The failing test is charged a single error however many
        // registers differ, but its report itemizes all of them.
        assert_eq!(outcome.unwrap().total_errors(), 1);
        assert_eq!(
            output,
            concat!(
                "[ 0 errors ] wrong elsewhere\n",
                "[ 1 error ] wrong answer\n",
                "    Error in register 2. Expected 0x00000004, but got 0x00000000.\n",
                "    Error in register 5. Expected 0x00000009, but got 0x00000000.\n",
                "TOTAL:  1 error \n",
                "Tests with no errors: 1/2\n",
            )
        );
    }
}
