//! Grading plans: which test files run, in what order, and how each one
//! counts.
//!
//! The number of test files on the command line selects a layout:
//!
//! - 1 file: a preliminary exercise, one table.
//! - 25 or 26 files: the datapath assignment. The first 24 files and the
//!   last file are scored in one table; with 26 files the 25th is
//!   recognized but never run.
//! - 29 or more files: the full pipeline assignment. The first 24 files
//!   are table A, files 26 through fourth-from-last are table B, the
//!   third-from-last runs as an advisory forwarding check, and the 25th
//!   and final two files never run.
//!
//! Any other count is an error before anything runs. Return-value-only
//! scoring replaces all of the above with a flat single-table plan over
//! every file.

use thiserror::Error;

/// Table A test files scored in the full layout. The remaining table A
/// file is accepted on the command line but never driven.
pub const TABLE_A_TESTS_USED: usize = 24;

/// Table A test files present in every datapath and full layout.
pub const TABLE_A_TOTAL_TESTS: usize = 25;

/// Files at the end of a full layout that are outside both tables. The
/// first of them is the advisory forwarding check.
pub const TRAILING_UNSCORED: usize = 3;

/// Smallest file count accepted as a full layout: all table A files, at
/// least one table B file, and the trailing group.
pub const FULL_LAYOUT_MINIMUM: usize = TABLE_A_TOTAL_TESTS + 1 + TRAILING_UNSCORED;

/// Printed when the advisory forwarding check fails.
pub const FORWARDING_ADVISORY_NOTE: &str = "May have forwarded output of RAM in MEM stage.";

/// How a test's mismatches decide pass or fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    /// Every register must match its expectation.
    #[default]
    AllRegisters,
    /// Only the return-value register decides; the full mismatch report
    /// is still printed.
    ReturnValueOnly,
}

/// No plan exists for this many test files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The file count matches none of the known layouts.
    #[error(
        "cannot grade {0} test files: expected 1 (preliminary), 25 or 26 (datapath), \
         or at least {FULL_LAYOUT_MINIMUM} (full)"
    )]
    UnsupportedLayout(usize),
}

/// What one planned run means for the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestRole {
    /// Pass or fail feeds the named table's tally.
    Scored {
        /// Index into [`GradingPlan::tables`].
        table: usize,
    },
    /// Runs and prints a note on failure, but is never tallied.
    Advisory {
        /// The note printed in place of the usual per-test report.
        failure_note: &'static str,
    },
}

/// One test file the plan will drive, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntry {
    /// Position of the test file in the command-line list.
    pub file_index: usize,
    /// How the result counts.
    pub role: TestRole,
}

/// One tally printed in the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Summary line prefix, e.g. `Table A tests`.
    pub label: &'static str,
}

/// The complete, immutable grading plan for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingPlan {
    entries: Vec<PlanEntry>,
    tables: Vec<TableSpec>,
    mode: ScoringMode,
}

impl GradingPlan {
    /// Builds the plan for `file_count` command-line test files.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnsupportedLayout`] when the count matches no
    /// layout, including a count of zero.
    pub fn for_layout(file_count: usize, mode: ScoringMode) -> Result<Self, PlanError> {
        if file_count == 0 {
            return Err(PlanError::UnsupportedLayout(0));
        }
        if mode == ScoringMode::ReturnValueOnly {
            return Ok(Self::flat(file_count, mode));
        }
        match file_count {
            1 => Ok(Self::flat(1, mode)),
            n if n == TABLE_A_TOTAL_TESTS || n == TABLE_A_TOTAL_TESTS + 1 => Ok(Self::datapath(n)),
            n if n >= FULL_LAYOUT_MINIMUM => Ok(Self::full(n)),
            n => Err(PlanError::UnsupportedLayout(n)),
        }
    }

    /// Every file scored into a single table, in command-line order.
    fn flat(file_count: usize, mode: ScoringMode) -> Self {
        Self {
            entries: (0..file_count).map(|file_index| scored(file_index, 0)).collect(),
            tables: vec![TableSpec { label: "Tests" }],
            mode,
        }
    }

    /// The first 24 files plus the last file, one table.
    fn datapath(file_count: usize) -> Self {
        let mut entries: Vec<PlanEntry> =
            (0..TABLE_A_TESTS_USED).map(|file_index| scored(file_index, 0)).collect();
        entries.push(scored(file_count - 1, 0));
        Self {
            entries,
            tables: vec![TableSpec { label: "Tests" }],
            mode: ScoringMode::AllRegisters,
        }
    }

    /// Tables A and B plus the advisory forwarding check.
    fn full(file_count: usize) -> Self {
        let mut entries: Vec<PlanEntry> =
            (0..TABLE_A_TESTS_USED).map(|file_index| scored(file_index, 0)).collect();
        entries.extend(
            (TABLE_A_TOTAL_TESTS..file_count - TRAILING_UNSCORED)
                .map(|file_index| scored(file_index, 1)),
        );
        entries.push(PlanEntry {
            file_index: file_count - TRAILING_UNSCORED,
            role: TestRole::Advisory {
                failure_note: FORWARDING_ADVISORY_NOTE,
            },
        });
        Self {
            entries,
            tables: vec![
                TableSpec {
                    label: "Table A tests",
                },
                TableSpec {
                    label: "Table B tests",
                },
            ],
            mode: ScoringMode::AllRegisters,
        }
    }

    /// The runs, in execution order.
    #[must_use]
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// The summary tables, in print order.
    #[must_use]
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// How scored tests decide pass or fail.
    #[must_use]
    pub const fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Number of scored runs feeding the given table, the denominator of
    /// its summary line.
    #[must_use]
    pub fn planned_for(&self, table: usize) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.role, TestRole::Scored { table: t } if t == table))
            .count()
    }
}

const fn scored(file_index: usize, table: usize) -> PlanEntry {
    PlanEntry {
        file_index,
        role: TestRole::Scored { table },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn file_indices(plan: &GradingPlan) -> Vec<usize> {
        plan.entries().iter().map(|entry| entry.file_index).collect()
    }

    #[test]
    fn one_file_is_a_preliminary_plan() {
        let plan = GradingPlan::for_layout(1, ScoringMode::AllRegisters).unwrap();
        assert_eq!(plan.entries(), &[scored(0, 0)]);
        assert_eq!(plan.tables().len(), 1);
        assert_eq!(plan.tables()[0].label, "Tests");
        assert_eq!(plan.planned_for(0), 1);
    }

    #[test]
    fn twenty_five_files_all_run_in_one_table() {
        let plan = GradingPlan::for_layout(25, ScoringMode::AllRegisters).unwrap();
        assert_eq!(file_indices(&plan), (0..25).collect::<Vec<_>>());
        assert_eq!(plan.tables().len(), 1);
        assert_eq!(plan.planned_for(0), 25);
    }

    #[test]
    fn twenty_six_files_skip_the_twenty_fifth() {
        let plan = GradingPlan::for_layout(26, ScoringMode::AllRegisters).unwrap();
        let mut want: Vec<usize> = (0..24).collect();
        want.push(25);
        assert_eq!(file_indices(&plan), want);
        assert_eq!(plan.planned_for(0), 25);
    }

    #[rstest]
    #[case::smallest(29)]
    #[case::typical(40)]
    fn full_layout_splits_tables_and_keeps_an_advisory(#[case] file_count: usize) {
        let plan = GradingPlan::for_layout(file_count, ScoringMode::AllRegisters).unwrap();

        assert_eq!(plan.tables().len(), 2);
        assert_eq!(plan.tables()[0].label, "Table A tests");
        assert_eq!(plan.tables()[1].label, "Table B tests");
        assert_eq!(plan.planned_for(0), 24);
        assert_eq!(plan.planned_for(1), file_count - 28);

        let mut want: Vec<usize> = (0..24).collect();
        want.extend(25..file_count - 3);
        want.push(file_count - 3);
        assert_eq!(file_indices(&plan), want);

        let last = plan.entries().last().unwrap();
        assert_eq!(
            last.role,
            TestRole::Advisory {
                failure_note: FORWARDING_ADVISORY_NOTE,
            }
        );

        // The 25th and final two files stay off the plan.
        for absent in [24, file_count - 2, file_count - 1] {
            assert!(!file_indices(&plan).contains(&absent));
        }
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(24)]
    #[case(27)]
    #[case(28)]
    fn unsupported_counts_fail_before_anything_runs(#[case] file_count: usize) {
        assert_eq!(
            GradingPlan::for_layout(file_count, ScoringMode::AllRegisters).unwrap_err(),
            PlanError::UnsupportedLayout(file_count)
        );
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(29)]
    fn return_value_scoring_flattens_every_layout(#[case] file_count: usize) {
        let plan = GradingPlan::for_layout(file_count, ScoringMode::ReturnValueOnly).unwrap();
        assert_eq!(file_indices(&plan), (0..file_count).collect::<Vec<_>>());
        assert_eq!(plan.tables().len(), 1);
        assert_eq!(plan.mode(), ScoringMode::ReturnValueOnly);
        assert_eq!(plan.planned_for(0), file_count);
    }

    #[test]
    fn zero_files_are_rejected_in_both_modes() {
        for mode in [ScoringMode::AllRegisters, ScoringMode::ReturnValueOnly] {
            assert_eq!(
                GradingPlan::for_layout(0, mode).unwrap_err(),
                PlanError::UnsupportedLayout(0)
            );
        }
    }

    #[test]
    fn execution_order_is_ascending_with_unique_files() {
        for file_count in [1, 25, 26, 29, 37] {
            let plan = GradingPlan::for_layout(file_count, ScoringMode::AllRegisters).unwrap();
            let indices = file_indices(&plan);
            assert!(indices.windows(2).all(|pair| pair[0] < pair[1]));
            assert!(indices.iter().all(|&index| index < file_count));
        }
    }
}
