//! Rendering of per-test report lines and the end-of-session summary.
//!
//! The output format is a stable contract consumed by downstream grading
//! scripts, so every line here is byte-exact, spacing included.

use std::io::{self, Write};

use crate::diff::StateDiff;
use crate::plan::GradingPlan;

/// The error-count phrase used in headers and totals, padded with one
/// space on each side: ` 1 error `, ` 3 errors `, ` 0 errors `.
#[must_use]
pub fn error_count_phrase(count: usize) -> String {
    if count == 1 {
        " 1 error ".to_string()
    } else {
        format!(" {count} errors ")
    }
}

/// Writes one scored test's report: the bracketed header line, then one
/// line per mismatched register when the test was charged any errors.
///
/// `error_count` is how many errors the test was charged, which under
/// return-value scoring is not the same as the diff's mismatch count.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_test_report(
    out: &mut impl Write,
    description: &str,
    error_count: usize,
    diff: &StateDiff,
) -> io::Result<()> {
    writeln!(out, "[{}] {}", error_count_phrase(error_count), description)?;
    if error_count > 0 {
        for mismatch in diff.mismatches() {
            writeln!(out, "{mismatch}")?;
        }
    }
    Ok(())
}

/// Writes the session summary: the running error total, then one tally
/// line per table. Multi-table plans get a separating blank line first.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_summary(
    out: &mut impl Write,
    plan: &GradingPlan,
    scoreboard: &Scoreboard,
) -> io::Result<()> {
    if plan.tables().len() > 1 {
        writeln!(out)?;
    }
    writeln!(out, "TOTAL: {}", error_count_phrase(scoreboard.total_errors()))?;
    for (index, table) in plan.tables().iter().enumerate() {
        writeln!(
            out,
            "{} with no errors: {}/{}",
            table.label,
            scoreboard.passes(index),
            plan.planned_for(index)
        )?;
    }
    Ok(())
}

/// Running tally of a session: passes per table and the error total.
/// Advisory runs never touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scoreboard {
    total_errors: usize,
    table_passes: Vec<usize>,
}

impl Scoreboard {
    /// A zeroed scoreboard for a plan with `table_count` tables.
    #[must_use]
    pub fn new(table_count: usize) -> Self {
        Self {
            total_errors: 0,
            table_passes: vec![0; table_count],
        }
    }

    /// Tallies a scored test in the given table; zero charged errors
    /// counts as a pass.
    pub fn record(&mut self, table: usize, error_count: usize) {
        self.total_errors += error_count;
        if error_count == 0 {
            self.table_passes[table] += 1;
        }
    }

    /// Errors charged across all scored tests.
    #[must_use]
    pub const fn total_errors(&self) -> usize {
        self.total_errors
    }

    /// Passing scored tests in the given table.
    #[must_use]
    pub fn passes(&self, table: usize) -> usize {
        self.table_passes[table]
    }
}
