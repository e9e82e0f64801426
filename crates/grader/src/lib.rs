//! Conformance grading harness for student MIPS processor circuits.

use refsim as _;
#[cfg(test)]
use tempfile as _;

/// Register-state comparison between a run and its expectations.
pub mod diff;
/// Directive-annotated test file parsing.
pub mod directive;
/// Grading layouts, table assignment, and scoring modes.
pub mod plan;
/// Per-test report lines and the end-of-session summary.
pub mod report;
/// The cycle-accurate drive loop for one test.
pub mod runner;
/// Whole-session orchestration over a set of test files.
pub mod suite;
