//! Comparison of a finished run's register file against a test's
//! expectations.
//!
//! Every register participates in the comparison. A test that leaves a
//! register unspecified is asserting it ends at zero, which
//! [`TestCase::expected_state`](crate::directive::TestCase::expected_state)
//! already encodes by densifying the sparse expectations.

use std::fmt;

use circuit_core::{ArchitecturalState, RegIndex};

/// One register whose observed value differs from the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    register: RegIndex,
    expected: i32,
    observed: i32,
}

impl Mismatch {
    /// The register that was wrong.
    #[must_use]
    pub const fn register(&self) -> RegIndex {
        self.register
    }

    /// The value the test demanded.
    #[must_use]
    pub const fn expected(&self) -> i32 {
        self.expected
    }

    /// The value the circuit actually held.
    #[must_use]
    pub const fn observed(&self) -> i32 {
        self.observed
    }
}

impl fmt::Display for Mismatch {
    /// Renders the per-register report line. Values print as 8-digit hex
    /// bit patterns, so negative values show their two's complement form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "    Error in register {}. Expected 0x{:08x}, but got 0x{:08x}.",
            self.register, self.expected, self.observed
        )
    }
}

/// The full register-by-register comparison for one test run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateDiff {
    mismatches: Vec<Mismatch>,
}

impl StateDiff {
    /// Compares all 32 registers, collecting mismatches in ascending
    /// register order.
    #[must_use]
    pub fn between(expected: &ArchitecturalState, observed: &ArchitecturalState) -> Self {
        let mismatches = RegIndex::all()
            .filter_map(|register| {
                let (want, got) = (expected.get(register), observed.get(register));
                (want != got).then_some(Mismatch {
                    register,
                    expected: want,
                    observed: got,
                })
            })
            .collect();
        Self { mismatches }
    }

    /// True when every register matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Number of mismatched registers, `0..=32`.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.mismatches.len()
    }

    /// The mismatches, ascending by register index.
    #[must_use]
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }
}
