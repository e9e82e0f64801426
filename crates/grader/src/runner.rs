//! The cycle-accurate drive loop for a single test.
//!
//! A run is the same fixed conversation with the engine every time: reset,
//! load the program, seed the starting registers, settle, toggle the clock
//! through `2 * cycles + 1` half-edges with a propagation after each, then
//! read back all 32 registers. Anything the engine refuses, and any
//! register that comes back undefined, aborts the whole session rather
//! than scoring as a mismatch.

use thiserror::Error;

use circuit_core::{ArchitecturalState, CircuitBinding, CircuitSim, RegIndex, SimError};

use crate::directive::TestCase;

/// Why a test run (as opposed to the circuit's answers) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// The engine rejected an operation, most commonly the program load.
    #[error(transparent)]
    Sim(#[from] SimError),
    /// A register read back undefined after the run, meaning the circuit
    /// left it unconnected or floating.
    #[error("register {0} held an undefined value after the run")]
    UndefinedRegister(RegIndex),
}

/// Drives one test against the bound circuit and returns the observed
/// register file.
///
/// Starting registers are written in ascending index order, including
/// register 0 when the test sets it; whether that write sticks is the
/// engine's business. The half-edge count is `2 * cycles + 1`, an odd
/// number, so a clock line ends the run at the opposite level from where
/// it started.
///
/// # Errors
///
/// Returns [`RunError::Sim`] when the engine rejects the program or a
/// register access, and [`RunError::UndefinedRegister`] when a register
/// read yields no defined value.
pub fn run_test<S: CircuitSim>(
    sim: &mut S,
    binding: &CircuitBinding,
    test: &TestCase,
) -> Result<ArchitecturalState, RunError> {
    sim.reset();
    sim.load_program(binding.program_memory(), test.program_text())?;
    for (register, value) in test.starting().entries() {
        sim.write_register(binding.register_file(), register, value)?;
    }
    sim.propagate();

    let half_edges = 2 * test.cycles() + 1;
    for _ in 0..half_edges {
        sim.tick();
        sim.propagate();
    }

    let mut observed = ArchitecturalState::default();
    for register in RegIndex::all() {
        let value = sim
            .read_register(binding.register_file(), register)?
            .ok_or(RunError::UndefinedRegister(register))?;
        observed.set(register, value);
    }
    Ok(observed)
}
