//! Capability contract between the harness and a simulation engine.

use thiserror::Error;

use crate::binding::RegisterFileHandle;
use crate::design::{ComponentId, Design};
use crate::state::RegIndex;

/// Failure surfaced by a simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// The engine rejected the text handed to program memory.
    #[error("program rejected: {0}")]
    ProgramRejected(String),
    /// A handle referred to a component this engine does not own.
    #[error("component handle does not belong to this engine")]
    UnknownComponent,
}

/// Everything the harness needs from a simulation engine.
///
/// The harness owns exactly one engine per run and drives it strictly
/// sequentially; implementations never need interior synchronization. All
/// component handles passed in originate from binding against the same
/// engine's [`design`](CircuitSim::design), and engines are expected to
/// reject handles they did not hand out.
pub trait CircuitSim {
    /// Structural self-description used for discovery and binding.
    fn design(&self) -> &Design;

    /// Returns all sequential state to the power-on condition: registers
    /// zero, data memory cleared, clock at its idle level. Program memory
    /// contents may survive; the harness always loads after resetting.
    fn reset(&mut self);

    /// Replaces the contents of program memory `memory` with `text`.
    ///
    /// # Errors
    ///
    /// [`SimError::ProgramRejected`] when the text is not loadable (for
    /// example, it does not assemble); [`SimError::UnknownComponent`] when
    /// `memory` is not this engine's program memory.
    fn load_program(&mut self, memory: ComponentId, text: &str) -> Result<(), SimError>;

    /// Writes one register through the bound register-file handle.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownComponent`] when the handle does not resolve to
    /// this engine's register file.
    fn write_register(
        &mut self,
        register_file: RegisterFileHandle,
        index: RegIndex,
        value: i32,
    ) -> Result<(), SimError>;

    /// Reads one register through the bound register-file handle.
    ///
    /// `Ok(None)` means the value is not fully determined (unknown or
    /// undriven bits); the harness treats that as fatal, never as zero.
    ///
    /// # Errors
    ///
    /// [`SimError::UnknownComponent`] when the handle does not resolve to
    /// this engine's register file.
    fn read_register(
        &self,
        register_file: RegisterFileHandle,
        index: RegIndex,
    ) -> Result<Option<i32>, SimError>;

    /// Settles combinational logic to a fixpoint under the current
    /// register and memory values, without moving the clock.
    fn propagate(&mut self);

    /// Advances the clock by one half edge.
    fn tick(&mut self);
}
