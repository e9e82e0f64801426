//! Behavioral reference engine for driving the grading harness.
//!
//! The engine loads a text circuit description, assembles the MIPS
//! subset, and models a single-cycle processor behind the
//! [`circuit_core::CircuitSim`] contract: correct architectural results
//! with honest clock-edge timing, and none of the gate-level detail.

/// MIPS-subset assembly, two passes.
pub mod asm;
pub use asm::{assemble, AsmError};

/// Instruction decode and execution.
pub mod cpu;
pub use cpu::Core;

/// Text circuit-description parsing.
pub mod design_text;
pub use design_text::{parse_design, DesignParseError, DesignParseErrorKind};

/// The engine contract implemented over the behavioral core.
pub mod sim;
pub use sim::Simulator;
