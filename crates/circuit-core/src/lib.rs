//! Engine-agnostic core for the mipsmark circuit grader.
//!
//! This crate defines the data the harness and a simulation engine exchange:
//! the structural [`Design`] model, the [`bind`] discovery protocol that
//! resolves a [`CircuitBinding`] from it, the [`CircuitSim`] capability
//! contract for driving a bound circuit, and the [`ArchitecturalState`]
//! snapshot type sampled after a run. It knows nothing about test files or
//! scoring.

/// Architectural register state primitives.
pub mod state;
pub use state::{ArchitecturalState, RegIndex, REGISTER_COUNT, RETURN_VALUE_REG};

/// Structural model of a circuit project.
pub mod design;
pub use design::{CircuitDef, Component, ComponentId, ComponentKind, Design};

/// Discovery and binding of the circuit under test.
pub mod binding;
pub use binding::{
    bind, BindError, CircuitBinding, RegisterFileHandle, MAIN_CIRCUIT_NAME, MAIN_CIRCUIT_NAME_ALT,
};

/// Capability contract implemented by simulation engines.
pub mod sim;
pub use sim::{CircuitSim, SimError};
