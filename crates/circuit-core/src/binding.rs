//! Discovery and binding of the circuit under test.
//!
//! Binding resolves the handles one grading run needs from a [`Design`]:
//! which circuit is the processor entry point, where the register file and
//! program memory live, and whether a clock source exists at all. Students
//! are asked to name their processor circuit `MIPS32` (older projects used
//! `MIPS`), and to keep the register file either in that circuit or inside a
//! subcircuit placed directly in it. The binder enforces exactly that: one
//! level of nesting, resolved through the enclosing subcircuit instance,
//! never an open-ended recursive search.

use thiserror::Error;

use crate::design::{CircuitDef, ComponentId, ComponentKind, Design};

/// Preferred name of the processor entry-point circuit.
pub const MAIN_CIRCUIT_NAME: &str = "MIPS32";
/// Legacy name of the processor entry-point circuit.
pub const MAIN_CIRCUIT_NAME_ALT: &str = "MIPS";

/// Why a design failed to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindError {
    /// The design has both a `MIPS` and a `MIPS32` circuit.
    #[error("design has both a MIPS and a MIPS32 circuit")]
    AmbiguousMainCircuit,
    /// The design contains no circuits at all.
    #[error("design contains no circuits")]
    NoMainCircuit,
    /// The design does not contain exactly one register file.
    #[error("expected exactly one register file, found {0}")]
    RegisterFileCount(usize),
    /// The design does not contain exactly one program memory.
    #[error("expected exactly one program memory, found {0}")]
    ProgramMemoryCount(usize),
    /// No clock source anywhere in the design.
    #[error("no clock source in the design")]
    NoClockSource,
    /// The register file is not in the main circuit and not reachable
    /// through a subcircuit instance placed directly in it.
    #[error("register file is nested more than one subcircuit deep or not reachable from the main circuit")]
    RegisterFileTooDeep,
}

/// Resolved handle to the register file, with its enclosing subcircuit
/// instance when it sits one level below the main circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterFileHandle {
    enclosure: Option<ComponentId>,
    component: ComponentId,
}

impl RegisterFileHandle {
    /// Builds a handle from an optional enclosing instance and the register
    /// file component itself.
    #[must_use]
    pub const fn new(enclosure: Option<ComponentId>, component: ComponentId) -> Self {
        Self {
            enclosure,
            component,
        }
    }

    /// The subcircuit instance in the main circuit enclosing the register
    /// file, or `None` when the register file is placed directly.
    #[must_use]
    pub const fn enclosure(self) -> Option<ComponentId> {
        self.enclosure
    }

    /// The register file component.
    #[must_use]
    pub const fn component(self) -> ComponentId {
        self.component
    }
}

/// Everything one grading run needs to drive a bound circuit.
///
/// Constructed once per run by [`bind`]; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBinding {
    main_circuit: String,
    register_file: RegisterFileHandle,
    program_memory: ComponentId,
    warnings: Vec<String>,
}

impl CircuitBinding {
    /// Name of the resolved entry-point circuit.
    #[must_use]
    pub fn main_circuit(&self) -> &str {
        &self.main_circuit
    }

    /// Handle to the register file.
    #[must_use]
    pub const fn register_file(&self) -> RegisterFileHandle {
        self.register_file
    }

    /// The program memory component.
    #[must_use]
    pub const fn program_memory(&self) -> ComponentId {
        self.program_memory
    }

    /// Non-fatal findings produced during resolution.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Resolves the handles needed to grade `design`.
///
/// # Errors
///
/// Returns a [`BindError`] when the design is ambiguous about its entry
/// point, is missing a required component, has duplicate register files or
/// program memories, or hides its register file deeper than one subcircuit
/// level.
pub fn bind(design: &Design) -> Result<CircuitBinding, BindError> {
    let mut warnings = Vec::new();
    let main = resolve_main(design, &mut warnings)?;

    let mut register_files: Vec<(&str, ComponentId)> = Vec::new();
    let mut program_memories: Vec<ComponentId> = Vec::new();
    let mut clock_count = 0usize;
    for circuit in &design.circuits {
        for component in &circuit.components {
            match &component.kind {
                ComponentKind::RegisterFile => {
                    register_files.push((circuit.name.as_str(), component.id));
                }
                ComponentKind::ProgramMemory => program_memories.push(component.id),
                ComponentKind::ClockSource => clock_count += 1,
                ComponentKind::Subcircuit(_) | ComponentKind::Other => {}
            }
        }
    }

    let &(owner, register_file) = match register_files.as_slice() {
        [one] => one,
        found => return Err(BindError::RegisterFileCount(found.len())),
    };
    let &program_memory = match program_memories.as_slice() {
        [one] => one,
        found => return Err(BindError::ProgramMemoryCount(found.len())),
    };
    if clock_count == 0 {
        return Err(BindError::NoClockSource);
    }

    let enclosure = if owner == main.name {
        None
    } else {
        Some(find_enclosure(main, owner).ok_or(BindError::RegisterFileTooDeep)?)
    };

    Ok(CircuitBinding {
        main_circuit: main.name.clone(),
        register_file: RegisterFileHandle::new(enclosure, register_file),
        program_memory,
        warnings,
    })
}

fn resolve_main<'d>(
    design: &'d Design,
    warnings: &mut Vec<String>,
) -> Result<&'d CircuitDef, BindError> {
    let preferred = design.circuit(MAIN_CIRCUIT_NAME);
    let legacy = design.circuit(MAIN_CIRCUIT_NAME_ALT);
    match (preferred, legacy) {
        (Some(_), Some(_)) => Err(BindError::AmbiguousMainCircuit),
        (Some(main), None) | (None, Some(main)) => Ok(main),
        (None, None) => {
            let fallback = design.current_circuit().ok_or(BindError::NoMainCircuit)?;
            warnings.push(format!(
                "no {MAIN_CIRCUIT_NAME} or {MAIN_CIRCUIT_NAME_ALT} circuit found, using {}",
                fallback.name
            ));
            Ok(fallback)
        }
    }
}

fn find_enclosure(main: &CircuitDef, owner: &str) -> Option<ComponentId> {
    main.components.iter().find_map(|c| match &c.kind {
        ComponentKind::Subcircuit(name) if name == owner => Some(c.id),
        _ => None,
    })
}
