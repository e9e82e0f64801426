//! Structural model of a circuit project.
//!
//! A [`Design`] describes what a project contains, not how it behaves: named
//! circuits holding placed components of a few recognized kinds. Discovery
//! (`binding`) consumes this model; simulation engines produce it.

/// Opaque identity of one placed component instance.
///
/// Identifiers are assigned by whatever built the [`Design`] and are only
/// meaningful back to that same engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ComponentId(u32);

impl ComponentId {
    /// Wraps a raw engine-assigned identifier.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw engine-assigned identifier.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Component kinds the discovery protocol recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ComponentKind {
    /// The 32-entry architectural register file.
    RegisterFile,
    /// Instruction memory accepting program text.
    ProgramMemory,
    /// A clock source driving sequential logic.
    ClockSource,
    /// An instance of another circuit in the same design, by name.
    Subcircuit(String),
    /// Anything the harness does not need to know about.
    Other,
}

/// One placed component instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Component {
    /// Engine-assigned identity.
    pub id: ComponentId,
    /// Recognized kind.
    pub kind: ComponentKind,
}

/// One named circuit definition and its placed components.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CircuitDef {
    /// Circuit name, unique within the design.
    pub name: String,
    /// Placed components in design order.
    pub components: Vec<Component>,
}

/// A whole circuit project: every circuit definition plus the designated
/// current circuit, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Design {
    /// Circuit definitions in design order.
    pub circuits: Vec<CircuitDef>,
    /// Name of the designated current circuit.
    pub current: Option<String>,
}

impl Design {
    /// Looks up a circuit definition by exact name.
    #[must_use]
    pub fn circuit(&self, name: &str) -> Option<&CircuitDef> {
        self.circuits.iter().find(|c| c.name == name)
    }

    /// Returns the designated current circuit, falling back to the first
    /// circuit in design order.
    #[must_use]
    pub fn current_circuit(&self) -> Option<&CircuitDef> {
        self.current
            .as_deref()
            .and_then(|name| self.circuit(name))
            .or_else(|| self.circuits.first())
    }
}
