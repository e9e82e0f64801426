//! The engine contract implemented over the behavioral core.

use circuit_core::{
    CircuitSim, ComponentId, ComponentKind, Design, RegIndex, RegisterFileHandle, SimError,
};

use crate::asm;
use crate::cpu::Core;

/// A behavioral single-cycle model of a processor design.
///
/// The clock idles high after reset; each [`tick`](CircuitSim::tick)
/// toggles it and the core commits one instruction on every rising edge.
/// The loaded program survives a reset, register and memory state does
/// not.
#[derive(Debug, Clone)]
pub struct Simulator {
    design: Design,
    core: Core,
    program: Vec<u32>,
    clock_high: bool,
}

impl Simulator {
    /// Wraps a parsed design in a runnable model.
    #[must_use]
    pub fn new(design: Design) -> Self {
        Self {
            design,
            core: Core::new(),
            program: Vec::new(),
            clock_high: true,
        }
    }

    fn component_kind(&self, id: ComponentId) -> Option<&ComponentKind> {
        self.design
            .circuits
            .iter()
            .flat_map(|circuit| &circuit.components)
            .find(|component| component.id == id)
            .map(|component| &component.kind)
    }

    /// The enclosure on the handle is a routing detail for netlist
    /// engines; the behavioral model only checks the component itself.
    fn check_register_file(&self, handle: RegisterFileHandle) -> Result<(), SimError> {
        match self.component_kind(handle.component()) {
            Some(ComponentKind::RegisterFile) => Ok(()),
            _ => Err(SimError::UnknownComponent),
        }
    }
}

impl CircuitSim for Simulator {
    fn design(&self) -> &Design {
        &self.design
    }

    fn reset(&mut self) {
        self.core.reset();
        self.clock_high = true;
    }

    fn load_program(&mut self, memory: ComponentId, text: &str) -> Result<(), SimError> {
        match self.component_kind(memory) {
            Some(ComponentKind::ProgramMemory) => {}
            _ => return Err(SimError::UnknownComponent),
        }
        self.program =
            asm::assemble(text).map_err(|error| SimError::ProgramRejected(error.to_string()))?;
        Ok(())
    }

    fn write_register(
        &mut self,
        register_file: RegisterFileHandle,
        index: RegIndex,
        value: i32,
    ) -> Result<(), SimError> {
        self.check_register_file(register_file)?;
        self.core.set_reg(index, value);
        Ok(())
    }

    fn read_register(
        &self,
        register_file: RegisterFileHandle,
        index: RegIndex,
    ) -> Result<Option<i32>, SimError> {
        self.check_register_file(register_file)?;
        Ok(Some(self.core.reg(index)))
    }

    // a behavioral model is always settled
    fn propagate(&mut self) {}

    fn tick(&mut self) {
        self.clock_high = !self.clock_high;
        if self.clock_high {
            self.core.step(&self.program);
        }
    }
}
