//! Behavioral execution of the assembled MIPS subset.
//!
//! One [`Core::step`] commits one instruction. Addresses are word
//! indices: the program counter, jump targets, and `jr` register values
//! all count instruction words from the start of the program. Data
//! memory is a sparse word store keyed by the computed `lw`/`sw`
//! address, reading as zero until written.

use std::collections::HashMap;

use circuit_core::RegIndex;

/// Architectural core state: registers, program counter, data memory.
#[derive(Debug, Clone, Default)]
pub struct Core {
    regs: [i32; 32],
    pc: u32,
    ram: HashMap<u32, i32>,
}

impl Core {
    /// A zeroed core.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears registers, data memory, and the program counter.
    pub fn reset(&mut self) {
        self.regs = [0; 32];
        self.pc = 0;
        self.ram.clear();
    }

    /// Current value of one register.
    #[must_use]
    pub const fn reg(&self, register: RegIndex) -> i32 {
        self.regs[register.index()]
    }

    /// Writes one register. Register 0 stays hardwired to zero.
    pub const fn set_reg(&mut self, register: RegIndex, value: i32) {
        if register.index() != 0 {
            self.regs[register.index()] = value;
        }
    }

    /// Executes the instruction at the program counter. A fetch past the
    /// end of the program reads zero, a no-op, so a runaway counter
    /// slides harmlessly; unused encodings execute as no-ops too.
    pub fn step(&mut self, program: &[u32]) {
        let word = usize::try_from(self.pc)
            .ok()
            .and_then(|index| program.get(index))
            .copied()
            .unwrap_or(0);

        let op = word >> 26;
        let rs = reg_field(word, 21);
        let rt = reg_field(word, 16);
        let rd = reg_field(word, 11);
        let shamt = (word >> 6) & 0x1f;
        let imm = word & 0xffff;
        let signed = sign_extend_16(imm);

        let mut next_pc = self.pc.wrapping_add(1);
        match op {
            0x00 => match word & 0x3f {
                // sll, srl, sra
                0x00 => self.write(rd, as_word(as_bits(self.regs[rt]) << shamt)),
                0x02 => self.write(rd, as_word(as_bits(self.regs[rt]) >> shamt)),
                0x03 => self.write(rd, self.regs[rt] >> shamt),
                // jr
                0x08 => next_pc = as_bits(self.regs[rs]),
                // add, addu, sub, subu
                0x20 | 0x21 => self.write(rd, self.regs[rs].wrapping_add(self.regs[rt])),
                0x22 | 0x23 => self.write(rd, self.regs[rs].wrapping_sub(self.regs[rt])),
                // and, or, xor, nor
                0x24 => self.write(rd, self.regs[rs] & self.regs[rt]),
                0x25 => self.write(rd, self.regs[rs] | self.regs[rt]),
                0x26 => self.write(rd, self.regs[rs] ^ self.regs[rt]),
                0x27 => self.write(rd, !(self.regs[rs] | self.regs[rt])),
                // slt, sltu
                0x2a => self.write(rd, i32::from(self.regs[rs] < self.regs[rt])),
                0x2b => self.write(
                    rd,
                    i32::from(as_bits(self.regs[rs]) < as_bits(self.regs[rt])),
                ),
                _ => {}
            },
            // j
            0x02 => next_pc = word & 0x03ff_ffff,
            // beq, bne
            0x04 => {
                if self.regs[rs] == self.regs[rt] {
                    next_pc = branch_target(self.pc, signed);
                }
            }
            0x05 => {
                if self.regs[rs] != self.regs[rt] {
                    next_pc = branch_target(self.pc, signed);
                }
            }
            // addi, addiu
            0x08 | 0x09 => self.write(rt, self.regs[rs].wrapping_add(signed)),
            // slti
            0x0a => self.write(rt, i32::from(self.regs[rs] < signed)),
            // andi, ori, xori (zero-extended immediate)
            0x0c => self.write(rt, self.regs[rs] & as_word(imm)),
            0x0d => self.write(rt, self.regs[rs] | as_word(imm)),
            0x0e => self.write(rt, self.regs[rs] ^ as_word(imm)),
            // lui
            0x0f => self.write(rt, as_word(imm << 16)),
            // lw, sw
            0x23 => {
                let address = as_bits(self.regs[rs]).wrapping_add(as_bits(signed));
                self.write(rt, self.ram.get(&address).copied().unwrap_or(0));
            }
            0x2b => {
                let address = as_bits(self.regs[rs]).wrapping_add(as_bits(signed));
                self.ram.insert(address, self.regs[rt]);
            }
            _ => {}
        }
        self.pc = next_pc;
    }

    /// Raw register write used by decode; index 0 stays zero.
    const fn write(&mut self, index: usize, value: i32) {
        if index != 0 {
            self.regs[index] = value;
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn reg_field(word: u32, shift: u32) -> usize {
    ((word >> shift) & 0x1f) as usize
}

#[allow(clippy::cast_possible_wrap)]
const fn as_word(bits: u32) -> i32 {
    bits as i32
}

#[allow(clippy::cast_sign_loss)]
const fn as_bits(value: i32) -> u32 {
    value as u32
}

const fn sign_extend_16(bits: u32) -> i32 {
    as_word(bits << 16) >> 16
}

const fn branch_target(pc: u32, offset: i32) -> u32 {
    pc.wrapping_add(1).wrapping_add(as_bits(offset))
}
