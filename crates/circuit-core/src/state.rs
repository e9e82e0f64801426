//! Architectural register state sampled from a circuit under test.

/// Number of architecturally visible general-purpose registers.
pub const REGISTER_COUNT: usize = 32;

/// Index of the conventional return-value register (`$v0`).
pub const RETURN_VALUE_REG: RegIndex = RegIndex(2);

/// Validated register index in `0..=31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegIndex(u8);

impl RegIndex {
    /// Checks a raw index against the register-file width.
    #[must_use]
    pub const fn new(index: usize) -> Option<Self> {
        if index < REGISTER_COUNT {
            #[allow(clippy::cast_possible_truncation)]
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Returns the array index for this register (`0..=31`).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterates every register index in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..REGISTER_COUNT).filter_map(Self::new)
    }
}

impl std::fmt::Display for RegIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One register-file snapshot: 32 signed 32-bit values.
///
/// Index 0 is conventionally hard-wired to zero in the target architecture,
/// but the harness does not special-case it; it is sampled and diffed like
/// any other index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    regs: [i32; REGISTER_COUNT],
}

impl ArchitecturalState {
    /// Builds a snapshot from a dense register array.
    #[must_use]
    pub const fn from_words(regs: [i32; REGISTER_COUNT]) -> Self {
        Self { regs }
    }

    /// Reads one register.
    #[must_use]
    pub const fn get(&self, index: RegIndex) -> i32 {
        self.regs[index.index()]
    }

    /// Writes one register.
    pub const fn set(&mut self, index: RegIndex, value: i32) {
        self.regs[index.index()] = value;
    }

    /// Iterates `(index, value)` pairs in ascending index order.
    pub fn entries(&self) -> impl Iterator<Item = (RegIndex, i32)> + '_ {
        RegIndex::all().map(|index| (index, self.get(index)))
    }
}
