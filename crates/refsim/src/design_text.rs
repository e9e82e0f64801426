//! Parser for the text circuit-description format.
//!
//! A description lists circuits and the components inside them, one entry
//! per line:
//!
//! ```text
//! # comment
//! current MIPS32
//! circuit MIPS32
//!   clock
//!   rom
//!   subcircuit Registers
//! circuit Registers
//!   regfile
//! ```
//!
//! `circuit <name>` opens a circuit; the entries after it belong to it.
//! `current <name>` marks the designated circuit. Component entries are
//! `regfile`, `rom`, `clock`, `subcircuit <name>`, and `other <note>` for
//! anything the grader does not care about. `#` starts a comment, names
//! may contain spaces, and indentation is free-form.

use thiserror::Error;

use circuit_core::{CircuitDef, Component, ComponentId, ComponentKind, Design};

/// A malformed circuit description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind} (in '{text}')")]
pub struct DesignParseError {
    /// 1-indexed line number.
    pub line: usize,
    /// The offending entry, comments stripped.
    pub text: String,
    /// What was wrong with it.
    pub kind: DesignParseErrorKind,
}

/// Classification of circuit-description parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignParseErrorKind {
    /// An entry keyword outside the known set.
    UnknownEntry(String),
    /// `circuit`, `current`, or `subcircuit` without a name.
    MissingName(&'static str),
    /// `regfile`, `rom`, or `clock` followed by extra text.
    UnexpectedArgument(&'static str),
    /// A component entry before any `circuit` line.
    ComponentOutsideCircuit,
    /// Two circuits with the same name.
    DuplicateCircuit(String),
    /// More than one `current` entry.
    DuplicateCurrent,
    /// `current` names a circuit the file never defines.
    UndefinedCurrent(String),
}

impl std::fmt::Display for DesignParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEntry(keyword) => write!(f, "unknown entry '{keyword}'"),
            Self::MissingName(keyword) => write!(f, "'{keyword}' needs a name"),
            Self::UnexpectedArgument(keyword) => {
                write!(f, "'{keyword}' does not take an argument")
            }
            Self::ComponentOutsideCircuit => {
                write!(f, "component listed before any circuit")
            }
            Self::DuplicateCircuit(name) => write!(f, "circuit '{name}' is already defined"),
            Self::DuplicateCurrent => write!(f, "the current circuit is already set"),
            Self::UndefinedCurrent(name) => {
                write!(f, "current circuit '{name}' is never defined")
            }
        }
    }
}

struct CurrentEntry {
    name: String,
    line: usize,
    text: String,
}

/// Parses a circuit description into a [`Design`]. Component ids are
/// assigned in file order across all circuits.
///
/// # Errors
///
/// Returns a [`DesignParseError`] locating the first malformed entry.
pub fn parse_design(text: &str) -> Result<Design, DesignParseError> {
    let mut circuits: Vec<CircuitDef> = Vec::new();
    let mut current: Option<CurrentEntry> = None;
    let mut next_id: u32 = 0;

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let located = |kind| DesignParseError {
            line: idx + 1,
            text: line.to_string(),
            kind,
        };

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };

        match keyword {
            "circuit" => {
                if rest.is_empty() {
                    return Err(located(DesignParseErrorKind::MissingName("circuit")));
                }
                if circuits.iter().any(|circuit| circuit.name == rest) {
                    return Err(located(DesignParseErrorKind::DuplicateCircuit(
                        rest.to_string(),
                    )));
                }
                circuits.push(CircuitDef {
                    name: rest.to_string(),
                    components: Vec::new(),
                });
            }
            "current" => {
                if rest.is_empty() {
                    return Err(located(DesignParseErrorKind::MissingName("current")));
                }
                if current.is_some() {
                    return Err(located(DesignParseErrorKind::DuplicateCurrent));
                }
                current = Some(CurrentEntry {
                    name: rest.to_string(),
                    line: idx + 1,
                    text: line.to_string(),
                });
            }
            "regfile" | "rom" | "clock" => {
                let (kind, keyword) = match keyword {
                    "regfile" => (ComponentKind::RegisterFile, "regfile"),
                    "rom" => (ComponentKind::ProgramMemory, "rom"),
                    _ => (ComponentKind::ClockSource, "clock"),
                };
                if !rest.is_empty() {
                    return Err(located(DesignParseErrorKind::UnexpectedArgument(keyword)));
                }
                push_component(&mut circuits, &mut next_id, kind).map_err(located)?;
            }
            "subcircuit" => {
                if rest.is_empty() {
                    return Err(located(DesignParseErrorKind::MissingName("subcircuit")));
                }
                push_component(
                    &mut circuits,
                    &mut next_id,
                    ComponentKind::Subcircuit(rest.to_string()),
                )
                .map_err(located)?;
            }
            // free-form note, the component only needs to exist
            "other" => {
                push_component(&mut circuits, &mut next_id, ComponentKind::Other)
                    .map_err(located)?;
            }
            unknown => {
                return Err(located(DesignParseErrorKind::UnknownEntry(
                    unknown.to_string(),
                )));
            }
        }
    }

    if let Some(entry) = &current {
        if !circuits.iter().any(|circuit| circuit.name == entry.name) {
            return Err(DesignParseError {
                line: entry.line,
                text: entry.text.clone(),
                kind: DesignParseErrorKind::UndefinedCurrent(entry.name.clone()),
            });
        }
    }

    Ok(Design {
        circuits,
        current: current.map(|entry| entry.name),
    })
}

fn push_component(
    circuits: &mut [CircuitDef],
    next_id: &mut u32,
    kind: ComponentKind,
) -> Result<(), DesignParseErrorKind> {
    let Some(circuit) = circuits.last_mut() else {
        return Err(DesignParseErrorKind::ComponentOutsideCircuit);
    };
    circuit.components.push(Component {
        id: ComponentId::new(*next_id),
        kind,
    });
    *next_id += 1;
    Ok(())
}
