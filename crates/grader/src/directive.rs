//! Parsing for the directive-annotated test file format.
//!
//! A test file is a program in the target assembly syntax with grading
//! metadata embedded in `##` directive lines. Directive lines are comments
//! to the assembler, so the whole file is handed to program loading
//! unchanged.
//!
//! ## Supported directives
//!
//! - `## desc = <text>` (synonym `description`) - test name, required
//! - `## cycles = <n>` - clock cycles to run, required, positive
//! - `## start[<0-31>] = <value>` (synonym `init`) - starting register
//! - `## expect[<0-31>] = <value>` - expected register after the run
//! - Values: decimal, or `0x` plus at most 8 hex digits reinterpreted as
//!   signed two's complement
//!
//! Directive names resolve by exact case-insensitive match against the
//! fixed table above; a directive-shaped line with any other name fails the
//! whole parse. Lines that do not have the directive shape at all are
//! program content and pass through untouched.

use std::num::IntErrorKind;

use thiserror::Error;

use circuit_core::{ArchitecturalState, RegIndex, REGISTER_COUNT};

/// Why a test file failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    /// A directive-shaped line failed to parse.
    #[error("line {line}: {kind} (in '{text}')")]
    Line {
        /// 1-indexed line number in the test file.
        line: usize,
        /// The offending line, trimmed.
        text: String,
        /// What was wrong with it.
        kind: DirectiveErrorKind,
    },
    /// No `desc` directive anywhere in the file.
    #[error("test file has no description directive")]
    MissingDescription,
    /// No `cycles` directive anywhere in the file.
    #[error("test file has no cycle count directive")]
    MissingCycleCount,
}

/// Classification of directive-line parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveErrorKind {
    /// Directive-shaped line with a name outside the fixed table.
    UnrecognizedDirective(String),
    /// `expect`/`start` without a register index.
    MissingIndex(String),
    /// `desc`/`cycles` with a register index.
    UnexpectedIndex(String),
    /// Register index outside `0..=31`.
    RegisterIndexOutOfRange(String),
    /// Numeric value that is not a valid literal.
    InvalidValue(String),
    /// Numeric value outside the signed 32-bit range.
    ValueOutOfRange(String),
    /// Cycle count of zero or less.
    NonPositiveCycleCount(i32),
}

impl std::fmt::Display for DirectiveErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedDirective(name) => write!(f, "unrecognized directive '{name}'"),
            Self::MissingIndex(name) => write!(f, "directive '{name}' needs a register index"),
            Self::UnexpectedIndex(name) => {
                write!(f, "directive '{name}' does not take a register index")
            }
            Self::RegisterIndexOutOfRange(index) => {
                write!(f, "register index {index} is outside 0..={}", REGISTER_COUNT - 1)
            }
            Self::InvalidValue(value) => write!(f, "invalid value '{value}'"),
            Self::ValueOutOfRange(value) => {
                write!(f, "value '{value}' is outside the signed 32-bit range")
            }
            Self::NonPositiveCycleCount(count) => {
                write!(f, "cycle count must be positive, got {count}")
            }
        }
    }
}

/// Sparse register assignments collected from `start`/`init` or `expect`
/// directives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterMap {
    values: [Option<i32>; REGISTER_COUNT],
}

impl RegisterMap {
    /// Sets one register assignment, replacing any earlier one.
    pub const fn set(&mut self, index: RegIndex, value: i32) {
        self.values[index.index()] = Some(value);
    }

    /// Returns the assignment for one register, if any.
    #[must_use]
    pub const fn get(&self, index: RegIndex) -> Option<i32> {
        self.values[index.index()]
    }

    /// Iterates explicitly assigned `(index, value)` pairs in ascending
    /// index order.
    pub fn entries(&self) -> impl Iterator<Item = (RegIndex, i32)> + '_ {
        RegIndex::all().filter_map(|index| self.get(index).map(|value| (index, value)))
    }

    /// Densifies into a full snapshot, unassigned registers defaulting to
    /// zero.
    #[must_use]
    pub fn to_state(&self) -> ArchitecturalState {
        let mut state = ArchitecturalState::default();
        for (index, value) in self.entries() {
            state.set(index, value);
        }
        state
    }
}

/// One parsed test file. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    description: String,
    cycles: u32,
    starting: RegisterMap,
    expected: RegisterMap,
    program_text: String,
}

impl TestCase {
    /// Parses a test file's text.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectiveError`] for any malformed directive line, an
    /// unrecognized directive name, or a file missing its description or
    /// cycle count.
    pub fn parse(text: &str) -> Result<Self, DirectiveError> {
        let mut description: Option<String> = None;
        let mut cycles: Option<u32> = None;
        let mut starting = RegisterMap::default();
        let mut expected = RegisterMap::default();
        let mut program_text = String::with_capacity(text.len() + 1);

        for (idx, line) in text.lines().enumerate() {
            program_text.push_str(line);
            program_text.push('\n');

            let Some(raw) = match_directive(line) else {
                continue;
            };
            let located = |kind| DirectiveError::Line {
                line: idx + 1,
                text: line.trim().to_string(),
                kind,
            };

            let Some(tag) = resolve_tag(raw.name) else {
                return Err(located(DirectiveErrorKind::UnrecognizedDirective(
                    raw.name.to_string(),
                )));
            };
            match tag {
                DirectiveTag::Desc => {
                    reject_index(&raw).map_err(&located)?;
                    description = Some(raw.value.to_string());
                }
                DirectiveTag::Cycles => {
                    reject_index(&raw).map_err(&located)?;
                    let count = parse_value(raw.value).map_err(&located)?;
                    cycles = Some(
                        u32::try_from(count).ok().filter(|&c| c > 0).ok_or_else(|| {
                            located(DirectiveErrorKind::NonPositiveCycleCount(count))
                        })?,
                    );
                }
                DirectiveTag::Start => {
                    let index = require_index(&raw).map_err(&located)?;
                    starting.set(index, parse_value(raw.value).map_err(&located)?);
                }
                DirectiveTag::Expect => {
                    let index = require_index(&raw).map_err(&located)?;
                    expected.set(index, parse_value(raw.value).map_err(&located)?);
                }
            }
        }

        let description = description.ok_or(DirectiveError::MissingDescription)?;
        let cycles = cycles.ok_or(DirectiveError::MissingCycleCount)?;
        Ok(Self {
            description,
            cycles,
            starting,
            expected,
            program_text,
        })
    }

    /// Human-readable test name from the `desc` directive.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of logical clock cycles to drive, always positive.
    #[must_use]
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Explicit starting register assignments.
    #[must_use]
    pub const fn starting(&self) -> &RegisterMap {
        &self.starting
    }

    /// Explicit expected register assignments.
    #[must_use]
    pub const fn expected(&self) -> &RegisterMap {
        &self.expected
    }

    /// Expected register snapshot, unassigned registers zero.
    #[must_use]
    pub fn expected_state(&self) -> ArchitecturalState {
        self.expected.to_state()
    }

    /// The full test-file text, every line newline-terminated, directives
    /// included. This is what program loading receives.
    #[must_use]
    pub fn program_text(&self) -> &str {
        &self.program_text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveTag {
    Desc,
    Cycles,
    Expect,
    Start,
}

/// Accepted directive spellings. `init` is the historical synonym for
/// `start`; both spellings of the description tag predate this tool.
const DIRECTIVE_TABLE: [(&str, DirectiveTag); 6] = [
    ("desc", DirectiveTag::Desc),
    ("description", DirectiveTag::Desc),
    ("cycles", DirectiveTag::Cycles),
    ("expect", DirectiveTag::Expect),
    ("start", DirectiveTag::Start),
    ("init", DirectiveTag::Start),
];

fn resolve_tag(name: &str) -> Option<DirectiveTag> {
    DIRECTIVE_TABLE
        .iter()
        .find(|(spelling, _)| name.eq_ignore_ascii_case(spelling))
        .map(|&(_, tag)| tag)
}

struct RawDirective<'a> {
    name: &'a str,
    index: Option<&'a str>,
    value: &'a str,
}

/// Matches the directive line shape `## name[idx] = value`.
///
/// Whitespace is allowed after `##`, around `=`, and at end of line; the
/// value must contain at least one non-whitespace character. Anything that
/// does not match the shape exactly is program content, not a directive.
fn match_directive(line: &str) -> Option<RawDirective<'_>> {
    let rest = line.strip_prefix("##")?.trim_start();

    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, rest) = rest.split_at(name_len);

    let (index, rest) = match rest.strip_prefix('[') {
        Some(after) => {
            let close = after.find(']')?;
            let digits = &after[..close];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (Some(digits), &after[close + 1..])
        }
        None => (None, rest),
    };

    let rest = rest.trim_start().strip_prefix('=')?;
    let value = rest.trim();
    if value.is_empty() {
        return None;
    }
    Some(RawDirective { name, index, value })
}

fn require_index(raw: &RawDirective<'_>) -> Result<RegIndex, DirectiveErrorKind> {
    let digits = raw
        .index
        .ok_or_else(|| DirectiveErrorKind::MissingIndex(raw.name.to_string()))?;
    digits
        .parse::<usize>()
        .ok()
        .and_then(RegIndex::new)
        .ok_or_else(|| DirectiveErrorKind::RegisterIndexOutOfRange(digits.to_string()))
}

fn reject_index(raw: &RawDirective<'_>) -> Result<(), DirectiveErrorKind> {
    match raw.index {
        Some(_) => Err(DirectiveErrorKind::UnexpectedIndex(raw.name.to_string())),
        None => Ok(()),
    }
}

/// Parses a directive value with the dual-radix rule: `0x` plus at most 8
/// hex digits reinterpreted as signed two's complement, or a signed decimal
/// literal. Out-of-range literals fail rather than wrap.
fn parse_value(text: &str) -> Result<i32, DirectiveErrorKind> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.len() > 8 {
            return Err(DirectiveErrorKind::ValueOutOfRange(text.to_string()));
        }
        let bits = u32::from_str_radix(hex, 16)
            .map_err(|_| DirectiveErrorKind::InvalidValue(text.to_string()))?;
        #[allow(clippy::cast_possible_wrap)]
        Ok(bits as i32)
    } else {
        text.parse::<i32>().map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                DirectiveErrorKind::ValueOutOfRange(text.to_string())
            }
            _ => DirectiveErrorKind::InvalidValue(text.to_string()),
        })
    }
}
