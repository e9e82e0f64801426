//! Two-pass assembler for the MIPS subset the reference model executes.
//!
//! The first pass strips `#` comments, peels `label:` prefixes, and
//! records each label's word address; the second pass encodes every
//! remaining instruction into its 32-bit MIPS word. Addresses are word
//! indices from the start of the program, which is also how `j`, `jr`,
//! and numeric branch operands are interpreted.
//!
//! Registers are written `r4`, `R4`, or `$4`. Immediates are decimal or
//! `0x` hex, and mnemonics are case-insensitive. Grading directives open
//! with `##`, so to this assembler they are comments like any other.

use std::collections::HashMap;

use thiserror::Error;

/// An assembly failure, located at its source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message} (in '{text}')")]
pub struct AsmError {
    /// 1-indexed line number in the program text.
    pub line: usize,
    /// The offending statement, comments and labels stripped.
    pub text: String,
    /// What went wrong.
    pub message: String,
}

struct Pending<'a> {
    line: usize,
    text: &'a str,
}

/// Assembles a program into instruction words, one per instruction in
/// source order.
///
/// # Errors
///
/// Returns an [`AsmError`] for the first malformed statement, duplicate
/// label, out-of-range operand, or reference to an undefined label.
pub fn assemble(source: &str) -> Result<Vec<u32>, AsmError> {
    let mut symbols: HashMap<String, u32> = HashMap::new();
    let mut pending: Vec<Pending<'_>> = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let mut text = strip_comment(raw).trim();
        while let Some((label, rest)) = split_label(text) {
            let located = |message| AsmError {
                line: idx + 1,
                text: text.to_string(),
                message,
            };
            let address = word_address(pending.len()).map_err(located)?;
            if symbols.insert(label.to_string(), address).is_some() {
                return Err(located(format!("duplicate label '{label}'")));
            }
            text = rest;
        }
        if !text.is_empty() {
            pending.push(Pending { line: idx + 1, text });
        }
    }

    let mut program = Vec::with_capacity(pending.len());
    for (index, statement) in pending.iter().enumerate() {
        let word = word_address(index)
            .and_then(|pc| encode(statement.text, pc, &symbols))
            .map_err(|message| AsmError {
                line: statement.line,
                text: statement.text.to_string(),
                message,
            })?;
        program.push(word);
    }
    Ok(program)
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default()
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let (head, tail) = text.split_once(':')?;
    let label = head.trim_end();
    is_label(label).then(|| (label, tail.trim_start()))
}

fn is_label(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn word_address(index: usize) -> Result<u32, String> {
    u32::try_from(index).map_err(|_| "program is too large".to_string())
}

fn encode(text: &str, pc: u32, symbols: &HashMap<String, u32>) -> Result<u32, String> {
    let (head, tail) = match text.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (text, ""),
    };
    let mnemonic = head.to_ascii_lowercase();
    let operands: Vec<&str> = if tail.is_empty() {
        Vec::new()
    } else {
        tail.split(',').map(str::trim).collect()
    };

    match mnemonic.as_str() {
        "nop" => {
            no_operands(&mnemonic, &operands)?;
            Ok(0)
        }
        "add" | "addu" | "sub" | "subu" | "and" | "or" | "xor" | "nor" | "slt" | "sltu" => {
            let funct = match mnemonic.as_str() {
                "add" => 0x20,
                "addu" => 0x21,
                "sub" => 0x22,
                "subu" => 0x23,
                "and" => 0x24,
                "or" => 0x25,
                "xor" => 0x26,
                "nor" => 0x27,
                "slt" => 0x2a,
                _ => 0x2b,
            };
            let (rd, rs, rt) = three_operands(&mnemonic, &operands)?;
            Ok(r_type(register(rs)?, register(rt)?, register(rd)?, 0, funct))
        }
        "sll" | "srl" | "sra" => {
            let funct = match mnemonic.as_str() {
                "sll" => 0x00,
                "srl" => 0x02,
                _ => 0x03,
            };
            let (rd, rt, shamt) = three_operands(&mnemonic, &operands)?;
            Ok(r_type(0, register(rt)?, register(rd)?, shift_amount(shamt)?, funct))
        }
        "jr" => {
            let rs = one_operand(&mnemonic, &operands)?;
            Ok(r_type(register(rs)?, 0, 0, 0, 0x08))
        }
        "addi" | "addiu" | "slti" | "andi" | "ori" | "xori" => {
            let op = match mnemonic.as_str() {
                "addi" => 0x08,
                "addiu" => 0x09,
                "slti" => 0x0a,
                "andi" => 0x0c,
                "ori" => 0x0d,
                _ => 0x0e,
            };
            let (rt, rs, imm) = three_operands(&mnemonic, &operands)?;
            Ok(i_type(op, register(rs)?, register(rt)?, imm16(imm)?))
        }
        "lui" => {
            let (rt, imm) = two_operands(&mnemonic, &operands)?;
            Ok(i_type(0x0f, 0, register(rt)?, imm16(imm)?))
        }
        "lw" | "sw" => {
            let op = if mnemonic == "lw" { 0x23 } else { 0x2b };
            let (rt, address) = two_operands(&mnemonic, &operands)?;
            let (offset, base) = mem_operand(address)?;
            Ok(i_type(op, base, register(rt)?, offset))
        }
        "beq" | "bne" => {
            let op = if mnemonic == "beq" { 0x04 } else { 0x05 };
            let (rs, rt, target) = three_operands(&mnemonic, &operands)?;
            Ok(i_type(
                op,
                register(rs)?,
                register(rt)?,
                branch_offset(target, pc, symbols)?,
            ))
        }
        "j" => {
            let target = one_operand(&mnemonic, &operands)?;
            Ok((0x02 << 26) | jump_target(target, symbols)?)
        }
        other => Err(format!("unknown instruction '{other}'")),
    }
}

const fn r_type(rs: u32, rt: u32, rd: u32, shamt: u32, funct: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (shamt << 6) | funct
}

const fn i_type(op: u32, rs: u32, rt: u32, imm: u32) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | imm
}

/// Low bits of a range-checked value; callers validate the range first.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn truncate(value: i64, mask: u32) -> u32 {
    (value as u32) & mask
}

fn no_operands(mnemonic: &str, operands: &[&str]) -> Result<(), String> {
    match operands {
        [] => Ok(()),
        _ => Err(operand_count(mnemonic, 0, operands.len())),
    }
}

fn one_operand<'a>(mnemonic: &str, operands: &[&'a str]) -> Result<&'a str, String> {
    match operands {
        [a] => Ok(a),
        _ => Err(operand_count(mnemonic, 1, operands.len())),
    }
}

fn two_operands<'a>(mnemonic: &str, operands: &[&'a str]) -> Result<(&'a str, &'a str), String> {
    match operands {
        [a, b] => Ok((a, b)),
        _ => Err(operand_count(mnemonic, 2, operands.len())),
    }
}

fn three_operands<'a>(
    mnemonic: &str,
    operands: &[&'a str],
) -> Result<(&'a str, &'a str, &'a str), String> {
    match operands {
        [a, b, c] => Ok((a, b, c)),
        _ => Err(operand_count(mnemonic, 3, operands.len())),
    }
}

fn operand_count(mnemonic: &str, want: usize, got: usize) -> String {
    format!("'{mnemonic}' expects {want} operand(s), got {got}")
}

fn register(text: &str) -> Result<u32, String> {
    let digits = text
        .strip_prefix('r')
        .or_else(|| text.strip_prefix('R'))
        .or_else(|| text.strip_prefix('$'))
        .ok_or_else(|| format!("expected a register, got '{text}'"))?;
    let index: u32 = digits
        .parse()
        .map_err(|_| format!("expected a register, got '{text}'"))?;
    if index < 32 {
        Ok(index)
    } else {
        Err(format!("register {index} is out of range"))
    }
}

fn number(text: &str) -> Result<i64, String> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.len() > 8 {
            return Err(format!("value '{text}' is out of range"));
        }
        u32::from_str_radix(hex, 16)
            .map(i64::from)
            .map_err(|_| format!("invalid number '{text}'"))
    } else {
        text.parse::<i64>()
            .map_err(|_| format!("invalid number '{text}'"))
    }
}

fn imm16(text: &str) -> Result<u32, String> {
    let value = number(text)?;
    if (-0x8000..=0xffff).contains(&value) {
        Ok(truncate(value, 0xffff))
    } else {
        Err(format!("immediate '{text}' does not fit in 16 bits"))
    }
}

fn shift_amount(text: &str) -> Result<u32, String> {
    let value = number(text)?;
    if (0..=31).contains(&value) {
        Ok(truncate(value, 0x1f))
    } else {
        Err(format!("shift amount '{text}' must be 0..=31"))
    }
}

/// `offset(base)` addressing, the offset defaulting to zero.
fn mem_operand(text: &str) -> Result<(u32, u32), String> {
    let malformed = || format!("expected 'offset(base)', got '{text}'");
    let open = text.find('(').ok_or_else(malformed)?;
    let inner = text
        .get(open + 1..)
        .and_then(|tail| tail.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let offset_text = text[..open].trim();
    let offset = if offset_text.is_empty() {
        0
    } else {
        imm16(offset_text)?
    };
    Ok((offset, register(inner.trim())?))
}

/// Branch field: a label resolves relative to the following instruction,
/// a bare number is used as the offset directly.
fn branch_offset(text: &str, pc: u32, symbols: &HashMap<String, u32>) -> Result<u32, String> {
    let offset: i64 = match symbols.get(text) {
        Some(&address) => i64::from(address) - (i64::from(pc) + 1),
        None if is_label(text) => return Err(format!("undefined label '{text}'")),
        None => number(text)?,
    };
    if (-0x8000..=0x7fff).contains(&offset) {
        Ok(truncate(offset, 0xffff))
    } else {
        Err(format!("branch to '{text}' is out of range"))
    }
}

fn jump_target(text: &str, symbols: &HashMap<String, u32>) -> Result<u32, String> {
    let target: i64 = match symbols.get(text) {
        Some(&address) => i64::from(address),
        None if is_label(text) => return Err(format!("undefined label '{text}'")),
        None => number(text)?,
    };
    if (0..=0x03ff_ffff).contains(&target) {
        Ok(truncate(target, 0x03ff_ffff))
    } else {
        Err(format!("jump target '{text}' is out of range"))
    }
}
