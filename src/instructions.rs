//! Opcode table schema.
//!
//! Each table row is written the way the SuperH manuals print it: the
//! assembler syntax (`mov.l @(disp,Rm),Rn`) and the 16- or 32-character bit
//! pattern (`0101nnnnmmmmdddd`). [`OpcodeDef::compile`] turns a row into the
//! match pattern, field extractors, operand descriptors and render tokens the
//! decoder and its consumers work from.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandKind {
    Register,
    Immediate,
    Displacement,
    /// Wide or paired register forms (`DRn`, `FVn`, `XMTRX`, ...). Rendered for
    /// display only, never lifted.
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Instruction,
    Text,
    Register,
    Integer,
    PossibleAddress,
    OperandSeparator,
}

/// A source row of the opcode table.
#[derive(Debug, Clone, Copy)]
pub struct Row {
    pub syntax: &'static str,
    pub bits: &'static str,
    pub delay: bool,
}

/// Extraction rule for one encoded field: `(word & mask) >> shift`.
///
/// `shift` is aligned down to the nibble holding the field's lowest bit, so a
/// `nnn0` register field yields even register numbers directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Field {
    pub mask: u32,
    pub shift: u32,
}

impl Field {
    pub const NONE: Field = Field { mask: 0, shift: 0 };

    fn from_mask(mask: u32) -> Self {
        if mask == 0 {
            return Self::NONE;
        }
        Self { mask, shift: mask.trailing_zeros() & !3 }
    }

    pub fn is_present(&self) -> bool {
        self.mask != 0
    }

    pub fn extract(&self, word: u32) -> u32 {
        let first = self.mask & 0xFFFF;
        let second = self.mask >> 16;
        if first != 0 && second != 0 {
            // Split across both halfwords of a 32-bit instruction; the first
            // halfword carries the high-order part.
            let hi = (word & first) >> first.trailing_zeros();
            let lo = ((word >> 16) & second) >> second.trailing_zeros();
            return (hi << second.count_ones()) | lo;
        }
        (word & self.mask) >> self.shift
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OpcodeFlags: u8 {
        /// Displacement is a PC-relative branch target.
        const LABEL = 1 << 0;
        /// Delayed branch: the next instruction executes before the transfer.
        const DELAY = 1 << 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperandDescriptor {
    pub kind: OperandKind,
    /// Register name or display template, may embed `{n}` / `{m}`.
    pub template: &'static str,
    pub is_ref: bool,
    /// First half of an `@(a,b)` pair; `partner` indexes the second half.
    pub is_pair: bool,
    pub partner: Option<usize>,
    /// Post-increment (positive) or pre-decrement (negative) of the base register.
    pub reg_delta: i8,
    /// Byte width of an immediate or displacement constant.
    pub size: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderToken {
    pub kind: TokenKind,
    pub text: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpcodeDef {
    pub mnemonic: &'static str,
    pub syntax: &'static str,
    pub pattern: u32,
    pub mask: u32,
    pub n: Field,
    pub m: Field,
    pub imm: Field,
    pub disp: Field,
    /// Encoded size in bytes, 2 or 4.
    pub size: u8,
    /// Data width in bytes implied by the mnemonic suffix, 0 when there is none.
    pub width: u8,
    pub flags: OpcodeFlags,
    pub operands: Vec<OperandDescriptor>,
    pub tokens: Vec<RenderToken>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("`{syntax}`: bit pattern has {len} significant characters, expected 16 or 32")]
    PatternLength { syntax: &'static str, len: usize },
    #[error("`{syntax}`: unexpected pattern character {ch:?}")]
    PatternChar { syntax: &'static str, ch: char },
    #[error("`{syntax}`: pattern {pattern:#x} has bits outside mask {mask:#x}")]
    PatternOutsideMask { syntax: &'static str, pattern: u32, mask: u32 },
    #[error("`{syntax}`: bits {bits:#x} are neither fixed nor owned by a field")]
    UncoveredBits { syntax: &'static str, bits: u32 },
    #[error("`{syntax}`: operand `{operand}` needs the `{field}` field, which the pattern does not encode")]
    MissingField { syntax: &'static str, operand: &'static str, field: &'static str },
    #[error("`{syntax}`: auto-indexed operand `{operand}` used without a data width")]
    MissingWidth { syntax: &'static str, operand: &'static str },
    #[error("`{syntax}`: paired operand `{operand}` has no register partner")]
    DanglingPair { syntax: &'static str, operand: &'static str },
}

/// Register names that appear literally in the syntax column.
const FIXED_REGISTERS: &[&str] = &[
    "R0", "R15", "FR0", "GBR", "TBR", "SR", "VBR", "MOD", "RE", "RS", "SGR", "SSR", "SPC", "DBR",
    "MACH", "MACL", "PR", "DSR", "A0", "X0", "X1", "Y0", "Y1", "PC", "FPSCR", "FPUL",
];

fn mnemonic_width(mnemonic: &str) -> u8 {
    match mnemonic {
        "fmov.s" => 4,
        "fmov.d" => 8,
        m if m.ends_with(".b") => 1,
        m if m.ends_with(".w") => 2,
        m if m.ends_with(".l") => 4,
        _ => 0,
    }
}

struct Pattern {
    pattern: u32,
    mask: u32,
    n: u32,
    m: u32,
    imm: u32,
    disp: u32,
    size: u8,
}

fn parse_bits(row: &Row) -> Result<Pattern, TableError> {
    let chars: Vec<char> = row.bits.chars().filter(|c| !c.is_whitespace()).collect();
    let size = match chars.len() {
        16 => 2,
        32 => 4,
        len => return Err(TableError::PatternLength { syntax: row.syntax, len }),
    };
    let mut p = Pattern { pattern: 0, mask: 0, n: 0, m: 0, imm: 0, disp: 0, size };
    for (i, &ch) in chars.iter().enumerate() {
        // The first halfword sits in the low half of the little-endian word.
        let bit = if i < 16 { 1u32 << (15 - i) } else { 1u32 << (47 - i) };
        match ch {
            '0' => p.mask |= bit,
            '1' => {
                p.mask |= bit;
                p.pattern |= bit;
            }
            'n' => p.n |= bit,
            'm' => p.m |= bit,
            'i' => p.imm |= bit,
            'd' => p.disp |= bit,
            _ => return Err(TableError::PatternChar { syntax: row.syntax, ch }),
        }
    }
    Ok(p)
}

/// Splits `mov.b @(R0,Rm),Rn` into the mnemonic and its comma separated pieces.
fn split_syntax(syntax: &'static str) -> (&'static str, Vec<&'static str>) {
    let (mnemonic, rest) = match syntax.split_once(' ') {
        Some((mn, rest)) => (mn, rest.trim()),
        None => (syntax, ""),
    };
    let args = if rest.is_empty() { Vec::new() } else { rest.split(',').collect() };
    (mnemonic, args)
}

impl OpcodeDef {
    pub fn compile(row: &Row) -> Result<Self, TableError> {
        let syntax = row.syntax;
        let bits = parse_bits(row)?;
        let (mnemonic, args) = split_syntax(syntax);
        let width = mnemonic_width(mnemonic);

        let mut flags = OpcodeFlags::empty();
        flags.set(OpcodeFlags::DELAY, row.delay);

        let mut tokens = vec![RenderToken { kind: TokenKind::Instruction, text: mnemonic }];
        if !args.is_empty() {
            tokens.push(RenderToken { kind: TokenKind::Text, text: " " });
        }
        let text = |text| RenderToken { kind: TokenKind::Text, text };

        let mut operands = Vec::with_capacity(args.len());
        for (i, piece) in args.iter().enumerate() {
            let mut arg = *piece;
            let mut is_ref = false;
            let mut is_pair = false;
            let mut reg_delta = 0i8;

            if let Some(rest) = arg.strip_prefix("@(") {
                tokens.push(text("@("));
                arg = rest;
                is_ref = true;
                is_pair = true;
            } else if let Some(rest) = arg.strip_prefix("@@(") {
                tokens.push(text("@@("));
                arg = rest;
                is_ref = true;
                is_pair = true;
            } else if let Some(rest) = arg.strip_prefix("@-") {
                if width == 0 {
                    return Err(TableError::MissingWidth { syntax, operand: piece });
                }
                tokens.push(text("@-"));
                arg = rest;
                is_ref = true;
                reg_delta = -(width as i8);
            } else if let Some(rest) = arg.strip_prefix('@') {
                tokens.push(text("@"));
                arg = rest;
                is_ref = true;
            }

            let mut trailing = Vec::new();
            if is_ref {
                if let Some(rest) = arg.strip_suffix('+') {
                    if width == 0 {
                        return Err(TableError::MissingWidth { syntax, operand: piece });
                    }
                    arg = rest;
                    reg_delta = width as i8;
                    trailing.push(text("+"));
                }
            }
            if let Some(rest) = arg.strip_suffix(')') {
                arg = rest;
                trailing.push(text(")"));
            }

            let need = |field: &'static str, mask: u32| {
                if mask == 0 {
                    Err(TableError::MissingField { syntax, operand: piece, field })
                } else {
                    Ok(())
                }
            };

            let (kind, template, size) = match arg {
                "Rn" => {
                    need("n", bits.n)?;
                    tokens.push(RenderToken { kind: TokenKind::Register, text: "R{n}" });
                    (OperandKind::Register, "R{n}", 0)
                }
                "Rm" => {
                    need("m", bits.m)?;
                    tokens.push(RenderToken { kind: TokenKind::Register, text: "R{m}" });
                    (OperandKind::Register, "R{m}", 0)
                }
                "Rn_BANK" => {
                    need("n", bits.n)?;
                    tokens.push(RenderToken { kind: TokenKind::Register, text: "R{n}_BANK" });
                    (OperandKind::Register, "R{n}_BANK", 0)
                }
                "Rm_BANK" => {
                    need("m", bits.m)?;
                    tokens.push(RenderToken { kind: TokenKind::Register, text: "R{m}_BANK" });
                    (OperandKind::Register, "R{m}_BANK", 0)
                }
                "FRn" => {
                    need("n", bits.n)?;
                    tokens.push(RenderToken { kind: TokenKind::Register, text: "FR{n}" });
                    (OperandKind::Register, "FR{n}", 0)
                }
                "FRm" => {
                    need("m", bits.m)?;
                    tokens.push(RenderToken { kind: TokenKind::Register, text: "FR{m}" });
                    (OperandKind::Register, "FR{m}", 0)
                }
                "DRn" | "XDn" | "FVn" => {
                    need("n", bits.n)?;
                    let template = match arg {
                        "DRn" => "DR{n}",
                        "XDn" => "XD{n}",
                        _ => "FV{n}",
                    };
                    tokens.push(text(template));
                    (OperandKind::Unresolved, template, 0)
                }
                "DRm" | "XDm" | "FVm" => {
                    need("m", bits.m)?;
                    // FVm is encoded as a two-bit vector number, FVn sits at
                    // a nibble shift that already yields multiples of four
                    let template = match arg {
                        "DRm" => "DR{m}",
                        "XDm" => "XD{m}",
                        _ => "FV{m4}",
                    };
                    tokens.push(text(template));
                    (OperandKind::Unresolved, template, 0)
                }
                "disp" | "disp8" | "disp12" | "label" => {
                    need("disp", bits.disp)?;
                    let size = match arg {
                        "disp" if mnemonic == "bra" || mnemonic == "bsr" => 2,
                        "disp" | "disp8" => 1,
                        _ => 2,
                    };
                    if arg == "label" {
                        flags |= OpcodeFlags::LABEL;
                        tokens.push(RenderToken { kind: TokenKind::PossibleAddress, text: "{disp}" });
                    } else {
                        tokens.push(RenderToken { kind: TokenKind::Integer, text: "{disp}" });
                    }
                    (OperandKind::Displacement, "{disp}", size)
                }
                "#imm" | "#imm3" | "#imm20" => {
                    need("imm", bits.imm)?;
                    tokens.push(text("#"));
                    tokens.push(RenderToken { kind: TokenKind::Integer, text: "{imm}" });
                    let size = if arg == "#imm20" { 3 } else { 1 };
                    (OperandKind::Immediate, "{imm}", size)
                }
                reg if FIXED_REGISTERS.contains(&reg) => {
                    tokens.push(RenderToken { kind: TokenKind::Register, text: reg });
                    (OperandKind::Register, reg, 0)
                }
                other => {
                    tokens.push(text(other));
                    (OperandKind::Unresolved, other, 0)
                }
            };

            tokens.extend(trailing);
            if i + 1 < args.len() {
                tokens.push(RenderToken { kind: TokenKind::OperandSeparator, text: "," });
            }

            operands.push(OperandDescriptor {
                kind,
                template,
                is_ref,
                is_pair,
                partner: None,
                reg_delta,
                size,
            });
        }

        for i in 0..operands.len() {
            if !operands[i].is_pair {
                continue;
            }
            match operands.get(i + 1) {
                Some(next) if next.kind == OperandKind::Register => operands[i].partner = Some(i + 1),
                _ => return Err(TableError::DanglingPair { syntax, operand: args[i] }),
            }
        }

        let def = OpcodeDef {
            mnemonic,
            syntax,
            pattern: bits.pattern,
            mask: bits.mask,
            n: Field::from_mask(bits.n),
            m: Field::from_mask(bits.m),
            imm: Field::from_mask(bits.imm),
            disp: Field::from_mask(bits.disp),
            size: bits.size,
            width,
            flags,
            operands,
            tokens,
        };
        def.validate()?;
        Ok(def)
    }

    /// Checks the pattern/mask pair and that every free bit belongs to a field.
    pub fn validate(&self) -> Result<(), TableError> {
        if self.pattern & !self.mask != 0 {
            return Err(TableError::PatternOutsideMask {
                syntax: self.syntax,
                pattern: self.pattern,
                mask: self.mask,
            });
        }
        let full = if self.size == 4 { u32::MAX } else { 0xFFFF };
        let fields = self.n.mask | self.m.mask | self.imm.mask | self.disp.mask;
        let uncovered = full & !(self.mask | fields);
        if uncovered != 0 {
            return Err(TableError::UncoveredBits { syntax: self.syntax, bits: uncovered });
        }
        Ok(())
    }

    pub fn matches(&self, word: u32) -> bool {
        word & self.mask == self.pattern
    }

    pub fn is_label(&self) -> bool {
        self.flags.contains(OpcodeFlags::LABEL)
    }

    pub fn is_delay(&self) -> bool {
        self.flags.contains(OpcodeFlags::DELAY)
    }

    /// Mnemonic with `/` and `.` folded to `_` (`bf/s` -> `bf_s`, `mov.l` -> `mov_l`).
    pub fn dispatch_key(&self) -> String {
        self.mnemonic.replace(['/', '.'], "_")
    }
}

/// Compiles rows in order; the first failing row aborts the build.
pub fn build_table(rows: &[Row]) -> Result<Vec<OpcodeDef>, TableError> {
    rows.iter().map(OpcodeDef::compile).collect()
}
