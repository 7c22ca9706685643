use serde::Serialize;
use tracing::trace;

use crate::instructions::{Field, OpcodeDef, OperandDescriptor, OperandKind};

/// Field values pulled out of the instruction word. Absent when the matched
/// entry does not encode the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Fields {
    pub n: Option<u32>,
    pub m: Option<u32>,
    pub imm: Option<u32>,
    /// Raw displacement, or the absolute target for label operands.
    pub disp: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OperandValue {
    Register(String),
    Immediate(u32),
    Displacement(u32),
    /// Display text of an operand the lifter does not model.
    Unresolved(String),
}

/// An operand descriptor paired with its value for one decoded word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand<'t> {
    pub desc: &'t OperandDescriptor,
    pub value: OperandValue,
}

impl Operand<'_> {
    pub fn register(&self) -> Option<&str> {
        match &self.value {
            OperandValue::Register(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedInstruction<'t> {
    pub def: &'t OpcodeDef,
    pub raw: u32,
    pub addr: u32,
    pub fields: Fields,
    pub operands: Vec<Operand<'t>>,
}

pub trait Decoder {
    fn decode(&self, bytes: &[u8], addr: u32) -> Option<DecodedInstruction<'_>>;
}

/// First-match decoder over any compiled table.
#[derive(Debug, Clone, Copy)]
pub struct TableDecoder<'t> {
    table: &'t [OpcodeDef],
}

impl<'t> TableDecoder<'t> {
    pub fn new(table: &'t [OpcodeDef]) -> Self {
        Self { table }
    }

    /// 32-bit entries are only tried when four bytes are available; fewer
    /// than two bytes never decode.
    pub fn decode(&self, bytes: &[u8], addr: u32) -> Option<DecodedInstruction<'t>> {
        let [lo, hi, ..] = bytes else {
            return None;
        };
        let word16 = u16::from_le_bytes([*lo, *hi]) as u32;
        let word32 = match bytes {
            [a, b, c, d, ..] => Some(u32::from_le_bytes([*a, *b, *c, *d])),
            _ => None,
        };
        for def in self.table {
            let word = match (def.size, word32) {
                (2, _) => word16,
                (4, Some(w)) => w,
                _ => continue,
            };
            if def.matches(word) {
                return Some(DecodedInstruction::resolve(def, word, addr));
            }
        }
        trace!("no opcode matched {word16:#06x} at {addr:#010x}");
        None
    }
}

impl<'t> Decoder for TableDecoder<'t> {
    fn decode(&self, bytes: &[u8], addr: u32) -> Option<DecodedInstruction<'_>> {
        TableDecoder::decode(self, bytes, addr)
    }
}

#[inline]
pub(crate) fn sign_extend(v: u32, bits: u32) -> u32 {
    let s = 32 - bits;
    ((v << s) as i32 >> s) as u32
}

/// Substitutes `{n}`, `{m}`, `{imm}` and `{disp}` in a template. Registers
/// print in decimal, constants as lowercase `0x` hex. `{m4}` is the m field
/// times four, the register number of a vector operand.
pub(crate) fn substitute(template: &str, fields: &Fields) -> String {
    let mut out = String::with_capacity(template.len() + 4);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &rest[open + 1..open + close];
        match key {
            "n" => out.push_str(&fields.n.unwrap_or_default().to_string()),
            "m" => out.push_str(&fields.m.unwrap_or_default().to_string()),
            "m4" => out.push_str(&(fields.m.unwrap_or_default() * 4).to_string()),
            "imm" => out.push_str(&format!("{:#x}", fields.imm.unwrap_or_default())),
            "disp" => out.push_str(&format!("{:#x}", fields.disp.unwrap_or_default())),
            _ => out.push_str(&rest[open..=open + close]),
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out
}

impl<'t> DecodedInstruction<'t> {
    /// Extracts fields and resolves operands for `word`, which must match `def`.
    pub fn resolve(def: &'t OpcodeDef, word: u32, addr: u32) -> Self {
        let pick = |f: Field| f.is_present().then(|| f.extract(word));
        let mut fields = Fields { n: pick(def.n), m: pick(def.m), imm: pick(def.imm), disp: pick(def.disp) };
        if def.is_label() {
            // the raw field is taken as unsigned: target = addr + 4 + raw * 2
            fields.disp = fields.disp.map(|raw| addr.wrapping_add(4).wrapping_add(raw.wrapping_mul(2)));
        }

        let operands = def
            .operands
            .iter()
            .map(|desc| {
                let value = match desc.kind {
                    OperandKind::Register => OperandValue::Register(substitute(desc.template, &fields)),
                    OperandKind::Immediate => OperandValue::Immediate(fields.imm.unwrap_or_default()),
                    OperandKind::Displacement => OperandValue::Displacement(fields.disp.unwrap_or_default()),
                    OperandKind::Unresolved => OperandValue::Unresolved(substitute(desc.template, &fields)),
                };
                Operand { desc, value }
            })
            .collect();

        Self { def, raw: word, addr, fields, operands }
    }

    pub fn mnemonic(&self) -> &'t str {
        self.def.mnemonic
    }

    /// Encoded length in bytes.
    pub fn length(&self) -> usize {
        self.def.size as usize
    }

    /// Absolute branch target for label-carrying instructions.
    pub fn target(&self) -> Option<u32> {
        if self.def.is_label() {
            self.fields.disp
        } else {
            None
        }
    }
}

/// Decodes one instruction with the built-in SuperH table.
pub fn decode(bytes: &[u8], addr: u32) -> Option<DecodedInstruction<'static>> {
    crate::isa::superh::ShDecoder::new().decode(bytes, addr)
}
