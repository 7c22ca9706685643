//! Architecture description and the byte-level entry points a host calls:
//! instruction info, text and IL for whatever sits at an address.

use serde::{Deserialize, Serialize};

use crate::branch::{classify, ControlFlowInfo};
use crate::decoder::decode;
use crate::disasm::{render, Token};
use crate::il::IlOp;
use crate::instructions::TokenKind;
use crate::lift::{lift_with, LabelResolver};

/// Length reported for bytes that do not decode.
pub const UNKNOWN_LENGTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallingConvention {
    pub name: String,
    pub int_arg_regs: Vec<String>,
    pub int_return_reg: String,
    pub callee_saved_regs: Vec<String>,
}

impl Default for CallingConvention {
    fn default() -> Self {
        Self {
            name: "default".into(),
            int_arg_regs: (4..=7).map(|i| format!("R{i}")).collect(),
            int_return_reg: "R0".into(),
            callee_saved_regs: (8..=15).map(|i| format!("R{i}")).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchInfo {
    pub name: String,
    pub little_endian: bool,
    pub address_size: usize,
    pub default_int_size: usize,
    pub max_instr_length: usize,
    pub instr_alignment: usize,
    pub stack_pointer: String,
    pub link_reg: String,
    pub flags: Vec<String>,
    pub calling_convention: CallingConvention,
}

impl Default for ArchInfo {
    fn default() -> Self {
        Self {
            name: "superh".into(),
            little_endian: true,
            address_size: 4,
            default_int_size: 2,
            max_instr_length: 4,
            instr_alignment: 2,
            stack_pointer: "R15".into(),
            link_reg: "PR".into(),
            flags: vec![crate::lift::T.into()],
            calling_convention: CallingConvention::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegisterClass {
    General,
    Control,
    System,
}

pub const CONTROL_REGISTERS: &[&str] = &["SR", "GBR", "VBR", "TBR", "SSR", "SPC", "SGR", "DBR", "MOD", "RE", "RS"];

pub const SYSTEM_REGISTERS: &[&str] = &["MACH", "MACL", "PR", "PC", "FPSCR", "FPUL", "DSR"];

pub const DSP_REGISTERS: &[&str] = &["A0", "A1", "M0", "M1", "X0", "X1", "Y0", "Y1"];

/// Every register name the decoder can produce, general registers first.
pub fn registers() -> Vec<(String, RegisterClass)> {
    let mut regs = Vec::with_capacity(96);
    let general = (0..16)
        .map(|i| format!("R{i}"))
        .chain((0..8).map(|i| format!("R{i}_BANK")))
        .chain((0..16).map(|i| format!("FR{i}")))
        .chain((0..16).map(|i| format!("XF{i}")))
        .chain(DSP_REGISTERS.iter().map(|r| r.to_string()));
    regs.extend(general.map(|r| (r, RegisterClass::General)));
    regs.extend(CONTROL_REGISTERS.iter().map(|r| (r.to_string(), RegisterClass::Control)));
    regs.extend(SYSTEM_REGISTERS.iter().map(|r| (r.to_string(), RegisterClass::System)));
    regs
}

pub fn register_class(name: &str) -> Option<RegisterClass> {
    registers().into_iter().find(|(r, _)| r == name).map(|(_, class)| class)
}

/// Length, edges and delay flag for the instruction at `addr`.
pub fn instruction_info(bytes: &[u8], addr: u32) -> ControlFlowInfo {
    match decode(bytes, addr) {
        Some(d) => classify(&d),
        None => ControlFlowInfo { length: UNKNOWN_LENGTH, ..Default::default() },
    }
}

pub fn instruction_text(bytes: &[u8], addr: u32) -> (Vec<Token>, usize) {
    match decode(bytes, addr) {
        Some(d) => (render(&d).0, d.length()),
        None => (vec![Token::new(TokenKind::Text, "<unknown>")], UNKNOWN_LENGTH),
    }
}

pub fn instruction_il(bytes: &[u8], addr: u32, labels: &dyn LabelResolver) -> (Vec<IlOp>, usize) {
    match decode(bytes, addr) {
        Some(d) => (lift_with(&d, labels), d.length()),
        None => (vec![IlOp::Unimplemented], UNKNOWN_LENGTH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lift::NoLabels;

    #[test]
    fn arch_defaults() {
        let info = ArchInfo::default();
        assert_eq!(info.name, "superh");
        assert_eq!(info.stack_pointer, "R15");
        assert_eq!(info.calling_convention.int_arg_regs, ["R4", "R5", "R6", "R7"]);
        assert_eq!(info.calling_convention.callee_saved_regs.len(), 8);
    }

    #[test]
    fn register_catalog_is_unique() {
        let regs = registers();
        let mut names: Vec<&str> = regs.iter().map(|(r, _)| r.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), regs.len());
        assert_eq!(register_class("R3_BANK"), Some(RegisterClass::General));
        assert_eq!(register_class("GBR"), Some(RegisterClass::Control));
        assert_eq!(register_class("FPUL"), Some(RegisterClass::System));
        assert_eq!(register_class("R16"), None);
    }

    #[test]
    fn unknown_bytes_fall_back() {
        // 0xfffd is an unused FPU slot
        let bytes = [0xfd, 0xff];
        assert_eq!(instruction_info(&bytes, 0).length, 2);
        let (tokens, len) = instruction_text(&bytes, 0);
        assert_eq!(len, 2);
        assert_eq!(tokens, vec![Token::new(TokenKind::Text, "<unknown>")]);
        assert_eq!(instruction_il(&bytes, 0, &NoLabels), (vec![IlOp::Unimplemented], 2));
    }
}
