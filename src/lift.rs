//! Lifts decoded instructions into [`IlOp`] lists.
//!
//! Rules are chosen by mnemonic with `/` and `.` folded to `_`. A mnemonic
//! without a rule lifts to a single [`IlOp::Unimplemented`]. Operand shapes
//! that do not fit a rule are table bugs and panic.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::decoder::{sign_extend, DecodedInstruction, OperandValue};
use crate::instructions::OperandKind;
use crate::il::{Cond, Expr, IlBuilder, IlOp, Label};

/// Register width in bytes.
pub const RSIZE: u8 = 4;
/// The single condition flag.
pub const T: &str = "t";

/// Tells the lifter whether a branch target already has a label in the
/// function being lifted.
pub trait LabelResolver {
    fn has_label(&self, addr: u32) -> bool;
}

/// Knows no labels; every conditional branch takes the indirect fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLabels;

impl LabelResolver for NoLabels {
    fn has_label(&self, _addr: u32) -> bool {
        false
    }
}

impl LabelResolver for HashSet<u32> {
    fn has_label(&self, addr: u32) -> bool {
        self.contains(&addr)
    }
}

impl LabelResolver for BTreeSet<u32> {
    fn has_label(&self, addr: u32) -> bool {
        self.contains(&addr)
    }
}

pub fn lift(d: &DecodedInstruction) -> Vec<IlOp> {
    lift_with(d, &NoLabels)
}

pub fn lift_with(d: &DecodedInstruction, labels: &dyn LabelResolver) -> Vec<IlOp> {
    let key = d.def.dispatch_key();
    let Some(rule) = rule_for(&key) else {
        debug!(mnemonic = d.mnemonic(), addr = d.addr, "no lift rule");
        return vec![IlOp::Unimplemented];
    };
    let mut cx = Lift { d, labels, key: &key, il: IlBuilder::new() };
    rule(&mut cx);
    cx.il.finish()
}

type Rule = fn(&mut Lift<'_, '_>);

fn rule_for(key: &str) -> Option<Rule> {
    let rule: Rule = match key {
        "mov" => lift_mov,
        "mov_b" | "mov_w" | "mov_l" | "movu_b" | "movu_w" | "fmov_s" => lift_mov_mem,
        "lds_l" | "sts_l" | "ldc_l" | "stc_l" => lift_mov_mem,
        "movi20" => lift_movi20,
        "movi20s" => lift_movi20s,
        "mova" => lift_mova,
        "movt" => lift_movt,
        "add" => lift_add,
        "sub" => lift_sub,
        "and" | "or" | "xor" => lift_logic,
        "not" | "neg" => lift_unary,
        "exts_b" | "exts_w" | "extu_b" | "extu_w" => lift_extend,
        "shll" | "shal" | "shlr" | "shar" => lift_shift1,
        "shll2" | "shll8" | "shll16" | "shlr2" | "shlr8" | "shlr16" => lift_shift_n,
        "dt" => lift_dt,
        "clrt" | "sett" => lift_set_t,
        "cmp_eq" | "cmp_hs" | "cmp_ge" | "cmp_hi" | "cmp_gt" => lift_cmp,
        "cmp_pz" | "cmp_pl" => lift_cmp_zero,
        "tst" => lift_tst,
        "bf" | "bf_s" | "bt" | "bt_s" => lift_cond_branch,
        "bra" | "bsr" => lift_branch,
        "braf" | "bsrf" => lift_branch_far,
        "jmp" => lift_jmp,
        "jsr" | "jsr_n" => lift_jsr,
        "rts" | "rts_n" => lift_rts,
        "lds" | "sts" | "ldc" | "stc" => lift_transfer,
        "nop" => lift_nop,
        _ => return None,
    };
    Some(rule)
}

/// Builds the IL expression for operand `index`.
///
/// `PC` reads as the instruction address. A paired displacement folds in its
/// partner: a PC partner gives the absolute constant
/// `(addr, longword aligned for 4-byte accesses) + 4 + (disp << width/2)`,
/// any other partner gives `disp + partner` with the displacement unscaled.
/// A paired register adds its partner register.
pub fn resolve_operand(d: &DecodedInstruction, index: usize, sign_ext: bool) -> Expr {
    let op = &d.operands[index];
    let expr = match &op.value {
        OperandValue::Register(name) if name == "PC" => Expr::constant(RSIZE, d.addr),
        OperandValue::Register(name) if op.desc.is_pair => {
            let partner = partner_register(d, index);
            Expr::add(RSIZE, Expr::reg(RSIZE, name.as_str()), Expr::reg(RSIZE, partner))
        }
        OperandValue::Register(name) => Expr::reg(RSIZE, name.as_str()),
        OperandValue::Displacement(disp) if op.desc.is_pair => match partner_register(d, index) {
            "PC" => {
                let base = if d.def.width == 4 { d.addr & !3 } else { d.addr };
                let scaled = disp << u32::from(d.def.width / 2);
                Expr::constant(RSIZE, base.wrapping_add(4).wrapping_add(scaled))
            }
            partner => Expr::add(RSIZE, Expr::constant(op.desc.size, *disp), Expr::reg(RSIZE, partner)),
        },
        OperandValue::Immediate(v) | OperandValue::Displacement(v) => {
            assert!(op.desc.size != 0, "{} at {:#x}: constant operand without a size", d.def.syntax, d.addr);
            Expr::constant(op.desc.size, *v)
        }
        OperandValue::Unresolved(text) => {
            panic!("{} at {:#x}: operand `{text}` cannot be lifted", d.def.syntax, d.addr)
        }
    };
    if sign_ext {
        Expr::sign_extend(RSIZE, expr)
    } else {
        expr
    }
}

fn partner_register<'d>(d: &'d DecodedInstruction, index: usize) -> &'d str {
    d.operands[index]
        .desc
        .partner
        .and_then(|p| d.operands[p].register())
        .unwrap_or_else(|| panic!("{} at {:#x}: operand {index} has no partner register", d.def.syntax, d.addr))
}

struct Lift<'a, 't> {
    d: &'a DecodedInstruction<'t>,
    labels: &'a dyn LabelResolver,
    key: &'a str,
    il: IlBuilder,
}

impl Lift<'_, '_> {
    fn expect_operands(&self, n: usize) {
        assert_eq!(
            self.d.operands.len(),
            n,
            "{} at {:#x}: expected {n} operands",
            self.d.def.syntax,
            self.d.addr
        );
    }

    fn operand(&self, index: usize, sign_ext: bool) -> Expr {
        resolve_operand(self.d, index, sign_ext)
    }

    fn is_immediate(&self, index: usize) -> bool {
        matches!(self.d.operands[index].value, OperandValue::Immediate(_))
    }

    /// Logical immediates are unsigned.
    fn unsigned_operand(&self, index: usize) -> Expr {
        let value = self.operand(index, false);
        if self.is_immediate(index) {
            Expr::zero_extend(RSIZE, value)
        } else {
            value
        }
    }

    fn reg_name(&self, index: usize) -> String {
        match self.d.operands[index].register() {
            Some(name) => name.to_string(),
            None => panic!("{} at {:#x}: operand {index} is not a register", self.d.def.syntax, self.d.addr),
        }
    }

    fn reg(&self, index: usize) -> Expr {
        Expr::reg(RSIZE, self.reg_name(index))
    }

    fn imm(&self, index: usize) -> u32 {
        match self.d.operands[index].value {
            OperandValue::Immediate(v) => v,
            _ => panic!("{} at {:#x}: operand {index} is not an immediate", self.d.def.syntax, self.d.addr),
        }
    }

    fn disp(&self, index: usize) -> u32 {
        match self.d.operands[index].value {
            OperandValue::Displacement(v) => v,
            _ => panic!("{} at {:#x}: operand {index} is not a displacement", self.d.def.syntax, self.d.addr),
        }
    }

    fn target(&self) -> u32 {
        match self.d.target() {
            Some(t) => t,
            None => panic!("{} at {:#x}: branch without a label operand", self.d.def.syntax, self.d.addr),
        }
    }

    /// Appends `base = base + reg_delta` for an auto-indexed operand.
    fn update_base(&mut self, index: usize) {
        let delta = self.d.operands[index].desc.reg_delta;
        if delta == 0 {
            return;
        }
        let base = self.reg_name(index);
        let value = Expr::add(RSIZE, Expr::reg(RSIZE, base.as_str()), Expr::constant(RSIZE, i32::from(delta) as u32));
        self.il.set_reg(RSIZE, base, value);
    }
}

fn lift_mov(cx: &mut Lift) {
    cx.expect_operands(2);
    let value = cx.operand(0, cx.is_immediate(0));
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

/// Loads, stores and the auto-indexed system register transfers.
fn lift_mov_mem(cx: &mut Lift) {
    let d = cx.d;
    let ops = &d.operands;
    assert!(ops.len() > 1, "{} at {:#x}: expected two operands", d.def.syntax, d.addr);
    let src = 0;
    let dst = if ops[src].desc.is_pair { 2 } else { 1 };
    let width = d.def.width;

    if ops[src].desc.is_ref {
        let loaded = Expr::load(width, cx.operand(src, false));
        let value = if width >= RSIZE {
            loaded
        } else if cx.key.starts_with("movu") {
            Expr::zero_extend(RSIZE, loaded)
        } else {
            Expr::sign_extend(RSIZE, loaded)
        };
        cx.il.set_reg(RSIZE, cx.reg_name(dst), value);
        // derived register-to-register entries carry no update of their own
        let plain = |i: usize| ops[i].desc.kind == OperandKind::Register && !ops[i].desc.is_ref;
        if !(plain(src) && plain(dst) && ops[src].desc.reg_delta > 0) {
            cx.update_base(src);
        }
    } else if ops[dst].desc.is_ref {
        let addr = cx.operand(dst, false);
        let value = cx.operand(src, false);
        cx.il.push(IlOp::Store { size: width, addr, value });
        cx.update_base(dst);
    } else {
        panic!("{} at {:#x}: neither operand references memory", d.def.syntax, d.addr);
    }
}

fn sign_extend_20(imm: u32) -> u32 {
    sign_extend(imm & 0xF_FFFF, 20)
}

fn lift_movi20(cx: &mut Lift) {
    cx.expect_operands(2);
    let value = Expr::constant(RSIZE, sign_extend_20(cx.imm(0)));
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

fn lift_movi20s(cx: &mut Lift) {
    cx.expect_operands(2);
    let size = cx.d.operands[0].desc.size;
    let shifted = Expr::shl(size, Expr::constant(size, cx.imm(0)), Expr::constant(1, 8));
    cx.il.set_reg(RSIZE, cx.reg_name(1), Expr::sign_extend(RSIZE, shifted));
}

fn lift_mova(cx: &mut Lift) {
    cx.expect_operands(3);
    let addr = (cx.d.addr & !3).wrapping_add(4).wrapping_add(cx.disp(0) << 2);
    cx.il.set_reg(RSIZE, cx.reg_name(2), Expr::constant(RSIZE, addr));
}

fn lift_movt(cx: &mut Lift) {
    cx.expect_operands(1);
    cx.il.set_reg(RSIZE, cx.reg_name(0), Expr::zero_extend(RSIZE, Expr::flag(T)));
}

fn lift_add(cx: &mut Lift) {
    cx.expect_operands(2);
    let value = Expr::add(RSIZE, cx.operand(0, cx.is_immediate(0)), cx.reg(1));
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

fn lift_sub(cx: &mut Lift) {
    cx.expect_operands(2);
    let value = Expr::sub(RSIZE, cx.reg(1), cx.reg(0));
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

fn lift_logic(cx: &mut Lift) {
    cx.expect_operands(2);
    let (lhs, rhs) = (cx.reg(1), cx.unsigned_operand(0));
    let value = match cx.key {
        "and" => Expr::and(RSIZE, lhs, rhs),
        "or" => Expr::or(RSIZE, lhs, rhs),
        _ => Expr::xor(RSIZE, lhs, rhs),
    };
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

fn lift_unary(cx: &mut Lift) {
    cx.expect_operands(2);
    let value = if cx.key == "not" { Expr::not(RSIZE, cx.reg(0)) } else { Expr::neg(RSIZE, cx.reg(0)) };
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

fn lift_extend(cx: &mut Lift) {
    cx.expect_operands(2);
    let low = Expr::low_part(cx.d.def.width, cx.reg(0));
    let value = if cx.key.starts_with("exts") {
        Expr::sign_extend(RSIZE, low)
    } else {
        Expr::zero_extend(RSIZE, low)
    };
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

/// Single-bit shifts; the bit shifted out lands in T.
fn lift_shift1(cx: &mut Lift) {
    cx.expect_operands(1);
    let one = || Expr::constant(1, 1);
    let (out, value) = match cx.key {
        "shll" | "shal" => (
            Expr::lsr(RSIZE, cx.reg(0), Expr::constant(1, 31)),
            Expr::shl(RSIZE, cx.reg(0), one()),
        ),
        "shlr" => (Expr::and(RSIZE, cx.reg(0), Expr::constant(RSIZE, 1)), Expr::lsr(RSIZE, cx.reg(0), one())),
        _ => (Expr::and(RSIZE, cx.reg(0), Expr::constant(RSIZE, 1)), Expr::asr(RSIZE, cx.reg(0), one())),
    };
    cx.il.set_flag(T, out);
    cx.il.set_reg(RSIZE, cx.reg_name(0), value);
}

fn lift_shift_n(cx: &mut Lift) {
    cx.expect_operands(1);
    let (left, amount) = match cx.key {
        "shll2" => (true, 2),
        "shll8" => (true, 8),
        "shll16" => (true, 16),
        "shlr2" => (false, 2),
        "shlr8" => (false, 8),
        _ => (false, 16),
    };
    let amount = Expr::constant(1, amount);
    let value = if left { Expr::shl(RSIZE, cx.reg(0), amount) } else { Expr::lsr(RSIZE, cx.reg(0), amount) };
    cx.il.set_reg(RSIZE, cx.reg_name(0), value);
}

fn lift_dt(cx: &mut Lift) {
    cx.expect_operands(1);
    cx.il.set_reg(RSIZE, cx.reg_name(0), Expr::sub(RSIZE, cx.reg(0), Expr::constant(RSIZE, 1)));
    let cond = Expr::compare(Cond::Eq, RSIZE, cx.reg(0), Expr::constant(RSIZE, 0));
    cx.il.set_flag_if(T, cond);
}

fn lift_set_t(cx: &mut Lift) {
    let value = if cx.key == "sett" { 1 } else { 0 };
    cx.il.set_flag(T, Expr::constant(0, value));
}

fn lift_cmp(cx: &mut Lift) {
    cx.expect_operands(2);
    let cond = match cx.key {
        "cmp_eq" => Cond::Eq,
        "cmp_hs" => Cond::Uge,
        "cmp_ge" => Cond::Sge,
        "cmp_hi" => Cond::Ugt,
        _ => Cond::Sgt,
    };
    let cmp = Expr::compare(cond, RSIZE, cx.operand(1, false), cx.operand(0, cx.is_immediate(0)));
    cx.il.set_flag_if(T, cmp);
}

fn lift_cmp_zero(cx: &mut Lift) {
    cx.expect_operands(1);
    let cond = if cx.key == "cmp_pz" { Cond::Sge } else { Cond::Sgt };
    let cmp = Expr::compare(cond, RSIZE, cx.reg(0), Expr::constant(RSIZE, 0));
    cx.il.set_flag_if(T, cmp);
}

fn lift_tst(cx: &mut Lift) {
    cx.expect_operands(2);
    let masked = Expr::and(RSIZE, cx.unsigned_operand(0), cx.operand(1, false));
    let cmp = Expr::compare(Cond::Eq, RSIZE, masked, Expr::constant(RSIZE, 0));
    cx.il.set_flag_if(T, cmp);
}

/// `bt`/`bf` and their delayed forms. A target with a known label is branched
/// to directly, otherwise through a local label and an explicit jump.
fn lift_cond_branch(cx: &mut Lift) {
    let target = cx.target();
    let cond = if cx.key.starts_with("bt") {
        Expr::flag(T)
    } else {
        Expr::compare(Cond::Eq, 0, Expr::flag(T), Expr::constant(0, 0))
    };
    let fallthrough = cx.il.new_label();
    if cx.labels.has_label(target) {
        cx.il.push(IlOp::If { cond, on_true: Label::Address(target), on_false: fallthrough });
    } else {
        let taken = cx.il.new_label();
        cx.il.push(IlOp::If { cond, on_true: taken, on_false: fallthrough });
        cx.il.mark(taken);
        cx.il.push(IlOp::Jump(Expr::constant(RSIZE, target)));
    }
    cx.il.mark(fallthrough);
}

fn lift_branch(cx: &mut Lift) {
    let dest = Expr::constant(RSIZE, cx.target());
    cx.il.push(if cx.key == "bsr" { IlOp::Call(dest) } else { IlOp::Jump(dest) });
}

fn lift_branch_far(cx: &mut Lift) {
    cx.expect_operands(1);
    let dest = Expr::add(RSIZE, Expr::constant(RSIZE, cx.d.addr.wrapping_add(4)), cx.reg(0));
    cx.il.push(if cx.key == "bsrf" { IlOp::Call(dest) } else { IlOp::Jump(dest) });
}

fn lift_jmp(cx: &mut Lift) {
    cx.expect_operands(1);
    let dest = cx.operand(0, false);
    cx.il.push(IlOp::Jump(dest));
}

fn lift_jsr(cx: &mut Lift) {
    let dest = if cx.d.operands[0].desc.is_pair {
        // @@(disp8,TBR): call through the function table entry
        cx.expect_operands(2);
        let entry = Expr::add(RSIZE, Expr::reg(RSIZE, cx.reg_name(1)), Expr::constant(RSIZE, cx.disp(0) << 2));
        Expr::load(RSIZE, entry)
    } else {
        cx.expect_operands(1);
        cx.operand(0, false)
    };
    cx.il.push(IlOp::Call(dest));
}

fn lift_rts(cx: &mut Lift) {
    cx.il.push(IlOp::Ret(Expr::reg(RSIZE, "PR")));
}

/// Register to register moves between general and system/control registers.
fn lift_transfer(cx: &mut Lift) {
    cx.expect_operands(2);
    let value = cx.reg(0);
    cx.il.set_reg(RSIZE, cx.reg_name(1), value);
}

fn lift_nop(cx: &mut Lift) {
    cx.il.push(IlOp::Nop);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    fn lifted(word: u16, addr: u32) -> Vec<IlOp> {
        lift(&decode(&word.to_le_bytes(), addr).unwrap())
    }

    #[test]
    fn pc_relative_longword_is_aligned() {
        // mov.l @(1,PC),R2 at 0x1002: (0x1000 + 4) + 4
        let ops = lifted(0xd201, 0x1002);
        assert_eq!(
            ops,
            vec![IlOp::SetReg {
                size: 4,
                reg: "R2".into(),
                value: Expr::load(4, Expr::constant(4, 0x1008)),
            }]
        );
    }

    #[test]
    fn pc_relative_word_is_not_aligned() {
        // mov.w @(1,PC),R2 at 0x1002: 0x1002 + 4 + 2
        let ops = lifted(0x9201, 0x1002);
        let IlOp::SetReg { value, .. } = &ops[0] else { panic!("{ops:?}") };
        assert_eq!(*value, Expr::sign_extend(4, Expr::load(2, Expr::constant(4, 0x1008))));
    }

    #[test]
    fn mova_aligns_and_scales() {
        // mova @(3,PC),R0 at 0x2002
        let ops = lifted(0xc703, 0x2002);
        assert_eq!(ops, vec![IlOp::SetReg { size: 4, reg: "R0".into(), value: Expr::constant(4, 0x2010) }]);
    }

    #[test]
    fn logical_immediate_zero_extends() {
        // and #0xff,R0
        let ops = lifted(0xc9ff, 0);
        let value = Expr::and(4, Expr::reg(4, "R0"), Expr::zero_extend(4, Expr::constant(1, 0xff)));
        assert_eq!(ops, vec![IlOp::SetReg { size: 4, reg: "R0".into(), value }]);
    }

    #[test]
    fn unmodelled_mnemonic_is_unimplemented() {
        // div0u
        assert_eq!(lifted(0x0019, 0), vec![IlOp::Unimplemented]);
    }

    #[test]
    #[should_panic(expected = "cannot be lifted")]
    fn unresolved_operands_refuse_to_lift() {
        // fcnvsd FPUL,DR2
        let d = decode(&0xf2adu16.to_le_bytes(), 0).unwrap();
        resolve_operand(&d, 1, false);
    }
}
