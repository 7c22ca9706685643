//! Neutral intermediate language produced by the lifter.
//!
//! Expressions are trees; operations are a flat list in which `If`, `Goto`
//! and `Label` express intra-instruction control flow.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Lsl,
    Lsr,
    Asr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnOp {
    Not,
    Neg,
    SignExtend,
    ZeroExtend,
    /// Truncate to the expression size.
    LowPart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cond {
    Eq,
    Ne,
    /// Unsigned greater or equal.
    Uge,
    Ugt,
    /// Signed greater or equal.
    Sge,
    Sgt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Expr {
    Reg { size: u8, name: String },
    Const { size: u8, value: u32 },
    Flag(String),
    Load { size: u8, addr: Box<Expr> },
    Unary { op: UnOp, size: u8, operand: Box<Expr> },
    Binary { op: BinOp, size: u8, lhs: Box<Expr>, rhs: Box<Expr> },
    Compare { cond: Cond, size: u8, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    pub fn reg(size: u8, name: impl Into<String>) -> Self {
        Expr::Reg { size, name: name.into() }
    }

    /// `value` is truncated to `size` bytes; size 0 leaves it unsized.
    pub fn constant(size: u8, value: u32) -> Self {
        let value = match size {
            1..=3 => value & ((1u32 << (size as u32 * 8)) - 1),
            _ => value,
        };
        Expr::Const { size, value }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Expr::Flag(name.into())
    }

    pub fn load(size: u8, addr: Expr) -> Self {
        Expr::Load { size, addr: Box::new(addr) }
    }

    fn unary(op: UnOp, size: u8, operand: Expr) -> Self {
        Expr::Unary { op, size, operand: Box::new(operand) }
    }

    fn binary(op: BinOp, size: u8, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary { op, size, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn compare(cond: Cond, size: u8, lhs: Expr, rhs: Expr) -> Self {
        Expr::Compare { cond, size, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn add(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Add, size, lhs, rhs)
    }

    pub fn sub(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Sub, size, lhs, rhs)
    }

    pub fn and(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::And, size, lhs, rhs)
    }

    pub fn or(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Or, size, lhs, rhs)
    }

    pub fn xor(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Xor, size, lhs, rhs)
    }

    pub fn shl(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Lsl, size, lhs, rhs)
    }

    pub fn lsr(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Lsr, size, lhs, rhs)
    }

    pub fn asr(size: u8, lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinOp::Asr, size, lhs, rhs)
    }

    pub fn not(size: u8, operand: Expr) -> Self {
        Self::unary(UnOp::Not, size, operand)
    }

    pub fn neg(size: u8, operand: Expr) -> Self {
        Self::unary(UnOp::Neg, size, operand)
    }

    pub fn sign_extend(size: u8, operand: Expr) -> Self {
        Self::unary(UnOp::SignExtend, size, operand)
    }

    pub fn zero_extend(size: u8, operand: Expr) -> Self {
        Self::unary(UnOp::ZeroExtend, size, operand)
    }

    pub fn low_part(size: u8, operand: Expr) -> Self {
        Self::unary(UnOp::LowPart, size, operand)
    }
}

/// Jump target inside the lifted op list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Label {
    /// Local to the current instruction, numbered by the builder.
    Local(u32),
    /// An existing label at a code address in the enclosing function.
    Address(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IlOp {
    SetReg { size: u8, reg: String, value: Expr },
    SetFlag { flag: String, value: Expr },
    Store { size: u8, addr: Expr, value: Expr },
    If { cond: Expr, on_true: Label, on_false: Label },
    Goto(Label),
    Label(Label),
    Jump(Expr),
    Call(Expr),
    Ret(Expr),
    Nop,
    Unimplemented,
}

/// Collects ops for one instruction and hands out local labels.
#[derive(Debug, Default)]
pub struct IlBuilder {
    ops: Vec<IlOp>,
    next_label: u32,
}

impl IlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_label(&mut self) -> Label {
        let l = Label::Local(self.next_label);
        self.next_label += 1;
        l
    }

    pub fn push(&mut self, op: IlOp) {
        self.ops.push(op);
    }

    pub fn mark(&mut self, label: Label) {
        self.ops.push(IlOp::Label(label));
    }

    pub fn set_reg(&mut self, size: u8, reg: impl Into<String>, value: Expr) {
        self.push(IlOp::SetReg { size, reg: reg.into(), value });
    }

    pub fn set_flag(&mut self, flag: &str, value: Expr) {
        self.push(IlOp::SetFlag { flag: flag.to_string(), value });
    }

    /// Sets `flag` to 1 when `cond` holds and to 0 otherwise, as an
    /// if / then / else diamond that rejoins at a fresh label.
    pub fn set_flag_if(&mut self, flag: &str, cond: Expr) {
        let on_true = self.new_label();
        let on_false = self.new_label();
        let done = self.new_label();
        self.push(IlOp::If { cond, on_true, on_false });
        self.mark(on_true);
        self.set_flag(flag, Expr::constant(0, 1));
        self.push(IlOp::Goto(done));
        self.mark(on_false);
        self.set_flag(flag, Expr::constant(0, 0));
        self.mark(done);
    }

    pub fn finish(self) -> Vec<IlOp> {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_truncated_to_size() {
        assert_eq!(Expr::constant(1, 0x1ff), Expr::Const { size: 1, value: 0xff });
        assert_eq!(Expr::constant(4, 0xffff_ffff), Expr::Const { size: 4, value: 0xffff_ffff });
    }

    #[test]
    fn diamond_rejoins() {
        let mut il = IlBuilder::new();
        il.set_flag_if("t", Expr::flag("t"));
        let ops = il.finish();
        assert_eq!(ops.len(), 7);
        let IlOp::If { on_true, on_false, .. } = &ops[0] else { panic!("expected If, got {:?}", ops[0]) };
        assert_eq!(ops[1], IlOp::Label(*on_true));
        assert_eq!(ops[4], IlOp::Label(*on_false));
        let IlOp::Goto(done) = &ops[3] else { panic!("expected Goto") };
        assert_eq!(ops[6], IlOp::Label(*done));
    }
}
