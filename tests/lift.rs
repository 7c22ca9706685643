use std::collections::HashSet;

use pretty_assertions::assert_eq;

use superh_rs::decoder::decode;
use superh_rs::il::{Cond, Expr, IlOp, Label};
use superh_rs::lift::{lift, lift_with};

fn lifted_at(word: u16, addr: u32) -> Vec<IlOp> {
    lift(&decode(&word.to_le_bytes(), addr).unwrap())
}

fn lifted(word: u16) -> Vec<IlOp> {
    lifted_at(word, 0)
}

fn reg(name: &str) -> Expr {
    Expr::reg(4, name)
}

fn set(name: &str, value: Expr) -> IlOp {
    IlOp::SetReg { size: 4, reg: name.into(), value }
}

#[test]
fn mov_register_is_a_single_set() {
    assert_eq!(lifted(0x6123), vec![set("R1", reg("R2"))]);
}

#[test]
fn mov_immediate_sign_extends() {
    assert_eq!(lifted(0xe1ff), vec![set("R1", Expr::sign_extend(4, Expr::constant(1, 0xff)))]);
}

#[test]
fn post_increment_load_updates_base() {
    // mov.l @R2+,R1
    assert_eq!(
        lifted(0x6126),
        vec![
            set("R1", Expr::load(4, reg("R2"))),
            set("R2", Expr::add(4, reg("R2"), Expr::constant(4, 4))),
        ]
    );
}

#[test]
fn post_increment_into_base_still_updates() {
    // mov.l @R1+,R1
    assert_eq!(
        lifted(0x6116),
        vec![
            set("R1", Expr::load(4, reg("R1"))),
            set("R1", Expr::add(4, reg("R1"), Expr::constant(4, 4))),
        ]
    );
}

#[test]
fn pre_decrement_store() {
    // mov.l R3,@-R15
    assert_eq!(
        lifted(0x2f36),
        vec![
            IlOp::Store { size: 4, addr: reg("R15"), value: reg("R3") },
            set("R15", Expr::add(4, reg("R15"), Expr::constant(4, 0xffff_fffc))),
        ]
    );
}

#[test]
fn indexed_byte_load_sign_extends() {
    // mov.b @(R0,R1),R2
    assert_eq!(
        lifted(0x021c),
        vec![set("R2", Expr::sign_extend(4, Expr::load(1, Expr::add(4, reg("R0"), reg("R1")))))]
    );
}

#[test]
fn register_displacement_is_added_unscaled() {
    // mov.l R3,@(1,R15)
    assert_eq!(
        lifted(0x1f31),
        vec![IlOp::Store { size: 4, addr: Expr::add(4, Expr::constant(1, 1), reg("R15")), value: reg("R3") }]
    );
    // mov.l @(3,R2),R1
    assert_eq!(
        lifted(0x5123),
        vec![set("R1", Expr::load(4, Expr::add(4, Expr::constant(1, 3), reg("R2"))))]
    );
    // mov.b @(0x10,GBR),R0
    assert_eq!(
        lifted(0xc410),
        vec![set("R0", Expr::sign_extend(4, Expr::load(1, Expr::add(4, Expr::constant(1, 0x10), reg("GBR")))))]
    );
}

#[test]
fn system_register_push_and_pop() {
    // sts.l PR,@-R15 ; lds.l @R15+,PR
    assert_eq!(lifted(0x4f22).len(), 2);
    assert_eq!(
        lifted(0x4f26),
        vec![
            set("PR", Expr::load(4, reg("R15"))),
            set("R15", Expr::add(4, reg("R15"), Expr::constant(4, 4))),
        ]
    );
}

#[test]
fn cmp_eq_diamond_converges() {
    // cmp/eq #1,R0
    let ops = lifted(0x8801);
    assert_eq!(ops.len(), 7);
    let IlOp::If { cond, on_true, on_false } = &ops[0] else { panic!("{ops:?}") };
    assert_eq!(
        *cond,
        Expr::compare(Cond::Eq, 4, reg("R0"), Expr::sign_extend(4, Expr::constant(1, 1)))
    );
    assert_eq!(ops[1], IlOp::Label(*on_true));
    assert_eq!(ops[2], IlOp::SetFlag { flag: "t".into(), value: Expr::constant(0, 1) });
    assert_eq!(ops[4], IlOp::Label(*on_false));
    assert_eq!(ops[5], IlOp::SetFlag { flag: "t".into(), value: Expr::constant(0, 0) });
    let IlOp::Goto(done) = ops[3] else { panic!("{ops:?}") };
    assert_eq!(ops[6], IlOp::Label(done));
}

#[test]
fn tst_compares_masked_value_with_zero() {
    // tst R1,R1
    let ops = lifted(0x2118);
    let IlOp::If { cond, .. } = &ops[0] else { panic!("{ops:?}") };
    assert_eq!(
        *cond,
        Expr::compare(Cond::Eq, 4, Expr::and(4, reg("R1"), reg("R1")), Expr::constant(4, 0))
    );
}

#[test]
fn bf_without_label_jumps_indirectly() {
    let ops = lifted_at(0x8b06, 0x2000);
    let not_t = Expr::compare(Cond::Eq, 0, Expr::flag("t"), Expr::constant(0, 0));
    assert_eq!(
        ops,
        vec![
            IlOp::If { cond: not_t, on_true: Label::Local(1), on_false: Label::Local(0) },
            IlOp::Label(Label::Local(1)),
            IlOp::Jump(Expr::constant(4, 0x2010)),
            IlOp::Label(Label::Local(0)),
        ]
    );
}

#[test]
fn bt_with_known_label_branches_directly() {
    let labels: HashSet<u32> = [0x2010].into_iter().collect();
    let d = decode(&0x8906u16.to_le_bytes(), 0x2000).unwrap();
    assert_eq!(
        lift_with(&d, &labels),
        vec![
            IlOp::If { cond: Expr::flag("t"), on_true: Label::Address(0x2010), on_false: Label::Local(0) },
            IlOp::Label(Label::Local(0)),
        ]
    );
}

#[test]
fn unconditional_transfers() {
    assert_eq!(lifted_at(0xa010, 0x1000), vec![IlOp::Jump(Expr::constant(4, 0x1024))]);
    assert_eq!(lifted_at(0xb010, 0x1000), vec![IlOp::Call(Expr::constant(4, 0x1024))]);
    assert_eq!(lifted(0x402b), vec![IlOp::Jump(reg("R0"))]);
    assert_eq!(lifted(0x430b), vec![IlOp::Call(reg("R3"))]);
    assert_eq!(
        lifted_at(0x0303, 0x1000),
        vec![IlOp::Call(Expr::add(4, Expr::constant(4, 0x1004), reg("R3")))]
    );
    assert_eq!(lifted(0x000b), vec![IlOp::Ret(reg("PR"))]);
}

#[test]
fn tbr_call_goes_through_table() {
    // jsr/n @@(0x10,TBR)
    assert_eq!(
        lifted(0x8310),
        vec![IlOp::Call(Expr::load(4, Expr::add(4, reg("TBR"), Expr::constant(4, 0x40))))]
    );
}

#[test]
fn arithmetic() {
    assert_eq!(
        lifted(0x71ff),
        vec![set("R1", Expr::add(4, Expr::sign_extend(4, Expr::constant(1, 0xff)), reg("R1")))]
    );
    assert_eq!(lifted(0x3128), vec![set("R1", Expr::sub(4, reg("R1"), reg("R2")))]);
    // dt R1: decrement, then a T diamond
    let dt = lifted(0x4110);
    assert_eq!(dt[0], set("R1", Expr::sub(4, reg("R1"), Expr::constant(4, 1))));
    assert_eq!(dt.len(), 8);
}

#[test]
fn movi20s_sign_extends_shifted_immediate() {
    let d = decode(&[0xf1, 0x01, 0xff, 0xff], 0).unwrap();
    assert_eq!(
        lift(&d),
        vec![set(
            "R1",
            Expr::sign_extend(4, Expr::shl(3, Expr::constant(3, 0xf_ffff), Expr::constant(1, 8)))
        )]
    );
}

#[test]
fn nop_and_unimplemented() {
    assert_eq!(lifted(0x0009), vec![IlOp::Nop]);
    // div0u has no rule
    assert_eq!(lifted(0x0019), vec![IlOp::Unimplemented]);
}

#[test]
#[should_panic(expected = "cannot be lifted")]
fn unresolved_operand_panics() {
    // fcnvsd FPUL,DR2 has no rule; resolving its wide operand is refused
    let d = decode(&0xf2adu16.to_le_bytes(), 0).unwrap();
    superh_rs::lift::resolve_operand(&d, 1, false);
}
