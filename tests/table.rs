use std::collections::BTreeSet;

use superh_rs::decoder::decode;
use superh_rs::instructions::{build_table, OperandKind, Row, TableError};
use superh_rs::isa::superh::{opcode_table, ROWS};

#[test]
fn entries_are_self_consistent() {
    for def in opcode_table() {
        assert_eq!(def.pattern & !def.mask, 0, "{}", def.syntax);
        let fields = [def.n.mask, def.m.mask, def.imm.mask, def.disp.mask];
        let full = if def.size == 4 { u32::MAX } else { 0xFFFF };
        let mut seen = def.mask;
        for f in fields {
            assert_eq!(seen & f, 0, "{}: overlapping field", def.syntax);
            seen |= f;
        }
        assert_eq!(seen, full, "{}: uncovered bits", def.syntax);
        for op in &def.operands {
            if op.kind == OperandKind::Immediate {
                assert!(def.imm.is_present(), "{}", def.syntax);
            }
            if op.kind == OperandKind::Displacement {
                assert!(def.disp.is_present() && op.size > 0, "{}", def.syntax);
            }
            if op.reg_delta != 0 {
                assert!(op.is_ref && def.width > 0, "{}", def.syntax);
            }
        }
    }
}

#[test]
fn only_known_rows_are_shadowed() {
    let mut shadowed = BTreeSet::new();
    for def in opcode_table() {
        let bytes = def.pattern.to_le_bytes();
        let d = decode(&bytes[..def.size as usize], 0).expect("own pattern decodes");
        if !std::ptr::eq(d.def, def) {
            shadowed.insert(def.syntax);
        }
    }
    let expected: BTreeSet<&str> = [
        "fmov.d @Rm,DRn",
        "fmov.d DRm,@Rn",
        "fmov.d @Rm+,DRn",
        "fmov.d DRm,@-Rn",
        "fmov.d @(R0,Rm),DRn",
        "fmov.d DRm,@(R0,Rn)",
        "fmov DRm,DRn",
        "fmov.d @Rm+,XDn",
        "fmov DRm,XDn",
        "fmov XDm,DRn",
        "fmov XDm,XDn",
        "lds Rm,FPSCR",
        "lds.l @Rm+,FPSCR",
        "sts FPSCR,Rn",
        "sts.l FPSCR,@-Rn",
    ]
    .into_iter()
    .collect();
    assert_eq!(shadowed, expected);
}

#[test]
fn field_resolution_is_deterministic() {
    let a = decode(&0x5123u16.to_le_bytes(), 0x100).unwrap();
    let b = decode(&0x5123u16.to_le_bytes(), 0x100).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.fields.n, Some(1));
    assert_eq!(a.fields.m, Some(2));
    assert_eq!(a.fields.disp, Some(3));
    assert_eq!(a.fields.imm, None);
}

#[test]
fn unknown_word_is_none() {
    assert!(decode(&0xfffdu16.to_le_bytes(), 0).is_none());
    assert!(decode(&[0xfd, 0xff, 0x00, 0x00], 0).is_none());
}

#[test]
fn bad_rows_fail_the_build() {
    let rows = [
        Row { syntax: "nop", bits: "0000000000001001", delay: false },
        Row { syntax: "mov Rm,Rn", bits: "0110nnnn00000011", delay: false },
    ];
    assert!(matches!(build_table(&rows), Err(TableError::MissingField { field: "m", .. })));
    let rows = [Row { syntax: "nop", bits: "00000000000010x1", delay: false }];
    assert!(matches!(build_table(&rows), Err(TableError::PatternChar { ch: 'x', .. })));
    assert_eq!(build_table(&ROWS[..4]).unwrap().len(), 4);
}
