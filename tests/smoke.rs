use std::collections::BTreeSet;

use superh_rs::arch::{instruction_il, instruction_info, instruction_text, register_class, RegisterClass};
use superh_rs::lift::NoLabels;
use superh_rs::{ArchInfo, EdgeKind, IlOp, TokenKind};

#[test]
fn indexed_load_end_to_end() {
    let bytes = 0x000cu16.to_le_bytes();
    let (tokens, len) = instruction_text(&bytes, 0x5000);
    assert_eq!(len, 2);
    let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(text, "mov.b @(R0,R0),R0");

    let info = instruction_info(&bytes, 0x5000);
    assert_eq!(info.length, 2);
    assert!(info.edges.is_empty());

    let (il, len) = instruction_il(&bytes, 0x5000, &NoLabels);
    assert_eq!(len, 2);
    assert_eq!(il.len(), 1);
    assert!(matches!(&il[0], IlOp::SetReg { reg, size: 4, .. } if reg == "R0"));
}

#[test]
fn unknown_bytes_are_reported_not_dropped() {
    let bytes = 0xfffdu16.to_le_bytes();
    let (tokens, len) = instruction_text(&bytes, 0);
    assert_eq!(len, 2);
    assert_eq!(tokens[0].kind, TokenKind::Text);
    assert_eq!(tokens[0].text, "<unknown>");
    assert_eq!(instruction_info(&bytes, 0).length, 2);
    assert_eq!(instruction_il(&bytes, 0, &NoLabels).0, vec![IlOp::Unimplemented]);
}

#[test]
fn short_input_does_not_decode_wide_forms() {
    // movi20 needs four bytes; two are not enough
    assert_eq!(instruction_text(&[0x00, 0x01], 0).0[0].text, "<unknown>");
    assert_eq!(instruction_text(&[0x00, 0x01, 0x34, 0x12], 0).1, 4);
}

#[test]
fn conditional_branch_info_and_labelled_il() {
    let bytes = 0x8906u16.to_le_bytes();
    let info = instruction_info(&bytes, 0x2000);
    let kinds: Vec<EdgeKind> = info.edges.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, [EdgeKind::TrueBranch, EdgeKind::FalseBranch]);

    let labels: BTreeSet<u32> = [0x2010].into_iter().collect();
    let (il, _) = instruction_il(&bytes, 0x2000, &labels);
    assert_eq!(il.len(), 2);
}

#[test]
fn arch_info_serializes() {
    let info = ArchInfo::default();
    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["name"], "superh");
    assert_eq!(json["little_endian"], true);
    assert_eq!(json["max_instr_length"], 4);
    assert_eq!(json["link_reg"], "PR");
    assert_eq!(json["flags"][0], "t");
    let back: ArchInfo = serde_json::from_value(json).unwrap();
    assert_eq!(back, info);
}

#[test]
fn register_classes() {
    assert_eq!(register_class("R15"), Some(RegisterClass::General));
    assert_eq!(register_class("R3_BANK"), Some(RegisterClass::General));
    assert_eq!(register_class("GBR"), Some(RegisterClass::Control));
    assert_eq!(register_class("FPUL"), Some(RegisterClass::System));
    assert_eq!(register_class("R16"), None);
}
