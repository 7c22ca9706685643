use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use superh_rs::branch::{classify, ControlFlowInfo, EdgeKind};
use superh_rs::decoder::decode;
use superh_rs::disasm::fmt_decoded;
use superh_rs::il::IlOp;
use superh_rs::lift::lift_with;

use crate::model::{read_window, Image};

#[derive(Debug, Clone, Serialize)]
pub struct Line {
    pub addr: u32,
    pub bytes: Vec<u8>,
    pub text: String,
    pub info: ControlFlowInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub il: Option<Vec<IlOp>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeOut {
    pub from: u32,
    pub to: Option<u32>,
    pub kind: EdgeKind,
    pub delay_slot: bool,
}

/// Linear disassembly of `[start, end)`. Undecodable halfwords become `.word`
/// lines. With `with_il`, every swept address counts as a known label when
/// lifting conditional branches.
pub fn sweep(img: &Image, start: u32, end: u32, with_il: bool) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut pc = start;
    while pc < end {
        let window = read_window(img, pc, 4);
        if window.len() < 2 {
            break;
        }
        let line = match decode(&window, pc) {
            Some(d) => Line {
                addr: pc,
                bytes: window[..d.length()].to_vec(),
                text: fmt_decoded(&d),
                info: classify(&d),
                il: None,
            },
            None => {
                let raw = u16::from_le_bytes([window[0], window[1]]);
                Line {
                    addr: pc,
                    bytes: window[..2].to_vec(),
                    text: format!(".word {raw:#06x}"),
                    info: ControlFlowInfo { length: 2, ..Default::default() },
                    il: None,
                }
            }
        };
        let next = pc.wrapping_add(line.info.length as u32);
        lines.push(line);
        if next <= pc {
            break; // wrapped past the top of the address space
        }
        pc = next;
    }

    if with_il {
        let labels: BTreeSet<u32> = lines.iter().map(|l| l.addr).collect();
        for line in &mut lines {
            line.il = Some(match decode(&line.bytes, line.addr) {
                Some(d) => lift_with(&d, &labels),
                None => vec![IlOp::Unimplemented],
            });
        }
    }
    debug!(start, end, lines = lines.len(), "swept range");
    lines
}

/// One record per control-flow edge in the listing.
pub fn edges(lines: &[Line]) -> Vec<EdgeOut> {
    lines
        .iter()
        .flat_map(|l| {
            l.info.edges.iter().map(move |e| EdgeOut {
                from: l.addr,
                to: e.target,
                kind: e.kind,
                delay_slot: l.info.delay_slot,
            })
        })
        .collect()
}
