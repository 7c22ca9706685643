//! Per-instruction control-flow classification.

use serde::{Deserialize, Serialize};

use crate::decoder::DecodedInstruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    TrueBranch,
    FalseBranch,
    Unconditional,
    Call,
    FunctionReturn,
    Indirect,
    SystemCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub kind: EdgeKind,
    pub target: Option<u32>,
}

impl Edge {
    fn to(kind: EdgeKind, target: u32) -> Self {
        Self { kind, target: Some(target) }
    }

    fn unknown(kind: EdgeKind) -> Self {
        Self { kind, target: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlFlowInfo {
    pub length: usize,
    pub edges: Vec<Edge>,
    /// The instruction after this one executes before the transfer.
    pub delay_slot: bool,
}

pub fn classify(d: &DecodedInstruction) -> ControlFlowInfo {
    use EdgeKind::*;
    let addr = d.addr;
    let target = || d.target().unwrap_or(addr);
    let edges = match d.def.dispatch_key().as_str() {
        "bf" | "bt" => vec![Edge::to(TrueBranch, target()), Edge::to(FalseBranch, addr.wrapping_add(2))],
        // the delay slot sits between the branch and the not-taken path
        "bf_s" | "bt_s" => vec![Edge::to(TrueBranch, target()), Edge::to(FalseBranch, addr.wrapping_add(4))],
        "bra" => vec![Edge::to(Unconditional, target())],
        "bsr" => vec![Edge::to(Call, target())],
        "braf" | "bsrf" | "jmp" | "jsr" | "jsr_n" => vec![Edge::unknown(Indirect)],
        "rts" | "rts_n" | "rtv_n" | "rte" => vec![Edge::unknown(FunctionReturn)],
        "trapa" => vec![Edge::unknown(SystemCall)],
        _ => Vec::new(),
    };
    ControlFlowInfo { length: d.length(), edges, delay_slot: d.def.is_delay() }
}
