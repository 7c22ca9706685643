pub mod arch;
pub mod branch;
pub mod decoder;
pub mod disasm;
pub mod il;
pub mod instructions;
pub mod lift;

pub mod isa {
    pub mod superh; // SH-1 .. SH-4A, SH-2A, SH-DSP register transfers
}

pub use arch::ArchInfo;
pub use branch::{classify, ControlFlowInfo, Edge, EdgeKind};
pub use decoder::{decode, DecodedInstruction, Decoder};
pub use disasm::{render, Token};
pub use il::{Expr, IlOp};
pub use instructions::{OpcodeDef, TableError, TokenKind};
pub use lift::{lift, lift_with, LabelResolver};
