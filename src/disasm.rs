use serde::{Deserialize, Serialize};

use crate::decoder::{substitute, DecodedInstruction};
use crate::instructions::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self { kind, text: text.into() }
    }
}

/// Renders the instruction as typed tokens plus their concatenation.
pub fn render(d: &DecodedInstruction) -> (Vec<Token>, String) {
    let tokens: Vec<Token> = d
        .def
        .tokens
        .iter()
        .map(|t| Token::new(t.kind, substitute(t.text, &d.fields)))
        .collect();
    let text = tokens.iter().map(|t| t.text.as_str()).collect();
    (tokens, text)
}

pub fn fmt_decoded(d: &DecodedInstruction) -> String {
    render(d).1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    fn text(bytes: &[u8], addr: u32) -> String {
        fmt_decoded(&decode(bytes, addr).unwrap())
    }

    #[test]
    fn operandless() {
        assert_eq!(text(&[0x09, 0x00], 0), "nop");
        assert_eq!(text(&[0x0b, 0x00], 0), "rts");
    }

    #[test]
    fn immediate_and_displacement() {
        assert_eq!(text(&[0x7f, 0xe1], 0), "mov #0x7f,R1");
        assert_eq!(text(&[0x12, 0x51], 0), "mov.l @(0x2,R1),R1");
        assert_eq!(text(&[0x10, 0xa0], 0x1000), "bra 0x1024");
    }

    #[test]
    fn token_kinds() {
        let (tokens, _) = render(&decode(&[0x66, 0x61], 0).unwrap());
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Instruction,
                TokenKind::Text,
                TokenKind::Text,
                TokenKind::Register,
                TokenKind::Text,
                TokenKind::OperandSeparator,
                TokenKind::Register,
            ]
        );
        assert_eq!(tokens[3].text, "R6");
    }
}
