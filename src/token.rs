use crate::opcode::Opcode;

/// A script element — either an opcode instruction or pushed data.
///
/// This is the output of the tokenizer, the input to the execution engine,
/// and the unit the script builders emit. `PushData` carries the raw bytes
/// from any of the four push-data encodings. `Op` wraps a fieldless
/// [`Opcode`] variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Data pushed onto the stack by a push-data instruction.
    /// Covers: direct push (0x01-0x4b), OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4.
    PushData(Vec<u8>),

    /// An opcode instruction (any non-push operation).
    Op(Opcode),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::PushData(data) => {
                write!(f, "<")?;
                for byte in data {
                    write!(f, "{byte:02x}")?;
                }
                write!(f, ">")
            }
            Token::Op(opcode) => write!(f, "{opcode}"),
        }
    }
}
