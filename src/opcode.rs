/// A Bitcoin Script opcode supported by this engine.
///
/// This is a fieldless enum that maps 1:1 to protocol-defined byte values.
/// It derives `Copy` because it carries no heap data.
///
/// The set covers everything the zero-knowledge script builders emit:
/// stack shuffling (including `OP_PICK`/`OP_ROLL` and the altstack),
/// big-number arithmetic in the post-Genesis style, splice opcodes for
/// byte-string surgery, hashing, and signature checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // Constants
    Op0,
    Op1Negate,
    Op1,
    Op2,
    Op3,
    Op4,
    Op5,
    Op6,
    Op7,
    Op8,
    Op9,
    Op10,
    Op11,
    Op12,
    Op13,
    Op14,
    Op15,
    Op16,

    // Flow control
    OpNop,
    OpIf,
    OpNotIf,
    OpElse,
    OpEndIf,
    OpVerify,
    OpReturn,

    // Stack manipulation
    OpToAltStack,
    OpFromAltStack,
    Op2Drop,
    Op2Dup,
    Op3Dup,
    Op2Over,
    Op2Rot,
    Op2Swap,
    OpDepth,
    OpDrop,
    OpDup,
    OpNip,
    OpOver,
    OpPick,
    OpRoll,
    OpRot,
    OpSwap,
    OpTuck,

    // Splice
    OpCat,
    OpSplit,
    OpNum2Bin,
    OpBin2Num,
    OpSize,

    // Comparison
    OpEqual,
    OpEqualVerify,

    // Arithmetic
    Op1Add,
    Op1Sub,
    OpNegate,
    OpAbs,
    OpNot,
    Op0NotEqual,
    OpAdd,
    OpSub,
    OpMul,
    OpDiv,
    OpMod,
    OpLShift,
    OpRShift,
    OpBoolAnd,
    OpBoolOr,
    OpNumEqual,
    OpNumEqualVerify,
    OpNumNotEqual,
    OpLessThan,
    OpGreaterThan,

    // Crypto
    OpRipemd160,
    OpSha256,
    OpHash160,
    OpHash256,
    OpCodeSeparator,
    OpCheckSig,
    OpCheckSigVerify,
}

impl Opcode {
    /// Convert a byte to an `Opcode`, if it maps to a supported opcode.
    ///
    /// Returns `None` for push-data bytes (`0x01`-`0x4e`), reserved opcodes,
    /// and any unimplemented opcode. These are handled by the tokenizer
    /// (push-data) or rejected as unsupported.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        match byte {
            0x00 => Some(Opcode::Op0),
            0x4f => Some(Opcode::Op1Negate),
            0x51 => Some(Opcode::Op1),
            0x52 => Some(Opcode::Op2),
            0x53 => Some(Opcode::Op3),
            0x54 => Some(Opcode::Op4),
            0x55 => Some(Opcode::Op5),
            0x56 => Some(Opcode::Op6),
            0x57 => Some(Opcode::Op7),
            0x58 => Some(Opcode::Op8),
            0x59 => Some(Opcode::Op9),
            0x5a => Some(Opcode::Op10),
            0x5b => Some(Opcode::Op11),
            0x5c => Some(Opcode::Op12),
            0x5d => Some(Opcode::Op13),
            0x5e => Some(Opcode::Op14),
            0x5f => Some(Opcode::Op15),
            0x60 => Some(Opcode::Op16),
            0x61 => Some(Opcode::OpNop),
            0x63 => Some(Opcode::OpIf),
            0x64 => Some(Opcode::OpNotIf),
            0x67 => Some(Opcode::OpElse),
            0x68 => Some(Opcode::OpEndIf),
            0x69 => Some(Opcode::OpVerify),
            0x6a => Some(Opcode::OpReturn),
            0x6b => Some(Opcode::OpToAltStack),
            0x6c => Some(Opcode::OpFromAltStack),
            0x6d => Some(Opcode::Op2Drop),
            0x6e => Some(Opcode::Op2Dup),
            0x6f => Some(Opcode::Op3Dup),
            0x70 => Some(Opcode::Op2Over),
            0x71 => Some(Opcode::Op2Rot),
            0x72 => Some(Opcode::Op2Swap),
            0x74 => Some(Opcode::OpDepth),
            0x75 => Some(Opcode::OpDrop),
            0x76 => Some(Opcode::OpDup),
            0x77 => Some(Opcode::OpNip),
            0x78 => Some(Opcode::OpOver),
            0x79 => Some(Opcode::OpPick),
            0x7a => Some(Opcode::OpRoll),
            0x7b => Some(Opcode::OpRot),
            0x7c => Some(Opcode::OpSwap),
            0x7d => Some(Opcode::OpTuck),
            0x7e => Some(Opcode::OpCat),
            0x7f => Some(Opcode::OpSplit),
            0x80 => Some(Opcode::OpNum2Bin),
            0x81 => Some(Opcode::OpBin2Num),
            0x82 => Some(Opcode::OpSize),
            0x87 => Some(Opcode::OpEqual),
            0x88 => Some(Opcode::OpEqualVerify),
            0x8b => Some(Opcode::Op1Add),
            0x8c => Some(Opcode::Op1Sub),
            0x8f => Some(Opcode::OpNegate),
            0x90 => Some(Opcode::OpAbs),
            0x91 => Some(Opcode::OpNot),
            0x92 => Some(Opcode::Op0NotEqual),
            0x93 => Some(Opcode::OpAdd),
            0x94 => Some(Opcode::OpSub),
            0x95 => Some(Opcode::OpMul),
            0x96 => Some(Opcode::OpDiv),
            0x97 => Some(Opcode::OpMod),
            0x98 => Some(Opcode::OpLShift),
            0x99 => Some(Opcode::OpRShift),
            0x9a => Some(Opcode::OpBoolAnd),
            0x9b => Some(Opcode::OpBoolOr),
            0x9c => Some(Opcode::OpNumEqual),
            0x9d => Some(Opcode::OpNumEqualVerify),
            0x9e => Some(Opcode::OpNumNotEqual),
            0x9f => Some(Opcode::OpLessThan),
            0xa0 => Some(Opcode::OpGreaterThan),
            0xa6 => Some(Opcode::OpRipemd160),
            0xa8 => Some(Opcode::OpSha256),
            0xa9 => Some(Opcode::OpHash160),
            0xaa => Some(Opcode::OpHash256),
            0xab => Some(Opcode::OpCodeSeparator),
            0xac => Some(Opcode::OpCheckSig),
            0xad => Some(Opcode::OpCheckSigVerify),
            _ => None,
        }
    }

    /// Convert an `Opcode` back to its canonical byte value.
    pub fn to_byte(self) -> u8 {
        match self {
            Opcode::Op0 => 0x00,
            Opcode::Op1Negate => 0x4f,
            Opcode::Op1 => 0x51,
            Opcode::Op2 => 0x52,
            Opcode::Op3 => 0x53,
            Opcode::Op4 => 0x54,
            Opcode::Op5 => 0x55,
            Opcode::Op6 => 0x56,
            Opcode::Op7 => 0x57,
            Opcode::Op8 => 0x58,
            Opcode::Op9 => 0x59,
            Opcode::Op10 => 0x5a,
            Opcode::Op11 => 0x5b,
            Opcode::Op12 => 0x5c,
            Opcode::Op13 => 0x5d,
            Opcode::Op14 => 0x5e,
            Opcode::Op15 => 0x5f,
            Opcode::Op16 => 0x60,
            Opcode::OpNop => 0x61,
            Opcode::OpIf => 0x63,
            Opcode::OpNotIf => 0x64,
            Opcode::OpElse => 0x67,
            Opcode::OpEndIf => 0x68,
            Opcode::OpVerify => 0x69,
            Opcode::OpReturn => 0x6a,
            Opcode::OpToAltStack => 0x6b,
            Opcode::OpFromAltStack => 0x6c,
            Opcode::Op2Drop => 0x6d,
            Opcode::Op2Dup => 0x6e,
            Opcode::Op3Dup => 0x6f,
            Opcode::Op2Over => 0x70,
            Opcode::Op2Rot => 0x71,
            Opcode::Op2Swap => 0x72,
            Opcode::OpDepth => 0x74,
            Opcode::OpDrop => 0x75,
            Opcode::OpDup => 0x76,
            Opcode::OpNip => 0x77,
            Opcode::OpOver => 0x78,
            Opcode::OpPick => 0x79,
            Opcode::OpRoll => 0x7a,
            Opcode::OpRot => 0x7b,
            Opcode::OpSwap => 0x7c,
            Opcode::OpTuck => 0x7d,
            Opcode::OpCat => 0x7e,
            Opcode::OpSplit => 0x7f,
            Opcode::OpNum2Bin => 0x80,
            Opcode::OpBin2Num => 0x81,
            Opcode::OpSize => 0x82,
            Opcode::OpEqual => 0x87,
            Opcode::OpEqualVerify => 0x88,
            Opcode::Op1Add => 0x8b,
            Opcode::Op1Sub => 0x8c,
            Opcode::OpNegate => 0x8f,
            Opcode::OpAbs => 0x90,
            Opcode::OpNot => 0x91,
            Opcode::Op0NotEqual => 0x92,
            Opcode::OpAdd => 0x93,
            Opcode::OpSub => 0x94,
            Opcode::OpMul => 0x95,
            Opcode::OpDiv => 0x96,
            Opcode::OpMod => 0x97,
            Opcode::OpLShift => 0x98,
            Opcode::OpRShift => 0x99,
            Opcode::OpBoolAnd => 0x9a,
            Opcode::OpBoolOr => 0x9b,
            Opcode::OpNumEqual => 0x9c,
            Opcode::OpNumEqualVerify => 0x9d,
            Opcode::OpNumNotEqual => 0x9e,
            Opcode::OpLessThan => 0x9f,
            Opcode::OpGreaterThan => 0xa0,
            Opcode::OpRipemd160 => 0xa6,
            Opcode::OpSha256 => 0xa8,
            Opcode::OpHash160 => 0xa9,
            Opcode::OpHash256 => 0xaa,
            Opcode::OpCodeSeparator => 0xab,
            Opcode::OpCheckSig => 0xac,
            Opcode::OpCheckSigVerify => 0xad,
        }
    }

    /// The small-constant opcode pushing `n`, for `n` in `[-1, 16]`.
    ///
    /// Used by the script builders to emit the short encodings of small
    /// stack positions and integers.
    pub fn from_small_int(n: i64) -> Option<Opcode> {
        match n {
            -1 => Some(Opcode::Op1Negate),
            0 => Some(Opcode::Op0),
            1 => Some(Opcode::Op1),
            2 => Some(Opcode::Op2),
            3 => Some(Opcode::Op3),
            4 => Some(Opcode::Op4),
            5 => Some(Opcode::Op5),
            6 => Some(Opcode::Op6),
            7 => Some(Opcode::Op7),
            8 => Some(Opcode::Op8),
            9 => Some(Opcode::Op9),
            10 => Some(Opcode::Op10),
            11 => Some(Opcode::Op11),
            12 => Some(Opcode::Op12),
            13 => Some(Opcode::Op13),
            14 => Some(Opcode::Op14),
            15 => Some(Opcode::Op15),
            16 => Some(Opcode::Op16),
            _ => None,
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Opcode::Op0 => "OP_0",
            Opcode::Op1Negate => "OP_1NEGATE",
            Opcode::Op1 => "OP_1",
            Opcode::Op2 => "OP_2",
            Opcode::Op3 => "OP_3",
            Opcode::Op4 => "OP_4",
            Opcode::Op5 => "OP_5",
            Opcode::Op6 => "OP_6",
            Opcode::Op7 => "OP_7",
            Opcode::Op8 => "OP_8",
            Opcode::Op9 => "OP_9",
            Opcode::Op10 => "OP_10",
            Opcode::Op11 => "OP_11",
            Opcode::Op12 => "OP_12",
            Opcode::Op13 => "OP_13",
            Opcode::Op14 => "OP_14",
            Opcode::Op15 => "OP_15",
            Opcode::Op16 => "OP_16",
            Opcode::OpNop => "OP_NOP",
            Opcode::OpIf => "OP_IF",
            Opcode::OpNotIf => "OP_NOTIF",
            Opcode::OpElse => "OP_ELSE",
            Opcode::OpEndIf => "OP_ENDIF",
            Opcode::OpVerify => "OP_VERIFY",
            Opcode::OpReturn => "OP_RETURN",
            Opcode::OpToAltStack => "OP_TOALTSTACK",
            Opcode::OpFromAltStack => "OP_FROMALTSTACK",
            Opcode::Op2Drop => "OP_2DROP",
            Opcode::Op2Dup => "OP_2DUP",
            Opcode::Op3Dup => "OP_3DUP",
            Opcode::Op2Over => "OP_2OVER",
            Opcode::Op2Rot => "OP_2ROT",
            Opcode::Op2Swap => "OP_2SWAP",
            Opcode::OpDepth => "OP_DEPTH",
            Opcode::OpDrop => "OP_DROP",
            Opcode::OpDup => "OP_DUP",
            Opcode::OpNip => "OP_NIP",
            Opcode::OpOver => "OP_OVER",
            Opcode::OpPick => "OP_PICK",
            Opcode::OpRoll => "OP_ROLL",
            Opcode::OpRot => "OP_ROT",
            Opcode::OpSwap => "OP_SWAP",
            Opcode::OpTuck => "OP_TUCK",
            Opcode::OpCat => "OP_CAT",
            Opcode::OpSplit => "OP_SPLIT",
            Opcode::OpNum2Bin => "OP_NUM2BIN",
            Opcode::OpBin2Num => "OP_BIN2NUM",
            Opcode::OpSize => "OP_SIZE",
            Opcode::OpEqual => "OP_EQUAL",
            Opcode::OpEqualVerify => "OP_EQUALVERIFY",
            Opcode::Op1Add => "OP_1ADD",
            Opcode::Op1Sub => "OP_1SUB",
            Opcode::OpNegate => "OP_NEGATE",
            Opcode::OpAbs => "OP_ABS",
            Opcode::OpNot => "OP_NOT",
            Opcode::Op0NotEqual => "OP_0NOTEQUAL",
            Opcode::OpAdd => "OP_ADD",
            Opcode::OpSub => "OP_SUB",
            Opcode::OpMul => "OP_MUL",
            Opcode::OpDiv => "OP_DIV",
            Opcode::OpMod => "OP_MOD",
            Opcode::OpLShift => "OP_LSHIFT",
            Opcode::OpRShift => "OP_RSHIFT",
            Opcode::OpBoolAnd => "OP_BOOLAND",
            Opcode::OpBoolOr => "OP_BOOLOR",
            Opcode::OpNumEqual => "OP_NUMEQUAL",
            Opcode::OpNumEqualVerify => "OP_NUMEQUALVERIFY",
            Opcode::OpNumNotEqual => "OP_NUMNOTEQUAL",
            Opcode::OpLessThan => "OP_LESSTHAN",
            Opcode::OpGreaterThan => "OP_GREATERTHAN",
            Opcode::OpRipemd160 => "OP_RIPEMD160",
            Opcode::OpSha256 => "OP_SHA256",
            Opcode::OpHash160 => "OP_HASH160",
            Opcode::OpHash256 => "OP_HASH256",
            Opcode::OpCodeSeparator => "OP_CODESEPARATOR",
            Opcode::OpCheckSig => "OP_CHECKSIG",
            Opcode::OpCheckSigVerify => "OP_CHECKSIGVERIFY",
        };
        write!(f, "{name}")
    }
}
