/// All error conditions that can arise during script parsing or execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    /// Stack had fewer elements than the operation required.
    StackUnderflow,

    /// Altstack had fewer elements than the operation required.
    AltStackUnderflow,

    /// Script byte stream ended mid-instruction.
    UnexpectedEndOfScript,

    /// A push-data length field is malformed or exceeds remaining bytes.
    InvalidPushData,

    /// An opcode byte is valid in Bitcoin but not implemented by this engine.
    UnsupportedOpcode(u8),

    /// OP_VERIFY, OP_EQUALVERIFY, OP_NUMEQUALVERIFY, or OP_CHECKSIGVERIFY
    /// consumed a false value.
    VerifyFailed,

    /// Execution completed but the stack is empty or the top element is false.
    ScriptFailed,

    /// OP_RETURN was encountered. The script is provably unspendable.
    OpReturnEncountered,

    /// OP_IF / OP_NOTIF / OP_ELSE / OP_ENDIF are not properly balanced.
    UnbalancedConditional,

    /// A stack element consumed as a number is not minimally encoded.
    NonMinimalNumber,

    /// A number grew past `ExecuteOpts::max_num_bytes`.
    ///
    /// This is how a wrong deferred-modulo budget surfaces at execution
    /// time: an intermediate value overflows the interpreter's per-number
    /// bound instead of silently carrying extra bytes.
    NumberTooLarge,

    /// OP_PICK / OP_ROLL index is negative or beyond the stack depth.
    InvalidStackIndex,

    /// OP_SPLIT position is beyond the string length, or OP_NUM2BIN cannot
    /// fit the number in the requested width.
    InvalidSplice,

    /// Division or modulo by zero.
    DivisionByZero,

    /// A hex string could not be decoded (odd length or invalid character).
    InvalidHex,
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptError::StackUnderflow => {
                write!(f, "stack underflow: not enough elements on the stack")
            }
            ScriptError::AltStackUnderflow => {
                write!(f, "altstack underflow: not enough elements on the altstack")
            }
            ScriptError::UnexpectedEndOfScript => {
                write!(f, "unexpected end of script")
            }
            ScriptError::InvalidPushData => {
                write!(f, "invalid push data encoding")
            }
            ScriptError::UnsupportedOpcode(b) => {
                write!(f, "unsupported opcode: 0x{b:02x}")
            }
            ScriptError::VerifyFailed => {
                write!(f, "verify failed: top stack element is false")
            }
            ScriptError::ScriptFailed => {
                write!(f, "script failed: final stack state is false")
            }
            ScriptError::OpReturnEncountered => {
                write!(f, "OP_RETURN encountered: script is unspendable")
            }
            ScriptError::UnbalancedConditional => {
                write!(f, "unbalanced conditional: mismatched IF/ELSE/ENDIF")
            }
            ScriptError::NonMinimalNumber => {
                write!(f, "stack element is not a minimally encoded number")
            }
            ScriptError::NumberTooLarge => {
                write!(f, "number exceeds the configured byte bound")
            }
            ScriptError::InvalidStackIndex => {
                write!(f, "pick/roll index outside the stack")
            }
            ScriptError::InvalidSplice => {
                write!(f, "invalid split position or num2bin width")
            }
            ScriptError::DivisionByZero => {
                write!(f, "division by zero")
            }
            ScriptError::InvalidHex => {
                write!(f, "invalid hex string")
            }
        }
    }
}

impl std::error::Error for ScriptError {}

/// Compile-time validation failures raised by the script builders.
///
/// These are caller errors: a descriptor that does not describe a legal
/// stack layout, or construction parameters that cannot be compiled.
/// Every variant names the exact mismatch so the caller can fix the
/// input; nothing is guessed or defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    /// `position - extension_degree + 1 < 0`: the element does not fit
    /// below its position.
    ElementOffStack {
        position: i64,
        extension_degree: usize,
    },

    /// An extension degree of zero was supplied.
    ZeroExtensionDegree,

    /// Two descriptors overlap on the stack.
    OverlappingElements {
        first_position: i64,
        first_extension_degree: usize,
        second_position: i64,
    },

    /// The x and y coordinates of a point have different extension degrees.
    MismatchedCoordinateDegrees { x_degree: usize, y_degree: usize },

    /// Elements were supplied in the wrong stack order (e.g. the gradient
    /// must sit below the points it relates).
    WrongOrder {
        expected_before: &'static str,
        expected_after: &'static str,
    },

    /// A shift moved a descriptor to a negative depth.
    ShiftOutOfRange { position: i64, shift: i64 },

    /// The multiplier bound must be at least 2 so the unrolled loop has
    /// at least one iteration.
    MaxMultiplierTooSmall { max_multiplier_bits: usize },

    /// A per-input bound list does not match the number of public inputs.
    WrongMultiplierCount { expected: usize, got: usize },
}

impl std::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuilderError::ElementOffStack {
                position,
                extension_degree,
            } => write!(
                f,
                "element does not fit in the stack: position: {position}, \
                 extension_degree: {extension_degree}"
            ),
            BuilderError::ZeroExtensionDegree => {
                write!(f, "the extension degree must be a positive integer")
            }
            BuilderError::OverlappingElements {
                first_position,
                first_extension_degree,
                second_position,
            } => write!(
                f,
                "elements overlap: first.position: {first_position}, \
                 first.extension_degree: {first_extension_degree}, \
                 second.position: {second_position}"
            ),
            BuilderError::MismatchedCoordinateDegrees { x_degree, y_degree } => write!(
                f,
                "the extension degrees of the x and y coordinates do not match: \
                 x.extension_degree: {x_degree}, y.extension_degree: {y_degree}"
            ),
            BuilderError::WrongOrder {
                expected_before,
                expected_after,
            } => write!(
                f,
                "{expected_after} must come after {expected_before} in the stack"
            ),
            BuilderError::ShiftOutOfRange { position, shift } => write!(
                f,
                "shift moves the element off the stack: position: {position}, shift: {shift}"
            ),
            BuilderError::MaxMultiplierTooSmall {
                max_multiplier_bits,
            } => write!(
                f,
                "max multiplier must unroll at least one iteration: \
                 bit length: {max_multiplier_bits}"
            ),
            BuilderError::WrongMultiplierCount { expected, got } => write!(
                f,
                "per-input multiplier bounds do not match the public inputs: \
                 expected: {expected}, got: {got}"
            ),
        }
    }
}

impl std::error::Error for BuilderError {}
