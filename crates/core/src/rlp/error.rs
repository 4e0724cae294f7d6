use thiserror::Error;

/// Why a byte sequence was rejected by the decoder.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeReason {
    #[error("input too short for the declared length")]
    InputTooShort,

    #[error("item extends past the end of its enclosing list")]
    ListOverrun,

    #[error("single byte below 0x80 must not carry a string prefix")]
    NonCanonicalSingleByte,

    #[error("long-form length used for a payload shorter than 56 bytes")]
    NonCanonicalSize,

    #[error("length field has a leading zero byte")]
    LeadingZeroLength,

    #[error("length field does not fit in a machine word")]
    LengthOverflow,

    #[error("trailing bytes after the encoded item")]
    TrailingBytes,

    #[error("nesting deeper than {max} lists")]
    DepthLimitExceeded { max: usize },

    #[error("expected a string, found a list")]
    UnexpectedList,

    #[error("expected a list, found a string")]
    UnexpectedString,

    #[error("integer has a leading zero byte")]
    LeadingZeroInteger,

    #[error("integer wider than {max_bytes} bytes")]
    IntegerOverflow { max_bytes: usize },

    #[error("address must be 20 bytes or empty, got {got}")]
    InvalidAddressLength { got: usize },

    #[error("expected {expected} list elements, got {got}")]
    FieldCount { expected: usize, got: usize },
}

/// A decode failure together with the absolute input offset it was detected at.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rlp decode error at offset {offset}: {reason}")]
pub struct DecodeError {
    pub offset: usize,
    pub reason: DecodeReason,
}

impl DecodeError {
    pub fn new(offset: usize, reason: DecodeReason) -> Self {
        Self { offset, reason }
    }
}
