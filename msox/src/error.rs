use std::fmt;


/// The broad class of a decoding failure.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum DecodeErrorKind {
    /// The buffer ended before the structure did.
    Truncated,
    /// A type tag or enumerated value has no known meaning.
    UnknownDiscriminant,
    /// The bytes are all there but violate a structural rule.
    Corrupted,
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DecodeError {
    Truncated { offset: usize, requested: usize, available: usize },
    XidSize { size: usize },
    UnknownDiscriminant { field: &'static str, value: u32 },
    ZeroCount { field: &'static str },
    VersionMismatch { field: &'static str, expected: u32, obtained: u32 },
    UnexpectedLength { field: &'static str, length: u64 },
    TrailingData { offset: usize, remaining: usize },
    ActionLengthMismatch { declared: u32, consumed: usize },
    InvalidBoolean { obtained: u16 },
    InvalidString { field: &'static str },
    OddStringLength { byte_length: usize },
    MissingTerminator { field: &'static str },
    LengthOverflow { length: u64 },
    NestingTooDeep { limit: usize },
}
impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Truncated { .. }|Self::XidSize { .. }
                => DecodeErrorKind::Truncated,
            Self::UnknownDiscriminant { .. }
                => DecodeErrorKind::UnknownDiscriminant,
            Self::ZeroCount { .. }|Self::VersionMismatch { .. }
                    |Self::UnexpectedLength { .. }|Self::TrailingData { .. }
                    |Self::ActionLengthMismatch { .. }|Self::InvalidBoolean { .. }
                    |Self::InvalidString { .. }|Self::OddStringLength { .. }
                    |Self::MissingTerminator { .. }|Self::LengthOverflow { .. }
                    |Self::NestingTooDeep { .. }
                => DecodeErrorKind::Corrupted,
        }
    }

    /// The absolute buffer offset at which decoding failed, if known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Truncated { offset, .. }|Self::TrailingData { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { offset, requested, available }
                => write!(f, "truncated at offset {}: {} bytes requested, {} available", offset, requested, available),
            Self::XidSize { size }
                => write!(f, "XID size {} is smaller than the 16-byte namespace GUID", size),
            Self::UnknownDiscriminant { field, value }
                => write!(f, "unknown {} value 0x{:X}", field, value),
            Self::ZeroCount { field }
                => write!(f, "{} must not be zero", field),
            Self::VersionMismatch { field, expected, obtained }
                => write!(f, "wrong {} (expected 0x{:08X}, obtained 0x{:08X})", field, expected, obtained),
            Self::UnexpectedLength { field, length }
                => write!(f, "{} is {} although its presence flag is clear", field, length),
            Self::TrailingData { offset, remaining }
                => write!(f, "{} unconsumed bytes at offset {}", remaining, offset),
            Self::ActionLengthMismatch { declared, consumed }
                => write!(f, "action block declares {} bytes but its payload consumed {}", declared, consumed),
            Self::InvalidBoolean { obtained }
                => write!(f, "invalid boolean value 0x{:04X} (must be 0x0000 for false or 0x0001 for true)", obtained),
            Self::InvalidString { field }
                => write!(f, "{} is not a valid string", field),
            Self::OddStringLength { byte_length }
                => write!(f, "odd length {} of UTF-16 string", byte_length),
            Self::MissingTerminator { field }
                => write!(f, "{} is not NUL-terminated", field),
            Self::LengthOverflow { length }
                => write!(f, "length {} does not fit into memory", length),
            Self::NestingTooDeep { limit }
                => write!(f, "restrictions nested deeper than {} levels", limit),
        }
    }
}
impl std::error::Error for DecodeError {
}


#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum EncodeError {
    LengthOverflow { field: &'static str, length: usize },
}
impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthOverflow { field, length }
                => write!(f, "{} of {} does not fit into its length field", length, field),
        }
    }
}
impl std::error::Error for EncodeError {
}
