//! Restrictions (filter expression trees) as stored in search folder
//! definitions.
//!
//! Every node starts with a 32-bit restriction type; composite nodes embed
//! their children inline, so the tree is recovered by straight recursion.

use bitflags::bitflags;
use encoding_rs::Encoding;
use from_to_repr::FromToRepr;
use log::trace;

use crate::binread::{length_to_usize, ByteCursor};
use crate::binwrite::{encode_length, BinaryWriter};
use crate::error::{DecodeError, EncodeError};
use crate::value::{PropertyTag, TaggedPropertyValue, ValueLayout};


#[derive(Clone, Copy, Debug, Eq, FromToRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u32)]
pub enum RestrictionType {
    And = 0x00,
    Or = 0x01,
    Not = 0x02,
    Content = 0x03,
    Property = 0x04,
    CompareProps = 0x05,
    Bitmask = 0x06,
    Size = 0x07,
    Exist = 0x08,
    SubObject = 0x09,
    Comment = 0x0A,
    Count = 0x0B,
}

#[derive(Clone, Copy, Debug, Eq, FromToRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u32)]
pub enum RelOp {
    LessThan = 0x00,
    LessThanOrEqual = 0x01,
    GreaterThan = 0x02,
    GreaterThanOrEqual = 0x03,
    Equal = 0x04,
    NotEqual = 0x05,
    Regex = 0x06,
    MemberOfDistributionList = 0x64,
}

#[derive(Clone, Copy, Debug, Eq, FromToRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u32)]
pub enum BitmapRelOp {
    EqualToZero = 0x00,
    NotEqualToZero = 0x01,
}

/// Low word of a content restriction's fuzzy level.
#[derive(Clone, Copy, Debug, Eq, FromToRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u16)]
pub enum FuzzyMatch {
    FullString = 0x0000,
    Substring = 0x0001,
    Prefix = 0x0002,
}

bitflags! {
    /// High word of a content restriction's fuzzy level.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct FuzzyModifiers: u16 {
        const IGNORE_CASE = 0x0001;
        const IGNORE_NON_SPACE = 0x0002;
        const LOOSE = 0x0004;
    }
}


#[derive(Clone, Debug, PartialEq)]
pub enum Restriction {
    And(Vec<Restriction>),
    Or(Vec<Restriction>),
    Not(Box<Restriction>),
    Content {
        fuzzy_match: FuzzyMatch,
        fuzzy_modifiers: FuzzyModifiers,
        prop_tag: PropertyTag,
        value: TaggedPropertyValue,
    },
    Property {
        rel_op: RelOp,
        prop_tag: PropertyTag,
        value: TaggedPropertyValue,
    },
    CompareProps {
        rel_op: RelOp,
        prop_tag1: PropertyTag,
        prop_tag2: PropertyTag,
    },
    Bitmask {
        rel_op: BitmapRelOp,
        prop_tag: PropertyTag,
        mask: u32,
    },
    Size {
        rel_op: RelOp,
        prop_tag: PropertyTag,
        size: u32,
    },
    Exist {
        prop_tag: PropertyTag,
    },
    SubObject {
        subobject: PropertyTag,
        restriction: Box<Restriction>,
    },
    Comment {
        values: Vec<TaggedPropertyValue>,
        restriction: Box<Restriction>,
    },
    Count {
        count: u32,
        restriction: Box<Restriction>,
    },
}
impl Restriction {
    pub fn restriction_type(&self) -> RestrictionType {
        match self {
            Self::And(_) => RestrictionType::And,
            Self::Or(_) => RestrictionType::Or,
            Self::Not(_) => RestrictionType::Not,
            Self::Content { .. } => RestrictionType::Content,
            Self::Property { .. } => RestrictionType::Property,
            Self::CompareProps { .. } => RestrictionType::CompareProps,
            Self::Bitmask { .. } => RestrictionType::Bitmask,
            Self::Size { .. } => RestrictionType::Size,
            Self::Exist { .. } => RestrictionType::Exist,
            Self::SubObject { .. } => RestrictionType::SubObject,
            Self::Comment { .. } => RestrictionType::Comment,
            Self::Count { .. } => RestrictionType::Count,
        }
    }

    /// The nested restrictions directly below this node.
    pub fn children(&self) -> Vec<&Restriction> {
        match self {
            Self::And(rs)|Self::Or(rs) => rs.iter().collect(),
            Self::Not(r)
                    |Self::SubObject { restriction: r, .. }
                    |Self::Comment { restriction: r, .. }
                    |Self::Count { restriction: r, .. }
                => vec![r.as_ref()],
            Self::Content { .. }|Self::Property { .. }|Self::CompareProps { .. }
                    |Self::Bitmask { .. }|Self::Size { .. }|Self::Exist { .. }
                => Vec::new(),
        }
    }

    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Self::decode_nested(cursor, 0)
    }

    fn decode_nested(cursor: &mut ByteCursor<'_>, depth: usize) -> Result<Self, DecodeError> {
        let limit = cursor.options().max_nesting_depth;
        if depth > limit {
            return Err(DecodeError::NestingTooDeep { limit });
        }

        let type_u32 = cursor.read_u32_le()?;
        let restriction_type = RestrictionType::try_from_repr(type_u32)
            .ok_or(DecodeError::UnknownDiscriminant { field: "RestrictionType", value: type_u32 })?;
        trace!("{:?} restriction at depth {}", restriction_type, depth);

        let restriction = match restriction_type {
            RestrictionType::And|RestrictionType::Or => {
                let count = length_to_usize(cursor.read_u32_le()?.into())?;
                let mut children = Vec::with_capacity(count.min(cursor.remaining() / 4));
                for _ in 0..count {
                    children.push(Self::decode_nested(cursor, depth + 1)?);
                }
                if restriction_type == RestrictionType::And {
                    Self::And(children)
                } else {
                    Self::Or(children)
                }
            },
            RestrictionType::Not => Self::Not(Box::new(Self::decode_nested(cursor, depth + 1)?)),
            RestrictionType::Content => {
                let low_u16 = cursor.read_u16_le()?;
                let fuzzy_match = FuzzyMatch::try_from_repr(low_u16)
                    .ok_or(DecodeError::UnknownDiscriminant { field: "FuzzyLevelLow", value: low_u16.into() })?;
                let fuzzy_modifiers = FuzzyModifiers::from_bits_retain(cursor.read_u16_le()?);
                let prop_tag = PropertyTag::read(cursor)?;
                let value = TaggedPropertyValue::decode(cursor, ValueLayout::SearchFolder)?;
                Self::Content { fuzzy_match, fuzzy_modifiers, prop_tag, value }
            },
            RestrictionType::Property => {
                let rel_op = read_rel_op(cursor)?;
                let prop_tag = PropertyTag::read(cursor)?;
                let value = TaggedPropertyValue::decode(cursor, ValueLayout::SearchFolder)?;
                Self::Property { rel_op, prop_tag, value }
            },
            RestrictionType::CompareProps => {
                let rel_op = read_rel_op(cursor)?;
                let prop_tag1 = PropertyTag::read(cursor)?;
                let prop_tag2 = PropertyTag::read(cursor)?;
                Self::CompareProps { rel_op, prop_tag1, prop_tag2 }
            },
            RestrictionType::Bitmask => {
                let rel_op_u32 = cursor.read_u32_le()?;
                let rel_op = BitmapRelOp::try_from_repr(rel_op_u32)
                    .ok_or(DecodeError::UnknownDiscriminant { field: "BitmapRelOp", value: rel_op_u32 })?;
                let prop_tag = PropertyTag::read(cursor)?;
                let mask = cursor.read_u32_le()?;
                Self::Bitmask { rel_op, prop_tag, mask }
            },
            RestrictionType::Size => {
                let rel_op = read_rel_op(cursor)?;
                let prop_tag = PropertyTag::read(cursor)?;
                let size = cursor.read_u32_le()?;
                Self::Size { rel_op, prop_tag, size }
            },
            RestrictionType::Exist => Self::Exist { prop_tag: PropertyTag::read(cursor)? },
            RestrictionType::SubObject => {
                let subobject = PropertyTag::read(cursor)?;
                let restriction = Box::new(Self::decode_nested(cursor, depth + 1)?);
                Self::SubObject { subobject, restriction }
            },
            RestrictionType::Comment => {
                let value_count = length_to_usize(cursor.read_u32_le()?.into())?;
                let mut values = Vec::with_capacity(value_count.min(cursor.remaining() / 4));
                for _ in 0..value_count {
                    values.push(TaggedPropertyValue::decode(cursor, ValueLayout::SearchFolder)?);
                }
                let restriction = Box::new(Self::decode_nested(cursor, depth + 1)?);
                Self::Comment { values, restriction }
            },
            RestrictionType::Count => {
                let count = cursor.read_u32_le()?;
                let restriction = Box::new(Self::decode_nested(cursor, depth + 1)?);
                Self::Count { count, restriction }
            },
        };
        Ok(restriction)
    }

    pub fn write(&self, out: &mut Vec<u8>, string8_encoding: &'static Encoding) -> Result<(), EncodeError> {
        out.write_u32_le(self.restriction_type() as u32);
        match self {
            Self::And(children)|Self::Or(children) => {
                out.write_u32_le(encode_length("restriction count", children.len())?);
                for child in children {
                    child.write(out, string8_encoding)?;
                }
            },
            Self::Not(child) => child.write(out, string8_encoding)?,
            Self::Content { fuzzy_match, fuzzy_modifiers, prop_tag, value } => {
                out.write_u16_le(*fuzzy_match as u16);
                out.write_u16_le(fuzzy_modifiers.bits());
                prop_tag.write(out);
                value.write(out, ValueLayout::SearchFolder, string8_encoding)?;
            },
            Self::Property { rel_op, prop_tag, value } => {
                out.write_u32_le(*rel_op as u32);
                prop_tag.write(out);
                value.write(out, ValueLayout::SearchFolder, string8_encoding)?;
            },
            Self::CompareProps { rel_op, prop_tag1, prop_tag2 } => {
                out.write_u32_le(*rel_op as u32);
                prop_tag1.write(out);
                prop_tag2.write(out);
            },
            Self::Bitmask { rel_op, prop_tag, mask } => {
                out.write_u32_le(*rel_op as u32);
                prop_tag.write(out);
                out.write_u32_le(*mask);
            },
            Self::Size { rel_op, prop_tag, size } => {
                out.write_u32_le(*rel_op as u32);
                prop_tag.write(out);
                out.write_u32_le(*size);
            },
            Self::Exist { prop_tag } => prop_tag.write(out),
            Self::SubObject { subobject, restriction } => {
                subobject.write(out);
                restriction.write(out, string8_encoding)?;
            },
            Self::Comment { values, restriction } => {
                out.write_u32_le(encode_length("comment value count", values.len())?);
                for value in values {
                    value.write(out, ValueLayout::SearchFolder, string8_encoding)?;
                }
                restriction.write(out, string8_encoding)?;
            },
            Self::Count { count, restriction } => {
                out.write_u32_le(*count);
                restriction.write(out, string8_encoding)?;
            },
        }
        Ok(())
    }
}

fn read_rel_op(cursor: &mut ByteCursor<'_>) -> Result<RelOp, DecodeError> {
    let rel_op_u32 = cursor.read_u32_le()?;
    RelOp::try_from_repr(rel_op_u32)
        .ok_or(DecodeError::UnknownDiscriminant { field: "RelOp", value: rel_op_u32 })
}
