//! Property tags and serialized property values.
//!
//! The same logical value has three wire layouts. Rule buffers follow the
//! PropertyValue layout with a COUNT width that depends on the rule format
//! (16 bits for standard rules, 32 bits for extended rules) and NUL-terminated
//! strings. Search folder definitions prefix every string with a 32-bit byte
//! length (terminator included) and pad booleans to 16 bits.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::cmp::Ordering;

use encoding_rs::Encoding;
use log::trace;

use crate::{PropType, PropValue};
use crate::binread::{length_to_usize, ByteCursor};
use crate::binwrite::{encode_length, BinaryWriter};
use crate::error::{DecodeError, EncodeError};
use crate::guid::{Guid, GuidByteOrder};
use crate::rule::RuleFormat;


/// Selects the wire layout of a property value.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueLayout {
    Rule(RuleFormat),
    SearchFolder,
}
impl ValueLayout {
    fn read_count(&self, cursor: &mut ByteCursor<'_>) -> Result<usize, DecodeError> {
        match self {
            Self::Rule(format) => format.read_count(cursor),
            Self::SearchFolder => length_to_usize(cursor.read_u32_le()?.into()),
        }
    }

    fn write_count(&self, out: &mut Vec<u8>, field: &'static str, count: usize) -> Result<(), EncodeError> {
        match self {
            Self::Rule(format) => format.write_count(out, field, count),
            Self::SearchFolder => {
                out.write_u32_le(encode_length(field, count)?);
                Ok(())
            },
        }
    }
}


/// A property identifier together with its type.
///
/// Serialized as a little-endian 32-bit value with the type in the low word.
#[derive(Clone, Copy, Debug)]
pub struct PropertyTag {
    pub id: u16,
    pub prop_type: PropType,
}
impl PropertyTag {
    pub const fn new(id: u16, prop_type: PropType) -> Self {
        Self { id, prop_type }
    }

    pub fn from_u32(tag: u32) -> Self {
        let id = (tag >> 16) as u16;
        let prop_type = PropType::from((tag & 0xFFFF) as u16);
        Self { id, prop_type }
    }

    pub fn to_u32(&self) -> u32 {
        (u32::from(self.id) << 16) | u32::from(u16::from(self.prop_type))
    }

    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self::from_u32(cursor.read_u32_le()?))
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.write_u32_le(self.to_u32());
    }
}
impl PartialEq for PropertyTag {
    fn eq(&self, other: &Self) -> bool { self.to_u32() == other.to_u32() }
}
impl Eq for PropertyTag {
}
impl Hash for PropertyTag {
    fn hash<H: Hasher>(&self, state: &mut H) { self.to_u32().hash(state) }
}
impl PartialOrd for PropertyTag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}
impl Ord for PropertyTag {
    fn cmp(&self, other: &Self) -> Ordering { self.to_u32().cmp(&other.to_u32()) }
}
impl fmt::Display for PropertyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.to_u32())
    }
}


/// A property value preceded by its tag.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct TaggedPropertyValue {
    pub tag: PropertyTag,
    pub value: PropValue,
}
impl TaggedPropertyValue {
    pub fn decode(cursor: &mut ByteCursor<'_>, layout: ValueLayout) -> Result<Self, DecodeError> {
        let tag = PropertyTag::read(cursor)?;
        trace!("tagged value {} ({:?})", tag, tag.prop_type);
        let value = PropValue::decode(cursor, tag.prop_type, layout)?;
        Ok(Self { tag, value })
    }

    pub fn write(&self, out: &mut Vec<u8>, layout: ValueLayout, string8_encoding: &'static Encoding) -> Result<(), EncodeError> {
        self.tag.write(out);
        self.value.write(out, layout, string8_encoding)
    }
}


macro_rules! decode_multiple {
    ($cursor:expr, $layout:expr, $variant:ident, $read:expr) => {{
        let count = $layout.read_count($cursor)?;
        let mut values = Vec::with_capacity(count.min($cursor.remaining()));
        for _ in 0..count {
            values.push($read(&mut *$cursor)?);
        }
        PropValue::$variant(values)
    }};
}

macro_rules! write_multiple {
    ($out:expr, $layout:expr, $values:expr, $write:expr) => {{
        $layout.write_count($out, "multi-valued property", $values.len())?;
        for value in $values {
            $write(&mut *$out, value)?;
        }
    }};
}


impl PropValue {
    pub fn prop_type(&self) -> PropType {
        match self {
            Self::Unspecified => PropType::Unspecified,
            Self::Null => PropType::Null,
            Self::Integer16(_) => PropType::Integer16,
            Self::Integer32(_) => PropType::Integer32,
            Self::Floating32(_) => PropType::Floating32,
            Self::Floating64(_) => PropType::Floating64,
            Self::Currency(_) => PropType::Currency,
            Self::FloatingTime(_) => PropType::FloatingTime,
            Self::ErrorCode(_) => PropType::ErrorCode,
            Self::Boolean(_) => PropType::Boolean,
            Self::Integer64(_) => PropType::Integer64,
            Self::String8(_) => PropType::String8,
            Self::String(_) => PropType::String,
            Self::Time(_) => PropType::Time,
            Self::Guid(_) => PropType::Guid,
            Self::ServerId(_) => PropType::ServerId,
            Self::Binary(_) => PropType::Binary,
            Self::MultipleInteger16(_) => PropType::MultipleInteger16,
            Self::MultipleInteger32(_) => PropType::MultipleInteger32,
            Self::MultipleFloating32(_) => PropType::MultipleFloating32,
            Self::MultipleFloating64(_) => PropType::MultipleFloating64,
            Self::MultipleCurrency(_) => PropType::MultipleCurrency,
            Self::MultipleFloatingTime(_) => PropType::MultipleFloatingTime,
            Self::MultipleInteger64(_) => PropType::MultipleInteger64,
            Self::MultipleString8(_) => PropType::MultipleString8,
            Self::MultipleString(_) => PropType::MultipleString,
            Self::MultipleTime(_) => PropType::MultipleTime,
            Self::MultipleGuid(_) => PropType::MultipleGuid,
            Self::MultipleBinary(_) => PropType::MultipleBinary,
        }
    }

    pub fn decode(cursor: &mut ByteCursor<'_>, prop_type: PropType, layout: ValueLayout) -> Result<Self, DecodeError> {
        let value = match prop_type {
            PropType::Unspecified => PropValue::Unspecified,
            PropType::Null => PropValue::Null,
            PropType::Integer16 => PropValue::Integer16(cursor.read_i16_le()?),
            PropType::Integer32 => PropValue::Integer32(cursor.read_i32_le()?),
            PropType::Floating32 => PropValue::Floating32(cursor.read_f32_le()?),
            PropType::Floating64 => PropValue::Floating64(cursor.read_f64_le()?),
            PropType::Currency => PropValue::Currency(cursor.read_i64_le()?),
            PropType::FloatingTime => PropValue::FloatingTime(cursor.read_f64_le()?),
            PropType::ErrorCode => PropValue::ErrorCode(cursor.read_u32_le()?),
            PropType::Boolean => PropValue::Boolean(read_boolean(cursor, layout)?),
            PropType::Integer64 => PropValue::Integer64(cursor.read_i64_le()?),
            PropType::String8 => PropValue::String8(read_string8(cursor, layout)?),
            PropType::String => PropValue::String(read_string(cursor, layout)?),
            PropType::Time => PropValue::Time(cursor.read_i64_le()?),
            PropType::Guid => PropValue::Guid(Guid::read(cursor, GuidByteOrder::LittleEndian)?),
            PropType::ServerId => PropValue::ServerId(read_binary(cursor, layout)?),
            PropType::Binary => PropValue::Binary(read_binary(cursor, layout)?),
            PropType::MultipleInteger16
                => decode_multiple!(cursor, layout, MultipleInteger16, |c: &mut ByteCursor<'_>| c.read_i16_le()),
            PropType::MultipleInteger32
                => decode_multiple!(cursor, layout, MultipleInteger32, |c: &mut ByteCursor<'_>| c.read_i32_le()),
            PropType::MultipleFloating32
                => decode_multiple!(cursor, layout, MultipleFloating32, |c: &mut ByteCursor<'_>| c.read_f32_le()),
            PropType::MultipleFloating64
                => decode_multiple!(cursor, layout, MultipleFloating64, |c: &mut ByteCursor<'_>| c.read_f64_le()),
            PropType::MultipleCurrency
                => decode_multiple!(cursor, layout, MultipleCurrency, |c: &mut ByteCursor<'_>| c.read_i64_le()),
            PropType::MultipleFloatingTime
                => decode_multiple!(cursor, layout, MultipleFloatingTime, |c: &mut ByteCursor<'_>| c.read_f64_le()),
            PropType::MultipleInteger64
                => decode_multiple!(cursor, layout, MultipleInteger64, |c: &mut ByteCursor<'_>| c.read_i64_le()),
            PropType::MultipleTime
                => decode_multiple!(cursor, layout, MultipleTime, |c: &mut ByteCursor<'_>| c.read_i64_le()),
            PropType::MultipleGuid
                => decode_multiple!(cursor, layout, MultipleGuid, |c: &mut ByteCursor<'_>| Guid::read(c, GuidByteOrder::LittleEndian)),
            PropType::MultipleString8
                => decode_multiple!(cursor, layout, MultipleString8, |c: &mut ByteCursor<'_>| read_string8(c, layout)),
            PropType::MultipleString
                => decode_multiple!(cursor, layout, MultipleString, |c: &mut ByteCursor<'_>| read_string(c, layout)),
            PropType::MultipleBinary
                => decode_multiple!(cursor, layout, MultipleBinary, |c: &mut ByteCursor<'_>| read_binary(c, layout)),
            PropType::Object|PropType::Restriction|PropType::RuleAction|PropType::Other(_) => {
                return Err(DecodeError::UnknownDiscriminant {
                    field: "property type",
                    value: u16::from(prop_type).into(),
                });
            },
        };
        Ok(value)
    }

    pub fn write(&self, out: &mut Vec<u8>, layout: ValueLayout, string8_encoding: &'static Encoding) -> Result<(), EncodeError> {
        match self {
            Self::Unspecified|Self::Null => {},
            Self::Integer16(v) => out.write_i16_le(*v),
            Self::Integer32(v) => out.write_i32_le(*v),
            Self::Floating32(v) => out.write_bytes(&v.to_le_bytes()),
            Self::Floating64(v)|Self::FloatingTime(v) => out.write_f64_le(*v),
            Self::Currency(v)|Self::Integer64(v)|Self::Time(v) => out.write_i64_le(*v),
            Self::ErrorCode(v) => out.write_u32_le(*v),
            Self::Boolean(v) => write_boolean(out, layout, *v),
            Self::String8(s) => write_string8(out, layout, s, string8_encoding)?,
            Self::String(s) => write_string(out, layout, s)?,
            Self::Guid(g) => g.write(out, GuidByteOrder::LittleEndian),
            Self::ServerId(bs)|Self::Binary(bs) => write_binary(out, layout, bs)?,
            Self::MultipleInteger16(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &i16| -> Result<(), EncodeError> { o.write_i16_le(*v); Ok(()) }),
            Self::MultipleInteger32(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &i32| -> Result<(), EncodeError> { o.write_i32_le(*v); Ok(()) }),
            Self::MultipleFloating32(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &f32| -> Result<(), EncodeError> { o.write_bytes(&v.to_le_bytes()); Ok(()) }),
            Self::MultipleFloating64(vs)|Self::MultipleFloatingTime(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &f64| -> Result<(), EncodeError> { o.write_f64_le(*v); Ok(()) }),
            Self::MultipleCurrency(vs)|Self::MultipleInteger64(vs)|Self::MultipleTime(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &i64| -> Result<(), EncodeError> { o.write_i64_le(*v); Ok(()) }),
            Self::MultipleGuid(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &Guid| -> Result<(), EncodeError> { v.write(o, GuidByteOrder::LittleEndian); Ok(()) }),
            Self::MultipleString8(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &String| write_string8(o, layout, v, string8_encoding)),
            Self::MultipleString(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &String| write_string(o, layout, v)),
            Self::MultipleBinary(vs)
                => write_multiple!(out, layout, vs, |o: &mut Vec<u8>, v: &Vec<u8>| write_binary(o, layout, v)),
        }
        Ok(())
    }
}


fn read_boolean(cursor: &mut ByteCursor<'_>, layout: ValueLayout) -> Result<bool, DecodeError> {
    // search folder booleans are padded to 16 bits
    let value = match layout {
        ValueLayout::Rule(_) => u16::from(cursor.read_u8()?),
        ValueLayout::SearchFolder => cursor.read_u16_le()?,
    };
    match value {
        0x0000 => Ok(false),
        0x0001 => Ok(true),
        other => Err(DecodeError::InvalidBoolean { obtained: other }),
    }
}

fn write_boolean(out: &mut Vec<u8>, layout: ValueLayout, value: bool) {
    match layout {
        ValueLayout::Rule(_) => out.write_u8(value.into()),
        ValueLayout::SearchFolder => out.write_u16_le(value.into()),
    }
}

fn read_binary(cursor: &mut ByteCursor<'_>, layout: ValueLayout) -> Result<Vec<u8>, DecodeError> {
    let byte_count = layout.read_count(cursor)?;
    Ok(cursor.read_bytes(byte_count)?.to_vec())
}

fn write_binary(out: &mut Vec<u8>, layout: ValueLayout, bytes: &[u8]) -> Result<(), EncodeError> {
    layout.write_count(out, "binary value", bytes.len())?;
    out.write_bytes(bytes);
    Ok(())
}

fn read_string(cursor: &mut ByteCursor<'_>, layout: ValueLayout) -> Result<String, DecodeError> {
    match layout {
        ValueLayout::Rule(_) => cursor.read_utf16_nul_terminated(),
        ValueLayout::SearchFolder => {
            let byte_length = length_to_usize(cursor.read_u32_le()?.into())?;
            if byte_length % 2 != 0 {
                return Err(DecodeError::OddStringLength { byte_length });
            }
            let mut string = cursor.read_utf16(byte_length / 2)?;
            if string.pop() != Some('\0') {
                return Err(DecodeError::MissingTerminator { field: "PtypString value" });
            }
            Ok(string)
        },
    }
}

fn write_string(out: &mut Vec<u8>, layout: ValueLayout, s: &str) -> Result<(), EncodeError> {
    if let ValueLayout::SearchFolder = layout {
        let byte_length = (s.encode_utf16().count() + 1) * 2;
        out.write_u32_le(encode_length("PtypString value", byte_length)?);
    }
    out.write_utf16_le(s);
    out.write_u16_le(0x0000);
    Ok(())
}

fn read_string8(cursor: &mut ByteCursor<'_>, layout: ValueLayout) -> Result<String, DecodeError> {
    match layout {
        ValueLayout::Rule(_) => cursor.read_string8_nul_terminated(),
        ValueLayout::SearchFolder => {
            let byte_length = length_to_usize(cursor.read_u32_le()?.into())?;
            if byte_length == 0 {
                return Err(DecodeError::MissingTerminator { field: "PtypString8 value" });
            }
            let mut value_cursor = cursor.sub_cursor(byte_length)?;
            let string = value_cursor.read_string8(byte_length - 1)?;
            if value_cursor.read_u8()? != 0x00 {
                return Err(DecodeError::MissingTerminator { field: "PtypString8 value" });
            }
            Ok(string)
        },
    }
}

fn write_string8(out: &mut Vec<u8>, layout: ValueLayout, s: &str, encoding: &'static Encoding) -> Result<(), EncodeError> {
    let (bytes, _encoding_used, _had_unmappable) = encoding.encode(s);
    if let ValueLayout::SearchFolder = layout {
        out.write_u32_le(encode_length("PtypString8 value", bytes.len() + 1)?);
    }
    out.write_bytes(&bytes);
    out.write_u8(0x00);
    Ok(())
}
