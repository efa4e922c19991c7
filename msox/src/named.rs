use from_to_repr::FromToRepr;
use log::debug;

use crate::binread::{length_to_usize, ByteCursor};
use crate::error::DecodeError;
use crate::guid::{Guid, GuidByteOrder};


#[derive(Clone, Copy, Debug, Eq, FromToRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum PropertyNameKind {
    Lid = 0x00,
    Name = 0x01,
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum PropertyNameId {
    Lid(u32),
    Name(String),
}

/// Identifies a named property by property set and LID or string name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PropertyName {
    pub guid: Guid,
    pub id: PropertyNameId,
}
impl PropertyName {
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let kind_u8 = cursor.read_u8()?;
        let kind = PropertyNameKind::try_from_repr(kind_u8)
            .ok_or(DecodeError::UnknownDiscriminant { field: "PropertyName Kind", value: kind_u8.into() })?;
        let guid = Guid::read(cursor, GuidByteOrder::LittleEndian)?;
        let id = match kind {
            PropertyNameKind::Lid => PropertyNameId::Lid(cursor.read_u32_le()?),
            PropertyNameKind::Name => {
                let name_size: usize = cursor.read_u8()?.into();
                if name_size % 2 != 0 {
                    return Err(DecodeError::OddStringLength { byte_length: name_size });
                }
                PropertyNameId::Name(cursor.read_utf16(name_size / 2)?)
            },
        };
        Ok(Self {
            guid,
            id,
        })
    }
}


/// Maps the property IDs used inside an extended rule buffer to names.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NamedPropertyInformation {
    pub prop_ids: Vec<u16>,
    pub named_properties_size: u32,
    pub named_properties: Vec<PropertyName>,
}
impl NamedPropertyInformation {
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let count: usize = cursor.read_u16_le()?.into();
        debug!("{} named properties", count);
        if count == 0 {
            return Ok(Self::default());
        }

        let mut prop_ids = Vec::with_capacity(count);
        for _ in 0..count {
            prop_ids.push(cursor.read_u16_le()?);
        }

        let named_properties_size = cursor.read_u32_le()?;
        let mut names_cursor = cursor.sub_cursor(length_to_usize(named_properties_size.into())?)?;
        let mut named_properties = Vec::with_capacity(count);
        for _ in 0..count {
            named_properties.push(PropertyName::decode(&mut names_cursor)?);
        }
        names_cursor.finish()?;

        Ok(Self {
            prop_ids,
            named_properties_size,
            named_properties,
        })
    }

    /// Looks up the name of a property ID used in the accompanying buffer.
    pub fn name_of(&self, prop_id: u16) -> Option<&PropertyName> {
        let index = self.prop_ids.iter().position(|&id| id == prop_id)?;
        self.named_properties.get(index)
    }
}
