use std::fmt;

use uuid::Uuid;

use crate::binread::{ByteCursor, Endianness};
use crate::binwrite::BinaryWriter;
use crate::error::DecodeError;


/// How the integer fields of a serialized GUID are laid out.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum GuidByteOrder {
    /// The bytes are kept in the order they are stored (RFC 4122 layout).
    Native,
    /// `data1`, `data2` and `data3` are little-endian (the Windows GUID layout).
    LittleEndian,
    /// `data1`, `data2` and `data3` are big-endian.
    BigEndian,
}


#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}
impl Guid {
    pub const fn nil() -> Self {
        Self { data1: 0, data2: 0, data3: 0, data4: [0; 8] }
    }

    pub fn read(cursor: &mut ByteCursor<'_>, byte_order: GuidByteOrder) -> Result<Self, DecodeError> {
        let endianness = match byte_order {
            GuidByteOrder::LittleEndian => Endianness::Little,
            GuidByteOrder::Native|GuidByteOrder::BigEndian => Endianness::Big,
        };
        let data1 = cursor.read_u32(endianness)?;
        let data2 = cursor.read_u16(endianness)?;
        let data3 = cursor.read_u16(endianness)?;
        let data4 = cursor.read_array::<8>()?;
        Ok(Self {
            data1,
            data2,
            data3,
            data4,
        })
    }

    pub fn write(&self, out: &mut Vec<u8>, byte_order: GuidByteOrder) {
        match byte_order {
            GuidByteOrder::LittleEndian => {
                out.write_u32_le(self.data1);
                out.write_u16_le(self.data2);
                out.write_u16_le(self.data3);
            },
            GuidByteOrder::Native|GuidByteOrder::BigEndian => {
                out.write_u32_be(self.data1);
                out.write_u16_be(self.data2);
                out.write_u16_be(self.data3);
            },
        }
        out.write_bytes(&self.data4);
    }

    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Uuid::from_bytes_le(bytes).into()
    }

    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Uuid::from_bytes(bytes).into()
    }

    pub fn to_le_bytes(&self) -> [u8; 16] {
        Uuid::from(*self).to_bytes_le()
    }

    pub fn to_be_bytes(&self) -> [u8; 16] {
        *Uuid::from(*self).as_bytes()
    }
}
impl From<Uuid> for Guid {
    fn from(uuid: Uuid) -> Self {
        let (data1, data2, data3, data4) = uuid.as_fields();
        Self {
            data1,
            data2,
            data3,
            data4: *data4,
        }
    }
}
impl From<Guid> for Uuid {
    fn from(guid: Guid) -> Self {
        Uuid::from_fields(guid.data1, guid.data2, guid.data3, &guid.data4)
    }
}
impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,
            "{:08X}-{:04X}-{:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
            self.data1, self.data2, self.data3,
            self.data4[0], self.data4[1], self.data4[2], self.data4[3], self.data4[4], self.data4[5], self.data4[6], self.data4[7],
        )
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    const PS_MAPI_LE: [u8; 16] = [
        0x28, 0x03, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00,
        0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
    ];

    #[test]
    fn little_endian_layout() {
        let mut cursor = ByteCursor::new(&PS_MAPI_LE);
        let guid = Guid::read(&mut cursor, GuidByteOrder::LittleEndian).unwrap();
        assert_eq!("00020328-0000-0000-C000-000000000046", guid.to_string());
        assert_eq!(PS_MAPI_LE, guid.to_le_bytes());
        assert!(cursor.is_empty());
    }

    #[test]
    fn native_matches_big_endian() {
        let mut native = ByteCursor::new(&PS_MAPI_LE);
        let mut big = ByteCursor::new(&PS_MAPI_LE);
        assert_eq!(
            Guid::read(&mut native, GuidByteOrder::Native).unwrap(),
            Guid::read(&mut big, GuidByteOrder::BigEndian).unwrap(),
        );
        let mut again = ByteCursor::new(&PS_MAPI_LE);
        let guid = Guid::read(&mut again, GuidByteOrder::Native).unwrap();
        assert_eq!(0x2803_0200, guid.data1);
        assert_eq!(PS_MAPI_LE, guid.to_be_bytes());
    }

    #[test]
    fn truncated() {
        let mut cursor = ByteCursor::new(&PS_MAPI_LE[0..15]);
        assert!(Guid::read(&mut cursor, GuidByteOrder::LittleEndian).is_err());
    }

    proptest! {
        #[test]
        fn round_trip(bytes in prop::array::uniform16(any::<u8>())) {
            for byte_order in [GuidByteOrder::Native, GuidByteOrder::LittleEndian, GuidByteOrder::BigEndian] {
                let mut cursor = ByteCursor::new(&bytes);
                let guid = Guid::read(&mut cursor, byte_order).unwrap();
                let mut out = Vec::new();
                guid.write(&mut out, byte_order);
                prop_assert_eq!(&bytes[..], &out[..]);
            }
        }

        #[test]
        fn uuid_conversion(bytes in prop::array::uniform16(any::<u8>())) {
            let guid = Guid::from_le_bytes(bytes);
            prop_assert_eq!(bytes, guid.to_le_bytes());
            prop_assert_eq!(Uuid::from_bytes_le(bytes), Uuid::from(guid));
        }
    }
}
