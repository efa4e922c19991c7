use std::fmt;

use log::trace;

use crate::binread::ByteCursor;
use crate::binwrite::{encode_length, BinaryWriter};
use crate::error::{DecodeError, EncodeError};
use crate::guid::{Guid, GuidByteOrder};


/// An external identifier: a namespace GUID followed by a local ID.
///
/// The local ID is not self-describing; its length is the total XID size
/// minus 16, and the size must come from whoever frames the XID.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Xid {
    pub namespace_guid: Guid,
    pub local_id: Vec<u8>,
}
impl Xid {
    pub const GUID_SIZE: usize = 16;

    pub fn decode(cursor: &mut ByteCursor<'_>, size: usize) -> Result<Self, DecodeError> {
        if size < Self::GUID_SIZE {
            return Err(DecodeError::XidSize { size });
        }
        let namespace_guid = Guid::read(cursor, GuidByteOrder::LittleEndian)?;
        let local_id = cursor.read_bytes(size - Self::GUID_SIZE)?.to_vec();
        Ok(Self {
            namespace_guid,
            local_id,
        })
    }

    pub fn size(&self) -> usize {
        Self::GUID_SIZE + self.local_id.len()
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        self.namespace_guid.write(out, GuidByteOrder::LittleEndian);
        out.write_bytes(&self.local_id);
    }
}
impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.namespace_guid)?;
        for b in &self.local_id {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}


/// An XID preceded by its one-byte size.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SizedXid {
    pub size: u8,
    pub xid: Xid,
}
impl SizedXid {
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let size = cursor.read_u8()?;
        let xid = Xid::decode(cursor, size.into())?;
        Ok(Self {
            size,
            xid,
        })
    }

    pub fn new(xid: Xid) -> Result<Self, EncodeError> {
        let size = encode_length("XID", xid.size())?;
        Ok(Self { size, xid })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.write_u8(self.size);
        self.xid.write(out);
    }
}


/// The change history of an object: one XID per replica that changed it.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PredecessorChangeList {
    pub xids: Vec<Xid>,
}
impl PredecessorChangeList {
    /// Decodes SizedXid records until the cursor is exhausted.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let mut xids = Vec::new();
        while !cursor.is_empty() {
            let sized = SizedXid::decode(cursor)?;
            trace!("predecessor change {}", sized.xid);
            xids.push(sized.xid);
        }
        cursor.finish()?;
        Ok(Self { xids })
    }

    pub fn write(&self, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        for xid in &self.xids {
            SizedXid::new(xid.clone())?.write(out);
        }
        Ok(())
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use crate::error::DecodeErrorKind;

    fn xid_strategy() -> impl Strategy<Value = Xid> {
        (prop::array::uniform16(any::<u8>()), prop::collection::vec(any::<u8>(), 1..=8))
            .prop_map(|(guid, local_id)| Xid { namespace_guid: Guid::from_le_bytes(guid), local_id })
    }

    #[test]
    fn twenty_byte_xid() {
        let mut buf = vec![
            0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE,
            0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF,
        ];
        buf.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        let mut cursor = ByteCursor::new(&buf);
        let xid = Xid::decode(&mut cursor, 20).unwrap();
        assert_eq!(vec![0x01, 0x02, 0x03, 0x04], xid.local_id);
        assert_eq!(0x7654_3210, xid.namespace_guid.data1);
        assert!(cursor.is_empty());
    }

    #[test]
    fn undersized_xid() {
        let buf = [0u8; 32];
        for size in 0..16 {
            let mut cursor = ByteCursor::new(&buf);
            let err = Xid::decode(&mut cursor, size).unwrap_err();
            assert_eq!(DecodeErrorKind::Truncated, err.kind());
        }
    }

    #[test]
    fn stray_byte_after_change_list() {
        let xid = Xid { namespace_guid: Guid::nil(), local_id: vec![0x00, 0x00, 0x00, 0x01] };
        let list = PredecessorChangeList { xids: vec![xid] };
        let mut buf = Vec::new();
        list.write(&mut buf).unwrap();
        buf.push(0x14);
        let mut cursor = ByteCursor::new(&buf);
        assert!(PredecessorChangeList::decode(&mut cursor).is_err());
    }

    #[test]
    fn empty_change_list() {
        let mut cursor = ByteCursor::new(&[]);
        assert!(PredecessorChangeList::decode(&mut cursor).unwrap().xids.is_empty());
    }

    #[test]
    fn oversized_local_id_does_not_encode() {
        let xid = Xid { namespace_guid: Guid::nil(), local_id: vec![0u8; 240] };
        assert!(SizedXid::new(xid).is_err());
    }

    proptest! {
        #[test]
        fn xid_size_invariant(
            size in 16usize..64,
            bytes in prop::collection::vec(any::<u8>(), 64),
        ) {
            let mut cursor = ByteCursor::new(&bytes[..size]);
            let xid = Xid::decode(&mut cursor, size).unwrap();
            prop_assert_eq!(size - 16, xid.local_id.len());
            prop_assert_eq!(&bytes[16..size], &xid.local_id[..]);
            prop_assert_eq!(Guid::from_le_bytes(bytes[..16].try_into().unwrap()), xid.namespace_guid);
            prop_assert!(cursor.is_empty());
        }

        #[test]
        fn change_list_exhaustion(xids in prop::collection::vec(xid_strategy(), 0..6)) {
            let mut buf = Vec::new();
            for xid in &xids {
                SizedXid::new(xid.clone()).unwrap().write(&mut buf);
            }
            let mut cursor = ByteCursor::new(&buf);
            let list = PredecessorChangeList::decode(&mut cursor).unwrap();
            prop_assert_eq!(&xids, &list.xids);
            prop_assert_eq!(0, cursor.remaining());

            buf.push(0x00);
            let mut cursor = ByteCursor::new(&buf);
            prop_assert!(PredecessorChangeList::decode(&mut cursor).is_err());
        }
    }
}
