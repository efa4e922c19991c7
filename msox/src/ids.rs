//! Object identifiers and entry IDs embedded in rule actions.

use std::fmt;

use log::trace;

use crate::binread::ByteCursor;
use crate::error::DecodeError;
use crate::guid::{Guid, GuidByteOrder};


/// A FolderID or MessageID: a replica ID followed by a 6-byte global counter.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId {
    pub replica_id: u16,
    pub global_counter: [u8; 6],
}
impl ObjectId {
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let replica_id = cursor.read_u16_le()?;
        let global_counter = cursor.read_array::<6>()?;
        Ok(Self {
            replica_id,
            global_counter,
        })
    }

    /// The global counter as a number; it is stored big-endian.
    pub fn counter(&self) -> u64 {
        self.global_counter.iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }
}
impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:X}", self.replica_id, self.counter())
    }
}

pub type FolderId = ObjectId;
pub type MessageId = ObjectId;


/// Identifies a folder in the same store as the rule that references it.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ServerEid {
    pub ours: bool,
    pub folder_id: FolderId,
    pub message_id: MessageId,
    pub instance: u32,
}
impl ServerEid {
    pub const SIZE: usize = 21;

    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let ours = match cursor.read_u8()? {
            0x00 => false,
            0x01 => true,
            other => return Err(DecodeError::UnknownDiscriminant { field: "ServerEid Ours", value: other.into() }),
        };
        let folder_id = FolderId::read(cursor)?;
        let message_id = MessageId::read(cursor)?;
        let instance = cursor.read_u32_le()?;
        Ok(Self {
            ours,
            folder_id,
            message_id,
            instance,
        })
    }
}


/// Entry ID of a folder in a private or public store.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FolderEntryId {
    pub flags: u32,
    pub provider_uid: Guid,
    pub folder_type: u16,
    pub database_guid: Guid,
    pub global_counter: [u8; 6],
}
impl FolderEntryId {
    pub const SIZE: usize = 46;

    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let flags = cursor.read_u32_le()?;
        let provider_uid = Guid::read(cursor, GuidByteOrder::Native)?;
        let folder_type = cursor.read_u16_le()?;
        let database_guid = Guid::read(cursor, GuidByteOrder::LittleEndian)?;
        let global_counter = cursor.read_array::<6>()?;
        let _pad = cursor.read_u16_le()?;
        Ok(Self {
            flags,
            provider_uid,
            folder_type,
            database_guid,
            global_counter,
        })
    }
}


/// Entry ID of a message in a private or public store.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MessageEntryId {
    pub flags: u32,
    pub provider_uid: Guid,
    pub message_type: u16,
    pub folder_database_guid: Guid,
    pub folder_global_counter: [u8; 6],
    pub message_database_guid: Guid,
    pub message_global_counter: [u8; 6],
}
impl MessageEntryId {
    pub const SIZE: usize = 70;

    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let flags = cursor.read_u32_le()?;
        let provider_uid = Guid::read(cursor, GuidByteOrder::Native)?;
        let message_type = cursor.read_u16_le()?;
        let folder_database_guid = Guid::read(cursor, GuidByteOrder::LittleEndian)?;
        let folder_global_counter = cursor.read_array::<6>()?;
        let _pad1 = cursor.read_u16_le()?;
        let message_database_guid = Guid::read(cursor, GuidByteOrder::LittleEndian)?;
        let message_global_counter = cursor.read_array::<6>()?;
        let _pad2 = cursor.read_u16_le()?;
        Ok(Self {
            flags,
            provider_uid,
            message_type,
            folder_database_guid,
            folder_global_counter,
            message_database_guid,
            message_global_counter,
        })
    }
}


/// Entry ID of a message store, wrapping the store provider's own entry ID.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StoreObjectEntryId {
    pub flags: u32,
    pub provider_uid: Guid,
    pub version: u8,
    pub flag: u8,
    pub dll_file_name: String,
    pub wrapped_flags: u32,
    pub wrapped_provider_uid: Guid,
    pub wrapped_type: u32,
    pub server_short_name: String,
    pub mailbox_dn: Option<String>,
    /// Version-specific fields following the mailbox DN, kept verbatim.
    pub extension: Vec<u8>,
}
impl StoreObjectEntryId {
    /// Decodes an entry ID that fills the whole cursor.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let flags = cursor.read_u32_le()?;
        let provider_uid = Guid::read(cursor, GuidByteOrder::Native)?;
        let version = cursor.read_u8()?;
        let flag = cursor.read_u8()?;

        // "emsmdb.dll" padded with NULs to 14 bytes
        let mut dll_cursor = cursor.sub_cursor(14)?;
        let dll_file_name = dll_cursor.read_string8_nul_terminated()?;

        let wrapped_flags = cursor.read_u32_le()?;
        let wrapped_provider_uid = Guid::read(cursor, GuidByteOrder::Native)?;
        let wrapped_type = cursor.read_u32_le()?;
        let server_short_name = cursor.read_string8_nul_terminated()?;
        trace!("store entry ID for server {:?}", server_short_name);

        let mailbox_dn = if cursor.is_empty() {
            None
        } else {
            Some(cursor.read_string8_nul_terminated()?)
        };
        let extension = cursor.read_bytes(cursor.remaining())?.to_vec();

        Ok(Self {
            flags,
            provider_uid,
            version,
            flag,
            dll_file_name,
            wrapped_flags,
            wrapped_provider_uid,
            wrapped_type,
            server_short_name,
            mailbox_dn,
            extension,
        })
    }
}
