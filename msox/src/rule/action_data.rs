use from_to_repr::FromToRepr;
use log::{debug, trace};

use crate::PropValue;
use crate::binread::ByteCursor;
use crate::error::DecodeError;
use crate::guid::{Guid, GuidByteOrder};
use crate::ids::{FolderEntryId, FolderId, MessageEntryId, MessageId, ServerEid, StoreObjectEntryId};
use crate::rule::{ActionType, RuleFormat};
use crate::value::{PropertyTag, TaggedPropertyValue, ValueLayout};


/// The payload of an action block; its shape depends on the action type.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionData {
    MoveCopy(MoveCopyActionData),
    Reply(ReplyActionData),
    /// Client-private data of a deferred action.
    Defer(Vec<u8>),
    ForwardDelegate(ForwardDelegateActionData),
    Bounce(BounceCode),
    Tag(TaggedPropertyValue),
}
impl ActionData {
    /// Decodes the payload filling the rest of an action block.
    ///
    /// Delete and mark-as-read actions have no payload and yield `None`.
    pub fn decode(cursor: &mut ByteCursor<'_>, action_type: ActionType, format: RuleFormat) -> Result<Option<Self>, DecodeError> {
        let data = match action_type {
            ActionType::Move|ActionType::Copy
                => ActionData::MoveCopy(MoveCopyActionData::decode(cursor, format)?),
            ActionType::Reply|ActionType::OofReply
                => ActionData::Reply(ReplyActionData::decode(cursor, format)?),
            ActionType::DeferAction
                => ActionData::Defer(cursor.read_bytes(cursor.remaining())?.to_vec()),
            ActionType::Forward|ActionType::Delegate
                => ActionData::ForwardDelegate(ForwardDelegateActionData::decode(cursor, format)?),
            ActionType::Bounce => {
                let code_u32 = cursor.read_u32_le()?;
                let code = BounceCode::try_from_repr(code_u32)
                    .ok_or(DecodeError::UnknownDiscriminant { field: "BounceCode", value: code_u32 })?;
                ActionData::Bounce(code)
            },
            ActionType::Tag
                => ActionData::Tag(TaggedPropertyValue::decode(cursor, ValueLayout::Rule(format))?),
            ActionType::Delete|ActionType::MarkAsRead
                => return Ok(None),
        };
        Ok(Some(data))
    }
}


/// Target folder of a move or copy action.
#[derive(Clone, Debug, PartialEq)]
pub enum MoveCopyActionData {
    /// Standard rule moving into a folder of the same store.
    SameStore { folder: ServerEid },
    /// Standard rule moving into a folder of another store. The folder entry
    /// ID is opaque to the server owning the rule.
    OtherStore { store: StoreObjectEntryId, folder_entry_id: Vec<u8> },
    /// Extended rule; these always target the store the rule lives in.
    Extended { folder: FolderEntryId },
}
impl MoveCopyActionData {
    pub fn decode(cursor: &mut ByteCursor<'_>, format: RuleFormat) -> Result<Self, DecodeError> {
        match format {
            RuleFormat::Standard => Self::decode_standard(cursor),
            RuleFormat::Extended => Self::decode_extended(cursor),
        }
    }

    fn decode_standard(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let folder_in_this_store = match cursor.read_u8()? {
            0x00 => false,
            0x01 => true,
            other => return Err(DecodeError::UnknownDiscriminant { field: "FolderInThisStore", value: other.into() }),
        };

        let store_eid_size: usize = cursor.read_u16_le()?.into();
        let mut store_cursor = cursor.sub_cursor(store_eid_size)?;
        let folder_eid_size: usize = cursor.read_u16_le()?.into();
        let mut folder_cursor = cursor.sub_cursor(folder_eid_size)?;
        debug!("move/copy to {} store", if folder_in_this_store { "this" } else { "another" });

        if folder_in_this_store {
            // the store entry ID is meaningless here
            let folder = ServerEid::decode(&mut folder_cursor)?;
            folder_cursor.finish()?;
            Ok(Self::SameStore { folder })
        } else {
            let store = StoreObjectEntryId::decode(&mut store_cursor)?;
            let folder_entry_id = folder_cursor.read_bytes(folder_eid_size)?.to_vec();
            Ok(Self::OtherStore { store, folder_entry_id })
        }
    }

    fn decode_extended(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let store_eid_size = RuleFormat::Extended.read_count(cursor)?;
        cursor.skip(store_eid_size)?;

        let folder_eid_size = RuleFormat::Extended.read_count(cursor)?;
        let mut folder_cursor = cursor.sub_cursor(folder_eid_size)?;
        let folder = FolderEntryId::decode(&mut folder_cursor)?;
        folder_cursor.finish()?;
        Ok(Self::Extended { folder })
    }
}


/// Message used as the template of a reply.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReplyTemplate {
    Ids { folder_id: FolderId, message_id: MessageId },
    EntryId(MessageEntryId),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ReplyActionData {
    pub template: ReplyTemplate,
    pub template_guid: Guid,
}
impl ReplyActionData {
    pub fn decode(cursor: &mut ByteCursor<'_>, format: RuleFormat) -> Result<Self, DecodeError> {
        let template = match format {
            RuleFormat::Standard => {
                let folder_id = FolderId::read(cursor)?;
                let message_id = MessageId::read(cursor)?;
                ReplyTemplate::Ids { folder_id, message_id }
            },
            RuleFormat::Extended => {
                let message_eid_size = format.read_count(cursor)?;
                let mut message_cursor = cursor.sub_cursor(message_eid_size)?;
                let entry_id = MessageEntryId::decode(&mut message_cursor)?;
                message_cursor.finish()?;
                ReplyTemplate::EntryId(entry_id)
            },
        };
        let template_guid = Guid::read(cursor, GuidByteOrder::LittleEndian)?;
        Ok(Self {
            template,
            template_guid,
        })
    }
}


/// One recipient of a forward or delegate action.
#[derive(Clone, Debug, PartialEq)]
pub struct RecipientBlock {
    pub reserved: u8,
    pub properties: Vec<TaggedPropertyValue>,
}
impl RecipientBlock {
    pub fn decode(cursor: &mut ByteCursor<'_>, format: RuleFormat) -> Result<Self, DecodeError> {
        let reserved = cursor.read_u8()?;
        let property_count = format.read_count(cursor)?;
        trace!("recipient with {} properties", property_count);
        let mut properties = Vec::with_capacity(property_count.min(cursor.remaining()));
        for _ in 0..property_count {
            properties.push(TaggedPropertyValue::decode(cursor, ValueLayout::Rule(format))?);
        }
        Ok(Self {
            reserved,
            properties,
        })
    }

    pub fn property(&self, tag: PropertyTag) -> Option<&PropValue> {
        self.properties.iter()
            .find(|p| p.tag == tag)
            .map(|p| &p.value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ForwardDelegateActionData {
    pub recipients: Vec<RecipientBlock>,
}
impl ForwardDelegateActionData {
    pub fn decode(cursor: &mut ByteCursor<'_>, format: RuleFormat) -> Result<Self, DecodeError> {
        let recipient_count = format.read_count(cursor)?;
        if recipient_count == 0 {
            return Err(DecodeError::ZeroCount { field: "RecipientCount" });
        }
        let mut recipients = Vec::with_capacity(recipient_count.min(cursor.remaining()));
        for _ in 0..recipient_count {
            recipients.push(RecipientBlock::decode(cursor, format)?);
        }
        Ok(Self { recipients })
    }
}


#[derive(Clone, Copy, Debug, Eq, FromToRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u32)]
pub enum BounceCode {
    MessageTooLarge = 0x0000_000D,
    CannotDisplay = 0x0000_001F,
    AccessDenied = 0x0000_0026,
}
