//! Rule actions, in the standard (16-bit counts) and extended (32-bit counts)
//! encodings.
//!
//! The encoding is chosen once per buffer and passed down explicitly to every
//! nested decoder; the bytes themselves do not say which one was used.

pub mod action_data;
pub mod extended;


use bitflags::bitflags;
use from_to_repr::FromToRepr;
use log::{debug, warn};

use crate::binread::{length_to_usize, ByteCursor};
use crate::binwrite::{encode_length, BinaryWriter};
use crate::error::{DecodeError, EncodeError};

pub use crate::rule::action_data::{
    ActionData, BounceCode, ForwardDelegateActionData, MoveCopyActionData, RecipientBlock,
    ReplyActionData, ReplyTemplate,
};
pub use crate::rule::extended::ExtendedRuleMessageActions;


/// Selects the width of counts and lengths in a rule buffer.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum RuleFormat {
    /// Rules stored in PidTagRuleActions; counts and lengths are 16 bits.
    Standard,
    /// Rules stored in FAI messages; counts and lengths are 32 bits.
    Extended,
}
impl RuleFormat {
    pub fn is_standard(&self) -> bool {
        *self == Self::Standard
    }

    /// Reads a count or length field of the width this format prescribes.
    pub fn read_count(&self, cursor: &mut ByteCursor<'_>) -> Result<usize, DecodeError> {
        let count = match self {
            Self::Standard => u32::from(cursor.read_u16_le()?),
            Self::Extended => cursor.read_u32_le()?,
        };
        length_to_usize(count.into())
    }

    pub fn write_count(&self, out: &mut Vec<u8>, field: &'static str, count: usize) -> Result<(), EncodeError> {
        match self {
            Self::Standard => out.write_u16_le(encode_length(field, count)?),
            Self::Extended => out.write_u32_le(encode_length(field, count)?),
        }
        Ok(())
    }
}


#[derive(Clone, Copy, Debug, Eq, FromToRepr, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum ActionType {
    Move = 0x01,
    Copy = 0x02,
    Reply = 0x03,
    OofReply = 0x04,
    DeferAction = 0x05,
    Bounce = 0x06,
    Forward = 0x07,
    Delegate = 0x08,
    Tag = 0x09,
    Delete = 0x0A,
    MarkAsRead = 0x0B,
}


bitflags! {
    /// ActionFlavor bits of forward actions.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ForwardFlavor: u32 {
        const PRESERVE_SENDER = 0x0000_0001;
        const DO_NOT_MUNGE_MESSAGE = 0x0000_0002;
        const FORWARD_AS_ATTACHMENT = 0x0000_0004;
        const SEND_SMS_ALERT = 0x0000_0008;
    }
}

bitflags! {
    /// ActionFlavor bits of reply and OOF reply actions.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ReplyFlavor: u32 {
        const DO_NOT_SEND_TO_ORIGINATOR = 0x0000_0001;
        const USE_STOCK_REPLY_TEMPLATE = 0x0000_0002;
    }
}


/// One action of a rule.
///
/// `action_length` counts every byte of the block after the length field
/// itself: the type, flavor and flags (9 bytes) plus the action data.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionBlock {
    pub action_length: u32,
    pub action_type: ActionType,
    pub action_flavor: u32,
    pub action_flags: u32,
    pub action_data: Option<ActionData>,
}
impl ActionBlock {
    pub const HEADER_SIZE: usize = 9;

    pub fn decode(cursor: &mut ByteCursor<'_>, format: RuleFormat) -> Result<Self, DecodeError> {
        let action_length = match format {
            RuleFormat::Standard => u32::from(cursor.read_u16_le()?),
            RuleFormat::Extended => cursor.read_u32_le()?,
        };
        let mut block = cursor.sub_cursor(length_to_usize(action_length.into())?)?;

        let action_type_u8 = block.read_u8()?;
        let action_type = ActionType::try_from_repr(action_type_u8)
            .ok_or(DecodeError::UnknownDiscriminant { field: "ActionType", value: action_type_u8.into() })?;
        debug!("action {:?} ({} bytes)", action_type, action_length);

        let action_flavor = block.read_u32_le()?;
        let action_flags = block.read_u32_le()?;
        let action_data = ActionData::decode(&mut block, action_type, format)?;

        if !block.is_empty() {
            if block.options().verify_action_length {
                return Err(DecodeError::ActionLengthMismatch {
                    declared: action_length,
                    consumed: block.position(),
                });
            }
            warn!(
                "{:?} action declares {} bytes but uses {}; skipping the rest",
                action_type, action_length, block.position(),
            );
        }

        Ok(Self {
            action_length,
            action_type,
            action_flavor,
            action_flags,
            action_data,
        })
    }

    pub fn forward_flavor(&self) -> Option<ForwardFlavor> {
        match self.action_type {
            ActionType::Forward => Some(ForwardFlavor::from_bits_retain(self.action_flavor)),
            _ => None,
        }
    }

    pub fn reply_flavor(&self) -> Option<ReplyFlavor> {
        match self.action_type {
            ActionType::Reply|ActionType::OofReply => Some(ReplyFlavor::from_bits_retain(self.action_flavor)),
            _ => None,
        }
    }
}


/// The list of actions a rule performs.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleAction {
    pub format: RuleFormat,
    pub action_blocks: Vec<ActionBlock>,
}
impl RuleAction {
    pub fn decode(cursor: &mut ByteCursor<'_>, format: RuleFormat) -> Result<Self, DecodeError> {
        let count = format.read_count(cursor)?;
        debug!("{:?} rule with {} actions", format, count);
        let mut action_blocks = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            action_blocks.push(ActionBlock::decode(cursor, format)?);
        }
        Ok(Self {
            format,
            action_blocks,
        })
    }

    pub fn len(&self) -> usize { self.action_blocks.len() }
    pub fn is_empty(&self) -> bool { self.action_blocks.is_empty() }
}


#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::error::DecodeErrorKind;

    /// Frames an action block around `payload`.
    pub(crate) fn block(format: RuleFormat, action_type: u8, flavor: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        format.write_count(&mut out, "ActionLength", ActionBlock::HEADER_SIZE + payload.len()).unwrap();
        out.write_u8(action_type);
        out.write_u32_le(flavor);
        out.write_u32_le(0);
        out.write_bytes(payload);
        out
    }

    pub(crate) fn rule(format: RuleFormat, blocks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = Vec::new();
        format.write_count(&mut out, "NoOfActions", blocks.len()).unwrap();
        for b in blocks {
            out.write_bytes(b);
        }
        out
    }

    #[test]
    fn standard_delete() {
        let buf = [
            0x01, 0x00,
            0x09, 0x00,
            0x0A,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];
        let mut cursor = ByteCursor::new(&buf);
        let rule = RuleAction::decode(&mut cursor, RuleFormat::Standard).unwrap();
        assert!(cursor.is_empty());
        assert_eq!(1, rule.len());
        let action = &rule.action_blocks[0];
        assert_eq!(9, action.action_length);
        assert_eq!(ActionType::Delete, action.action_type);
        assert_eq!(0, action.action_flavor);
        assert_eq!(None, action.action_data);
    }

    #[test]
    fn format_changes_field_widths() {
        let buf = [
            0x01, 0x00,
            0x09, 0x00,
            0x0A,
            0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        // the same leading bytes give different counts
        assert_eq!(1, RuleFormat::Standard.read_count(&mut ByteCursor::new(&buf)).unwrap());
        assert_eq!(0x0009_0001, RuleFormat::Extended.read_count(&mut ByteCursor::new(&buf)).unwrap());

        // and a different action length for the first block
        let mut cursor = ByteCursor::new(&buf[2..]);
        let err = ActionBlock::decode(&mut cursor, RuleFormat::Extended).unwrap_err();
        assert_eq!(DecodeError::Truncated { offset: 4, requested: 0x000A_0009, available: 7 }, err);

        let mut cursor = ByteCursor::new(&buf);
        let err = RuleAction::decode(&mut cursor, RuleFormat::Extended).unwrap_err();
        assert_eq!(DecodeErrorKind::Truncated, err.kind());

        // extended bytes read as standard
        let extended = rule(RuleFormat::Extended, &[block(RuleFormat::Extended, 0x0A, 0, &[])]);
        let mut cursor = ByteCursor::new(&extended);
        assert_eq!(1, RuleAction::decode(&mut cursor, RuleFormat::Extended).unwrap().len());
        let mut cursor = ByteCursor::new(&extended);
        let err = RuleAction::decode(&mut cursor, RuleFormat::Standard).unwrap_err();
        assert_eq!(DecodeErrorKind::Truncated, err.kind());
    }

    #[test]
    fn unknown_action_type() {
        let buf = rule(RuleFormat::Standard, &[block(RuleFormat::Standard, 0x0C, 0, &[])]);
        let mut cursor = ByteCursor::new(&buf);
        let err = RuleAction::decode(&mut cursor, RuleFormat::Standard).unwrap_err();
        assert_eq!(DecodeError::UnknownDiscriminant { field: "ActionType", value: 0x0C }, err);
    }

    #[test]
    fn action_length_mismatch() {
        // a mark-as-read action claiming one byte of data
        let buf = rule(RuleFormat::Standard, &[block(RuleFormat::Standard, 0x0B, 0, &[0xEE])]);
        let mut cursor = ByteCursor::new(&buf);
        let err = RuleAction::decode(&mut cursor, RuleFormat::Standard).unwrap_err();
        assert_eq!(DecodeError::ActionLengthMismatch { declared: 10, consumed: 9 }, err);

        let lenient = crate::binread::DecodeOptions {
            verify_action_length: false,
            ..Default::default()
        };
        let mut cursor = ByteCursor::with_options(&buf, lenient);
        let rule = RuleAction::decode(&mut cursor, RuleFormat::Standard).unwrap();
        assert_eq!(ActionType::MarkAsRead, rule.action_blocks[0].action_type);
        assert!(cursor.is_empty());
    }

    #[test]
    fn several_actions() {
        let buf = rule(RuleFormat::Extended, &[
            block(RuleFormat::Extended, 0x0B, 0, &[]),
            block(RuleFormat::Extended, 0x06, 0, &0x26u32.to_le_bytes()),
            block(RuleFormat::Extended, 0x0A, 0, &[]),
        ]);
        let mut cursor = ByteCursor::new(&buf);
        let rule = RuleAction::decode(&mut cursor, RuleFormat::Extended).unwrap();
        let types: Vec<ActionType> = rule.action_blocks.iter().map(|b| b.action_type).collect();
        assert_eq!(vec![ActionType::MarkAsRead, ActionType::Bounce, ActionType::Delete], types);
        assert_eq!(Some(ActionData::Bounce(BounceCode::AccessDenied)), rule.action_blocks[1].action_data);
    }

    #[test]
    fn flavors() {
        let buf = rule(RuleFormat::Standard, &[
            block(RuleFormat::Standard, 0x05, 0x0000_0005, &[0x01]),
        ]);
        let mut cursor = ByteCursor::new(&buf);
        let rule = RuleAction::decode(&mut cursor, RuleFormat::Standard).unwrap();
        assert_eq!(None, rule.action_blocks[0].forward_flavor());
        assert_eq!(None, rule.action_blocks[0].reply_flavor());

        let forward = ActionBlock {
            action_length: 0,
            action_type: ActionType::Forward,
            action_flavor: 0x0000_0005,
            action_flags: 0,
            action_data: None,
        };
        assert_eq!(
            Some(ForwardFlavor::PRESERVE_SENDER | ForwardFlavor::FORWARD_AS_ATTACHMENT),
            forward.forward_flavor(),
        );
    }
}
