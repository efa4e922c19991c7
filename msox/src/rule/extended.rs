use log::debug;

use crate::binread::ByteCursor;
use crate::error::DecodeError;
use crate::named::NamedPropertyInformation;
use crate::rule::{RuleAction, RuleFormat};


/// The actions of an extended rule, as stored in its FAI message.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtendedRuleMessageActions {
    pub named_property_information: NamedPropertyInformation,
    pub rule_version: u32,
    pub rule_actions: RuleAction,
}
impl ExtendedRuleMessageActions {
    pub const RULE_VERSION: u32 = 0x0000_0001;

    /// Decodes a buffer that must consist of exactly one such structure.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let named_property_information = NamedPropertyInformation::decode(cursor)?;

        let rule_version = cursor.read_u32_le()?;
        if rule_version != Self::RULE_VERSION {
            return Err(DecodeError::VersionMismatch {
                field: "RuleVersion",
                expected: Self::RULE_VERSION,
                obtained: rule_version,
            });
        }

        let rule_actions = RuleAction::decode(cursor, RuleFormat::Extended)?;
        debug!("extended rule with {} actions", rule_actions.len());
        cursor.finish()?;

        Ok(Self {
            named_property_information,
            rule_version,
            rule_actions,
        })
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::binwrite::BinaryWriter;
    use crate::rule::ActionType;
    use crate::rule::test::{block, rule};

    fn buffer(rule_version: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_u16_le(0);
        out.write_u32_le(rule_version);
        out.extend(rule(RuleFormat::Extended, &[block(RuleFormat::Extended, 0x0B, 0, &[])]));
        out
    }

    #[test]
    fn mark_as_read() {
        let buf = buffer(1);
        let mut cursor = ByteCursor::new(&buf);
        let actions = ExtendedRuleMessageActions::decode(&mut cursor).unwrap();
        assert!(actions.named_property_information.prop_ids.is_empty());
        assert_eq!(RuleFormat::Extended, actions.rule_actions.format);
        assert_eq!(ActionType::MarkAsRead, actions.rule_actions.action_blocks[0].action_type);
    }

    #[test]
    fn wrong_version() {
        let buf = buffer(2);
        let mut cursor = ByteCursor::new(&buf);
        let err = ExtendedRuleMessageActions::decode(&mut cursor).unwrap_err();
        assert_eq!(DecodeError::VersionMismatch { field: "RuleVersion", expected: 1, obtained: 2 }, err);
    }

    #[test]
    fn trailing_bytes() {
        let mut buf = buffer(1);
        buf.push(0x00);
        let mut cursor = ByteCursor::new(&buf);
        let err = ExtendedRuleMessageActions::decode(&mut cursor).unwrap_err();
        assert_eq!(DecodeError::TrailingData { offset: buf.len() - 1, remaining: 1 }, err);
    }
}
