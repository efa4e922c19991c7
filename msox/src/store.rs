//! Typed accessors over a generic store of raw property values.
//!
//! A value that cannot be decoded is logged and then treated as absent.

use std::collections::HashMap;

use log::warn;

use crate::{PropTag, PropType};
use crate::binread::{ByteCursor, DecodeOptions};
use crate::error::DecodeError;
use crate::guid::{Guid, GuidByteOrder};
use crate::rule::{RuleAction, RuleFormat};
use crate::rule::extended::ExtendedRuleMessageActions;
use crate::search_folder::SearchFolderDefinition;
use crate::value::PropertyTag;
use crate::xid::{PredecessorChangeList, Xid};


/// Anything that can look up the raw bytes of a property.
pub trait PropertyStore {
    fn get_property(&self, tag: PropertyTag) -> Option<&[u8]>;

    /// Options for decoding this store's values.
    fn decode_options(&self) -> DecodeOptions {
        DecodeOptions::default()
    }
}

impl PropertyStore for HashMap<PropertyTag, Vec<u8>> {
    fn get_property(&self, tag: PropertyTag) -> Option<&[u8]> {
        self.get(&tag).map(|value| value.as_slice())
    }
}


fn tag(prop_tag: PropTag, prop_type: PropType) -> PropertyTag {
    PropertyTag::new(prop_tag.into(), prop_type)
}

fn decode_property<S, T, F>(store: &S, tag: PropertyTag, decode: F) -> Option<T>
    where
        S: PropertyStore + ?Sized,
        F: FnOnce(&mut ByteCursor<'_>) -> Result<T, DecodeError> {
    let bytes = store.get_property(tag)?;
    let mut cursor = ByteCursor::with_options(bytes, store.decode_options());
    match decode(&mut cursor) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("failed to decode property {}: {}", tag, e);
            None
        },
    }
}

fn decode_xid<S: PropertyStore + ?Sized>(store: &S, prop_tag: PropTag) -> Option<Xid> {
    decode_property(store, tag(prop_tag, PropType::Binary), |cursor| {
        let size = cursor.len();
        Xid::decode(cursor, size)
    })
}


pub fn source_key<S: PropertyStore + ?Sized>(store: &S) -> Option<Xid> {
    decode_xid(store, PropTag::TagSourceKey)
}

pub fn parent_source_key<S: PropertyStore + ?Sized>(store: &S) -> Option<Xid> {
    decode_xid(store, PropTag::TagParentSourceKey)
}

pub fn change_key<S: PropertyStore + ?Sized>(store: &S) -> Option<Xid> {
    decode_xid(store, PropTag::TagChangeKey)
}

pub fn predecessor_change_list<S: PropertyStore + ?Sized>(store: &S) -> Option<PredecessorChangeList> {
    decode_property(
        store,
        tag(PropTag::TagPredecessorChangeList, PropType::Binary),
        PredecessorChangeList::decode,
    )
}

/// The actions of a standard (server-side) rule.
pub fn rule_actions<S: PropertyStore + ?Sized>(store: &S) -> Option<RuleAction> {
    decode_property(store, tag(PropTag::TagRuleActions, PropType::RuleAction), |cursor| {
        let rule_action = RuleAction::decode(cursor, RuleFormat::Standard)?;
        cursor.finish()?;
        Ok(rule_action)
    })
}

/// The actions of an extended rule, read from its rule message.
pub fn extended_rule_message_actions<S: PropertyStore + ?Sized>(store: &S) -> Option<ExtendedRuleMessageActions> {
    decode_property(
        store,
        tag(PropTag::TagExtendedRuleMessageActions, PropType::Binary),
        ExtendedRuleMessageActions::decode,
    )
}

pub fn search_folder_definition<S: PropertyStore + ?Sized>(store: &S) -> Option<SearchFolderDefinition> {
    decode_property(
        store,
        tag(PropTag::TagSearchFolderDefinition, PropType::Binary),
        SearchFolderDefinition::decode,
    )
}

pub fn search_folder_id<S: PropertyStore + ?Sized>(store: &S) -> Option<Guid> {
    decode_property(store, tag(PropTag::TagSearchFolderId, PropType::Binary), |cursor| {
        let guid = Guid::read(cursor, GuidByteOrder::Native)?;
        cursor.finish()?;
        Ok(guid)
    })
}

pub fn search_folder_template_id<S: PropertyStore + ?Sized>(store: &S) -> Option<u32> {
    decode_property(store, tag(PropTag::TagSearchFolderTemplateId, PropType::Integer32), |cursor| {
        let template_id = cursor.read_u32_le()?;
        cursor.finish()?;
        Ok(template_id)
    })
}
