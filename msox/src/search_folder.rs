//! The persisted criteria of a search folder (PidTagSearchFolderDefinition).
//!
//! The record is a straight sequence of fields; the flags read near the start
//! decide which of the later length-prefixed fields may be non-empty.

use bitflags::bitflags;
use log::debug;

use crate::binread::{length_to_usize, ByteCursor};
use crate::error::DecodeError;
use crate::restriction::Restriction;
use crate::value::{TaggedPropertyValue, ValueLayout};


bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct SearchFolderStorageType: u32 {
        /// NumericSearch holds a value.
        const NUMERIC_SEARCH = 0x0000_0002;
        const FLAG_C = 0x0000_0004;
        const FLAG_D = 0x0000_0008;
        const FLAG_E = 0x0000_0010;
        const FLAG_F = 0x0000_0020;
        /// TextSearch holds a value.
        const TEXT_SEARCH = 0x0000_0040;
        /// FolderList1 holds folder names.
        const FOLDER_LIST_1 = 0x0000_0080;
        /// FolderList2 holds an entry list.
        const FOLDER_LIST_2 = 0x0000_0100;
        /// Addresses are present.
        const ADDRESSES = 0x0000_0200;
        /// A search restriction follows SkipBytes3.
        const RESTRICTION = 0x0000_0400;
        /// AdvancedSearch holds data.
        const ADVANCED_SEARCH = 0x0000_0800;
    }
}


/// A list of entry IDs, each padded to a multiple of four bytes.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct EntryList {
    pub entries: Vec<Vec<u8>>,
}
impl EntryList {
    /// Decodes an entry list that must fill the whole cursor.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let entry_count = length_to_usize(cursor.read_u32_le()?.into())?;
        let _pad = cursor.read_u32_le()?;

        let mut lengths = Vec::with_capacity(entry_count.min(cursor.remaining() / 8));
        for _ in 0..entry_count {
            let entry_length = length_to_usize(cursor.read_u32_le()?.into())?;
            let _entry_length_pad = cursor.read_u32_le()?;
            lengths.push(entry_length);
        }

        let mut entries = Vec::with_capacity(lengths.len());
        for entry_length in lengths {
            entries.push(cursor.read_bytes(entry_length)?.to_vec());
            cursor.pad_to_4(entry_length)?;
        }
        cursor.finish()?;

        Ok(Self { entries })
    }
}


/// One address restricting the search, as a set of recipient properties.
#[derive(Clone, Debug, PartialEq)]
pub struct Address {
    pub properties: Vec<TaggedPropertyValue>,
}
impl Address {
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let property_count = length_to_usize(cursor.read_u32_le()?.into())?;
        let _pad = cursor.read_u32_le()?;
        let mut properties = Vec::with_capacity(property_count.min(cursor.remaining() / 4));
        for _ in 0..property_count {
            properties.push(TaggedPropertyValue::decode(cursor, ValueLayout::SearchFolder)?);
        }
        Ok(Self { properties })
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct SearchFolderDefinition {
    pub version: u32,
    pub flags: SearchFolderStorageType,
    pub numeric_search: u32,
    pub text_search_length: u16,
    pub text_search: String,
    pub skip_bytes_1: Vec<u8>,
    pub deep_search: u32,
    pub folder_list_1_length: u16,
    pub folder_list_1: String,
    pub folder_list_2_length: u32,
    pub folder_list_2: Option<EntryList>,
    pub skip_bytes_2: Vec<u8>,
    pub addresses: Vec<Address>,
    pub skip_bytes_3: Vec<u8>,
    pub search_restriction: Option<Restriction>,
    pub advanced_search_length: u64,
    pub advanced_search: Vec<u8>,
    pub skip_bytes_4: Vec<u8>,
}
impl SearchFolderDefinition {
    pub const VERSION: u32 = 0x0410_0000;

    /// Whether subfolders of the listed folders are searched too.
    pub fn is_deep(&self) -> bool {
        self.deep_search != 0
    }

    /// Decodes a buffer that must consist of exactly one definition.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> Result<Self, DecodeError> {
        let version = cursor.read_u32_be()?;
        if version != Self::VERSION {
            return Err(DecodeError::VersionMismatch {
                field: "SearchFolderDefinition Version",
                expected: Self::VERSION,
                obtained: version,
            });
        }

        let flags = SearchFolderStorageType::from_bits_retain(cursor.read_u32_le()?);
        debug!("search folder definition with flags {:?}", flags);

        let numeric_search = cursor.read_u32_le()?;
        check_absent(flags, SearchFolderStorageType::NUMERIC_SEARCH, "NumericSearch", numeric_search.into())?;

        let text_search_length = read_short_length(cursor)?;
        check_absent(flags, SearchFolderStorageType::TEXT_SEARCH, "TextSearchLength", text_search_length.into())?;
        let text_search = cursor.read_utf16(text_search_length.into())?;

        let skip_bytes_1 = read_skip_block(cursor)?;

        let deep_search = cursor.read_u32_le()?;

        let folder_list_1_length = read_short_length(cursor)?;
        check_absent(flags, SearchFolderStorageType::FOLDER_LIST_1, "FolderList1Length", folder_list_1_length.into())?;
        let folder_list_1 = cursor.read_utf16(folder_list_1_length.into())?;

        let folder_list_2_length = cursor.read_u32_le()?;
        check_absent(flags, SearchFolderStorageType::FOLDER_LIST_2, "FolderList2Length", folder_list_2_length.into())?;
        let folder_list_2 = if flags.contains(SearchFolderStorageType::FOLDER_LIST_2) {
            let mut list_cursor = cursor.sub_cursor(length_to_usize(folder_list_2_length.into())?)?;
            Some(EntryList::decode(&mut list_cursor)?)
        } else {
            None
        };

        let skip_bytes_2 = read_skip_block(cursor)?;

        let address_count = cursor.read_u32_le()?;
        check_absent(flags, SearchFolderStorageType::ADDRESSES, "AddressCount", address_count.into())?;
        let address_count = length_to_usize(address_count.into())?;
        let mut addresses = Vec::with_capacity(address_count.min(cursor.remaining() / 8));
        for _ in 0..address_count {
            addresses.push(Address::decode(cursor)?);
        }

        let skip_bytes_3 = read_skip_block(cursor)?;

        let search_restriction = if flags.contains(SearchFolderStorageType::RESTRICTION) {
            Some(Restriction::decode(cursor)?)
        } else {
            None
        };

        // two little-endian halves, low first
        let advanced_low = cursor.read_u32_le()?;
        let advanced_high = cursor.read_u32_le()?;
        let advanced_search_length = (u64::from(advanced_high) << 32) | u64::from(advanced_low);
        check_absent(flags, SearchFolderStorageType::ADVANCED_SEARCH, "AdvancedSearchLen", advanced_search_length)?;
        let advanced_search = cursor.read_bytes(length_to_usize(advanced_search_length)?)?.to_vec();

        let skip_bytes_4 = read_skip_block(cursor)?;

        cursor.finish()?;

        Ok(Self {
            version,
            flags,
            numeric_search,
            text_search_length,
            text_search,
            skip_bytes_1,
            deep_search,
            folder_list_1_length,
            folder_list_1,
            folder_list_2_length,
            folder_list_2,
            skip_bytes_2,
            addresses,
            skip_bytes_3,
            search_restriction,
            advanced_search_length,
            advanced_search,
            skip_bytes_4,
        })
    }
}

/// Reads a one-byte length, which the value 255 extends by a 16-bit length.
fn read_short_length(cursor: &mut ByteCursor<'_>) -> Result<u16, DecodeError> {
    let short_length = cursor.read_u8()?;
    if short_length == 0xFF {
        cursor.read_u16_le()
    } else {
        Ok(short_length.into())
    }
}

fn read_skip_block(cursor: &mut ByteCursor<'_>) -> Result<Vec<u8>, DecodeError> {
    let skip_length = length_to_usize(cursor.read_u32_le()?.into())?;
    Ok(cursor.read_bytes(skip_length)?.to_vec())
}

fn check_absent(flags: SearchFolderStorageType, flag: SearchFolderStorageType, field: &'static str, length: u64) -> Result<(), DecodeError> {
    if !flags.contains(flag) && length != 0 {
        return Err(DecodeError::UnexpectedLength { field, length });
    }
    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;
    use encoding_rs::WINDOWS_1252;
    use crate::{PropType, PropValue};
    use crate::binwrite::BinaryWriter;
    use crate::error::DecodeErrorKind;
    use crate::restriction::test::subject_contains;
    use crate::value::PropertyTag;

    #[derive(Default)]
    struct Parts {
        flags: u32,
        numeric_search: u32,
        text_search: String,
        deep_search: u32,
        folder_list_1: String,
        folder_list_2: Vec<u8>,
        address_count: u32,
        addresses: Vec<u8>,
        restriction: Vec<u8>,
        advanced_search: Vec<u8>,
        skip_bytes: Vec<u8>,
    }
    impl Parts {
        fn to_bytes(&self) -> Vec<u8> {
            fn write_short_length(out: &mut Vec<u8>, length: usize) {
                if length >= 0xFF {
                    out.write_u8(0xFF);
                    out.write_u16_le(length as u16);
                } else {
                    out.write_u8(length as u8);
                }
            }
            fn write_skip(out: &mut Vec<u8>, skip: &[u8]) {
                out.write_u32_le(skip.len() as u32);
                out.write_bytes(skip);
            }

            let mut out = Vec::new();
            out.write_u32_be(SearchFolderDefinition::VERSION);
            out.write_u32_le(self.flags);
            out.write_u32_le(self.numeric_search);
            write_short_length(&mut out, self.text_search.encode_utf16().count());
            out.write_utf16_le(&self.text_search);
            write_skip(&mut out, &self.skip_bytes);
            out.write_u32_le(self.deep_search);
            write_short_length(&mut out, self.folder_list_1.encode_utf16().count());
            out.write_utf16_le(&self.folder_list_1);
            out.write_u32_le(self.folder_list_2.len() as u32);
            out.write_bytes(&self.folder_list_2);
            write_skip(&mut out, &[]);
            out.write_u32_le(self.address_count);
            out.write_bytes(&self.addresses);
            write_skip(&mut out, &[]);
            out.write_bytes(&self.restriction);
            out.write_u32_le(self.advanced_search.len() as u32);
            out.write_u32_le(0);
            out.write_bytes(&self.advanced_search);
            write_skip(&mut out, &[]);
            out
        }
    }

    fn decode(buf: &[u8]) -> Result<SearchFolderDefinition, DecodeError> {
        SearchFolderDefinition::decode(&mut ByteCursor::new(buf))
    }

    #[test]
    fn text_search_clear() {
        let buf = Parts::default().to_bytes();
        let definition = decode(&buf).unwrap();
        assert_eq!(SearchFolderStorageType::empty(), definition.flags);
        assert_eq!(0, definition.text_search_length);
        assert_eq!("", definition.text_search);
        assert!(definition.folder_list_2.is_none());
        assert!(definition.search_restriction.is_none());
        assert!(!definition.is_deep());
    }

    #[test]
    fn text_search_length_without_flag() {
        let buf = Parts { text_search: "abc".to_owned(), ..Default::default() }.to_bytes();
        let err = decode(&buf).unwrap_err();
        assert_eq!(DecodeError::UnexpectedLength { field: "TextSearchLength", length: 3 }, err);
    }

    #[test]
    fn extended_text_search_length_missing() {
        let mut buf = Vec::new();
        buf.write_u32_be(SearchFolderDefinition::VERSION);
        buf.write_u32_le(SearchFolderStorageType::TEXT_SEARCH.bits());
        buf.write_u32_le(0);
        buf.write_u8(0xFF);
        let err = decode(&buf).unwrap_err();
        assert_eq!(DecodeErrorKind::Truncated, err.kind());
        assert_eq!(DecodeError::Truncated { offset: 13, requested: 2, available: 0 }, err);
    }

    #[test]
    fn extended_text_search_length() {
        let long_text = "x".repeat(300);
        let buf = Parts {
            flags: SearchFolderStorageType::TEXT_SEARCH.bits(),
            text_search: long_text.clone(),
            ..Default::default()
        }.to_bytes();
        let definition = decode(&buf).unwrap();
        assert_eq!(300, definition.text_search_length);
        assert_eq!(long_text, definition.text_search);
    }

    #[test]
    fn version_is_big_endian() {
        let mut buf = Parts::default().to_bytes();
        buf[0..4].copy_from_slice(&SearchFolderDefinition::VERSION.to_le_bytes());
        let err = decode(&buf).unwrap_err();
        assert_eq!(
            DecodeError::VersionMismatch {
                field: "SearchFolderDefinition Version",
                expected: 0x0410_0000,
                obtained: 0x0000_1004,
            },
            err,
        );
    }

    #[test]
    fn every_section_present() {
        let mut folder_list_2 = Vec::new();
        folder_list_2.write_u32_le(2);
        folder_list_2.write_u32_le(0);
        folder_list_2.write_u32_le(3);
        folder_list_2.write_u32_le(0);
        folder_list_2.write_u32_le(4);
        folder_list_2.write_u32_le(0);
        folder_list_2.write_bytes(&[0xA1, 0xA2, 0xA3, 0x00]);
        folder_list_2.write_bytes(&[0xB1, 0xB2, 0xB3, 0xB4]);

        let display_name = PropertyTag::new(0x3001, PropType::String);
        let mut addresses = Vec::new();
        addresses.write_u32_le(1);
        addresses.write_u32_le(0);
        TaggedPropertyValue { tag: display_name, value: PropValue::String("Someone".to_owned()) }
            .write(&mut addresses, ValueLayout::SearchFolder, WINDOWS_1252)
            .unwrap();

        let mut restriction = Vec::new();
        subject_contains("invoice").write(&mut restriction, WINDOWS_1252).unwrap();

        let flags = SearchFolderStorageType::NUMERIC_SEARCH
            | SearchFolderStorageType::FLAG_D
            | SearchFolderStorageType::TEXT_SEARCH
            | SearchFolderStorageType::FOLDER_LIST_1
            | SearchFolderStorageType::FOLDER_LIST_2
            | SearchFolderStorageType::ADDRESSES
            | SearchFolderStorageType::RESTRICTION
            | SearchFolderStorageType::ADVANCED_SEARCH;
        let buf = Parts {
            flags: flags.bits(),
            numeric_search: 42,
            text_search: "invoice".to_owned(),
            deep_search: 1,
            folder_list_1: "Inbox".to_owned(),
            folder_list_2,
            address_count: 1,
            addresses,
            restriction,
            advanced_search: vec![0x01, 0x02, 0x03],
            skip_bytes: vec![0xEE; 5],
        }.to_bytes();

        let definition = decode(&buf).unwrap();
        assert_eq!(flags, definition.flags);
        assert_eq!(42, definition.numeric_search);
        assert_eq!("invoice", definition.text_search);
        assert_eq!(vec![0xEE; 5], definition.skip_bytes_1);
        assert!(definition.is_deep());
        assert_eq!("Inbox", definition.folder_list_1);
        assert_eq!(
            vec![vec![0xA1, 0xA2, 0xA3], vec![0xB1, 0xB2, 0xB3, 0xB4]],
            definition.folder_list_2.unwrap().entries,
        );
        assert_eq!(1, definition.addresses.len());
        assert_eq!(display_name, definition.addresses[0].properties[0].tag);
        assert_eq!(Some(subject_contains("invoice")), definition.search_restriction);
        assert_eq!(3, definition.advanced_search_length);
        assert_eq!(vec![0x01, 0x02, 0x03], definition.advanced_search);
    }

    #[test]
    fn advanced_search_length_halves() {
        let mut buf = Parts::default().to_bytes();
        // the high half sits four bytes before the final SkipLen4
        let high_offset = buf.len() - 8;
        buf[high_offset..high_offset + 4].copy_from_slice(&1u32.to_le_bytes());
        let err = decode(&buf).unwrap_err();
        assert_eq!(DecodeError::UnexpectedLength { field: "AdvancedSearchLen", length: 1 << 32 }, err);
    }

    #[test]
    fn entry_list_must_be_consumed() {
        let mut folder_list_2 = Vec::new();
        folder_list_2.write_u32_le(0);
        folder_list_2.write_u32_le(0);
        folder_list_2.write_u32_le(0xDEAD_BEEF);
        let buf = Parts {
            flags: SearchFolderStorageType::FOLDER_LIST_2.bits(),
            folder_list_2,
            ..Default::default()
        }.to_bytes();
        let err = decode(&buf).unwrap_err();
        assert_eq!(DecodeErrorKind::Corrupted, err.kind());
    }

    #[test]
    fn trailing_bytes() {
        let mut buf = Parts::default().to_bytes();
        buf.push(0x00);
        let err = decode(&buf).unwrap_err();
        assert_eq!(DecodeError::TrailingData { offset: buf.len() - 1, remaining: 1 }, err);
    }
}
