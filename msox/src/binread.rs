use encoding_rs::{Encoding, WINDOWS_1252};

use crate::error::DecodeError;


macro_rules! impl_read {
    ($func_name:ident, $type:ty, $byte_count:expr, $from_bytes_func_name:ident) => {
        pub fn $func_name(&mut self) -> Result<$type, DecodeError> {
            let buf = self.read_array::<{ $byte_count }>()?;
            Ok(<$type>::$from_bytes_func_name(buf))
        }
    };
}
macro_rules! impl_read_le_be {
    ($func_name:ident, $le_func_name:ident, $be_func_name:ident, $type:ty, $byte_count:expr) => {
        impl_read!($le_func_name, $type, $byte_count, from_le_bytes);
        impl_read!($be_func_name, $type, $byte_count, from_be_bytes);

        pub fn $func_name(&mut self, endianness: Endianness) -> Result<$type, DecodeError> {
            match endianness {
                Endianness::Little => self.$le_func_name(),
                Endianness::Big => self.$be_func_name(),
            }
        }
    };
}
macro_rules! impl_read_signed {
    ($signed_func:ident, $signed_type:ty, $unsigned_func:ident) => {
        pub fn $signed_func(&mut self) -> Result<$signed_type, DecodeError> {
            let val = self.$unsigned_func()?;
            Ok(val as $signed_type)
        }
    };
}


/// The byte order of a single multi-byte field.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Endianness {
    Little,
    Big,
}


/// Settings that apply to a whole decode call and every cursor carved from it.
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    /// Encoding of 8-bit (PtypString8) strings.
    pub string8_encoding: &'static Encoding,

    /// Whether an action block whose payload does not fill its declared
    /// ActionLength is an error (`true`) or has its leftover bytes skipped.
    pub verify_action_length: bool,

    /// How deeply restrictions may nest before decoding gives up.
    pub max_nesting_depth: usize,
}
impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            string8_encoding: WINDOWS_1252,
            verify_action_length: true,
            max_nesting_depth: 256,
        }
    }
}


/// Sequential, bounds-checked reader over an immutable byte buffer.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    position: usize,
    base: usize,
    options: DecodeOptions,
}
impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            data,
            position: 0,
            base: 0,
            options,
        }
    }

    pub fn options(&self) -> DecodeOptions { self.options }

    /// Offset relative to the start of this cursor's buffer.
    pub fn position(&self) -> usize { self.position }

    /// Offset relative to the outermost buffer this cursor was carved from.
    pub fn absolute_position(&self) -> usize { self.base + self.position }

    pub fn len(&self) -> usize { self.data.len() }
    pub fn remaining(&self) -> usize { self.data.len() - self.position }
    pub fn is_empty(&self) -> bool { self.remaining() == 0 }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        if count > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.absolute_position(),
                requested: count,
                available: self.remaining(),
            });
        }
        let data: &'a [u8] = self.data;
        let bytes = &data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_bytes(N)?;
        let mut buf = [0u8; N];
        buf.copy_from_slice(bytes);
        Ok(buf)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        self.read_bytes(count)?;
        Ok(())
    }

    /// Carves the next `count` bytes into an independent cursor.
    pub fn sub_cursor(&mut self, count: usize) -> Result<ByteCursor<'a>, DecodeError> {
        let base = self.absolute_position();
        let data = self.read_bytes(count)?;
        Ok(ByteCursor {
            data,
            position: 0,
            base,
            options: self.options,
        })
    }

    /// Skips the padding that aligns a field of `bytes_read` bytes to 4 bytes.
    pub fn pad_to_4(&mut self, bytes_read: usize) -> Result<(), DecodeError> {
        if bytes_read % 4 == 0 {
            return Ok(());
        }
        self.skip(4 - (bytes_read % 4))
    }

    /// Fails if any bytes have not been consumed.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.remaining() > 0 {
            return Err(DecodeError::TrailingData {
                offset: self.absolute_position(),
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    impl_read!(read_u8, u8, 1, from_le_bytes);
    impl_read_le_be!(read_u16, read_u16_le, read_u16_be, u16, 2);
    impl_read_le_be!(read_u32, read_u32_le, read_u32_be, u32, 4);
    impl_read_le_be!(read_u64, read_u64_le, read_u64_be, u64, 8);
    impl_read!(read_f32_le, f32, 4, from_le_bytes);
    impl_read!(read_f64_le, f64, 8, from_le_bytes);

    impl_read_signed!(read_i16_le, i16, read_u16_le);
    impl_read_signed!(read_i32_le, i32, read_u32_le);
    impl_read_signed!(read_i64_le, i64, read_u64_le);

    /// Reads `byte_count` bytes and decodes them strictly with `encoding`.
    pub fn read_string(&mut self, byte_count: usize, encoding: &'static Encoding) -> Result<String, DecodeError> {
        let bytes = self.read_bytes(byte_count)?;
        match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            Some(s) => Ok(s.into_owned()),
            None => Err(DecodeError::InvalidString { field: encoding.name() }),
        }
    }

    /// Reads an 8-bit string of `byte_count` bytes in the configured encoding.
    pub fn read_string8(&mut self, byte_count: usize) -> Result<String, DecodeError> {
        self.read_string(byte_count, self.options.string8_encoding)
    }

    /// Reads `char_count` little-endian UTF-16 code units.
    pub fn read_utf16(&mut self, char_count: usize) -> Result<String, DecodeError> {
        let mut chars = Vec::with_capacity(char_count.min(self.remaining() / 2));
        for _ in 0..char_count {
            chars.push(self.read_u16_le()?);
        }
        String::from_utf16(&chars)
            .map_err(|_| DecodeError::InvalidString { field: "UTF-16 string" })
    }

    /// Reads UTF-16LE code units up to and including a NUL terminator.
    pub fn read_utf16_nul_terminated(&mut self) -> Result<String, DecodeError> {
        let mut chars = Vec::new();
        loop {
            let word = self.read_u16_le()?;
            if word == 0x0000 {
                break;
            }
            chars.push(word);
        }
        String::from_utf16(&chars)
            .map_err(|_| DecodeError::InvalidString { field: "UTF-16 string" })
    }

    /// Reads 8-bit characters up to and including a NUL terminator.
    pub fn read_string8_nul_terminated(&mut self) -> Result<String, DecodeError> {
        let data: &'a [u8] = self.data;
        let rest = &data[self.position..];
        let nul_index = match rest.iter().position(|&b| b == 0x00) {
            Some(ni) => ni,
            None => return Err(DecodeError::Truncated {
                offset: self.absolute_position(),
                requested: rest.len() + 1,
                available: rest.len(),
            }),
        };
        let string = self.read_string8(nul_index)?;
        self.skip(1)?;
        Ok(string)
    }
}


/// Converts a wire length to an in-memory length.
pub(crate) fn length_to_usize(length: u64) -> Result<usize, DecodeError> {
    usize::try_from(length)
        .map_err(|_| DecodeError::LengthOverflow { length })
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::error::DecodeErrorKind;

    #[test]
    fn mixed_endianness() {
        let buf = [0x04, 0x10, 0x00, 0x00, 0x01, 0x02, 0xFF];
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!(0x0410_0000, cursor.read_u32(Endianness::Big).unwrap());
        assert_eq!(0x0201, cursor.read_u16(Endianness::Little).unwrap());
        assert_eq!(0xFF, cursor.read_u8().unwrap());
        assert!(cursor.is_empty());
        cursor.finish().unwrap();
    }

    #[test]
    fn truncation_reports_offset() {
        let buf = [0x01, 0x02, 0x03];
        let mut cursor = ByteCursor::new(&buf);
        cursor.read_u8().unwrap();
        let err = cursor.read_u32_le().unwrap_err();
        assert_eq!(DecodeError::Truncated { offset: 1, requested: 4, available: 2 }, err);

        // failed reads do not advance
        assert_eq!(1, cursor.position());
        assert_eq!(0x0302, cursor.read_u16_le().unwrap());
    }

    #[test]
    fn sub_cursor_keeps_absolute_offsets() {
        let buf = [0xAA, 0xBB, 0x01, 0x00, 0xCC];
        let mut cursor = ByteCursor::new(&buf);
        cursor.skip(2).unwrap();
        let mut sub = cursor.sub_cursor(2).unwrap();
        assert_eq!(0x0001, sub.read_u16_le().unwrap());
        let err = sub.read_u8().unwrap_err();
        assert_eq!(DecodeError::Truncated { offset: 4, requested: 1, available: 0 }, err);
        assert_eq!(0xCC, cursor.read_u8().unwrap());
    }

    #[test]
    fn finish_rejects_leftovers() {
        let buf = [0x00, 0x00, 0x00];
        let mut cursor = ByteCursor::new(&buf);
        cursor.read_u16_le().unwrap();
        let err = cursor.finish().unwrap_err();
        assert_eq!(DecodeErrorKind::Corrupted, err.kind());
        assert_eq!(DecodeError::TrailingData { offset: 2, remaining: 1 }, err);
    }

    #[test]
    fn padding() {
        let buf = [0x01, 0x00, 0x00, 0x00, 0x02];
        let mut cursor = ByteCursor::new(&buf);
        cursor.read_u8().unwrap();
        cursor.pad_to_4(1).unwrap();
        cursor.pad_to_4(4).unwrap();
        assert_eq!(0x02, cursor.read_u8().unwrap());
    }

    #[test]
    fn strings() {
        let buf = [
            b'h', 0x00, b'i', 0x00, 0x00, 0x00,
            b'o', b'k', 0x00,
            0xE9,
        ];
        let mut cursor = ByteCursor::new(&buf);
        assert_eq!("hi", cursor.read_utf16_nul_terminated().unwrap());
        assert_eq!("ok", cursor.read_string8_nul_terminated().unwrap());
        assert_eq!("\u{E9}", cursor.read_string8(1).unwrap());
    }

    #[test]
    fn unterminated_string8() {
        let buf = [b'a', b'b'];
        let mut cursor = ByteCursor::new(&buf);
        let err = cursor.read_string8_nul_terminated().unwrap_err();
        assert_eq!(DecodeErrorKind::Truncated, err.kind());
    }

    #[test]
    fn invalid_utf16() {
        // lone high surrogate
        let buf = [0x00, 0xD8];
        let mut cursor = ByteCursor::new(&buf);
        let err = cursor.read_utf16(1).unwrap_err();
        assert_eq!(DecodeErrorKind::Corrupted, err.kind());
    }
}
