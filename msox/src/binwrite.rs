use crate::error::EncodeError;


macro_rules! declare_write_le_be {
    ($le_func_name:ident, $be_func_name:ident, $type:ty) => {
        fn $le_func_name(&mut self, value: $type);
        fn $be_func_name(&mut self, value: $type);
    };
}
macro_rules! impl_write_le_be {
    ($le_func_name:ident, $be_func_name:ident, $type:ty) => {
        fn $le_func_name(&mut self, value: $type) {
            self.extend_from_slice(&value.to_le_bytes());
        }

        fn $be_func_name(&mut self, value: $type) {
            self.extend_from_slice(&value.to_be_bytes());
        }
    };
}


/// Appends fixed-width values to an in-memory buffer.
pub trait BinaryWriter {
    fn write_u8(&mut self, value: u8);
    declare_write_le_be!(write_u16_le, write_u16_be, u16);
    declare_write_le_be!(write_u32_le, write_u32_be, u32);
    declare_write_le_be!(write_u64_le, write_u64_be, u64);
    declare_write_le_be!(write_i16_le, write_i16_be, i16);
    declare_write_le_be!(write_i32_le, write_i32_be, i32);
    declare_write_le_be!(write_i64_le, write_i64_be, i64);
    declare_write_le_be!(write_f64_le, write_f64_be, f64);
    fn write_bytes(&mut self, bytes: &[u8]);
    fn write_utf16_le(&mut self, s: &str);
    fn pad_to_4(&mut self, bytes_written: usize);
}

impl BinaryWriter for Vec<u8> {
    fn write_u8(&mut self, value: u8) {
        self.push(value);
    }

    impl_write_le_be!(write_u16_le, write_u16_be, u16);
    impl_write_le_be!(write_u32_le, write_u32_be, u32);
    impl_write_le_be!(write_u64_le, write_u64_be, u64);
    impl_write_le_be!(write_i16_le, write_i16_be, i16);
    impl_write_le_be!(write_i32_le, write_i32_be, i32);
    impl_write_le_be!(write_i64_le, write_i64_be, i64);
    impl_write_le_be!(write_f64_le, write_f64_be, f64);

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn write_utf16_le(&mut self, s: &str) {
        for word in s.encode_utf16() {
            self.write_u16_le(word);
        }
    }

    #[inline]
    fn pad_to_4(&mut self, bytes_written: usize) {
        if bytes_written % 4 == 0 {
            return;
        }
        let pad_count = 4 - (bytes_written % 4);
        self.extend_from_slice(&[0u8; 3][0..pad_count]);
    }
}


/// Narrows an in-memory length to the width of its wire field.
pub(crate) fn encode_length<T: TryFrom<usize>>(field: &'static str, length: usize) -> Result<T, EncodeError> {
    T::try_from(length)
        .map_err(|_| EncodeError::LengthOverflow { field, length })
}
