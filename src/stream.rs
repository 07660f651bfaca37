//! Binary layout stream
//!
//! Big-endian encoding compatible with Qt's `QDataStream`, which is what
//! layouts saved by earlier C++ hosts contain:
//!
//! ```text
//! i32     4 bytes, big-endian
//! bool    1 byte, non-zero = true
//! string  u32 byte length (0xFFFFFFFF = null) + UTF-16BE code units
//! rect    i32 left, top, right, bottom (right/bottom inclusive)
//! size    i32 width, height
//! ```
//!
//! Composite payloads implement [`StreamPersist`]; the serializer treats them
//! as opaque.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::StreamError;
use crate::geometry::{Rect, Size};

/// Length marker for a null string
const NULL_STRING: u32 = 0xFFFF_FFFF;

/// Longest string the format can carry, in UTF-16 units
const MAX_STRING_UNITS: usize = (NULL_STRING as usize - 1) / 2;

/// Strings longer than [`MAX_STRING_UNITS`] are cut at the limit
fn string_units(len: usize) -> usize {
    len.min(MAX_STRING_UNITS)
}

fn string_byte_len(units: usize) -> u32 {
    u32::try_from(string_units(units) * 2).unwrap_or(NULL_STRING - 1)
}

/// A value that can write itself to a layout stream and be rebuilt from one
pub trait StreamPersist: Sized {
    fn write_to(&self, ds: &mut DataStreamWriter);
    fn read_from(ds: &mut DataStreamReader<'_>) -> Result<Self, StreamError>;
}

// ============================================================================
// Writer
// ============================================================================

#[derive(Debug, Default)]
pub struct DataStreamWriter {
    buf: BytesMut,
}

impl DataStreamWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.put_i32(value);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    /// Write a collection length as an `i32` count
    pub fn write_count(&mut self, count: usize) {
        self.write_i32(i32::try_from(count).unwrap_or(i32::MAX));
    }

    pub fn write_string(&mut self, value: &str) {
        let units: Vec<u16> = value.encode_utf16().collect();
        let units = &units[..string_units(units.len())];
        self.buf.put_u32(string_byte_len(units.len()));
        for &unit in units {
            self.buf.put_u16(unit);
        }
    }

    pub fn write_rect(&mut self, rect: Rect) {
        self.write_i32(rect.x);
        self.write_i32(rect.y);
        self.write_i32(rect.right());
        self.write_i32(rect.bottom());
    }

    pub fn write_size(&mut self, size: Size) {
        self.write_i32(size.width);
        self.write_i32(size.height);
    }

    pub fn write<T: StreamPersist>(&mut self, value: &T) {
        value.write_to(self);
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

// ============================================================================
// Reader
// ============================================================================

#[derive(Debug)]
pub struct DataStreamReader<'a> {
    buf: &'a [u8],
}

impl<'a> DataStreamReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { buf: data }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn at_end(&self) -> bool {
        !self.buf.has_remaining()
    }

    fn ensure(&self, needed: usize) -> Result<(), StreamError> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(StreamError::UnexpectedEof { needed, remaining });
        }
        Ok(())
    }

    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        self.ensure(4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool, StreamError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read an `i32` count, rejecting negative values
    pub fn read_count(&mut self, what: &'static str) -> Result<usize, StreamError> {
        let count = self.read_i32()?;
        usize::try_from(count).map_err(|_| StreamError::NegativeCount { what, count })
    }

    pub fn read_string(&mut self) -> Result<String, StreamError> {
        self.ensure(4)?;
        let byte_len = self.buf.get_u32();
        if byte_len == NULL_STRING {
            return Ok(String::new());
        }
        if byte_len % 2 != 0 {
            return Err(StreamError::OddStringLength(byte_len));
        }
        self.ensure(byte_len as usize)?;
        let units: Vec<u16> = (0..byte_len / 2).map(|_| self.buf.get_u16()).collect();
        String::from_utf16(&units).map_err(|_| StreamError::InvalidString)
    }

    pub fn read_rect(&mut self) -> Result<Rect, StreamError> {
        let left = self.read_i32()?;
        let top = self.read_i32()?;
        let right = self.read_i32()?;
        let bottom = self.read_i32()?;
        Rect::from_edges(left, top, right, bottom).ok_or(StreamError::InvalidRect {
            left,
            top,
            right,
            bottom,
        })
    }

    pub fn read_size(&mut self) -> Result<Size, StreamError> {
        let width = self.read_i32()?;
        let height = self.read_i32()?;
        Ok(Size::new(width, height))
    }

    pub fn read<T: StreamPersist>(&mut self) -> Result<T, StreamError> {
        T::read_from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i32_is_big_endian() {
        let mut ds = DataStreamWriter::new();
        ds.write_i32(2);
        ds.write_i32(-1);
        assert_eq!(
            ds.into_bytes().as_ref(),
            &[0, 0, 0, 2, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_string_encoding_is_utf16() {
        let mut ds = DataStreamWriter::new();
        ds.write_string("ab");
        assert_eq!(ds.into_bytes().as_ref(), &[0, 0, 0, 4, 0, b'a', 0, b'b']);
    }

    #[test]
    fn test_non_ascii_string() {
        let mut ds = DataStreamWriter::new();
        ds.write_string("Größe ✓");
        let bytes = ds.into_bytes();
        let mut reader = DataStreamReader::new(&bytes);
        assert_eq!(reader.read_string().unwrap(), "Größe ✓");
        assert!(reader.at_end());
    }

    #[test]
    fn test_null_string_reads_as_empty() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = DataStreamReader::new(&data);
        assert_eq!(reader.read_string().unwrap(), "");
    }

    #[test]
    fn test_rect_uses_inclusive_edges() {
        let mut ds = DataStreamWriter::new();
        ds.write_rect(Rect::new(10, 10, 300, 200));
        let bytes = ds.into_bytes();
        assert_eq!(&bytes[8..12], &309i32.to_be_bytes());
        assert_eq!(&bytes[12..16], &209i32.to_be_bytes());

        let mut reader = DataStreamReader::new(&bytes);
        assert_eq!(reader.read_rect().unwrap(), Rect::new(10, 10, 300, 200));
    }

    #[test]
    fn test_out_of_range_rect_is_an_error() {
        let mut ds = DataStreamWriter::new();
        for edge in [i32::MIN, 0, i32::MAX, 10] {
            ds.write_i32(edge);
        }
        let bytes = ds.into_bytes();
        let mut reader = DataStreamReader::new(&bytes);
        assert!(matches!(
            reader.read_rect(),
            Err(StreamError::InvalidRect {
                left: i32::MIN,
                right: i32::MAX,
                ..
            })
        ));
    }

    #[test]
    fn test_extreme_rect_writes_saturated_edges() {
        let mut ds = DataStreamWriter::new();
        ds.write_rect(Rect::new(i32::MAX - 1, 0, i32::MAX, 10));
        let bytes = ds.into_bytes();
        assert_eq!(&bytes[8..12], &(i32::MAX - 1).to_be_bytes());
    }

    #[test]
    fn test_string_length_never_reaches_null_marker() {
        assert_eq!(string_byte_len(3), 6);
        assert_eq!(string_byte_len(usize::MAX), NULL_STRING - 1);
        assert_eq!(string_units(usize::MAX), MAX_STRING_UNITS);
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let data = [0, 0, 1];
        let mut reader = DataStreamReader::new(&data);
        assert_eq!(
            reader.read_i32(),
            Err(StreamError::UnexpectedEof {
                needed: 4,
                remaining: 3
            })
        );
    }

    #[test]
    fn test_truncated_string_is_an_error() {
        let data = [0, 0, 0, 8, 0, b'a'];
        let mut reader = DataStreamReader::new(&data);
        assert!(matches!(
            reader.read_string(),
            Err(StreamError::UnexpectedEof { needed: 8, .. })
        ));
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let data = (-3i32).to_be_bytes();
        let mut reader = DataStreamReader::new(&data);
        assert_eq!(
            reader.read_count("main window"),
            Err(StreamError::NegativeCount {
                what: "main window",
                count: -3
            })
        );
    }
}
