use std::io::Write;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::FormatError;

/// Sequential read position over an owned byte buffer.
///
/// Every access that would cross the end of the buffer fails with
/// [`FormatError::OutOfBounds`] without a partial read; callers treat that as
/// fatal for the record being decoded.
#[derive(Debug, Clone)]
pub struct ByteCursor {
    buf: Vec<u8>,
    pos: usize,
}

impl ByteCursor {
    pub fn new(buf: Vec<u8>) -> ByteCursor {
        ByteCursor { buf, pos: 0 }
    }

    pub fn from_slice(bytes: &[u8]) -> ByteCursor {
        ByteCursor::new(bytes.to_vec())
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&[u8], FormatError> {
        if n > self.remaining() {
            return Err(FormatError::OutOfBounds {
                offset: self.pos + n,
                size: self.buf.len(),
            });
        }

        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;

        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, FormatError> {
        let mut bytes = self.take(2)?;
        Ok(bytes.read_u16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32, FormatError> {
        let mut bytes = self.take(4)?;
        Ok(bytes.read_u32::<LittleEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16, FormatError> {
        let mut bytes = self.take(2)?;
        Ok(bytes.read_i16::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32, FormatError> {
        let mut bytes = self.take(4)?;
        Ok(bytes.read_i32::<LittleEndian>()?)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, FormatError> {
        Ok(self.take(n)?.to_vec())
    }

    pub fn read_buf<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Moves the read position to an absolute offset. Seeking past the end of
    /// the buffer is an error, not a clamp.
    pub fn seek(&mut self, offset: usize) -> Result<(), FormatError> {
        if offset > self.buf.len() {
            return Err(FormatError::OutOfBounds {
                offset,
                size: self.buf.len(),
            });
        }

        self.pos = offset;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.take(n)?;
        Ok(())
    }

    /// Carves `length` bytes out of this cursor into an independently
    /// addressable copy, advancing this cursor past the window. Used to
    /// isolate obfuscated or size-prefixed sub-blocks.
    pub fn extract_window(&mut self, length: usize) -> Result<ByteCursor, FormatError> {
        if length > self.remaining() {
            return Err(FormatError::FileParse(format!(
                "window of {} bytes extends past end of stream ({} left)",
                length,
                self.remaining()
            )));
        }

        let bytes = self.take(length)?.to_vec();
        Ok(ByteCursor::new(bytes))
    }

    /// XORs every byte of the buffer with `key` in place. Applying it twice
    /// with the same key restores the original bytes, so the same call serves
    /// both de-obfuscation and obfuscation.
    pub fn xor(&mut self, key: u8) {
        for byte in &mut self.buf {
            *byte ^= key;
        }
    }

    // In-place write mirrors of the reads. These overwrite existing bytes and
    // fail at the buffer boundary; appending output goes through ByteWriter.

    pub fn write_u8(&mut self, value: u8) -> Result<(), FormatError> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), FormatError> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), FormatError> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), FormatError> {
        if bytes.len() > self.remaining() {
            return Err(FormatError::OutOfBounds {
                offset: self.pos + bytes.len(),
                size: self.buf.len(),
            });
        }

        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();

        Ok(())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Growable little-endian writer the encoders serialize into. Writes into a
/// `Vec` cannot fail, so the methods are infallible.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> ByteWriter {
        ByteWriter::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.write_u8(value).unwrap();
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.write_u16::<LittleEndian>(value).unwrap();
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.write_u32::<LittleEndian>(value).unwrap();
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.write_i16::<LittleEndian>(value).unwrap();
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.write_i32::<LittleEndian>(value).unwrap();
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.write_all(bytes).unwrap();
    }

    /// Appends `bytes` with every byte XORed against `key`; the encode-side
    /// counterpart of [`ByteCursor::xor`].
    pub fn write_xor(&mut self, bytes: &[u8], key: u8) {
        for &byte in bytes {
            self.buf.write_u8(byte ^ key).unwrap();
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Reads a u16-length-prefixed byte string, rejecting lengths over `max`
/// before any allocation happens.
pub(crate) fn read_var_bytes(
    cur: &mut ByteCursor,
    max: usize,
    what: &str,
) -> Result<Vec<u8>, FormatError> {
    let len = cur.read_u16()? as usize;

    if len > max {
        return Err(FormatError::FileParse(format!(
            "{} length {} exceeds maximum {}",
            what, len, max
        )));
    }

    cur.read_bytes(len)
}

pub(crate) fn write_var_bytes(
    writer: &mut ByteWriter,
    bytes: &[u8],
    max: usize,
    what: &str,
) -> Result<(), FormatError> {
    if bytes.len() > max {
        return Err(FormatError::InvalidInput(format!(
            "{} length {} exceeds maximum {}",
            what,
            bytes.len(),
            max
        )));
    }

    writer.write_u16(bytes.len() as u16);
    writer.write_bytes(bytes);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_little_endian() {
        let mut cur = ByteCursor::new(vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);

        assert_eq!(cur.read_u8().unwrap(), 0x01);
        assert_eq!(cur.read_u16().unwrap(), 0x0302);
        assert_eq!(cur.read_u32().unwrap(), 0x07060504);
        assert_eq!(cur.remaining(), 0);
    }

    #[test]
    fn read_past_end_fails_without_partial_read() {
        let mut cur = ByteCursor::new(vec![0xAA, 0xBB]);
        cur.read_u8().unwrap();

        assert!(matches!(
            cur.read_u32(),
            Err(FormatError::OutOfBounds { .. })
        ));
        // The failed read must not have consumed the remaining byte.
        assert_eq!(cur.read_u8().unwrap(), 0xBB);
    }

    #[test]
    fn seek_past_end_fails() {
        let mut cur = ByteCursor::new(vec![0; 8]);

        cur.seek(8).unwrap();
        assert!(matches!(cur.seek(9), Err(FormatError::OutOfBounds { .. })));
    }

    #[test]
    fn window_is_independent_and_advances_parent() {
        let mut parent = ByteCursor::new(vec![1, 2, 3, 4, 5]);

        let mut window = parent.extract_window(3).unwrap();
        assert_eq!(parent.pos(), 3);
        assert_eq!(window.read_bytes(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(parent.read_u8().unwrap(), 4);
    }

    #[test]
    fn oversized_window_is_a_parse_error() {
        let mut parent = ByteCursor::new(vec![0; 4]);
        assert!(matches!(
            parent.extract_window(5),
            Err(FormatError::FileParse(_))
        ));
    }

    #[test]
    fn xor_is_an_involution_for_every_key() {
        let original: Vec<u8> = (0..=255).collect();

        for key in 0..=255u8 {
            let mut cur = ByteCursor::new(original.clone());
            cur.xor(key);
            cur.xor(key);
            assert_eq!(cur.as_slice(), &original[..]);
        }
    }

    #[test]
    fn writer_output_reads_back() {
        let mut w = ByteWriter::new();
        w.write_u8(0x11);
        w.write_u16(0x2233);
        w.write_u32(0x44556677);
        w.write_i16(-2);

        let mut cur = ByteCursor::new(w.into_inner());
        assert_eq!(cur.read_u8().unwrap(), 0x11);
        assert_eq!(cur.read_u16().unwrap(), 0x2233);
        assert_eq!(cur.read_u32().unwrap(), 0x44556677);
        assert_eq!(cur.read_i16().unwrap(), -2);
    }

    #[test]
    fn write_xor_matches_cursor_xor() {
        let bytes = [0x10, 0x20, 0x30];

        let mut w = ByteWriter::new();
        w.write_xor(&bytes, 0xAC);

        let mut cur = ByteCursor::new(w.into_inner());
        cur.xor(0xAC);
        assert_eq!(cur.as_slice(), &bytes);
    }

    #[test]
    fn in_place_write_respects_the_boundary() {
        let mut cur = ByteCursor::new(vec![0; 3]);

        cur.write_u16(0xBEEF).unwrap();
        assert!(matches!(
            cur.write_u16(0xBEEF),
            Err(FormatError::OutOfBounds { .. })
        ));
        assert_eq!(cur.as_slice(), &[0xEF, 0xBE, 0x00]);
    }

    #[test]
    fn var_bytes_length_is_checked_before_reading() {
        let mut w = ByteWriter::new();
        w.write_u16(500);
        w.write_bytes(&[0; 500]);

        let mut cur = ByteCursor::new(w.into_inner());
        assert!(matches!(
            read_var_bytes(&mut cur, 100, "test string"),
            Err(FormatError::FileParse(_))
        ));
    }
}
