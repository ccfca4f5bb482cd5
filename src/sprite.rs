use crate::{
    FormatError,
    palette::Palette,
    rgba::RgbaImage,
    rle,
    stream::{ByteCursor, ByteWriter},
};

pub const MAX_WIDTH: u16 = 320;
pub const MAX_HEIGHT: u16 = 200;

/// One frame image: position, index and a run-length-coded payload of
/// palette indices.
///
/// The payload is kept verbatim because the codec is decode-only; re-encoding
/// a sprite writes back the exact bytes that were read. A sprite with a
/// non-zero `missing` flag carries no payload of its own — its data lives
/// with an earlier sprite of the same index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sprite {
    /// Payload byte count as stored. Matches `data.len()` for present
    /// sprites; for missing sprites it refers to the shared payload.
    pub len: u16,
    pub pos_x: i16,
    pub pos_y: i16,
    pub width: u16,
    pub height: u16,
    pub index: u8,
    pub missing: u8,
    pub data: Vec<u8>,
}

impl Sprite {
    pub fn read(cur: &mut ByteCursor) -> Result<Sprite, FormatError> {
        let len = cur.read_u16()?;
        let pos_x = cur.read_i16()?;
        let pos_y = cur.read_i16()?;
        let width = cur.read_u16()?;
        let height = cur.read_u16()?;
        let index = cur.read_u8()?;
        let missing = cur.read_u8()?;

        if width > MAX_WIDTH || height > MAX_HEIGHT {
            return Err(FormatError::FileParse(format!(
                "sprite dimensions {}x{} exceed {}x{}",
                width, height, MAX_WIDTH, MAX_HEIGHT
            )));
        }

        let data = if missing == 0 {
            cur.read_bytes(len as usize)?
        } else {
            Vec::new()
        };

        Ok(Sprite {
            len,
            pos_x,
            pos_y,
            width,
            height,
            index,
            missing,
            data,
        })
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), FormatError> {
        self.write_stored(writer, self.width, self.height)
    }

    /// Serializes with caller-chosen stored dimensions; the CHR photo stores
    /// each dimension one below its true value.
    pub(crate) fn write_stored(
        &self,
        writer: &mut ByteWriter,
        width: u16,
        height: u16,
    ) -> Result<(), FormatError> {
        if self.data.len() > u16::MAX as usize {
            return Err(FormatError::InvalidInput(format!(
                "sprite payload of {} bytes does not fit the length field",
                self.data.len()
            )));
        }

        let len = if self.missing == 0 {
            self.data.len() as u16
        } else {
            self.len
        };

        writer.write_u16(len);
        writer.write_i16(self.pos_x);
        writer.write_i16(self.pos_y);
        writer.write_u16(width);
        writer.write_u16(height);
        writer.write_u8(self.index);
        writer.write_u8(self.missing);

        if self.missing == 0 {
            writer.write_bytes(&self.data);
        }

        Ok(())
    }

    /// Decodes the payload into a `width` × `height` grid of palette indices
    /// through the shared run-length codec. The payload must fill the grid
    /// exactly, with no bytes left over.
    pub fn decode(&self) -> Result<Vec<u8>, FormatError> {
        if self.missing != 0 {
            return Err(FormatError::InvalidInput(
                "missing sprite has no pixel data of its own".to_string(),
            ));
        }

        let mut cur = ByteCursor::from_slice(&self.data);
        let pixels = rle::decode_image(&mut cur, self.width as usize, self.height as usize)?;

        if cur.remaining() != 0 {
            return Err(FormatError::FileParse(format!(
                "sprite payload has {} trailing bytes after the pixel grid",
                cur.remaining()
            )));
        }

        Ok(pixels)
    }

    /// Pure palette lookup over the decoded grid; the buffer the playback
    /// front end uploads.
    pub fn decode_rgba(&self, pal: &Palette) -> Result<RgbaImage, FormatError> {
        let pixels = self.decode()?;

        let mut data = Vec::with_capacity(pixels.len() * 4);
        for pixel in pixels {
            data.extend_from_slice(&pal.rgba(pixel));
        }

        Ok(RgbaImage {
            width: self.width,
            height: self.height,
            data,
        })
    }
}
