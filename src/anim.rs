use crate::{
    FormatError,
    sprite::Sprite,
    stream::{self, ByteCursor, ByteWriter},
};

pub const MAX_OVERLAYS: usize = 32;
pub const MAX_FRAMES: usize = 64;
pub const MAX_EXTRA_STRINGS: usize = 16;
pub const MAX_STRING_LEN: usize = 1024;

/// A keyframe animation: start position, an opaque four-byte header, an
/// overlay id table, the sprite list and a table of extra strings.
///
/// Every collection is count-prefixed in the stream and each count is checked
/// against its bound before the collection is allocated, so a corrupted count
/// cannot trigger an unbounded allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Animation {
    pub start_x: i16,
    pub start_y: i16,
    pub header: [u8; 4],
    pub overlay_table: Vec<u32>,
    /// Raw bytes of the animation command string; not required to be UTF-8.
    pub anim_string: Vec<u8>,
    pub sprites: Vec<Sprite>,
    pub unknown_b: u8,
    pub extra_strings: Vec<Vec<u8>>,
}

impl Animation {
    pub fn read(cur: &mut ByteCursor) -> Result<Animation, FormatError> {
        let start_x = cur.read_i16()?;
        let start_y = cur.read_i16()?;
        let header = cur.read_buf::<4>()?;

        let overlay_count = cur.read_u16()? as usize;
        if overlay_count > MAX_OVERLAYS {
            return Err(FormatError::FileParse(format!(
                "overlay count {} exceeds maximum {}",
                overlay_count, MAX_OVERLAYS
            )));
        }
        let mut overlay_table = Vec::with_capacity(overlay_count);
        for _ in 0..overlay_count {
            overlay_table.push(cur.read_u32()?);
        }

        let anim_string = stream::read_var_bytes(cur, MAX_STRING_LEN, "animation string")?;

        let frame_count = cur.read_u8()? as usize;
        if frame_count > MAX_FRAMES {
            return Err(FormatError::FileParse(format!(
                "frame count {} exceeds maximum {}",
                frame_count, MAX_FRAMES
            )));
        }
        let mut sprites = Vec::with_capacity(frame_count);
        for i in 0..frame_count {
            sprites.push(Sprite::read(cur).map_err(|e| e.in_stage(&format!("sprite {}", i)))?);
        }

        let unknown_b = cur.read_u8()?;

        let extra_string_count = cur.read_u8()? as usize;
        if extra_string_count > MAX_EXTRA_STRINGS {
            return Err(FormatError::FileParse(format!(
                "extra string count {} exceeds maximum {}",
                extra_string_count, MAX_EXTRA_STRINGS
            )));
        }
        let mut extra_strings = Vec::with_capacity(extra_string_count);
        for _ in 0..extra_string_count {
            extra_strings.push(stream::read_var_bytes(cur, MAX_STRING_LEN, "extra string")?);
        }

        Ok(Animation {
            start_x,
            start_y,
            header,
            overlay_table,
            anim_string,
            sprites,
            unknown_b,
            extra_strings,
        })
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), FormatError> {
        if self.overlay_table.len() > MAX_OVERLAYS {
            return Err(FormatError::InvalidInput(format!(
                "overlay table holds {} entries, maximum is {}",
                self.overlay_table.len(),
                MAX_OVERLAYS
            )));
        }
        if self.sprites.len() > MAX_FRAMES {
            return Err(FormatError::InvalidInput(format!(
                "sprite list holds {} entries, maximum is {}",
                self.sprites.len(),
                MAX_FRAMES
            )));
        }
        if self.extra_strings.len() > MAX_EXTRA_STRINGS {
            return Err(FormatError::InvalidInput(format!(
                "extra string table holds {} entries, maximum is {}",
                self.extra_strings.len(),
                MAX_EXTRA_STRINGS
            )));
        }

        writer.write_i16(self.start_x);
        writer.write_i16(self.start_y);
        writer.write_bytes(&self.header);

        writer.write_u16(self.overlay_table.len() as u16);
        for overlay in &self.overlay_table {
            writer.write_u32(*overlay);
        }

        stream::write_var_bytes(writer, &self.anim_string, MAX_STRING_LEN, "animation string")?;

        writer.write_u8(self.sprites.len() as u8);
        for sprite in &self.sprites {
            sprite.write(writer)?;
        }

        writer.write_u8(self.unknown_b);

        writer.write_u8(self.extra_strings.len() as u8);
        for extra in &self.extra_strings {
            stream::write_var_bytes(writer, extra, MAX_STRING_LEN, "extra string")?;
        }

        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.sprites.len()
    }
}
