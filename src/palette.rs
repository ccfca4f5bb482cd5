use crate::{
    FormatError,
    stream::{ByteCursor, ByteWriter},
};

pub const PALETTE_SIZE: usize = 256;

/// A fixed-capacity table of RGB entries. Files may populate only a range of
/// it; unloaded entries stay black.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    data: [[u8; 3]; PALETTE_SIZE],
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            data: [[0; 3]; PALETTE_SIZE],
        }
    }
}

impl Palette {
    pub fn new() -> Palette {
        Palette::default()
    }

    /// Reads `count` consecutive 3-byte RGB entries into the table starting
    /// at `start`. The range must fit the table's capacity.
    pub fn load_range(
        &mut self,
        cur: &mut ByteCursor,
        start: usize,
        count: usize,
    ) -> Result<(), FormatError> {
        if start + count > PALETTE_SIZE {
            return Err(FormatError::InvalidInput(format!(
                "palette range {}..{} exceeds capacity {}",
                start,
                start + count,
                PALETTE_SIZE
            )));
        }

        for entry in &mut self.data[start..start + count] {
            *entry = cur.read_buf::<3>()?;
        }

        Ok(())
    }

    /// Reads a full 256-entry palette.
    pub fn read(cur: &mut ByteCursor) -> Result<Palette, FormatError> {
        let mut pal = Palette::new();
        pal.load_range(cur, 0, PALETTE_SIZE)?;
        Ok(pal)
    }

    pub fn write_range(
        &self,
        writer: &mut ByteWriter,
        start: usize,
        count: usize,
    ) -> Result<(), FormatError> {
        if start + count > PALETTE_SIZE {
            return Err(FormatError::InvalidInput(format!(
                "palette range {}..{} exceeds capacity {}",
                start,
                start + count,
                PALETTE_SIZE
            )));
        }

        for entry in &self.data[start..start + count] {
            writer.write_bytes(entry);
        }

        Ok(())
    }

    pub fn write(&self, writer: &mut ByteWriter) {
        // Writing the full table cannot fail the range check.
        self.write_range(writer, 0, PALETTE_SIZE).unwrap();
    }

    pub fn color(&self, index: u8) -> [u8; 3] {
        self.data[index as usize]
    }

    pub fn set_color(&mut self, index: u8, rgb: [u8; 3]) {
        self.data[index as usize] = rgb;
    }

    /// The entry as an opaque RGBA pixel, the form the renderer consumes.
    pub fn rgba(&self, index: u8) -> [u8; 4] {
        let [r, g, b] = self.data[index as usize];
        [r, g, b, 0xFF]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_load_places_entries_at_the_start_index() {
        let mut cur = ByteCursor::new(vec![1, 2, 3, 4, 5, 6]);

        let mut pal = Palette::new();
        pal.load_range(&mut cur, 10, 2).unwrap();

        assert_eq!(pal.color(9), [0, 0, 0]);
        assert_eq!(pal.color(10), [1, 2, 3]);
        assert_eq!(pal.color(11), [4, 5, 6]);
    }

    #[test]
    fn range_past_capacity_is_rejected() {
        let mut cur = ByteCursor::new(vec![0; 3 * 16]);

        let mut pal = Palette::new();
        assert!(matches!(
            pal.load_range(&mut cur, 250, 16),
            Err(FormatError::InvalidInput(_))
        ));
    }

    #[test]
    fn write_range_round_trips() {
        let mut pal = Palette::new();
        pal.set_color(0, [10, 20, 30]);
        pal.set_color(47, [40, 50, 60]);

        let mut w = ByteWriter::new();
        pal.write_range(&mut w, 0, 48).unwrap();
        assert_eq!(w.len(), 48 * 3);

        let mut again = Palette::new();
        again
            .load_range(&mut ByteCursor::new(w.into_inner()), 0, 48)
            .unwrap();
        assert_eq!(again, pal);
    }

    #[test]
    fn rgba_is_opaque() {
        let mut pal = Palette::new();
        pal.set_color(5, [1, 2, 3]);
        assert_eq!(pal.rgba(5), [1, 2, 3, 0xFF]);
    }
}
