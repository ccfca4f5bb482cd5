use std::{fs, path::Path};

use indexmap::IndexMap;

use crate::{
    FormatError,
    anim::Animation,
    palette::Palette,
    sprite::Sprite,
    stream::{self, ByteCursor, ByteWriter},
};

pub const MAX_SLOTS: usize = 50;
pub const MAX_PALETTES: usize = 8;
pub const FOOTER_SIZE: usize = 30;

const SLOT_STRING_MAX: usize = 1024;

/// One populated entry of the animation table: chain indices into other
/// slots, selection weight, hazard data, an opaque string and the owned
/// animation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimSlot {
    /// Slot index to chain to when the move connects.
    pub chain_hit: u8,
    /// Slot index to chain to when it does not.
    pub chain_no_hit: u8,
    pub repeat: u8,
    pub probability: u16,
    pub hazard_damage: u8,
    /// Raw bytes; not required to be UTF-8.
    pub string: Vec<u8>,
    pub animation: Animation,
}

impl AnimSlot {
    pub fn read(cur: &mut ByteCursor) -> Result<AnimSlot, FormatError> {
        let chain_hit = cur.read_u8()?;
        let chain_no_hit = cur.read_u8()?;
        let repeat = cur.read_u8()?;
        let probability = cur.read_u16()?;
        let hazard_damage = cur.read_u8()?;
        let string = stream::read_var_bytes(cur, SLOT_STRING_MAX, "slot string")?;
        let animation = Animation::read(cur)?;

        Ok(AnimSlot {
            chain_hit,
            chain_no_hit,
            repeat,
            probability,
            hazard_damage,
            string,
            animation,
        })
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), FormatError> {
        writer.write_u8(self.chain_hit);
        writer.write_u8(self.chain_no_hit);
        writer.write_u8(self.repeat);
        writer.write_u16(self.probability);
        writer.write_u8(self.hazard_damage);
        stream::write_var_bytes(writer, &self.string, SLOT_STRING_MAX, "slot string")?;
        self.animation.write(writer)?;

        Ok(())
    }
}

/// An animation container file: a background image, a palette set and a
/// fixed-capacity sparse table of animation slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BkFile {
    pub file_id: u32,
    pub unknown_a: u8,
    pub background: Sprite,
    pub palettes: Vec<Palette>,
    /// Populated slots keyed by index 0..50. Absence is an absent entry,
    /// never a dangling reference.
    pub slots: IndexMap<u8, AnimSlot>,
    pub footer: [u8; FOOTER_SIZE],
}

impl BkFile {
    /**
    Decodes an animation container file from a byte buffer.

    Layout: file id, palette count, one unknown byte, the background sprite,
    the palette set, then fifty slot positions each prefixed by a one-byte
    presence marker (`0` absent, `1` present), and the 30-byte footer.

    # Errors
    - [`FormatError::FileParse`] on a count over its bound or a malformed
      presence marker
    - [`FormatError::OutOfBounds`] when the buffer ends inside a fixed field
    */
    pub fn from_bytes(bytes: &[u8]) -> Result<BkFile, FormatError> {
        let mut cur = ByteCursor::from_slice(bytes);
        BkFile::read(&mut cur)
    }

    pub fn read(cur: &mut ByteCursor) -> Result<BkFile, FormatError> {
        let file_id = cur.read_u32()?;

        let palette_count = cur.read_u8()? as usize;
        if palette_count > MAX_PALETTES {
            return Err(FormatError::FileParse(format!(
                "palette count {} exceeds maximum {}",
                palette_count, MAX_PALETTES
            )));
        }

        let unknown_a = cur.read_u8()?;

        let background = Sprite::read(cur).map_err(|e| e.in_stage("background"))?;

        let mut palettes = Vec::with_capacity(palette_count);
        for i in 0..palette_count {
            palettes
                .push(Palette::read(cur).map_err(|e| e.in_stage(&format!("palette {}", i)))?);
        }

        let mut slots = IndexMap::new();
        for i in 0..MAX_SLOTS {
            let marker = cur.read_u8()?;
            match marker {
                0 => {}
                1 => {
                    let slot = AnimSlot::read(cur)
                        .map_err(|e| e.in_stage(&format!("animation slot {}", i)))?;
                    slots.insert(i as u8, slot);
                }
                other => {
                    return Err(FormatError::FileParse(format!(
                        "slot {} has invalid presence marker {}",
                        i, other
                    )));
                }
            }
        }

        let footer = cur.read_buf::<FOOTER_SIZE>()?;

        Ok(BkFile {
            file_id,
            unknown_a,
            background,
            palettes,
            slots,
            footer,
        })
    }

    pub fn load(path: &Path) -> Result<BkFile, FormatError> {
        let bytes = fs::read(path)
            .map_err(|e| FormatError::FileOpen(format!("{}: {}", path.display(), e)))?;
        BkFile::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut writer = ByteWriter::new();
        self.write(&mut writer)?;
        Ok(writer.into_inner())
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), FormatError> {
        if self.palettes.len() > MAX_PALETTES {
            return Err(FormatError::InvalidInput(format!(
                "palette set holds {} palettes, maximum is {}",
                self.palettes.len(),
                MAX_PALETTES
            )));
        }
        if let Some(index) = self.slots.keys().find(|i| **i as usize >= MAX_SLOTS) {
            return Err(FormatError::InvalidInput(format!(
                "slot index {} is outside the {}-slot table",
                index, MAX_SLOTS
            )));
        }

        writer.write_u32(self.file_id);
        writer.write_u8(self.palettes.len() as u8);
        writer.write_u8(self.unknown_a);

        self.background.write(writer)?;

        for palette in &self.palettes {
            palette.write(writer);
        }

        for i in 0..MAX_SLOTS {
            match self.slots.get(&(i as u8)) {
                Some(slot) => {
                    writer.write_u8(1);
                    slot.write(writer)?;
                }
                None => writer.write_u8(0),
            }
        }

        writer.write_bytes(&self.footer);

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), FormatError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)
            .map_err(|e| FormatError::FileOpen(format!("{}: {}", path.display(), e)))
    }

    /// The populated slot at `index`, if any. Indices outside the table are
    /// simply absent.
    pub fn slot(&self, index: u8) -> Option<&AnimSlot> {
        self.slots.get(&index)
    }

    pub fn slot_mut(&mut self, index: u8) -> Option<&mut AnimSlot> {
        self.slots.get_mut(&index)
    }

    pub fn set_slot(&mut self, index: u8, slot: AnimSlot) -> Result<(), FormatError> {
        if index as usize >= MAX_SLOTS {
            return Err(FormatError::InvalidInput(format!(
                "slot index {} is outside the {}-slot table",
                index, MAX_SLOTS
            )));
        }

        self.slots.insert(index, slot);
        Ok(())
    }

    pub fn remove_slot(&mut self, index: u8) -> Option<AnimSlot> {
        self.slots.shift_remove(&index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_slot(probability: u16) -> AnimSlot {
        AnimSlot {
            chain_hit: 3,
            chain_no_hit: 0,
            repeat: 1,
            probability,
            hazard_damage: 12,
            string: b"s05".to_vec(),
            animation: Animation {
                start_x: 160,
                start_y: 100,
                header: [4, 3, 2, 1],
                overlay_table: vec![7],
                anim_string: b"A10-B10".to_vec(),
                sprites: vec![Sprite {
                    len: 2,
                    width: 2,
                    height: 1,
                    data: vec![0x01, 0x02],
                    ..Default::default()
                }],
                unknown_b: 0,
                extra_strings: Vec::new(),
            },
        }
    }

    fn sample_bk() -> BkFile {
        let mut pal = Palette::new();
        pal.set_color(1, [10, 20, 30]);

        let mut bk = BkFile {
            file_id: 77,
            unknown_a: 5,
            background: Sprite {
                len: 2,
                width: 2,
                height: 1,
                data: vec![0x0A, 0x0B],
                ..Default::default()
            },
            palettes: vec![pal],
            footer: [2; FOOTER_SIZE],
            ..Default::default()
        };

        bk.set_slot(0, sample_slot(100)).unwrap();
        bk.set_slot(7, sample_slot(250)).unwrap();
        bk
    }

    #[test]
    fn round_trip_is_byte_identical() {
        let bk = sample_bk();

        let bytes = bk.to_bytes().unwrap();
        let again = BkFile::from_bytes(&bytes).unwrap();

        assert_eq!(again, bk);
        assert_eq!(again.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn sparse_slots_survive_the_trip() {
        let bk = sample_bk();
        let again = BkFile::from_bytes(&bk.to_bytes().unwrap()).unwrap();

        assert_eq!(again.slots.len(), 2);
        assert!(again.slot(0).is_some());
        assert!(again.slot(1).is_none());
        assert_eq!(again.slot(7).unwrap().probability, 250);
    }

    #[test]
    fn invalid_presence_marker_is_rejected() {
        let bk = sample_bk();
        let mut bytes = bk.to_bytes().unwrap();

        // The first slot marker sits right after the header, background
        // sprite and the single palette.
        let marker_at = 4 + 1 + 1 + (12 + 2) + 768;
        assert_eq!(bytes[marker_at], 1);
        bytes[marker_at] = 9;

        assert!(matches!(
            BkFile::from_bytes(&bytes),
            Err(FormatError::FileParse(_))
        ));
    }

    #[test]
    fn palette_count_over_the_bound_is_rejected() {
        let bk = sample_bk();
        let mut bytes = bk.to_bytes().unwrap();
        bytes[4] = 20;

        assert!(matches!(
            BkFile::from_bytes(&bytes),
            Err(FormatError::FileParse(_))
        ));
    }

    #[test]
    fn slot_index_is_range_checked() {
        let mut bk = sample_bk();
        assert!(matches!(
            bk.set_slot(50, sample_slot(1)),
            Err(FormatError::InvalidInput(_))
        ));
    }

    #[test]
    fn truncated_slot_reports_which_slot_failed() {
        let bk = sample_bk();
        let mut bytes = bk.to_bytes().unwrap();
        // Cut past the trailing markers and footer, into slot 7's animation.
        bytes.truncate(bytes.len() - 80);

        match BkFile::from_bytes(&bytes) {
            Err(FormatError::FileParse(msg)) => {
                assert!(msg.contains("animation slot 7"), "message was: {}", msg)
            }
            other => panic!("expected a parse error, got {:?}", other),
        }
    }
}
