use std::{fs, path::Path};

use crate::{
    FormatError,
    palette::Palette,
    pilot::{self, Pilot},
    sprite::Sprite,
    stream::{ByteCursor, ByteWriter},
};

/// Obfuscated window holding the full pilot block and its 20-byte tail.
pub const PILOT_WINDOW_SIZE: usize = pilot::PILOT_BLOCK_SIZE + PILOT_TAIL_SIZE;
pub const PILOT_WINDOW_KEY: u8 = 0xAC;
/// One enemy record: a player block plus its opaque tail.
pub const ENEMY_RECORD_SIZE: usize = pilot::PLAYER_BLOCK_SIZE + ENEMY_TAIL_SIZE;
pub const MAX_ENEMIES: usize = 256;

const PILOT_TAIL_SIZE: usize = 20;
const ENEMY_TAIL_SIZE: usize = 25;
const PALETTE_RANGE: usize = 48;

/// One entry of the enemy roster: a player-shaped pilot record and an opaque
/// trailing region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChrEnemy {
    pub pilot: Pilot,
    /// Always 25 bytes once loaded.
    pub unknown: Vec<u8>,
}

/// A character file: the pilot, the enemy roster, the robot palette range
/// and the pilot's photo sprite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChrFile {
    pub pilot: Pilot,
    /// Opaque tail of the pilot window, preserved verbatim (20 bytes).
    pub unknown_a: Vec<u8>,
    /// Length always equals `pilot.enemies_inc_unranked`.
    pub enemies: Vec<ChrEnemy>,
    pub palette: Palette,
    /// Four bytes between the palette and the photo with no known meaning.
    pub unknown_b: [u8; 4],
    /// The pilot photo. Stored dimensions are one below the true values;
    /// the decoder corrects them, so this sprite carries true dimensions.
    pub photo: Sprite,
}

impl ChrFile {
    /**
    Decodes a character file from a byte buffer.

    The layout is a strict sequence: the XOR-obfuscated pilot window, the
    XOR-obfuscated enemy block sized by `enemies_inc_unranked`, palette
    entries 0..48, four unknown bytes and the photo sprite. A failure at any
    step abandons the whole file; no partially decoded tree escapes.

    # Errors
    - [`FormatError::FileParse`] when a window or count does not fit the data
    - [`FormatError::OutOfBounds`] when the buffer ends inside a fixed field
    */
    pub fn from_bytes(bytes: &[u8]) -> Result<ChrFile, FormatError> {
        let mut cur = ByteCursor::from_slice(bytes);
        ChrFile::read(&mut cur)
    }

    pub fn read(cur: &mut ByteCursor) -> Result<ChrFile, FormatError> {
        let mut window = cur
            .extract_window(PILOT_WINDOW_SIZE)
            .map_err(|e| e.in_stage("pilot block"))?;
        window.xor(PILOT_WINDOW_KEY);

        let pilot = Pilot::read(&mut window).map_err(|e| e.in_stage("pilot block"))?;
        let unknown_a = window
            .read_bytes(PILOT_TAIL_SIZE)
            .map_err(|e| e.in_stage("pilot block"))?;

        let enemy_count = pilot.enemies_inc_unranked as usize;
        if enemy_count > MAX_ENEMIES {
            return Err(FormatError::FileParse(format!(
                "enemy count {} exceeds maximum {}",
                enemy_count, MAX_ENEMIES
            )));
        }

        let block_size = ENEMY_RECORD_SIZE * enemy_count;
        let mut window = cur
            .extract_window(block_size)
            .map_err(|e| e.in_stage("enemy list"))?;
        window.xor((block_size & 0xFF) as u8);

        let mut enemies = Vec::with_capacity(enemy_count);
        for i in 0..enemy_count {
            let pilot = Pilot::read_player(&mut window)
                .map_err(|e| e.in_stage(&format!("enemy {}", i)))?;
            let unknown = window
                .read_bytes(ENEMY_TAIL_SIZE)
                .map_err(|e| e.in_stage(&format!("enemy {}", i)))?;

            enemies.push(ChrEnemy { pilot, unknown });
        }

        let mut palette = Palette::new();
        palette
            .load_range(cur, 0, PALETTE_RANGE)
            .map_err(|e| e.in_stage("palette"))?;

        let unknown_b = cur.read_buf::<4>()?;

        let mut photo = Sprite::read(cur).map_err(|e| e.in_stage("photo sprite"))?;
        photo.width += 1;
        photo.height += 1;

        Ok(ChrFile {
            pilot,
            unknown_a,
            enemies,
            palette,
            unknown_b,
            photo,
        })
    }

    pub fn load(path: &Path) -> Result<ChrFile, FormatError> {
        let bytes = fs::read(path)
            .map_err(|e| FormatError::FileOpen(format!("{}: {}", path.display(), e)))?;
        ChrFile::from_bytes(&bytes)
    }

    /// Serializes the file, mirroring the decoder field for field, including
    /// re-obfuscation of the pilot and enemy windows with the same keys.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut writer = ByteWriter::new();
        self.write(&mut writer)?;
        Ok(writer.into_inner())
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), FormatError> {
        if self.unknown_a.len() != PILOT_TAIL_SIZE {
            return Err(FormatError::InvalidInput(format!(
                "pilot window tail is {} bytes, expected {}",
                self.unknown_a.len(),
                PILOT_TAIL_SIZE
            )));
        }
        if self.enemies.len() != self.pilot.enemies_inc_unranked as usize {
            return Err(FormatError::InvalidInput(format!(
                "enemy list holds {} records but enemies_inc_unranked is {}",
                self.enemies.len(),
                self.pilot.enemies_inc_unranked
            )));
        }
        if self.enemies.len() > MAX_ENEMIES {
            return Err(FormatError::InvalidInput(format!(
                "enemy list holds {} records, maximum is {}",
                self.enemies.len(),
                MAX_ENEMIES
            )));
        }

        let mut window = ByteWriter::new();
        self.pilot.write(&mut window)?;
        window.write_bytes(&self.unknown_a);
        writer.write_xor(window.as_slice(), PILOT_WINDOW_KEY);

        let mut window = ByteWriter::new();
        for enemy in &self.enemies {
            if enemy.unknown.len() != ENEMY_TAIL_SIZE {
                return Err(FormatError::InvalidInput(format!(
                    "enemy record tail is {} bytes, expected {}",
                    enemy.unknown.len(),
                    ENEMY_TAIL_SIZE
                )));
            }
            enemy.pilot.write_player(&mut window);
            window.write_bytes(&enemy.unknown);
        }
        let block_size = ENEMY_RECORD_SIZE * self.enemies.len();
        writer.write_xor(window.as_slice(), (block_size & 0xFF) as u8);

        self.palette.write_range(writer, 0, PALETTE_RANGE)?;
        writer.write_bytes(&self.unknown_b);

        let stored_width = self.photo.width.checked_sub(1).ok_or_else(|| {
            FormatError::InvalidInput("photo width must be at least 1".to_string())
        })?;
        let stored_height = self.photo.height.checked_sub(1).ok_or_else(|| {
            FormatError::InvalidInput("photo height must be at least 1".to_string())
        })?;
        self.photo.write_stored(writer, stored_width, stored_height)?;

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), FormatError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)
            .map_err(|e| FormatError::FileOpen(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_enemy(name: &str, wins: u16) -> ChrEnemy {
        let mut pilot = Pilot {
            wins,
            har_id: 2,
            ..Default::default()
        };
        pilot.set_name(name);

        ChrEnemy {
            pilot,
            unknown: vec![0x33; 25],
        }
    }

    fn sample_chr(enemy_count: u16) -> ChrFile {
        let mut pilot = Pilot {
            wins: 7,
            har_id: 0,
            enemies_inc_unranked: enemy_count,
            unknown: vec![0xAB; 316],
            ..Default::default()
        };
        pilot.set_name("Ivan");

        let mut palette = Palette::new();
        palette.set_color(0, [63, 0, 0]);
        palette.set_color(47, [0, 63, 0]);

        let enemies = (0..enemy_count)
            .map(|i| sample_enemy(&format!("Enemy{}", i), i))
            .collect();

        ChrFile {
            pilot,
            unknown_a: vec![0x44; 20],
            enemies,
            palette,
            unknown_b: [9, 8, 7, 6],
            photo: Sprite {
                len: 2,
                width: 1,
                height: 2,
                data: vec![0x05, 0x06],
                ..Default::default()
            },
        }
    }

    #[test]
    fn round_trip_is_byte_identical() {
        let chr = sample_chr(2);

        let bytes = chr.to_bytes().unwrap();
        let again = ChrFile::from_bytes(&bytes).unwrap();

        assert_eq!(again, chr);
        assert_eq!(again.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn pilot_window_is_obfuscated_on_disk() {
        let chr = sample_chr(0);
        let bytes = chr.to_bytes().unwrap();

        // First byte of the window is the first byte of the pilot name,
        // XORed with the fixed key.
        assert_eq!(bytes[0], b'I' ^ PILOT_WINDOW_KEY);
    }

    #[test]
    fn enemy_window_key_derives_from_the_record_count() {
        let chr = sample_chr(2);
        let bytes = chr.to_bytes().unwrap();

        let key = ((ENEMY_RECORD_SIZE * 2) & 0xFF) as u8;
        assert_eq!(bytes[PILOT_WINDOW_SIZE], b'E' ^ key);
    }

    #[test]
    fn enemy_count_drives_the_list_length() {
        for n in [0u16, 1, 5] {
            let chr = sample_chr(n);
            let again = ChrFile::from_bytes(&chr.to_bytes().unwrap()).unwrap();
            assert_eq!(again.enemies.len(), n as usize);
        }
    }

    #[test]
    fn truncated_enemy_block_fails_without_a_partial_tree() {
        let chr = sample_chr(3);
        let mut bytes = chr.to_bytes().unwrap();
        bytes.truncate(PILOT_WINDOW_SIZE + ENEMY_RECORD_SIZE + 10);

        assert!(matches!(
            ChrFile::from_bytes(&bytes),
            Err(FormatError::FileParse(_))
        ));
    }

    #[test]
    fn photo_dimensions_are_stored_one_below_true_size() {
        let chr = sample_chr(0);
        let bytes = chr.to_bytes().unwrap();

        // Stored dims sit after the window, palette range, unknown bytes and
        // the photo's length and position fields.
        let dims_at = PILOT_WINDOW_SIZE + PALETTE_RANGE * 3 + 4 + 6;
        assert_eq!(u16::from_le_bytes([bytes[dims_at], bytes[dims_at + 1]]), 0);
        assert_eq!(
            u16::from_le_bytes([bytes[dims_at + 2], bytes[dims_at + 3]]),
            1
        );

        let again = ChrFile::from_bytes(&bytes).unwrap();
        assert_eq!(again.photo.width, 1);
        assert_eq!(again.photo.height, 2);
    }

    #[test]
    fn enemy_list_length_must_match_the_pilot_count_on_save() {
        let mut chr = sample_chr(2);
        chr.enemies.pop();

        assert!(matches!(
            chr.to_bytes(),
            Err(FormatError::InvalidInput(_))
        ));
    }
}
