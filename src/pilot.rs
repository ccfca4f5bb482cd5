use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    FormatError,
    stream::{ByteCursor, ByteWriter},
};

/// The fixed layout shared by character files and the per-enemy sub-records.
pub const PLAYER_BLOCK_SIZE: usize = 43;
/// The full pilot block carried only by character files: the player block
/// plus the tournament section and its opaque tail.
pub const PILOT_BLOCK_SIZE: usize = 428;

const NAME_SIZE: usize = 18;
const TRN_NAME_SIZE: usize = 13;
const TRN_DESC_SIZE: usize = 31;
const TRN_IMAGE_SIZE: usize = 13;
const UNKNOWN_SIZE: usize = 316;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum HarId {
    Jaguar = 0,
    Shadow = 1,
    Thorn = 2,
    Pyros = 3,
    Electra = 4,
    Katana = 5,
    Shredder = 6,
    Flail = 7,
    Gargoyle = 8,
    Chronos = 9,
    Nova = 10,
}

/// A pilot record. Enemy sub-records populate only the player-block fields
/// and leave the tournament section at its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pilot {
    pub name: [u8; NAME_SIZE],
    pub wins: u16,
    pub losses: u16,
    pub rank: u8,
    pub har_id: u8,

    pub arm_power: u8,
    pub leg_power: u8,
    pub arm_speed: u8,
    pub leg_speed: u8,
    pub armor: u8,
    pub stun_resistance: u8,
    pub power: u8,
    pub agility: u8,
    pub endurance: u8,
    pub offense: u8,
    pub defense: u8,

    pub money: i32,
    pub color_1: u8,
    pub color_2: u8,
    pub color_3: u8,
    pub photo_id: u8,

    /// How many enemy records follow the pilot in a character file,
    /// unranked challengers included. Load-bearing for the CHR decoder.
    pub enemies_inc_unranked: u16,
    pub enemies_ex_unranked: u16,
    pub trn_name: [u8; TRN_NAME_SIZE],
    pub trn_desc: [u8; TRN_DESC_SIZE],
    pub trn_image: [u8; TRN_IMAGE_SIZE],
    pub winnings: i32,
    pub total_value: i32,

    /// Opaque tail of the full pilot block, preserved verbatim. Always
    /// 316 bytes once loaded; enemy sub-records leave it empty.
    pub unknown: Vec<u8>,
}

impl Pilot {
    /// Decodes the 43-byte player block shared with enemy records.
    pub fn read_player(cur: &mut ByteCursor) -> Result<Pilot, FormatError> {
        let mut pilot = Pilot {
            name: cur.read_buf::<NAME_SIZE>()?,
            wins: cur.read_u16()?,
            losses: cur.read_u16()?,
            rank: cur.read_u8()?,
            har_id: cur.read_u8()?,
            ..Default::default()
        };

        pilot.arm_power = cur.read_u8()?;
        pilot.leg_power = cur.read_u8()?;
        pilot.arm_speed = cur.read_u8()?;
        pilot.leg_speed = cur.read_u8()?;
        pilot.armor = cur.read_u8()?;
        pilot.stun_resistance = cur.read_u8()?;
        pilot.power = cur.read_u8()?;
        pilot.agility = cur.read_u8()?;
        pilot.endurance = cur.read_u8()?;
        pilot.offense = cur.read_u8()?;
        pilot.defense = cur.read_u8()?;

        pilot.money = cur.read_i32()?;
        pilot.color_1 = cur.read_u8()?;
        pilot.color_2 = cur.read_u8()?;
        pilot.color_3 = cur.read_u8()?;
        pilot.photo_id = cur.read_u8()?;

        Ok(pilot)
    }

    /// Decodes the full 428-byte pilot block of a character file.
    pub fn read(cur: &mut ByteCursor) -> Result<Pilot, FormatError> {
        let mut pilot = Pilot::read_player(cur)?;

        pilot.enemies_inc_unranked = cur.read_u16()?;
        pilot.enemies_ex_unranked = cur.read_u16()?;
        pilot.trn_name = cur.read_buf::<TRN_NAME_SIZE>()?;
        pilot.trn_desc = cur.read_buf::<TRN_DESC_SIZE>()?;
        pilot.trn_image = cur.read_buf::<TRN_IMAGE_SIZE>()?;
        pilot.winnings = cur.read_i32()?;
        pilot.total_value = cur.read_i32()?;
        pilot.unknown = cur.read_bytes(UNKNOWN_SIZE)?;

        Ok(pilot)
    }

    pub fn write_player(&self, writer: &mut ByteWriter) {
        writer.write_bytes(&self.name);
        writer.write_u16(self.wins);
        writer.write_u16(self.losses);
        writer.write_u8(self.rank);
        writer.write_u8(self.har_id);

        writer.write_u8(self.arm_power);
        writer.write_u8(self.leg_power);
        writer.write_u8(self.arm_speed);
        writer.write_u8(self.leg_speed);
        writer.write_u8(self.armor);
        writer.write_u8(self.stun_resistance);
        writer.write_u8(self.power);
        writer.write_u8(self.agility);
        writer.write_u8(self.endurance);
        writer.write_u8(self.offense);
        writer.write_u8(self.defense);

        writer.write_i32(self.money);
        writer.write_u8(self.color_1);
        writer.write_u8(self.color_2);
        writer.write_u8(self.color_3);
        writer.write_u8(self.photo_id);
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), FormatError> {
        if self.unknown.len() != UNKNOWN_SIZE {
            return Err(FormatError::InvalidInput(format!(
                "pilot unknown tail is {} bytes, expected {}",
                self.unknown.len(),
                UNKNOWN_SIZE
            )));
        }

        self.write_player(writer);

        writer.write_u16(self.enemies_inc_unranked);
        writer.write_u16(self.enemies_ex_unranked);
        writer.write_bytes(&self.trn_name);
        writer.write_bytes(&self.trn_desc);
        writer.write_bytes(&self.trn_image);
        writer.write_i32(self.winnings);
        writer.write_i32(self.total_value);
        writer.write_bytes(&self.unknown);

        Ok(())
    }

    pub fn name(&self) -> &str {
        std::str::from_utf8(&self.name)
            .unwrap_or("")
            .split('\0')
            .next()
            .unwrap_or("")
    }

    /// Truncated to the 18-byte name field and NUL-padded.
    pub fn set_name(&mut self, name: &str) {
        let bytes = name.as_bytes();
        let n = bytes.len().min(NAME_SIZE);

        self.name = [0; NAME_SIZE];
        self.name[..n].copy_from_slice(&bytes[..n]);
    }

    /// The pilot's robot, when the id byte is one the game defines.
    pub fn har(&self) -> Option<HarId> {
        HarId::try_from(self.har_id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_pilot() -> Pilot {
        let mut pilot = Pilot {
            wins: 12,
            losses: 3,
            rank: 1,
            har_id: HarId::Shadow.into(),
            arm_power: 5,
            leg_power: 6,
            arm_speed: 7,
            leg_speed: 8,
            armor: 4,
            stun_resistance: 3,
            power: 9,
            agility: 10,
            endurance: 11,
            offense: 100,
            defense: 90,
            money: 2500,
            color_1: 5,
            color_2: 11,
            color_3: 2,
            photo_id: 3,
            enemies_inc_unranked: 2,
            enemies_ex_unranked: 1,
            winnings: 10000,
            total_value: 12000,
            unknown: vec![0xEE; 316],
            ..Default::default()
        };
        pilot.set_name("Crystal");
        pilot.trn_name[0] = b'T';
        pilot
    }

    #[test]
    fn player_block_is_43_bytes_and_round_trips() {
        let pilot = sample_pilot();

        let mut w = ByteWriter::new();
        pilot.write_player(&mut w);
        assert_eq!(w.len(), PLAYER_BLOCK_SIZE);

        let again = Pilot::read_player(&mut ByteCursor::new(w.into_inner())).unwrap();
        assert_eq!(again.name(), "Crystal");
        assert_eq!(again.wins, 12);
        assert_eq!(again.money, 2500);
        assert_eq!(again.photo_id, 3);
        // The tournament section is not part of the player block.
        assert_eq!(again.enemies_inc_unranked, 0);
    }

    #[test]
    fn full_block_is_428_bytes_and_round_trips() {
        let pilot = sample_pilot();

        let mut w = ByteWriter::new();
        pilot.write(&mut w).unwrap();
        assert_eq!(w.len(), PILOT_BLOCK_SIZE);

        let again = Pilot::read(&mut ByteCursor::new(w.into_inner())).unwrap();
        assert_eq!(again, pilot);
    }

    #[test]
    fn write_rejects_a_malformed_unknown_tail() {
        let mut pilot = sample_pilot();
        pilot.unknown.pop();

        let mut w = ByteWriter::new();
        assert!(matches!(
            pilot.write(&mut w),
            Err(FormatError::InvalidInput(_))
        ));
    }

    #[test]
    fn har_lookup_recognizes_known_ids_only() {
        let mut pilot = sample_pilot();
        assert_eq!(pilot.har(), Some(HarId::Shadow));

        pilot.har_id = 200;
        assert_eq!(pilot.har(), None);
    }
}
