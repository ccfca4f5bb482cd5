//! Typed field access for the editing tool: each record exposes its
//! editable fields through a small enum, with range-checked indices and a
//! recognizable error for anything that does not resolve. Parsing key
//! *syntax* stays outside the crate.

use std::{error::Error, fmt};

use crate::{
    bk::{AnimSlot, BkFile},
    pilot::Pilot,
    sprite::Sprite,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    I16(i16),
    I32(i32),
    Bytes(Vec<u8>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U8(v) => write!(f, "{}", v),
            FieldValue::U16(v) => write!(f, "{}", v),
            FieldValue::U32(v) => write!(f, "{}", v),
            FieldValue::I16(v) => write!(f, "{}", v),
            FieldValue::I32(v) => write!(f, "{}", v),
            FieldValue::Bytes(v) => write!(f, "{}", String::from_utf8_lossy(v)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// The indexed entry does not exist on this record.
    IndexOutOfRange,
    /// The supplied value's type does not match the field.
    TypeMismatch,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for FieldError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteField {
    PosX,
    PosY,
    Index,
    Missing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimField {
    ChainHit,
    ChainNoHit,
    Repeat,
    Probability,
    HazardDamage,
    SlotString,
    StartX,
    StartY,
    Header(usize),
    Overlay(usize),
    AnimString,
    Unknown,
    ExtraString(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BkField {
    FileId,
    UnknownA,
    Footer(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotField {
    Name,
    Wins,
    Losses,
    Rank,
    Har,
    ArmPower,
    LegPower,
    ArmSpeed,
    LegSpeed,
    Armor,
    StunResistance,
    Power,
    Agility,
    Endurance,
    Offense,
    Defense,
    Money,
    Color1,
    Color2,
    Color3,
    PhotoId,
    EnemiesIncUnranked,
    EnemiesExUnranked,
    Winnings,
    TotalValue,
}

impl Sprite {
    pub fn get_field(&self, field: SpriteField) -> FieldValue {
        match field {
            SpriteField::PosX => FieldValue::I16(self.pos_x),
            SpriteField::PosY => FieldValue::I16(self.pos_y),
            SpriteField::Index => FieldValue::U8(self.index),
            SpriteField::Missing => FieldValue::U8(self.missing),
        }
    }

    pub fn set_field(&mut self, field: SpriteField, value: FieldValue) -> Result<(), FieldError> {
        match (field, value) {
            (SpriteField::PosX, FieldValue::I16(v)) => self.pos_x = v,
            (SpriteField::PosY, FieldValue::I16(v)) => self.pos_y = v,
            (SpriteField::Index, FieldValue::U8(v)) => self.index = v,
            (SpriteField::Missing, FieldValue::U8(v)) => self.missing = v,
            _ => return Err(FieldError::TypeMismatch),
        }
        Ok(())
    }
}

impl AnimSlot {
    pub fn get_field(&self, field: AnimField) -> Result<FieldValue, FieldError> {
        let value = match field {
            AnimField::ChainHit => FieldValue::U8(self.chain_hit),
            AnimField::ChainNoHit => FieldValue::U8(self.chain_no_hit),
            AnimField::Repeat => FieldValue::U8(self.repeat),
            AnimField::Probability => FieldValue::U16(self.probability),
            AnimField::HazardDamage => FieldValue::U8(self.hazard_damage),
            AnimField::SlotString => FieldValue::Bytes(self.string.clone()),
            AnimField::StartX => FieldValue::I16(self.animation.start_x),
            AnimField::StartY => FieldValue::I16(self.animation.start_y),
            AnimField::Header(i) => FieldValue::U8(
                *self
                    .animation
                    .header
                    .get(i)
                    .ok_or(FieldError::IndexOutOfRange)?,
            ),
            AnimField::Overlay(i) => FieldValue::U32(
                *self
                    .animation
                    .overlay_table
                    .get(i)
                    .ok_or(FieldError::IndexOutOfRange)?,
            ),
            AnimField::AnimString => FieldValue::Bytes(self.animation.anim_string.clone()),
            AnimField::Unknown => FieldValue::U8(self.animation.unknown_b),
            AnimField::ExtraString(i) => FieldValue::Bytes(
                self.animation
                    .extra_strings
                    .get(i)
                    .ok_or(FieldError::IndexOutOfRange)?
                    .clone(),
            ),
        };
        Ok(value)
    }

    pub fn set_field(&mut self, field: AnimField, value: FieldValue) -> Result<(), FieldError> {
        match (field, value) {
            (AnimField::ChainHit, FieldValue::U8(v)) => self.chain_hit = v,
            (AnimField::ChainNoHit, FieldValue::U8(v)) => self.chain_no_hit = v,
            (AnimField::Repeat, FieldValue::U8(v)) => self.repeat = v,
            (AnimField::Probability, FieldValue::U16(v)) => self.probability = v,
            (AnimField::HazardDamage, FieldValue::U8(v)) => self.hazard_damage = v,
            (AnimField::SlotString, FieldValue::Bytes(v)) => self.string = v,
            (AnimField::StartX, FieldValue::I16(v)) => self.animation.start_x = v,
            (AnimField::StartY, FieldValue::I16(v)) => self.animation.start_y = v,
            (AnimField::Header(i), FieldValue::U8(v)) => {
                *self
                    .animation
                    .header
                    .get_mut(i)
                    .ok_or(FieldError::IndexOutOfRange)? = v
            }
            (AnimField::Overlay(i), FieldValue::U32(v)) => {
                *self
                    .animation
                    .overlay_table
                    .get_mut(i)
                    .ok_or(FieldError::IndexOutOfRange)? = v
            }
            (AnimField::AnimString, FieldValue::Bytes(v)) => self.animation.anim_string = v,
            (AnimField::Unknown, FieldValue::U8(v)) => self.animation.unknown_b = v,
            (AnimField::ExtraString(i), FieldValue::Bytes(v)) => {
                *self
                    .animation
                    .extra_strings
                    .get_mut(i)
                    .ok_or(FieldError::IndexOutOfRange)? = v
            }
            _ => return Err(FieldError::TypeMismatch),
        }
        Ok(())
    }
}

impl BkFile {
    pub fn get_field(&self, field: BkField) -> Result<FieldValue, FieldError> {
        let value = match field {
            BkField::FileId => FieldValue::U32(self.file_id),
            BkField::UnknownA => FieldValue::U8(self.unknown_a),
            BkField::Footer(i) => {
                FieldValue::U8(*self.footer.get(i).ok_or(FieldError::IndexOutOfRange)?)
            }
        };
        Ok(value)
    }

    pub fn set_field(&mut self, field: BkField, value: FieldValue) -> Result<(), FieldError> {
        match (field, value) {
            (BkField::FileId, FieldValue::U32(v)) => self.file_id = v,
            (BkField::UnknownA, FieldValue::U8(v)) => self.unknown_a = v,
            (BkField::Footer(i), FieldValue::U8(v)) => {
                *self.footer.get_mut(i).ok_or(FieldError::IndexOutOfRange)? = v
            }
            _ => return Err(FieldError::TypeMismatch),
        }
        Ok(())
    }
}

impl Pilot {
    pub fn get_field(&self, field: PilotField) -> FieldValue {
        match field {
            PilotField::Name => FieldValue::Bytes(self.name().as_bytes().to_vec()),
            PilotField::Wins => FieldValue::U16(self.wins),
            PilotField::Losses => FieldValue::U16(self.losses),
            PilotField::Rank => FieldValue::U8(self.rank),
            PilotField::Har => FieldValue::U8(self.har_id),
            PilotField::ArmPower => FieldValue::U8(self.arm_power),
            PilotField::LegPower => FieldValue::U8(self.leg_power),
            PilotField::ArmSpeed => FieldValue::U8(self.arm_speed),
            PilotField::LegSpeed => FieldValue::U8(self.leg_speed),
            PilotField::Armor => FieldValue::U8(self.armor),
            PilotField::StunResistance => FieldValue::U8(self.stun_resistance),
            PilotField::Power => FieldValue::U8(self.power),
            PilotField::Agility => FieldValue::U8(self.agility),
            PilotField::Endurance => FieldValue::U8(self.endurance),
            PilotField::Offense => FieldValue::U8(self.offense),
            PilotField::Defense => FieldValue::U8(self.defense),
            PilotField::Money => FieldValue::I32(self.money),
            PilotField::Color1 => FieldValue::U8(self.color_1),
            PilotField::Color2 => FieldValue::U8(self.color_2),
            PilotField::Color3 => FieldValue::U8(self.color_3),
            PilotField::PhotoId => FieldValue::U8(self.photo_id),
            PilotField::EnemiesIncUnranked => FieldValue::U16(self.enemies_inc_unranked),
            PilotField::EnemiesExUnranked => FieldValue::U16(self.enemies_ex_unranked),
            PilotField::Winnings => FieldValue::I32(self.winnings),
            PilotField::TotalValue => FieldValue::I32(self.total_value),
        }
    }

    pub fn set_field(&mut self, field: PilotField, value: FieldValue) -> Result<(), FieldError> {
        match (field, value) {
            (PilotField::Name, FieldValue::Bytes(v)) => {
                self.set_name(&String::from_utf8_lossy(&v))
            }
            (PilotField::Wins, FieldValue::U16(v)) => self.wins = v,
            (PilotField::Losses, FieldValue::U16(v)) => self.losses = v,
            (PilotField::Rank, FieldValue::U8(v)) => self.rank = v,
            (PilotField::Har, FieldValue::U8(v)) => self.har_id = v,
            (PilotField::ArmPower, FieldValue::U8(v)) => self.arm_power = v,
            (PilotField::LegPower, FieldValue::U8(v)) => self.leg_power = v,
            (PilotField::ArmSpeed, FieldValue::U8(v)) => self.arm_speed = v,
            (PilotField::LegSpeed, FieldValue::U8(v)) => self.leg_speed = v,
            (PilotField::Armor, FieldValue::U8(v)) => self.armor = v,
            (PilotField::StunResistance, FieldValue::U8(v)) => self.stun_resistance = v,
            (PilotField::Power, FieldValue::U8(v)) => self.power = v,
            (PilotField::Agility, FieldValue::U8(v)) => self.agility = v,
            (PilotField::Endurance, FieldValue::U8(v)) => self.endurance = v,
            (PilotField::Offense, FieldValue::U8(v)) => self.offense = v,
            (PilotField::Defense, FieldValue::U8(v)) => self.defense = v,
            (PilotField::Money, FieldValue::I32(v)) => self.money = v,
            (PilotField::Color1, FieldValue::U8(v)) => self.color_1 = v,
            (PilotField::Color2, FieldValue::U8(v)) => self.color_2 = v,
            (PilotField::Color3, FieldValue::U8(v)) => self.color_3 = v,
            (PilotField::PhotoId, FieldValue::U8(v)) => self.photo_id = v,
            (PilotField::EnemiesIncUnranked, FieldValue::U16(v)) => self.enemies_inc_unranked = v,
            (PilotField::EnemiesExUnranked, FieldValue::U16(v)) => self.enemies_ex_unranked = v,
            (PilotField::Winnings, FieldValue::I32(v)) => self.winnings = v,
            (PilotField::TotalValue, FieldValue::I32(v)) => self.total_value = v,
            _ => return Err(FieldError::TypeMismatch),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_fields_get_and_set() {
        let mut sprite = Sprite::default();
        sprite
            .set_field(SpriteField::PosX, FieldValue::I16(-5))
            .unwrap();

        assert_eq!(sprite.pos_x, -5);
        assert_eq!(sprite.get_field(SpriteField::PosX), FieldValue::I16(-5));
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut sprite = Sprite::default();
        assert_eq!(
            sprite.set_field(SpriteField::PosX, FieldValue::U32(1)),
            Err(FieldError::TypeMismatch)
        );
    }

    #[test]
    fn indexed_fields_are_range_checked() {
        let mut slot = AnimSlot::default();

        assert_eq!(
            slot.get_field(AnimField::Header(4)),
            Err(FieldError::IndexOutOfRange)
        );
        assert_eq!(
            slot.set_field(AnimField::Overlay(0), FieldValue::U32(1)),
            Err(FieldError::IndexOutOfRange)
        );

        slot.animation.overlay_table.push(0);
        slot.set_field(AnimField::Overlay(0), FieldValue::U32(42))
            .unwrap();
        assert_eq!(
            slot.get_field(AnimField::Overlay(0)),
            Ok(FieldValue::U32(42))
        );
    }

    #[test]
    fn footer_index_is_range_checked() {
        let mut bk = BkFile::default();

        bk.set_field(BkField::Footer(29), FieldValue::U8(7)).unwrap();
        assert_eq!(bk.footer[29], 7);
        assert_eq!(
            bk.set_field(BkField::Footer(30), FieldValue::U8(7)),
            Err(FieldError::IndexOutOfRange)
        );
    }

    #[test]
    fn pilot_name_sets_through_the_field_surface() {
        let mut pilot = Pilot::default();
        pilot
            .set_field(PilotField::Name, FieldValue::Bytes(b"Raven".to_vec()))
            .unwrap();

        assert_eq!(pilot.name(), "Raven");
        assert_eq!(
            pilot.get_field(PilotField::Name),
            FieldValue::Bytes(b"Raven".to_vec())
        );
    }
}
