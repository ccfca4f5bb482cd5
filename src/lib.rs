pub mod stream;

pub mod rle;

pub mod anim;
pub mod bk;
pub mod chr;
pub mod palette;
pub mod pcx;
pub mod pilot;
pub mod sprite;

pub mod fields;
pub mod rgba;

use std::{error::Error, fmt};

pub use crate::{
    anim::Animation,
    bk::{AnimSlot, BkFile},
    chr::{ChrEnemy, ChrFile},
    palette::Palette,
    pcx::PcxFile,
    pilot::{HarId, Pilot},
    rgba::RgbaImage,
    sprite::Sprite,
    stream::{ByteCursor, ByteWriter},
};

#[derive(Debug)]
pub enum FormatError {
    /// A caller-supplied record or argument was unusable (bad range, mismatched
    /// lengths, value too large to serialize).
    InvalidInput(String),
    /// The source file could not be opened.
    FileOpen(String),
    /// The source was opened but held fewer bytes than the format requires.
    FileRead(String),
    /// The content is structurally invalid: a count over its bound, a window
    /// extending past the end of the stream, a run overflowing its row.
    FileParse(String),
    /// A cursor access crossed the end of its buffer.
    OutOfBounds { offset: usize, size: usize },
}

impl FormatError {
    /// Prefixes parse failures with the decode stage that produced them, so a
    /// failed root load names the record it died in.
    pub(crate) fn in_stage(self, stage: &str) -> FormatError {
        match self {
            FormatError::FileParse(msg) => {
                FormatError::FileParse(format!("{}: {}", stage, msg))
            }
            FormatError::OutOfBounds { offset, size } => FormatError::FileParse(format!(
                "{}: unexpected end of data (offset {} of {})",
                stage, offset, size
            )),
            other => other,
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Error for FormatError {}

impl From<std::io::Error> for FormatError {
    fn from(value: std::io::Error) -> Self {
        FormatError::FileRead(format!("File error: {}", value))
    }
}
