use std::{fs, path::Path};

use crate::{
    FormatError,
    palette::Palette,
    rgba::RgbaImage,
    rle,
    stream::ByteCursor,
};

pub const HEADER_SIZE: usize = 128;
pub const WIDTH: usize = 320;
pub const HEIGHT: usize = 200;

const HEADER_PALETTE_SIZE: usize = 48;

/// A run-length-coded raster file with a fixed 128-byte header and a
/// 320×200 image. Decode-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcxFile {
    pub manufacturer: u8,
    pub version: u8,
    pub encoding: u8,
    pub bits_per_plane: u8,

    pub window_x_min: u16,
    pub window_y_min: u16,
    pub window_x_max: u16,
    pub window_y_max: u16,

    pub horz_dpi: u16,
    pub vert_dpi: u16,

    /// The 16-color header palette, 3 bytes per entry.
    pub palette: [u8; HEADER_PALETTE_SIZE],
    pub reserved: u8,
    pub color_planes: u8,

    pub bytes_per_plane_line: u16,
    pub palette_info: u16,
    pub hor_scr_size: u16,
    pub ver_scr_size: u16,

    /// 320×200 palette indices, row-major.
    pub image: Vec<u8>,
}

impl PcxFile {
    /**
    Decodes a raster file from a byte buffer.

    A buffer that cannot hold more than the 128-byte header is rejected
    before any field is read.

    # Errors
    - [`FormatError::FileRead`] when the buffer is too short for the header
    - [`FormatError::FileParse`] when a run overflows its scanline
    */
    pub fn from_bytes(bytes: &[u8]) -> Result<PcxFile, FormatError> {
        if bytes.len() <= HEADER_SIZE {
            return Err(FormatError::FileRead(format!(
                "{} bytes is too short for a {}-byte header and image data",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let mut cur = ByteCursor::from_slice(bytes);

        let manufacturer = cur.read_u8()?;
        let version = cur.read_u8()?;
        let encoding = cur.read_u8()?;
        let bits_per_plane = cur.read_u8()?;

        let window_x_min = cur.read_u16()?;
        let window_y_min = cur.read_u16()?;
        let window_x_max = cur.read_u16()?;
        let window_y_max = cur.read_u16()?;

        let horz_dpi = cur.read_u16()?;
        let vert_dpi = cur.read_u16()?;

        let palette = cur.read_buf::<HEADER_PALETTE_SIZE>()?;
        let reserved = cur.read_u8()?;
        let color_planes = cur.read_u8()?;

        let bytes_per_plane_line = cur.read_u16()?;
        let palette_info = cur.read_u16()?;
        let hor_scr_size = cur.read_u16()?;
        let ver_scr_size = cur.read_u16()?;

        // The rest of the header is reserved padding.
        cur.seek(HEADER_SIZE)?;

        let image =
            rle::decode_image(&mut cur, WIDTH, HEIGHT).map_err(|e| e.in_stage("scanline data"))?;

        Ok(PcxFile {
            manufacturer,
            version,
            encoding,
            bits_per_plane,
            window_x_min,
            window_y_min,
            window_x_max,
            window_y_max,
            horz_dpi,
            vert_dpi,
            palette,
            reserved,
            color_planes,
            bytes_per_plane_line,
            palette_info,
            hor_scr_size,
            ver_scr_size,
            image,
        })
    }

    pub fn load(path: &Path) -> Result<PcxFile, FormatError> {
        let bytes = fs::read(path)
            .map_err(|e| FormatError::FileOpen(format!("{}: {}", path.display(), e)))?;
        PcxFile::from_bytes(&bytes)
    }

    /// The header palette as a table; entries beyond the 16 stored colors
    /// stay black.
    pub fn header_palette(&self) -> Palette {
        let mut pal = Palette::new();
        for (i, rgb) in self.palette.chunks(3).enumerate() {
            pal.set_color(i as u8, [rgb[0], rgb[1], rgb[2]]);
        }
        pal
    }

    /// Pure palette lookup over the decoded raster.
    pub fn decode_rgba(&self, pal: &Palette) -> RgbaImage {
        let mut data = Vec::with_capacity(self.image.len() * 4);
        for pixel in &self.image {
            data.extend_from_slice(&pal.rgba(*pixel));
        }

        RgbaImage {
            width: WIDTH as u16,
            height: HEIGHT as u16,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::ByteWriter;

    /// A full 320x200 RLE stream, each row a single value emitted as runs.
    fn scanlines() -> Vec<u8> {
        let mut w = ByteWriter::new();
        for row in 0..HEIGHT {
            let value = (row % 190) as u8;
            let mut left = WIDTH;
            while left > 0 {
                let run = left.min(63);
                w.write_u8(rle::RUN_FLAG + run as u8);
                w.write_u8(value);
                left -= run;
            }
        }
        w.into_inner()
    }

    fn sample_pcx_bytes() -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_u8(10); // manufacturer
        w.write_u8(5); // version
        w.write_u8(1); // encoding
        w.write_u8(8); // bits per plane
        w.write_u16(0);
        w.write_u16(0);
        w.write_u16(319);
        w.write_u16(199);
        w.write_u16(72);
        w.write_u16(72);
        for i in 0..HEADER_PALETTE_SIZE {
            w.write_u8(i as u8);
        }
        w.write_u8(0); // reserved
        w.write_u8(1); // color planes
        w.write_u16(320);
        w.write_u16(1);
        w.write_u16(320);
        w.write_u16(200);
        while w.len() < HEADER_SIZE {
            w.write_u8(0);
        }
        w.write_bytes(&scanlines());
        w.into_inner()
    }

    #[test]
    fn short_file_is_rejected_before_decoding() {
        assert!(matches!(
            PcxFile::from_bytes(&[0; 128]),
            Err(FormatError::FileRead(_))
        ));
    }

    #[test]
    fn header_fields_and_image_decode() {
        let pcx = PcxFile::from_bytes(&sample_pcx_bytes()).unwrap();

        assert_eq!(pcx.manufacturer, 10);
        assert_eq!(pcx.version, 5);
        assert_eq!(pcx.window_x_max, 319);
        assert_eq!(pcx.window_y_max, 199);
        assert_eq!(pcx.bytes_per_plane_line, 320);

        assert_eq!(pcx.image.len(), WIDTH * HEIGHT);
        assert_eq!(pcx.image[0], 0);
        assert_eq!(pcx.image[WIDTH], 1);
        assert_eq!(pcx.image[WIDTH * 3 + 57], 3);
    }

    #[test]
    fn header_palette_is_a_sixteen_color_table() {
        let pcx = PcxFile::from_bytes(&sample_pcx_bytes()).unwrap();
        let pal = pcx.header_palette();

        assert_eq!(pal.color(0), [0, 1, 2]);
        assert_eq!(pal.color(15), [45, 46, 47]);
        assert_eq!(pal.color(16), [0, 0, 0]);
    }

    #[test]
    fn overlong_run_in_a_scanline_is_rejected() {
        let mut bytes = sample_pcx_bytes();
        // The first row ends in a run of 5; claim 63 instead so the run
        // overflows the 5 pixels the row has left.
        bytes[HEADER_SIZE + 10] = rle::RUN_FLAG + 63;

        assert!(matches!(
            PcxFile::from_bytes(&bytes),
            Err(FormatError::FileParse(_))
        ));
    }
}
