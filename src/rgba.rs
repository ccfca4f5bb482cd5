use std::{fs::File, io::BufWriter, path::Path};

/// A decoded RGBA pixel buffer, ready for texture upload or export. The
/// windowing and presentation side lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl RgbaImage {
    pub fn write_png(&self, path: &Path) -> Result<(), std::io::Error> {
        let file = File::create(path)?;
        let w = &mut BufWriter::new(file);

        let mut encoder = png::Encoder::new(w, self.width as u32, self.height as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        writer.finish()?;

        Ok(())
    }
}
