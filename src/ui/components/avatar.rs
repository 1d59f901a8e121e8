use image::imageops::FilterType;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

/// A picture downscaled to terminal cells. Each cell shows two pixels, the
/// upper one as foreground of `▀` and the lower one as background.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    width: u16,
    height: u16,
    pixels: Vec<[u8; 3]>,
}

impl Thumbnail {
    /// `None` when the bytes are not an image the decoder understands.
    pub fn from_bytes(bytes: &[u8], width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let decoded = image::load_from_memory(bytes).ok()?;
        let resized = decoded
            .resize_exact(width as u32, height as u32 * 2, FilterType::Triangle)
            .to_rgb8();

        Some(Self {
            width,
            height,
            pixels: resized.pixels().map(|p| p.0).collect(),
        })
    }

    /// Decodes on the blocking pool, off the async workers.
    pub async fn decode(bytes: Vec<u8>, width: u16, height: u16) -> Option<Self> {
        tokio::task::spawn_blocking(move || Self::from_bytes(&bytes, width, height))
            .await
            .ok()
            .flatten()
    }

    #[cfg(test)]
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn pixel(&self, x: u16, y: u16) -> Color {
        let [r, g, b] = self.pixels[y as usize * self.width as usize + x as usize];
        Color::Rgb(r, g, b)
    }
}

impl Widget for &Thumbnail {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for row in 0..self.height.min(area.height) {
            for col in 0..self.width.min(area.width) {
                if let Some(cell) = buf.cell_mut((area.x + col, area.y + row)) {
                    cell.set_symbol("▀")
                        .set_fg(self.pixel(col, row * 2))
                        .set_bg(self.pixel(col, row * 2 + 1));
                }
            }
        }
    }
}
