use ratatui::style::Color;

pub const PRIMARY: Color = Color::from_u32(0x0062a8f5);
pub const SECONDARY: Color = Color::from_u32(0x002f5f9c);
pub const NEUTRAL: Color = Color::from_u32(0x00454a52);
pub const BACKGROUND: Color = Color::from_u32(0x000e1116);
pub const ACCENT: Color = Color::from_u32(0x00f2c14e);
pub const ERROR: Color = Color::from_u32(0x00e5534b);
