use eframe::egui::Color32;

pub const BLACK: Color32 = Color32::BLACK;
pub const WHITE: Color32 = Color32::WHITE;
pub const DARK_GRAY: Color32 = Color32::DARK_GRAY;
pub const TRANSPARENT: Color32 = Color32::TRANSPARENT;

pub const GRAY_30: Color32 = Color32::from_gray(30);
pub const GRAY_50: Color32 = Color32::from_gray(50);
pub const GRAY_180: Color32 = Color32::from_gray(180);
pub const GRAY_230: Color32 = Color32::from_gray(230);
pub const GRAY_240: Color32 = Color32::from_gray(240);

pub const VERY_LIGHT_BLUE: Color32 = Color32::from_rgb(220, 230, 245);
pub const MILD_BLUE: Color32 = Color32::from_rgb(55, 127, 153);
pub const DARK_BLUE: Color32 = Color32::from_rgb(51, 102, 153);
pub const VERY_LIGHT_YELLOW: Color32 = Color32::from_rgb(255, 255, 220);
pub const DARK_YELLOW: Color32 = Color32::from_rgb(242, 176, 34);
pub const MILD_RED: Color32 = Color32::from_rgb(220, 50, 50);

/// Background for coded text whose code has no usable color.
pub const FALLBACK_HIGHLIGHT: &str = "#F8E0E0";

/// Palette new codes draw a random color from. Light enough that black text
/// stays readable on top of each entry.
pub const CODE_PALETTE: [&str; 24] = [
    "#F8E0E0", "#F6CECE", "#F5A9A9", "#F7D8BF", "#F5D0A9", "#F3E2A9", "#F5F6CE",
    "#D0F5A9", "#A9F5A9", "#A9F5D0", "#A9F5F2", "#A9E2F3", "#A9BCF5", "#CEF6F5",
    "#CED8F6", "#D0A9F5", "#E2A9F3", "#F5A9E1", "#F6CEE3", "#E0E0F8", "#E0F8F7",
    "#E3F6CE", "#F6E3CE", "#E6E6E6",
];

pub fn random_code_color() -> String {
    let index = rand::random_range(0..CODE_PALETTE.len());
    CODE_PALETTE[index].to_string()
}

/// Parse a "#RRGGBB" string. Anything unparseable falls back to the
/// light red used for uncolored highlights.
pub fn color_from_hex(hex: &str) -> Color32 {
    parse_hex(hex).unwrap_or_else(|| parse_hex(FALLBACK_HIGHLIGHT).unwrap_or(WHITE))
}

fn parse_hex(hex: &str) -> Option<Color32> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}
