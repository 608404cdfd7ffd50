use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::FormatError;

// @module: Hex color codec

// @const: Long form (#RRGGBB / #RRGGBBAA) regex
static HEX_LONG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})?\z").unwrap()
});

// @const: Short form (#RGB / #RGBA) regex
static HEX_SHORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A#([0-9a-fA-F])([0-9a-fA-F])([0-9a-fA-F])([0-9a-fA-F])?\z").unwrap()
});

/// Parse a compact hex color into a normalized RGBA vector.
///
/// Accepts `#RGB`, `#RGBA`, `#RRGGBB` and `#RRGGBBAA`. A missing alpha
/// component defaults to fully opaque. Each channel is normalized against
/// the maximum value of its digit width, so `#fff` and `#ffffff` both map
/// to `[1.0, 1.0, 1.0, 1.0]`.
pub fn hex_to_vector(hex_str: &str) -> Result<[f32; 4], FormatError> {
    if !hex_str.starts_with('#') {
        return Err(FormatError::BadColor(hex_str.to_string()));
    }

    let digits = hex_str.len() - 1;
    let (regex, max_value) = match digits {
        6 | 8 => (&*HEX_LONG_REGEX, 0xFFu32),
        3 | 4 => (&*HEX_SHORT_REGEX, 0xFu32),
        _ => return Err(FormatError::BadColor(hex_str.to_string())),
    };

    let caps = regex
        .captures(hex_str)
        .ok_or_else(|| FormatError::BadColor(hex_str.to_string()))?;

    let mut channels = [1.0f32; 4];
    for (i, channel) in channels.iter_mut().enumerate() {
        if let Some(m) = caps.get(i + 1) {
            // Digits are guaranteed hex by the regex
            let value = u32::from_str_radix(m.as_str(), 16).unwrap();
            *channel = value as f32 / max_value as f32;
        }
    }
    Ok(channels)
}

/// Format a normalized RGBA vector as a 6-digit `#rrggbb` string.
///
/// Opacity crosses the renderer boundary as a separate scalar, never as a
/// fourth hex pair, so the alpha channel is dropped here.
pub fn vector_to_hex(color: [f32; 4]) -> String {
    let to_byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        to_byte(color[0]),
        to_byte(color[1]),
        to_byte(color[2])
    )
}
