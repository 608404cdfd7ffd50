use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// @module: Typed style and position configuration

/// Upper bound on outline passes the renderer will draw
pub const MAX_BORDERS: usize = 2;

/// Default channel and pixel offsets for generated strips.
///
/// Exists at document scope (one instance) and, sparsely, per cue via
/// [`PositionOverride`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PositionSettings {
    /// Timeline channel the strip is placed on
    #[serde(default = "default_channel_no")]
    pub channel_no: u32,

    /// Horizontal offset from the anchor point, in px
    #[serde(default)]
    pub offset_x: f64,

    /// Vertical offset from the anchor point, in px
    #[serde(default = "default_offset_y")]
    pub offset_y: f64,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            channel_no: default_channel_no(),
            offset_x: 0.0,
            offset_y: default_offset_y(),
        }
    }
}

/// Per-cue position override. Each field is independent: a cue may move
/// only vertically and still inherit the default channel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PositionOverride {
    /// Override for [`PositionSettings::channel_no`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_no: Option<u32>,

    /// Override for [`PositionSettings::offset_x`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f64>,

    /// Override for [`PositionSettings::offset_y`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f64>,
}

impl PositionOverride {
    /// True when no field is overridden
    pub fn is_empty(&self) -> bool {
        self.channel_no.is_none() && self.offset_x.is_none() && self.offset_y.is_none()
    }

    /// Layer this override onto the document defaults
    pub fn resolve(&self, defaults: &PositionSettings) -> PositionSettings {
        PositionSettings {
            channel_no: self.channel_no.unwrap_or(defaults.channel_no),
            offset_x: self.offset_x.unwrap_or(defaults.offset_x),
            offset_y: self.offset_y.unwrap_or(defaults.offset_y),
        }
    }
}

/// Transparent padding kept around the cropped caption, in px
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CropStyle {
    pub padding_x: i32,
    pub padding_y: i32,
}

impl Default for CropStyle {
    fn default() -> Self {
        Self {
            padding_x: 20,
            padding_y: 20,
        }
    }
}

/// Text alignment inside the caption image
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Font face, size and fill
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TextStyle {
    pub font_family: String,
    /// Font size in px
    pub size: u32,
    /// Foreground color, #RRGGBB
    pub color: String,
    pub align: TextAlign,
    /// Line spacing as a ratio of the font size
    pub line_space_rate: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Noto Sans JP Bold".to_string(),
            size: 48,
            color: "#40516a".to_string(),
            align: TextAlign::Center,
            line_space_rate: -0.3,
        }
    }
}

/// One outline pass around the glyphs
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BorderStyle {
    /// Outline color, #RRGGBB
    pub color: String,
    /// Outline width as a ratio of the font size
    pub rate: f64,
    /// Feather width in px, 0 for a hard edge
    pub feather: f64,
}

impl BorderStyle {
    fn new(color: &str) -> Self {
        Self {
            color: color.to_string(),
            rate: 0.08,
            feather: 0.0,
        }
    }
}

/// Drop shadow behind the caption
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShadowStyle {
    pub enabled: bool,
    /// Shadow color, #RRGGBB
    pub color: String,
    /// Shadow opacity, 0..=1
    pub opacity: f64,
    /// Horizontal shadow offset in px
    pub offset_x: i32,
    /// Vertical shadow offset in px
    pub offset_y: i32,
    /// Blur radius in px
    pub blur_radius: i32,
}

impl Default for ShadowStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            color: "#000000".to_string(),
            opacity: 1.0,
            offset_x: 10,
            offset_y: 10,
            blur_radius: 15,
        }
    }
}

/// Filled background box behind the caption
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BoxStyle {
    pub enabled: bool,
    /// Box color, #RRGGBB
    pub color: String,
    /// Box opacity, 0..=1
    pub opacity: f64,
    /// Horizontal box padding in px
    pub padding_x: i32,
    /// Vertical box padding in px
    pub padding_y: i32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            enabled: false,
            color: "#cccccc".to_string(),
            opacity: 1.0,
            padding_x: 20,
            padding_y: 20,
        }
    }
}

/// Full visual configuration of a caption image.
///
/// One instance holds the document-wide defaults; per-cue overrides stay in
/// their sparse generic-tree form and are layered on by the merge engine
/// (see `settings_merge`), never materialized into this type.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StyleConfig {
    #[serde(default)]
    pub crop: CropStyle,

    #[serde(default)]
    pub text: TextStyle,

    /// Outline passes, innermost first. At most [`MAX_BORDERS`] are drawn.
    #[serde(default = "default_borders")]
    pub borders: Vec<BorderStyle>,

    #[serde(default)]
    pub shadow: ShadowStyle,

    #[serde(default, rename = "box")]
    pub box_style: BoxStyle,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            crop: CropStyle::default(),
            text: TextStyle::default(),
            borders: default_borders(),
            shadow: ShadowStyle::default(),
            box_style: BoxStyle::default(),
        }
    }
}

impl StyleConfig {
    /// Serialize into the generic configuration tree the merge engine and
    /// the renderer boundary operate on
    pub fn to_tree(&self) -> Value {
        // Serialization of a plain struct cannot fail
        serde_json::to_value(self).expect("style config is always JSON-representable")
    }

    /// Rebuild a typed configuration from a generic tree, filling absent
    /// keys with defaults
    pub fn from_tree(tree: &Value) -> Result<Self> {
        serde_json::from_value(tree.clone()).context("style tree does not match the schema")
    }
}

fn default_channel_no() -> u32 {
    1
}

fn default_offset_y() -> f64 {
    -400.0
}

fn default_borders() -> Vec<BorderStyle> {
    vec![BorderStyle::new("#ffffff"), BorderStyle::new("#40516a")]
}
