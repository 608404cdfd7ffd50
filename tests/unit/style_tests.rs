/*!
 * Tests for style and position configuration
 */

use serde_json::json;

use capstrip::style::{PositionOverride, PositionSettings, StyleConfig, TextAlign, MAX_BORDERS};

/// Test the document-wide position defaults
#[test]
fn test_position_settings_withDefaults_shouldMatchDocumentedValues() {
    let settings = PositionSettings::default();
    assert_eq!(settings.channel_no, 1);
    assert_eq!(settings.offset_x, 0.0);
    assert_eq!(settings.offset_y, -400.0);
}

#[test]
fn test_position_override_withPartialFields_shouldResolveIndependently() {
    let defaults = PositionSettings::default();
    let overrides = PositionOverride {
        channel_no: None,
        offset_x: None,
        offset_y: Some(-150.0),
    };

    let resolved = overrides.resolve(&defaults);
    assert_eq!(resolved.channel_no, 1);
    assert_eq!(resolved.offset_x, 0.0);
    assert_eq!(resolved.offset_y, -150.0);
}

#[test]
fn test_position_override_withNoFields_shouldSerializeEmpty() {
    let overrides = PositionOverride::default();
    assert!(overrides.is_empty());
    assert_eq!(serde_json::to_value(&overrides).unwrap(), json!({}));
}

#[test]
fn test_style_config_withDefaults_shouldMatchDocumentedValues() {
    let style = StyleConfig::default();
    assert_eq!(style.text.font_family, "Noto Sans JP Bold");
    assert_eq!(style.text.size, 48);
    assert_eq!(style.text.color, "#40516a");
    assert_eq!(style.text.align, TextAlign::Center);
    assert_eq!(style.crop.padding_x, 20);
    assert_eq!(style.borders.len(), MAX_BORDERS);
    assert_eq!(style.borders[0].color, "#ffffff");
    assert_eq!(style.borders[1].color, "#40516a");
    assert!(!style.shadow.enabled);
    assert!(!style.box_style.enabled);
}

#[test]
fn test_style_config_tree_withRoundTrip_shouldBeLossless() {
    let style = StyleConfig::default();
    let tree = style.to_tree();
    let rebuilt = StyleConfig::from_tree(&tree).unwrap();
    assert_eq!(rebuilt, style);
}

#[test]
fn test_style_config_tree_withBoxKey_shouldUseWireName() {
    let tree = StyleConfig::default().to_tree();
    assert!(tree.get("box").is_some());
    assert!(tree.get("box_style").is_none());
}

#[test]
fn test_style_config_from_tree_withSparseTree_shouldFillDefaults() {
    let tree = json!({"text": {"font_family": "Arial", "size": 32, "color": "#000000", "align": "left", "line_space_rate": 0.0}});
    let style = StyleConfig::from_tree(&tree).unwrap();
    assert_eq!(style.text.font_family, "Arial");
    assert_eq!(style.text.align, TextAlign::Left);
    // Absent sections come back as defaults
    assert_eq!(style.crop.padding_y, 20);
    assert_eq!(style.borders.len(), 2);
}

#[test]
fn test_style_config_from_tree_withWrongShape_shouldFail() {
    let tree = json!({"text": "not an object"});
    assert!(StyleConfig::from_tree(&tree).is_err());
}
