/*!
 * Tests for the caption document codec
 */

use anyhow::Result;
use serde_json::json;

use capstrip::errors::FormatError;
use capstrip::srt::{Cue, CueDocument, JSON_MARKER};
use capstrip::style::PositionOverride;

use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = Cue::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5025678);

    let formatted = Cue::format_timestamp(ms);
    assert_eq!(formatted, ts);
}

#[test]
fn test_timestamp_parsing_withOutOfRangeFields_shouldFail() {
    assert!(matches!(
        Cue::parse_timestamp("00:60:00,000"),
        Err(FormatError::BadTimestamp(_))
    ));
    assert!(matches!(
        Cue::parse_timestamp("00:00:61,000"),
        Err(FormatError::BadTimestamp(_))
    ));
    assert!(matches!(
        Cue::parse_timestamp("00:00:00,1000"),
        Err(FormatError::BadTimestamp(_))
    ));
    assert!(matches!(
        Cue::parse_timestamp("00:00:00"),
        Err(FormatError::BadTimestamp(_))
    ));
}

#[test]
fn test_frame_conversion_withRoundTrip_shouldBeExactAtMillisecondGranularity() {
    for fps in [23.976, 24.0, 25.0, 29.97, 60.0] {
        for ms in [0u64, 1, 999, 1000, 5025678] {
            let frames = Cue::frames_from_ms(ms, fps);
            assert_eq!(Cue::ms_from_frames(frames, fps), ms, "fps {}", fps);
        }
    }
}

#[test]
fn test_parse_withValidDocument_shouldProduceCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_caption(temp_dir.path(), "test.srt")?;

    let doc = CueDocument::from_file(&path, 24.0)?;
    assert_eq!(doc.cues.len(), 3);
    assert_eq!(doc.fps, 24.0);
    assert_eq!(doc.source_file.as_deref(), Some(path.as_path()));

    let first = &doc.cues[0];
    assert_eq!(first.no, 1);
    assert_eq!(first.text, "This is a test caption.");
    // 1s at 24 fps
    assert_eq!(first.start_frame, 24.0);
    assert_eq!(first.frame_duration, 72.0);
    assert!(first.settings_override.is_none());
    assert!(first.style_override.is_none());

    let third = &doc.cues[2];
    assert_eq!(third.text, "Across two\nlines.");
    Ok(())
}

#[test]
fn test_parse_withJsonOverride_shouldSplitPositionAndStyles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_caption(temp_dir.path(), "test.srt")?;

    let doc = CueDocument::from_file(&path, 24.0)?;
    let cue = doc.cue(2).unwrap();

    let settings = cue.settings_override.as_ref().unwrap();
    assert_eq!(settings.offset_y, Some(-200.0));
    assert_eq!(settings.channel_no, None);
    assert_eq!(settings.offset_x, None);

    let styles = cue.style_override.as_ref().unwrap();
    assert_eq!(styles, &json!({"text": {"size": 64}}));
    Ok(())
}

#[test]
fn test_parse_withNonJsonTrailingContent_shouldIgnoreIt() {
    let content = "1\n00:00:01,000 --> 00:00:02,000 X-POSITION:left\nHello\n";
    let cues = CueDocument::parse_str(content, 24.0).unwrap();
    assert_eq!(cues.len(), 1);
    assert!(cues[0].settings_override.is_none());
    assert!(cues[0].style_override.is_none());
}

#[test]
fn test_parse_withMalformedJsonOverride_shouldFail() {
    let content = "1\n00:00:01,000 --> 00:00:02,000 JSON:{not json}\nHello\n";
    let err = CueDocument::parse_str(content, 24.0).unwrap_err();
    assert!(matches!(err, FormatError::BadOverride { line: 2, .. }));
}

#[test]
fn test_parse_withNonObjectJsonOverride_shouldFail() {
    let content = "1\n00:00:01,000 --> 00:00:02,000 JSON:[1, 2]\nHello\n";
    let err = CueDocument::parse_str(content, 24.0).unwrap_err();
    assert!(matches!(err, FormatError::BadBlock { line: 2, .. }));
}

#[test]
fn test_parse_withMissingTimeRange_shouldFail() {
    let content = "1\nHello there\n\n";
    let err = CueDocument::parse_str(content, 24.0).unwrap_err();
    assert!(matches!(err, FormatError::BadTimeRange { line: 2, .. }));
}

#[test]
fn test_parse_withNonNumericCueNumber_shouldFail() {
    let content = "one\n00:00:01,000 --> 00:00:02,000\nHello\n";
    let err = CueDocument::parse_str(content, 24.0).unwrap_err();
    assert!(matches!(err, FormatError::BadBlock { line: 1, .. }));
}

#[test]
fn test_parse_withTruncatedFinalBlock_shouldFail() {
    // Number line at EOF, no time range
    let err = CueDocument::parse_str("1\n", 24.0).unwrap_err();
    assert!(matches!(err, FormatError::BadBlock { .. }));

    // Time range but no text
    let err = CueDocument::parse_str("1\n00:00:01,000 --> 00:00:02,000\n\n", 24.0).unwrap_err();
    assert!(matches!(err, FormatError::BadBlock { .. }));
}

#[test]
fn test_parse_withFinalBlockAtEof_shouldAcceptMissingTrailingBlankLine() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nNo trailing newline block";
    let cues = CueDocument::parse_str(content, 24.0).unwrap();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "No trailing newline block");
}

#[test]
fn test_parse_withCrlfLineEndings_shouldParse() {
    let content = "1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n";
    let cues = CueDocument::parse_str(content, 24.0).unwrap();
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].text, "Hello");
}

#[test]
fn test_serialize_withOverrides_shouldRoundTrip() {
    let mut doc = CueDocument::new(24.0);
    doc.cues.push(Cue::new(1, "Plain cue".to_string(), 24.0, 48.0));

    let mut decorated = Cue::new(2, "Styled\ncue".to_string(), 120.0, 96.0);
    decorated.settings_override = Some(PositionOverride {
        channel_no: Some(3),
        offset_x: None,
        offset_y: Some(-200.0),
    });
    decorated.style_override = Some(json!({"text": {"size": 64}}));
    doc.cues.push(decorated);

    let text = doc.serialize();
    assert!(text.contains("00:00:01,000 --> 00:00:03,000"));
    assert!(text.contains(JSON_MARKER));
    // Plain cue must not carry the marker on its line
    let plain_line = text
        .lines()
        .find(|l| l.starts_with("00:00:01,000"))
        .unwrap();
    assert!(!plain_line.contains(JSON_MARKER));

    let reparsed = CueDocument::parse_str(&text, 24.0).unwrap();
    assert_eq!(reparsed, doc.cues);
}

#[test]
fn test_serialize_withPlainDocument_shouldReproduceInputBytes() {
    let content = "1\n00:00:01,000 --> 00:00:04,000\nHello\n\n2\n00:00:05,000 --> 00:00:09,000\nWorld\n\n";
    let mut doc = CueDocument::new(24.0);
    doc.cues = CueDocument::parse_str(content, 24.0).unwrap();
    assert_eq!(doc.serialize(), content);
}

#[test]
fn test_override_tree_withNoOverrides_shouldBeNone() {
    let cue = Cue::new(1, "Plain".to_string(), 0.0, 24.0);
    assert!(cue.override_tree().is_none());

    let mut cue = Cue::new(2, "Empty override".to_string(), 0.0, 24.0);
    cue.settings_override = Some(PositionOverride::default());
    assert!(cue.override_tree().is_none());
}

#[test]
fn test_max_cue_number_withEmptyDocument_shouldBeZero() {
    let doc = CueDocument::new(24.0);
    assert_eq!(doc.max_cue_number(), 0);

    let mut doc = CueDocument::new(24.0);
    doc.cues.push(Cue::new(7, "Seven".to_string(), 0.0, 24.0));
    doc.cues.push(Cue::new(3, "Three".to_string(), 0.0, 24.0));
    assert_eq!(doc.max_cue_number(), 7);
}
