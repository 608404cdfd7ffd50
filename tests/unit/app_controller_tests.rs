/*!
 * Tests for the application controller
 */

use std::path::PathBuf;

use anyhow::Result;

use capstrip::app_config::Config;
use capstrip::app_controller::Controller;
use capstrip::file_utils::FileManager;
use capstrip::srt::CueDocument;

use crate::common;

fn controller() -> Controller {
    Controller::with_config(Config::default())
}

#[test]
fn test_with_config_withDefaults_shouldStartCleanAndEmpty() {
    let controller = controller();
    assert!(!controller.is_dirty());
    assert!(controller.document.cues.is_empty());
    assert_eq!(controller.document.fps, 24.0);
    // Each controller run gets its own provenance marker
    assert!(!controller.generated_by().is_empty());
}

#[test]
fn test_add_cue_withExistingCues_shouldNumberPastTheMaximum() {
    let mut controller = controller();
    let first = controller.add_cue("One".to_string(), 0.0, 24.0);
    let second = controller.add_cue("Two".to_string(), 48.0, 24.0);

    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert!(controller.is_dirty());

    // Numbering never reuses a freed number below the maximum
    controller.remove_cue(1).unwrap();
    let third = controller.add_cue("Three".to_string(), 96.0, 24.0);
    assert_eq!(third, 3);
}

#[test]
fn test_remove_cue_withUnknownNumber_shouldFail() {
    let mut controller = controller();
    assert!(controller.remove_cue(5).is_err());
    assert!(!controller.is_dirty());
}

#[test]
fn test_load_document_withSampleFile_shouldClearDirtyFlag() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_caption(temp_dir.path(), "test.srt")?;

    let mut controller = controller();
    controller.add_cue("Scratch".to_string(), 0.0, 24.0);
    assert!(controller.is_dirty());

    controller.load_document(&path)?;
    assert!(!controller.is_dirty());
    assert_eq!(controller.document.cues.len(), 3);
    Ok(())
}

#[test]
fn test_save_document_withNoFile_shouldFail() {
    let mut controller = controller();
    controller.add_cue("One".to_string(), 0.0, 24.0);
    assert!(controller.save_document(None).is_err());
}

#[test]
fn test_save_document_withEdits_shouldBackUpPreviousVersion() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("doc.srt");

    let mut controller = controller();
    controller.add_cue("One".to_string(), 24.0, 48.0);
    let saved = controller.save_document(Some(&path))?;
    assert_eq!(saved, path);
    assert!(!controller.is_dirty());

    // Second save of an edited document keeps the previous version
    controller.add_cue("Two".to_string(), 96.0, 48.0);
    controller.save_document(None)?;

    let backup = FileManager::backup_path(&path);
    assert!(backup.exists());
    let previous = CueDocument::parse_str(&FileManager::read_to_string(&backup)?, 24.0)?;
    assert_eq!(previous.len(), 1);
    let current = CueDocument::parse_str(&FileManager::read_to_string(&path)?, 24.0)?;
    assert_eq!(current.len(), 2);
    Ok(())
}

#[test]
fn test_pull_timing_from_strip_withGeneratedStrip_shouldUpdateCue() {
    let mut controller = controller();
    controller.add_cue("One".to_string(), 24.0, 48.0);

    // Stand in for a previous render: a generated strip the user has dragged
    let marker = controller.generated_by().to_string();
    let id = controller
        .timeline
        .new_image("1.png", PathBuf::from("1.png"), 1, 100.0, 180.0);
    {
        let strip = controller.timeline.strip_mut(id).unwrap();
        strip.generated_by = Some(marker);
        strip.cue_number = Some(1);
    }

    controller.pull_timing_from_strip(1).unwrap();
    let cue = controller.document.cue(1).unwrap();
    assert_eq!(cue.start_frame, 100.0);
    assert_eq!(cue.frame_duration, 80.0);
    assert!(controller.is_dirty());
}

#[test]
fn test_pull_timing_from_strip_withNoStrip_shouldFail() {
    let mut controller = controller();
    controller.add_cue("One".to_string(), 24.0, 48.0);
    assert!(controller.pull_timing_from_strip(1).is_err());
}

#[test]
fn test_playhead_timestamp_withFramePosition_shouldFormatAtDocumentRate() {
    let controller = controller();
    assert_eq!(controller.playhead_timestamp(48.0), "00:00:02,000");
    assert_eq!(controller.playhead_timestamp(0.0), "00:00:00,000");
    assert_eq!(controller.playhead_timestamp(36.0), "00:00:01,500");
}
