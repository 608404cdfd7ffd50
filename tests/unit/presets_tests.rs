/*!
 * Tests for named style preset storage
 */

use anyhow::Result;

use capstrip::errors::NameConflictError;
use capstrip::presets::{PresetScope, PresetStore, DEFAULT_PRESET};
use capstrip::style::StyleConfig;

use crate::common;

fn store() -> Result<(tempfile::TempDir, PresetStore)> {
    let temp_dir = common::create_temp_dir()?;
    let store = PresetStore::with_root(temp_dir.path());
    store.bootstrap(&StyleConfig::default())?;
    Ok((temp_dir, store))
}

#[test]
fn test_bootstrap_withEmptyRoot_shouldCreateDefaultPresetInBothScopes() -> Result<()> {
    let (_guard, store) = store()?;
    for scope in [PresetScope::Default, PresetScope::Cue] {
        assert_eq!(store.list(scope)?, vec![DEFAULT_PRESET.to_string()]);
        let loaded = store.load(scope, DEFAULT_PRESET)?;
        assert_eq!(loaded, StyleConfig::default());
    }
    Ok(())
}

#[test]
fn test_bootstrap_withExistingDefault_shouldNotOverwrite() -> Result<()> {
    let (_guard, store) = store()?;
    let mut custom = StyleConfig::default();
    custom.text.size = 99;
    store.update(PresetScope::Cue, DEFAULT_PRESET, &custom)?;

    // A second bootstrap must leave the edited default alone
    store.bootstrap(&StyleConfig::default())?;
    assert_eq!(store.load(PresetScope::Cue, DEFAULT_PRESET)?.text.size, 99);
    Ok(())
}

#[test]
fn test_save_as_withNewName_shouldRoundTrip() -> Result<()> {
    let (_guard, store) = store()?;
    let mut style = StyleConfig::default();
    style.text.color = "#112233".to_string();

    store.save_as(PresetScope::Cue, "emphasis", &style)?;
    assert_eq!(store.load(PresetScope::Cue, "emphasis")?, style);
    assert_eq!(
        store.list(PresetScope::Cue)?,
        vec![DEFAULT_PRESET.to_string(), "emphasis".to_string()]
    );
    // Scopes are partitioned
    assert_eq!(store.list(PresetScope::Default)?, vec![DEFAULT_PRESET.to_string()]);
    Ok(())
}

#[test]
fn test_save_as_withTakenName_shouldRejectBeforeWriting() -> Result<()> {
    let (_guard, store) = store()?;
    let err = store
        .save_as(PresetScope::Cue, DEFAULT_PRESET, &StyleConfig::default())
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NameConflictError>(),
        Some(NameConflictError::AlreadyExists(_))
    ));
    Ok(())
}

#[test]
fn test_save_as_withUnusableName_shouldReject() -> Result<()> {
    let (_guard, store) = store()?;
    for name in ["", "  ", ".hidden", "a/b", "a\\b"] {
        let err = store
            .save_as(PresetScope::Cue, name, &StyleConfig::default())
            .unwrap_err();
        assert!(
            matches!(
                err.downcast_ref::<NameConflictError>(),
                Some(NameConflictError::InvalidName(_))
            ),
            "name {:?} was accepted",
            name
        );
    }
    Ok(())
}

#[test]
fn test_rename_withOrdinaryPreset_shouldMoveFile() -> Result<()> {
    let (_guard, store) = store()?;
    store.save_as(PresetScope::Cue, "old", &StyleConfig::default())?;
    store.rename(PresetScope::Cue, "old", "new")?;

    assert!(store.load(PresetScope::Cue, "new").is_ok());
    assert!(store.load(PresetScope::Cue, "old").is_err());
    Ok(())
}

#[test]
fn test_rename_withDefaultPreset_shouldBeProtected() -> Result<()> {
    let (_guard, store) = store()?;
    let err = store
        .rename(PresetScope::Cue, DEFAULT_PRESET, "other")
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NameConflictError>(),
        Some(NameConflictError::ProtectedPreset)
    ));
    Ok(())
}

#[test]
fn test_delete_withOrdinaryPreset_shouldRemoveFile() -> Result<()> {
    let (_guard, store) = store()?;
    store.save_as(PresetScope::Cue, "doomed", &StyleConfig::default())?;
    store.delete(PresetScope::Cue, "doomed")?;
    assert_eq!(store.list(PresetScope::Cue)?, vec![DEFAULT_PRESET.to_string()]);
    Ok(())
}

#[test]
fn test_delete_withDefaultPreset_shouldBeProtected() -> Result<()> {
    let (_guard, store) = store()?;
    let err = store.delete(PresetScope::Cue, DEFAULT_PRESET).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<NameConflictError>(),
        Some(NameConflictError::ProtectedPreset)
    ));
    assert!(store.load(PresetScope::Cue, DEFAULT_PRESET).is_ok());
    Ok(())
}

#[test]
fn test_load_withUnknownName_shouldReportMissingResource() -> Result<()> {
    let (_guard, store) = store()?;
    let err = store.load(PresetScope::Cue, "ghost").unwrap_err();
    assert!(err.to_string().contains("missing resource"));
    Ok(())
}
