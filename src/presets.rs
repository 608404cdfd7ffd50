use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::errors::{MissingResourceError, NameConflictError};
use crate::file_utils::FileManager;
use crate::style::StyleConfig;

// @module: Named style preset storage

/// The preset that always exists and cannot be deleted or renamed
pub const DEFAULT_PRESET: &str = "default";

/// Scope a preset applies at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetScope {
    /// Document-wide default styles
    Default,
    /// Per-cue styles
    Cue,
}

impl PresetScope {
    /// Subdirectory a scope's presets are partitioned into
    pub fn dir_name(&self) -> &'static str {
        match self {
            PresetScope::Default => "default_styles",
            PresetScope::Cue => "jimaku_styles",
        }
    }
}

/// Store of named style presets, one JSON tree per file, partitioned into
/// a subdirectory per scope under a well-known root.
pub struct PresetStore {
    root: PathBuf,
}

impl PresetStore {
    /// Open the store at the platform config directory
    pub fn open_default() -> Result<Self> {
        let base = dirs::config_dir().context("no platform configuration directory available")?;
        Ok(Self::with_root(base.join("capstrip").join("presets")))
    }

    /// Open a store rooted at an explicit directory
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Guarantee the scope directories and the protected default preset
    /// exist in both scopes
    pub fn bootstrap(&self, defaults: &StyleConfig) -> Result<()> {
        for scope in [PresetScope::Default, PresetScope::Cue] {
            let dir = self.scope_dir(scope);
            FileManager::ensure_dir(&dir)?;
            let default_path = self.preset_path(scope, DEFAULT_PRESET);
            if !default_path.exists() {
                let content = serde_json::to_string_pretty(&defaults.to_tree())?;
                FileManager::write_to_file(&default_path, &content)?;
                info!("Created {} preset at {:?}", DEFAULT_PRESET, default_path);
            }
        }
        Ok(())
    }

    /// Preset names registered in a scope, sorted
    pub fn list(&self, scope: PresetScope) -> Result<Vec<String>> {
        let dir = self.scope_dir(scope);
        if !FileManager::dir_exists(&dir) {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = FileManager::find_files(&dir, "json")?
            .iter()
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().to_string()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load a preset by name
    pub fn load(&self, scope: PresetScope, name: &str) -> Result<StyleConfig> {
        let path = self.preset_path(scope, name);
        if !FileManager::file_exists(&path) {
            return Err(MissingResourceError(format!("preset file {:?}", path)).into());
        }
        let content = FileManager::read_to_string(&path)?;
        let tree: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("preset file {:?} is not valid JSON", path))?;
        StyleConfig::from_tree(&tree)
    }

    /// Register a new preset. Name conflicts and names unusable for
    /// storage are rejected before anything touches the file system.
    pub fn save_as(&self, scope: PresetScope, name: &str, style: &StyleConfig) -> Result<()> {
        Self::validate_name(name)?;
        let path = self.preset_path(scope, name);
        if path.exists() {
            return Err(NameConflictError::AlreadyExists(name.to_string()).into());
        }
        let content = serde_json::to_string_pretty(&style.to_tree())?;
        FileManager::write_to_file(&path, &content)?;
        debug!("Saved preset '{}' to {:?}", name, path);
        Ok(())
    }

    /// Overwrite an existing preset in place
    pub fn update(&self, scope: PresetScope, name: &str, style: &StyleConfig) -> Result<()> {
        let path = self.preset_path(scope, name);
        if !FileManager::file_exists(&path) {
            return Err(MissingResourceError(format!("preset file {:?}", path)).into());
        }
        let content = serde_json::to_string_pretty(&style.to_tree())?;
        FileManager::write_to_file(&path, &content)
    }

    /// Rename a preset. The default preset is protected.
    pub fn rename(&self, scope: PresetScope, from: &str, to: &str) -> Result<()> {
        if from == DEFAULT_PRESET {
            return Err(NameConflictError::ProtectedPreset.into());
        }
        Self::validate_name(to)?;
        let from_path = self.preset_path(scope, from);
        if !FileManager::file_exists(&from_path) {
            return Err(MissingResourceError(format!("preset file {:?}", from_path)).into());
        }
        let to_path = self.preset_path(scope, to);
        if to_path.exists() {
            return Err(NameConflictError::AlreadyExists(to.to_string()).into());
        }
        std::fs::rename(&from_path, &to_path)
            .with_context(|| format!("Failed to rename preset {:?} to {:?}", from_path, to_path))
    }

    /// Delete a preset. The default preset is protected.
    pub fn delete(&self, scope: PresetScope, name: &str) -> Result<()> {
        if name == DEFAULT_PRESET {
            return Err(NameConflictError::ProtectedPreset.into());
        }
        let path = self.preset_path(scope, name);
        if !FileManager::file_exists(&path) {
            return Err(MissingResourceError(format!("preset file {:?}", path)).into());
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete preset {:?}", path))
    }

    fn scope_dir(&self, scope: PresetScope) -> PathBuf {
        self.root.join(scope.dir_name())
    }

    fn preset_path(&self, scope: PresetScope, name: &str) -> PathBuf {
        self.scope_dir(scope).join(format!("{}.json", name))
    }

    /// A preset name must work as a plain file stem
    fn validate_name(name: &str) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('.')
            || trimmed.contains(['/', '\\', '\0'])
        {
            return Err(NameConflictError::InvalidName(name.to_string()).into());
        }
        Ok(())
    }
}
