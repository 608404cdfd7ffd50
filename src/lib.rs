/*!
 * # capstrip - caption strip renderer
 *
 * A Rust library for rendering styled caption images from SRT files and
 * placing them as strips on a timeline.
 *
 * ## Features
 *
 * - Parse and serialize SRT caption files, including a `JSON:` extension
 *   carrying per-cue position and style overrides on the time-range line
 * - Type-aware recursive merge of override trees onto default configuration
 * - Drive an external batch renderer (one process per job, script on stdin)
 *   without blocking the caller
 * - Reconcile rendered images as timeline strips, preserving container
 *   nesting and channel placement across re-renders
 * - Named style presets stored in the platform config directory
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `srt`: Caption document codec (cues, timestamps, overrides)
 * - `style`: Typed style and position configuration
 * - `color`: Hex color string conversion
 * - `settings_merge`: Generic configuration-tree merge
 * - `render_job`: External renderer job lifecycle
 * - `strip_reconciler`: Timeline strip reconciliation after a render
 * - `timeline`: Host timeline model (strips, containers, selection)
 * - `presets`: Named style preset storage
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod color;
pub mod errors;
pub mod file_utils;
pub mod presets;
pub mod render_job;
pub mod settings_merge;
pub mod srt;
pub mod strip_reconciler;
pub mod style;
pub mod timeline;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::Controller;
pub use presets::{PresetScope, PresetStore};
pub use render_job::{JobStatus, RenderJob, RenderJobController, RenderTarget, RendererConfig};
pub use settings_merge::merge;
pub use srt::{Cue, CueDocument};
pub use strip_reconciler::{reconcile, ReconcileOutcome};
pub use style::{PositionOverride, PositionSettings, StyleConfig};
pub use timeline::{Timeline, StripId};
pub use errors::{AppError, FormatError, NameConflictError, RenderProcessError};
