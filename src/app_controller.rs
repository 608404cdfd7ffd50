use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::time::sleep;
use uuid::Uuid;

use crate::app_config::Config;
use crate::errors::{AppError, RenderProcessError};
use crate::file_utils::FileManager;
use crate::render_job::{JobStatus, RenderJob, RenderJobController, RenderTarget};
use crate::srt::{Cue, CueDocument};
use crate::strip_reconciler::{self, ReconcileOutcome};
use crate::timeline::Timeline;

/// Application controller module
/// This module orchestrates the caption workflow: the loaded document, the
/// host timeline, and the external render job lifecycle.
/// Main application controller
pub struct Controller {
    /// Application configuration
    pub config: Config,

    /// Caption document currently being edited
    pub document: CueDocument,

    /// Host timeline the rendered strips land on
    pub timeline: Timeline,

    /// Single-job render controller
    jobs: RenderJobController,

    /// Provenance marker stamped onto every strip this controller creates
    generated_by: String,

    /// True when the document has unsaved edits
    dirty: bool,
}

impl Controller {
    /// Create a new controller from a configuration
    pub fn with_config(config: Config) -> Self {
        let jobs = RenderJobController::new(config.renderer.clone());
        let document = CueDocument::new(config.fps);
        Self {
            config,
            document,
            timeline: Timeline::new(),
            jobs,
            generated_by: Uuid::new_v4().to_string(),
            dirty: false,
        }
    }

    /// Provenance marker of this controller instance
    pub fn generated_by(&self) -> &str {
        &self.generated_by
    }

    /// True when the document has edits not yet saved to its file
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Load a caption document, replacing the current one
    pub fn load_document<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let doc = CueDocument::from_file(&path, self.config.fps)?;
        info!(
            "Loaded {} cue(s) from {}",
            doc.cues.len(),
            path.as_ref().display()
        );
        self.document = doc;
        self.dirty = false;
        Ok(())
    }

    /// Replace the document with an empty one at the configured frame rate
    pub fn reset_document(&mut self) {
        self.document = CueDocument::new(self.config.fps);
        self.dirty = false;
    }

    /// Save the document back to its file (or an explicit path), keeping
    /// the previous version as a backup
    pub fn save_document(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path.or(self.document.source_file.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => anyhow::bail!("the document has no file to save to"),
        };
        let content = self.document.serialize();
        FileManager::write_with_backup(&target, &content)?;
        self.document.source_file = Some(target.clone());
        self.dirty = false;
        info!("Saved document to {}", target.display());
        Ok(target)
    }

    /// Append a new cue numbered one past the current maximum
    pub fn add_cue(&mut self, text: String, start_frame: f64, frame_duration: f64) -> u32 {
        let no = self.document.max_cue_number() + 1;
        self.document
            .cues
            .push(Cue::new(no, text, start_frame, frame_duration));
        self.dirty = true;
        no
    }

    /// Remove a cue by number. Its generated strip, if any, stays on the
    /// timeline until the next render pass replaces the document's strips.
    pub fn remove_cue(&mut self, no: u32) -> Result<(), AppError> {
        let before = self.document.cues.len();
        self.document.cues.retain(|c| c.no != no);
        if self.document.cues.len() == before {
            return Err(AppError::Unknown(format!("cue {} does not exist", no)));
        }
        self.dirty = true;
        Ok(())
    }

    /// Copy a generated strip's current frame range back into its cue.
    ///
    /// Lets timing adjustments made by dragging strips on the timeline flow
    /// back into the document.
    pub fn pull_timing_from_strip(&mut self, no: u32) -> Result<(), AppError> {
        let (start, end) = match self.timeline.find_generated(&self.generated_by, no) {
            Some(strip) => (strip.start_frame, strip.end_frame),
            None => {
                return Err(AppError::Unknown(format!(
                    "cue {} has no generated strip on the timeline",
                    no
                )));
            }
        };
        let cue = self
            .document
            .cue_mut(no)
            .ok_or_else(|| AppError::Unknown(format!("cue {} does not exist", no)))?;
        cue.start_frame = start;
        cue.frame_duration = end - start;
        self.dirty = true;
        Ok(())
    }

    /// Format a playhead frame position as an SRT timestamp
    pub fn playhead_timestamp(&self, frame: f64) -> String {
        Cue::format_timestamp(Cue::ms_from_frames(frame, self.document.fps))
    }

    /// Render every cue and reconcile the timeline
    pub async fn render_all(&mut self) -> Result<ReconcileOutcome> {
        self.render(RenderTarget::All).await
    }

    /// Render a single cue and reconcile its strip in place
    pub async fn render_cue(&mut self, no: u32) -> Result<ReconcileOutcome> {
        self.render(RenderTarget::Cue(no)).await
    }

    /// Drive one render job to completion: build, launch, poll until the
    /// process exits, then reconcile the timeline on success.
    pub async fn render(&mut self, target: RenderTarget) -> Result<ReconcileOutcome> {
        let job = RenderJob::build(
            &self.document,
            target,
            &self.config.default_styles,
            &self.config.image_dir,
        )?;
        let images_dir = job.output_dir.clone();
        FileManager::ensure_dir(&images_dir)?;

        self.jobs.launch(job).await?;
        let interval = self.jobs.poll_interval();

        loop {
            match self.jobs.tick().await? {
                JobStatus::Running => sleep(interval).await,
                JobStatus::Succeeded(job) => {
                    return strip_reconciler::reconcile(
                        &mut self.timeline,
                        &self.document,
                        job.target,
                        &self.config.default_settings,
                        &images_dir,
                        &self.generated_by,
                    );
                }
                JobStatus::Failed { code, diagnostics } => {
                    warn!("Render job failed with status {}", code);
                    return Err(RenderProcessError::ExitedWithFailure { code, diagnostics })
                        .context("render job failed");
                }
                JobStatus::Idle => {
                    // launch() transitioned to Running, so a tick can only
                    // report Idle after a terminal state was consumed
                    anyhow::bail!("render controller returned to idle without a result");
                }
            }
        }
    }
}
