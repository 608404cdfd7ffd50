use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use log::{debug, info, warn};

use crate::render_job::RenderTarget;
use crate::srt::CueDocument;
use crate::style::PositionSettings;
use crate::timeline::{StripId, Timeline, GENERATED_COLOR_TAG};

// @module: Timeline strip reconciliation after a successful render

/// Where a cue's previous strip lived, captured before regeneration
#[derive(Debug, Clone)]
struct PriorPlacement {
    strip: StripId,
    container: Option<StripId>,
    channel: u32,
}

/// What a reconciliation pass did
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    /// Strips created, in cue order
    pub created: Vec<StripId>,
    /// Cues skipped because their rendered image was missing
    pub skipped: Vec<u32>,
}

/// Replace previously generated strips with freshly rendered ones,
/// preserving prior placement.
///
/// Postconditions: at most one live generated strip per cue number, and
/// every container's bounds equal the min/max of its current children.
/// Cues whose `<no>.png` is absent are skipped with a warning, never a
/// failure.
pub fn reconcile(
    timeline: &mut Timeline,
    doc: &CueDocument,
    target: RenderTarget,
    default_position: &PositionSettings,
    images_dir: &Path,
    generated_by: &str,
) -> Result<ReconcileOutcome> {
    // Snapshot prior placement for every targeted cue across the whole
    // timeline, nested strips included, so placement survives regeneration
    let mut prior: BTreeMap<u32, PriorPlacement> = BTreeMap::new();
    for strip in timeline.generated_strips(generated_by) {
        if let Some(no) = strip.cue_number {
            if target.covers(no) {
                prior.insert(
                    no,
                    PriorPlacement {
                        strip: strip.id,
                        container: timeline.container_of(strip.id),
                        channel: strip.channel,
                    },
                );
            }
        }
    }

    // Single-cue renders replace in place: the old strip goes away before
    // the replacement is created. Its container's bounds must shrink right
    // away, since the replacement may never materialize (missing image).
    if let RenderTarget::Cue(no) = target {
        if let Some(placement) = prior.get(&no) {
            timeline.remove(placement.strip);
            if let Some(container) = placement.container {
                timeline.recompute_container_bounds(container);
            }
        }
    }

    let mut outcome = ReconcileOutcome::default();

    for cue in doc.cues.iter().filter(|c| target.covers(c.no)) {
        let resolved = match &cue.settings_override {
            Some(overrides) => overrides.resolve(default_position),
            None => default_position.clone(),
        };

        let image_path = images_dir.join(format!("{}.png", cue.no));
        if !image_path.is_file() {
            warn!(
                "No rendered image for cue {} at {}, skipping",
                cue.no,
                image_path.display()
            );
            outcome.skipped.push(cue.no);
            continue;
        }
        let (_, image_height) = match image::image_dimensions(&image_path) {
            Ok(dims) => dims,
            Err(e) => {
                warn!(
                    "Unreadable rendered image for cue {} at {}: {}, skipping",
                    cue.no,
                    image_path.display(),
                    e
                );
                outcome.skipped.push(cue.no);
                continue;
            }
        };

        let name = format!("{}.png", cue.no);
        let strip_id = timeline.new_image(
            &name,
            image_path,
            resolved.channel_no,
            cue.start_frame,
            cue.start_frame + cue.frame_duration,
        );
        {
            let strip = timeline.strip_mut(strip_id).expect("strip just created");
            // Anchor to the image's top edge, then correct the vertical
            // offset by half the image height so the configured offset
            // means "distance from the anchor point" regardless of how
            // tall the rendered caption came out
            strip.origin = (0.5, 1.0);
            strip.offset_x = resolved.offset_x;
            strip.offset_y = resolved.offset_y - image_height as f64 / 2.0;
            strip.generated_by = Some(generated_by.to_string());
            strip.cue_number = Some(cue.no);
            strip.color_tag = Some(GENERATED_COLOR_TAG);
        }

        match prior.get(&cue.no) {
            Some(placement) if placement.container.is_some() => {
                let container = placement.container.expect("checked above");
                // Bulk path still holds the old strip; drop it before the
                // replacement takes its place in the container
                if matches!(target, RenderTarget::All) {
                    timeline.remove(placement.strip);
                }
                timeline.move_into_container(strip_id, container);
                if let Some(strip) = timeline.strip_mut(strip_id) {
                    strip.channel = placement.channel;
                }
                timeline.recompute_container_bounds(container);
                debug!("Cue {} restored into its container", cue.no);
            }
            Some(placement) => {
                if matches!(target, RenderTarget::All) {
                    timeline.remove(placement.strip);
                }
            }
            None => {
                // Fresh cue: follow the user's current view when it is
                // inside a container
                if let Some(view) = timeline.current_view {
                    timeline.move_into_container(strip_id, view);
                    timeline.recompute_container_bounds(view);
                }
            }
        }

        outcome.created.push(strip_id);
    }

    // Leave the fresh strips selected for user continuity
    timeline.selection = outcome.created.clone();

    info!(
        "Reconciled {} strip(s), skipped {}",
        outcome.created.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}
