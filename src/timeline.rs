use std::collections::BTreeMap;
use std::path::PathBuf;

// @module: Host timeline model (strips, containers, selection)

/// Stable handle of a strip or container for the lifetime of the timeline.
/// Identity of generated strips is tracked by cue number, never by handle.
pub type StripId = u64;

/// Color tag applied to strips for operator identification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTag {
    Color01,
    Color02,
    Color03,
    Color04,
    Color05,
    Color06,
    Color07,
    Color08,
    Color09,
}

/// Tag applied to every strip this tool generates
pub const GENERATED_COLOR_TAG: ColorTag = ColorTag::Color05;

/// One placed image on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStrip {
    pub id: StripId,
    pub name: String,
    pub image_path: PathBuf,
    pub channel: u32,
    pub start_frame: f64,
    pub end_frame: f64,
    /// Transform offsets in px
    pub offset_x: f64,
    pub offset_y: f64,
    /// Transform origin in normalized image coordinates; (0.5, 1.0) anchors
    /// to the top-center of the image
    pub origin: (f32, f32),
    /// Provenance marker of the tool run that generated this strip
    pub generated_by: Option<String>,
    /// Cue the strip was generated for
    pub cue_number: Option<u32>,
    pub color_tag: Option<ColorTag>,
}

/// A grouping strip whose bounds track the min/max of its children
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub id: StripId,
    pub name: String,
    pub channel: u32,
    pub start_frame: f64,
    pub end_frame: f64,
    children: Vec<StripId>,
}

impl Container {
    /// Child strips currently inside this container
    pub fn children(&self) -> &[StripId] {
        &self.children
    }
}

/// In-memory stand-in for the host's sequence timeline.
///
/// Mutated only from the single cooperative thread; no internal
/// synchronization.
#[derive(Debug, Default)]
pub struct Timeline {
    next_id: StripId,
    strips: BTreeMap<StripId, ImageStrip>,
    containers: BTreeMap<StripId, Container>,
    /// Strip of which container a strip currently lives in
    parent_of: BTreeMap<StripId, StripId>,
    /// Currently selected strips
    pub selection: Vec<StripId>,
    /// Container whose contents the user is currently viewing, if any
    pub current_view: Option<StripId>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> StripId {
        self.next_id += 1;
        self.next_id
    }

    /// Place a new image strip at the given channel and frame range
    pub fn new_image(
        &mut self,
        name: &str,
        image_path: PathBuf,
        channel: u32,
        start_frame: f64,
        end_frame: f64,
    ) -> StripId {
        let id = self.allocate_id();
        self.strips.insert(
            id,
            ImageStrip {
                id,
                name: name.to_string(),
                image_path,
                channel,
                start_frame,
                end_frame,
                offset_x: 0.0,
                offset_y: 0.0,
                origin: (0.5, 0.5),
                generated_by: None,
                cue_number: None,
                color_tag: None,
            },
        );
        id
    }

    /// Create an empty container strip
    pub fn new_container(&mut self, name: &str, channel: u32) -> StripId {
        let id = self.allocate_id();
        self.containers.insert(
            id,
            Container {
                id,
                name: name.to_string(),
                channel,
                start_frame: 0.0,
                end_frame: 0.0,
                children: Vec::new(),
            },
        );
        id
    }

    pub fn strip(&self, id: StripId) -> Option<&ImageStrip> {
        self.strips.get(&id)
    }

    pub fn strip_mut(&mut self, id: StripId) -> Option<&mut ImageStrip> {
        self.strips.get_mut(&id)
    }

    pub fn container(&self, id: StripId) -> Option<&Container> {
        self.containers.get(&id)
    }

    /// All image strips, nested ones included
    pub fn strips(&self) -> impl Iterator<Item = &ImageStrip> {
        self.strips.values()
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// Container a strip currently lives in, if any
    pub fn container_of(&self, strip: StripId) -> Option<StripId> {
        self.parent_of.get(&strip).copied()
    }

    /// Remove a strip from the timeline, detaching it from its container
    /// and the selection
    pub fn remove(&mut self, id: StripId) {
        if let Some(parent) = self.parent_of.remove(&id) {
            if let Some(container) = self.containers.get_mut(&parent) {
                container.children.retain(|c| *c != id);
            }
        }
        self.selection.retain(|s| *s != id);
        self.strips.remove(&id);
    }

    /// Move a strip into a container.
    ///
    /// Mirrors the host's behavior: when another child already occupies the
    /// strip's channel over an overlapping frame range, the host reassigns
    /// the incoming strip to the next free channel above the container's
    /// children. Callers that care about the channel must restore it
    /// afterwards.
    pub fn move_into_container(&mut self, strip_id: StripId, container_id: StripId) {
        if !self.strips.contains_key(&strip_id) || !self.containers.contains_key(&container_id) {
            return;
        }

        // Detach from any previous parent first
        if let Some(prev) = self.parent_of.remove(&strip_id) {
            if let Some(container) = self.containers.get_mut(&prev) {
                container.children.retain(|c| *c != strip_id);
            }
        }

        let (channel, start, end) = {
            let strip = &self.strips[&strip_id];
            (strip.channel, strip.start_frame, strip.end_frame)
        };
        let container = &self.containers[&container_id];
        let mut conflict = false;
        let mut highest_channel = 0u32;
        for child_id in &container.children {
            if let Some(child) = self.strips.get(child_id) {
                highest_channel = highest_channel.max(child.channel);
                if child.channel == channel && child.start_frame < end && start < child.end_frame {
                    conflict = true;
                }
            }
        }
        if conflict {
            if let Some(strip) = self.strips.get_mut(&strip_id) {
                strip.channel = highest_channel + 1;
            }
        }

        self.containers
            .get_mut(&container_id)
            .expect("container checked above")
            .children
            .push(strip_id);
        self.parent_of.insert(strip_id, container_id);
    }

    /// Recompute a container's bounds as the min/max of its current
    /// children. Empty containers keep their previous bounds.
    pub fn recompute_container_bounds(&mut self, container_id: StripId) {
        let Some(container) = self.containers.get(&container_id) else {
            return;
        };
        let mut start = f64::INFINITY;
        let mut end = f64::NEG_INFINITY;
        for child_id in &container.children {
            if let Some(child) = self.strips.get(child_id) {
                start = start.min(child.start_frame);
                end = end.max(child.end_frame);
            }
        }
        if start.is_finite() && end.is_finite() {
            let container = self.containers.get_mut(&container_id).expect("checked above");
            container.start_frame = start;
            container.end_frame = end;
        }
    }

    /// Find the live generated strip for a cue number, nested strips
    /// included
    pub fn find_generated(&self, generated_by: &str, cue_number: u32) -> Option<&ImageStrip> {
        self.strips.values().find(|s| {
            s.cue_number == Some(cue_number) && s.generated_by.as_deref() == Some(generated_by)
        })
    }

    /// All live generated strips for a provenance marker
    pub fn generated_strips(&self, generated_by: &str) -> Vec<&ImageStrip> {
        self.strips
            .values()
            .filter(|s| s.generated_by.as_deref() == Some(generated_by))
            .collect()
    }
}
