use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::errors::FormatError;
use crate::style::PositionOverride;

// @module: Caption document codec (SRT with JSON override extension)

// @const: Time-range line regex, trailing annotation included
static TIME_RANGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A(\d+):(\d+):(\d+),(\d+)\s*-->\s*(\d+):(\d+):(\d+),(\d+)[ \t]*(.*)\z").unwrap()
});

/// Marker introducing a structured override in a time-range line's trailing
/// segment. Any other trailing content is ignored on read and never emitted.
pub const JSON_MARKER: &str = "JSON:";

// @struct: Single caption cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Sequence number (nominally dense/ascending, not enforced)
    pub no: u32,

    // @field: Caption text, possibly multi-line
    pub text: String,

    // @field: Start position in frames
    pub start_frame: f64,

    // @field: Length in frames
    pub frame_duration: f64,

    // @field: Per-cue channel/offset override, absent unless opted in
    pub settings_override: Option<PositionOverride>,

    // @field: Per-cue style override as a sparse generic tree
    pub style_override: Option<Value>,
}

impl Cue {
    /// Creates a plain cue with no overrides
    pub fn new(no: u32, text: String, start_frame: f64, frame_duration: f64) -> Self {
        Cue {
            no,
            text,
            start_frame,
            frame_duration,
            settings_override: None,
            style_override: None,
        }
    }

    /// Parse an SRT timestamp (HH:MM:SS,mmm) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, FormatError> {
        let parts: Vec<&str> = timestamp.split([':', ',']).collect();
        if parts.len() != 4 {
            return Err(FormatError::BadTimestamp(timestamp.to_string()));
        }

        let mut values = [0u64; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| FormatError::BadTimestamp(timestamp.to_string()))?;
        }
        let [hours, minutes, seconds, millis] = values;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(FormatError::BadTimestamp(timestamp.to_string()));
        }

        Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    /// Convert milliseconds to a frame position at the given frame rate
    pub fn frames_from_ms(ms: u64, fps: f64) -> f64 {
        ms as f64 * fps / 1000.0
    }

    /// Convert a frame position back to milliseconds at the given frame
    /// rate. Rounding makes this exact for positions produced by
    /// [`Cue::frames_from_ms`], which keeps document timestamps stable
    /// across load/save cycles.
    pub fn ms_from_frames(frames: f64, fps: f64) -> u64 {
        (frames.max(0.0) * 1000.0 / fps).round() as u64
    }

    /// Start time in milliseconds at the given frame rate
    pub fn start_ms(&self, fps: f64) -> u64 {
        Self::ms_from_frames(self.start_frame, fps)
    }

    /// End time in milliseconds at the given frame rate
    pub fn end_ms(&self, fps: f64) -> u64 {
        Self::ms_from_frames(self.start_frame + self.frame_duration, fps)
    }

    /// Combined override tree (position keys at the top level, style under
    /// `styles`), or None when the cue never opted into any override
    pub fn override_tree(&self) -> Option<Value> {
        let mut tree = Map::new();

        if let Some(settings) = &self.settings_override {
            if !settings.is_empty() {
                if let Value::Object(fields) =
                    serde_json::to_value(settings).expect("position override is JSON-representable")
                {
                    tree.extend(fields);
                }
            }
        }

        if let Some(styles) = &self.style_override {
            tree.insert("styles".to_string(), styles.clone());
        }

        if tree.is_empty() {
            None
        } else {
            Some(Value::Object(tree))
        }
    }

    /// Split a parsed override tree into the cue's position and style
    /// overrides. The inverse of [`Cue::override_tree`].
    fn apply_override_tree(&mut self, tree: &Map<String, Value>) {
        let position = PositionOverride {
            channel_no: tree.get("channel_no").and_then(Value::as_u64).map(|v| v as u32),
            offset_x: tree.get("offset_x").and_then(Value::as_f64),
            offset_y: tree.get("offset_y").and_then(Value::as_f64),
        };
        if !position.is_empty() {
            self.settings_override = Some(position);
        }

        if let Some(styles) = tree.get("styles") {
            self.style_override = Some(styles.clone());
        }
    }
}

/// Parsed caption document: cue list plus the frame rate that timestamps
/// were converted against
#[derive(Debug, Clone, PartialEq)]
pub struct CueDocument {
    /// Source file the document was loaded from, if any
    pub source_file: Option<PathBuf>,

    /// Cues in document order
    pub cues: Vec<Cue>,

    /// Frames per second used for timestamp conversion
    pub fps: f64,
}

impl CueDocument {
    /// Create an empty document
    pub fn new(fps: f64) -> Self {
        CueDocument {
            source_file: None,
            cues: Vec::new(),
            fps,
        }
    }

    /// Load and parse a caption file
    pub fn from_file<P: AsRef<Path>>(path: P, fps: f64) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read caption file: {}", path.display()))?;
        let cues = Self::parse_str(&content, fps)
            .with_context(|| format!("Failed to parse caption file: {}", path.display()))?;
        Ok(CueDocument {
            source_file: Some(path.to_path_buf()),
            cues,
            fps,
        })
    }

    /// Parse caption document text into cues.
    ///
    /// A malformed block aborts the whole parse; nothing is partially
    /// applied.
    pub fn parse_str(content: &str, fps: f64) -> Result<Vec<Cue>, FormatError> {
        enum Expect {
            Number,
            TimeRange,
            Text,
        }

        let mut cues = Vec::new();
        let mut state = Expect::Number;
        let mut block_start_line = 0usize;
        let mut current: Option<Cue> = None;

        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim_end_matches('\r');

            if line.trim().is_empty() {
                match state {
                    Expect::Number => {}
                    Expect::TimeRange => {
                        return Err(FormatError::BadBlock {
                            line: block_start_line,
                            detail: "block ended before its time-range line".to_string(),
                        });
                    }
                    Expect::Text => {
                        // Blank line closes the block; at least one text line
                        // has been collected by now
                        let cue = current.take().expect("cue exists while collecting text");
                        if cue.text.is_empty() {
                            return Err(FormatError::BadBlock {
                                line: block_start_line,
                                detail: "block has no text lines".to_string(),
                            });
                        }
                        cues.push(cue);
                        state = Expect::Number;
                    }
                }
                continue;
            }

            match state {
                Expect::Number => {
                    let no: u32 = line.trim().parse().map_err(|_| FormatError::BadBlock {
                        line: line_no,
                        detail: format!("expected a cue number, found '{}'", line.trim()),
                    })?;
                    block_start_line = line_no;
                    current = Some(Cue::new(no, String::new(), 0.0, 0.0));
                    state = Expect::TimeRange;
                }
                Expect::TimeRange => {
                    let cue = current.as_mut().expect("cue exists after its number line");
                    Self::parse_time_range(line, line_no, fps, cue)?;
                    state = Expect::Text;
                }
                Expect::Text => {
                    let cue = current.as_mut().expect("cue exists while collecting text");
                    if !cue.text.is_empty() {
                        cue.text.push('\n');
                    }
                    cue.text.push_str(line);
                }
            }
        }

        // Final block may end at EOF without a trailing blank line
        match state {
            Expect::Number => {}
            Expect::TimeRange => {
                return Err(FormatError::BadBlock {
                    line: block_start_line,
                    detail: "block ended before its time-range line".to_string(),
                });
            }
            Expect::Text => {
                let cue = current.take().expect("cue exists while collecting text");
                if cue.text.is_empty() {
                    return Err(FormatError::BadBlock {
                        line: block_start_line,
                        detail: "block has no text lines".to_string(),
                    });
                }
                cues.push(cue);
            }
        }

        Ok(cues)
    }

    /// Parse one time-range line, including its optional trailing override
    fn parse_time_range(
        line: &str,
        line_no: usize,
        fps: f64,
        cue: &mut Cue,
    ) -> Result<(), FormatError> {
        if !line.contains("-->") {
            return Err(FormatError::BadTimeRange {
                line: line_no,
                text: line.to_string(),
            });
        }
        let caps = TIME_RANGE_REGEX
            .captures(line)
            .ok_or_else(|| FormatError::BadTimeRange {
                line: line_no,
                text: line.to_string(),
            })?;

        let start_ms = Self::timestamp_from_captures(&caps, 1)?;
        let end_ms = Self::timestamp_from_captures(&caps, 5)?;

        cue.start_frame = Cue::frames_from_ms(start_ms, fps);
        cue.frame_duration = Cue::frames_from_ms(end_ms.saturating_sub(start_ms), fps);

        if let Some(trailing) = caps.get(9).map(|m| m.as_str()) {
            if let Some(marker_pos) = trailing.find(JSON_MARKER) {
                let json_text = trailing[marker_pos + JSON_MARKER.len()..].trim();
                let tree: Value = serde_json::from_str(json_text)
                    .map_err(|source| FormatError::BadOverride { line: line_no, source })?;
                match tree {
                    Value::Object(map) => cue.apply_override_tree(&map),
                    _ => {
                        return Err(FormatError::BadBlock {
                            line: line_no,
                            detail: "JSON override is not an object".to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn timestamp_from_captures(caps: &regex::Captures, start_idx: usize) -> Result<u64, FormatError> {
        let text = format!(
            "{}:{}:{},{}",
            &caps[start_idx],
            &caps[start_idx + 1],
            &caps[start_idx + 2],
            &caps[start_idx + 3]
        );
        Cue::parse_timestamp(&text)
    }

    /// Serialize the document back to caption text.
    ///
    /// Inverse of [`CueDocument::parse_str`] for any cue list this system
    /// produced: timestamps come back millisecond-exact and the `JSON:`
    /// annotation is emitted only for cues whose override tree is
    /// non-empty.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for cue in &self.cues {
            let _ = writeln!(out, "{}", cue.no);
            let _ = write!(
                out,
                "{} --> {}",
                Cue::format_timestamp(cue.start_ms(self.fps)),
                Cue::format_timestamp(cue.end_ms(self.fps))
            );
            if let Some(tree) = cue.override_tree() {
                let _ = write!(out, " {}{}", JSON_MARKER, tree);
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", cue.text);
            let _ = writeln!(out);
        }
        out
    }

    /// Highest cue number currently in the document, 0 when empty
    pub fn max_cue_number(&self) -> u32 {
        self.cues.iter().map(|c| c.no).max().unwrap_or(0)
    }

    /// Find a cue by number
    pub fn cue(&self, no: u32) -> Option<&Cue> {
        self.cues.iter().find(|c| c.no == no)
    }

    /// Find a cue by number, mutably
    pub fn cue_mut(&mut self, no: u32) -> Option<&mut Cue> {
        self.cues.iter_mut().find(|c| c.no == no)
    }
}
