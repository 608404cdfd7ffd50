use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::errors::RenderProcessError;
use crate::srt::{Cue, CueDocument};
use crate::style::StyleConfig;

// @module: External renderer job controller

/// Which cues a render request covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Every cue in the document
    All,
    /// A single cue, by number
    Cue(u32),
}

impl RenderTarget {
    /// True when the target covers the given cue number
    pub fn covers(&self, no: u32) -> bool {
        match self {
            RenderTarget::All => true,
            RenderTarget::Cue(target) => *target == no,
        }
    }
}

/// How the external renderer process is invoked
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RendererConfig {
    /// Renderer executable
    #[serde(default = "default_renderer_program")]
    pub program: String,

    /// Arguments placing the renderer in script-from-stdin batch mode
    #[serde(default = "default_renderer_args")]
    pub args: Vec<String>,

    /// Liveness poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: default_renderer_program(),
            args: default_renderer_args(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// A transportable description of one render request.
///
/// Lives from launch until the job's terminal state is observed. Everything
/// crossing the renderer boundary is a generic tree: integers, floats,
/// strings, objects and lists only.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Cue subset covered by this job
    pub target: RenderTarget,

    /// Targeted cues as a generic tree (no, start, end, lines, optional
    /// override under `json`)
    pub cues_tree: Value,

    /// Document-wide default configuration tree; the renderer layers each
    /// cue's `json` override onto this with the shared merge algorithm
    pub default_config: Value,

    /// Absolute output directory; the renderer writes `<no>.png` per cue
    pub output_dir: PathBuf,
}

impl RenderJob {
    /// Build a job from the current document state.
    ///
    /// Preconditions from the state machine's Idle→Launching edge are
    /// checked here: non-empty cue list, configured output directory and,
    /// for a single-cue render, an existing cue.
    pub fn build(
        doc: &CueDocument,
        target: RenderTarget,
        default_style: &StyleConfig,
        output_dir: &Path,
    ) -> Result<Self, RenderProcessError> {
        if doc.cues.is_empty() {
            return Err(RenderProcessError::Precondition(
                "the document has no cues".to_string(),
            ));
        }
        if output_dir.as_os_str().is_empty() {
            return Err(RenderProcessError::Precondition(
                "no output directory configured".to_string(),
            ));
        }
        if let RenderTarget::Cue(no) = target {
            if doc.cue(no).is_none() {
                return Err(RenderProcessError::Precondition(format!(
                    "cue {} does not exist",
                    no
                )));
            }
        }

        let output_dir = std::path::absolute(output_dir).map_err(|e| {
            RenderProcessError::Precondition(format!(
                "cannot resolve output directory '{}': {}",
                output_dir.display(),
                e
            ))
        })?;

        let cues: Vec<Value> = doc
            .cues
            .iter()
            .filter(|cue| target.covers(cue.no))
            .map(|cue| Self::cue_tree(cue, doc.fps))
            .collect();

        Ok(RenderJob {
            target,
            cues_tree: Value::Array(cues),
            default_config: default_style.to_tree(),
            output_dir,
        })
    }

    /// One cue as it crosses the renderer boundary
    fn cue_tree(cue: &Cue, fps: f64) -> Value {
        let mut tree = json!({
            "no": cue.no,
            "start": Cue::format_timestamp(cue.start_ms(fps)),
            "end": Cue::format_timestamp(cue.end_ms(fps)),
            "lines": cue.text.split('\n').collect::<Vec<_>>(),
        });
        if let Some(overrides) = cue.override_tree() {
            tree["json"] = overrides;
        }
        tree
    }

    /// Generate the self-contained script fed to the renderer's
    /// interpreter on its input channel.
    ///
    /// The script decodes the embedded job description and calls the
    /// renderer's entry point, which renders `<no>.png` per cue into the
    /// output directory and exits 0 on success.
    pub fn renderer_script(&self) -> String {
        let job = json!({
            "cues": self.cues_tree,
            "default_config": self.default_config,
            "output_dir": self.output_dir.to_string_lossy(),
        });
        // A JSON string literal is also a valid Python string literal, so
        // the job description travels as one quoted blob
        let job_literal = serde_json::to_string(&job.to_string())
            .expect("job description is JSON-representable");

        format!(
            "import json\n\
             from capstrip_renderer import run_render_job\n\
             \n\
             job = json.loads({job_literal})\n\
             run_render_job(job[\"cues\"], job[\"default_config\"], job[\"output_dir\"])\n"
        )
    }
}

/// Terminal and non-terminal observations reported by a tick
#[derive(Debug)]
pub enum JobStatus {
    /// No job in flight
    Idle,
    /// Process still alive; check again on the next tick
    Running,
    /// Process exited 0; reconcile the job's target next
    Succeeded(RenderJob),
    /// Process exited non-zero; captured stderr attached
    Failed {
        code: i32,
        diagnostics: String,
    },
}

enum JobState {
    Idle,
    Running {
        child: Child,
        job: RenderJob,
        started: Instant,
        output: JoinHandle<String>,
        diagnostics: JoinHandle<String>,
    },
}

/// Drives one external render job at a time through
/// Idle → Launching → Running → Completed → Idle.
///
/// Nothing here blocks the calling thread: launching writes the script to
/// the child's stdin and returns, and each [`RenderJobController::tick`]
/// does a single non-blocking liveness check. The controller holds no
/// queue; a launch while a job is running is a caller error.
pub struct RenderJobController {
    renderer: RendererConfig,
    state: JobState,
}

impl RenderJobController {
    pub fn new(renderer: RendererConfig) -> Self {
        Self {
            renderer,
            state: JobState::Idle,
        }
    }

    /// True when no job is in flight
    pub fn is_idle(&self) -> bool {
        matches!(self.state, JobState::Idle)
    }

    /// Poll interval the caller should tick at
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.renderer.poll_interval_ms)
    }

    /// Launch the renderer for a job: spawn the process with all three
    /// byte channels piped, feed the generated script on its input channel
    /// and transition to Running.
    pub async fn launch(&mut self, job: RenderJob) -> Result<(), RenderProcessError> {
        if !self.is_idle() {
            return Err(RenderProcessError::AlreadyRunning);
        }

        let script = job.renderer_script();
        debug!(
            "Launching renderer '{}' for {} cue(s)",
            self.renderer.program,
            job.cues_tree.as_array().map_or(0, Vec::len)
        );

        let mut child = Command::new(&self.renderer.program)
            .args(&self.renderer.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderProcessError::LaunchFailed {
                program: self.renderer.program.clone(),
                detail: e.to_string(),
            })?;

        // Drain both byte channels from the start so a chatty renderer can
        // never fill an OS pipe buffer and deadlock against our polling
        let output = Self::drain(child.stdout.take());
        let diagnostics = Self::drain(child.stderr.take());

        let mut stdin = child.stdin.take().expect("stdin was piped");
        if let Err(e) = stdin.write_all(script.as_bytes()).await {
            // kill_on_drop reaps the child here; the drain tasks see EOF
            return Err(RenderProcessError::LaunchFailed {
                program: self.renderer.program.clone(),
                detail: format!("could not feed renderer script: {}", e),
            });
        }
        drop(stdin);

        self.state = JobState::Running {
            child,
            job,
            started: Instant::now(),
            output,
            diagnostics,
        };
        Ok(())
    }

    /// Read a child byte channel to the end in the background
    fn drain<R>(channel: Option<R>) -> JoinHandle<String>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut channel) = channel {
                let _ = channel.read_to_string(&mut buf).await;
            }
            buf
        })
    }

    /// One non-blocking liveness check.
    ///
    /// While the process is alive this returns immediately with
    /// [`JobStatus::Running`]; control goes back to the caller's event
    /// loop between ticks. On exit the background channel readers are
    /// joined, the result is classified by exit code, and the controller
    /// returns to Idle.
    pub async fn tick(&mut self) -> Result<JobStatus, RenderProcessError> {
        let status = match &mut self.state {
            JobState::Idle => return Ok(JobStatus::Idle),
            JobState::Running { child, .. } => match child.try_wait() {
                Ok(None) => return Ok(JobStatus::Running),
                Ok(Some(status)) => status,
                Err(e) => {
                    self.state = JobState::Idle;
                    return Err(RenderProcessError::ExitedWithFailure {
                        code: -1,
                        diagnostics: format!("failed to poll renderer process: {}", e),
                    });
                }
            },
        };

        let JobState::Running {
            child: _,
            job,
            started,
            output,
            diagnostics,
        } = std::mem::replace(&mut self.state, JobState::Idle)
        else {
            unreachable!("state was Running above");
        };

        let output = output.await.unwrap_or_default();
        let diagnostics = diagnostics.await.unwrap_or_default();

        if status.success() {
            debug!(
                "Renderer finished in {:.1}s",
                started.elapsed().as_secs_f64()
            );
            if !output.trim().is_empty() {
                debug!("Renderer output: {}", output.trim());
            }
            Ok(JobStatus::Succeeded(job))
        } else {
            let code = status.code().unwrap_or(-1);
            warn!("Renderer exited with status {}", code);
            Ok(JobStatus::Failed {
                code,
                diagnostics: diagnostics.trim().to_string(),
            })
        }
    }
}

fn default_renderer_program() -> String {
    "gimp".to_string()
}

fn default_renderer_args() -> Vec<String> {
    vec![
        "-idf".to_string(),
        "--batch-interpreter=python-fu-eval".to_string(),
        "-b".to_string(),
        "-".to_string(),
    ]
}

fn default_poll_interval_ms() -> u64 {
    500
}
