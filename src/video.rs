// src/video.rs - Clip probing, background frame extraction, playback transport
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use eframe::egui;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("video file does not exist: {0}")]
    Missing(PathBuf),
    #[error("ffprobe is not installed or not in PATH")]
    ProbeUnavailable,
    #[error("ffmpeg is not installed or not in PATH")]
    FfmpegUnavailable,
    #[error("invalid clip metadata: {0}")]
    BadMetadata(String),
    #[error("frame extraction failed for {0}")]
    ExtractionFailed(PathBuf),
}

/// Intrinsic clip properties from ffprobe. `frame_count` is `None` when the
/// container does not report one; such a clip has no known duration but
/// still allows phase navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipMeta {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub frame_count: Option<usize>,
}

impl ClipMeta {
    pub fn duration(&self) -> Option<f64> {
        if self.fps <= 0.0 {
            return None;
        }
        self.frame_count.map(|n| n as f64 / self.fps as f64)
    }
}

pub fn probe_clip(path: &Path) -> Result<ClipMeta> {
    if !path.exists() {
        return Err(MediaError::Missing(path.to_path_buf()).into());
    }
    if Command::new("ffprobe").arg("-version").output().is_err() {
        return Err(MediaError::ProbeUnavailable.into());
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_frames",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_read_frames",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .context("failed to run ffprobe")?;

    let info = String::from_utf8_lossy(&output.stdout);
    let parts: Vec<&str> = info.trim().split(',').collect();

    if parts.len() < 3 {
        return Err(MediaError::BadMetadata(info.trim().to_string()).into());
    }

    let width = parts[0]
        .parse()
        .map_err(|_| MediaError::BadMetadata(format!("width `{}`", parts[0])))?;
    let height = parts[1]
        .parse()
        .map_err(|_| MediaError::BadMetadata(format!("height `{}`", parts[1])))?;

    let fps_str = parts[2];
    let fps = if fps_str.contains('/') {
        let fps_parts: Vec<&str> = fps_str.split('/').collect();
        if fps_parts.len() != 2 {
            return Err(MediaError::BadMetadata(format!("frame rate `{fps_str}`")).into());
        }
        fps_parts[0].parse::<f32>().unwrap_or(30.0) / fps_parts[1].parse::<f32>().unwrap_or(1.0)
    } else {
        fps_str.parse().unwrap_or(30.0)
    };

    // nb_read_frames is "N/A" for streams ffprobe cannot count
    let frame_count = parts
        .get(3)
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0);

    Ok(ClipMeta { width, height, fps, frame_count })
}

#[derive(Default)]
struct LoadState {
    meta: Option<ClipMeta>,
    frames: Vec<egui::ColorImage>,
    progress: f32,
    message: String,
    error: Option<String>,
    done: bool,
}

/// Decodes a clip into memory on a worker thread; the UI polls the shared
/// state for metadata, frames and progress. The worker owns only its `Arc`
/// clone and temp dir, so teardown is by detachment.
pub struct ClipLoader {
    path: PathBuf,
    shared: Arc<Mutex<LoadState>>,
}

impl ClipLoader {
    pub fn spawn(path: PathBuf) -> Self {
        let shared = Arc::new(Mutex::new(LoadState {
            message: "Probing video...".to_string(),
            ..Default::default()
        }));

        let worker = Arc::clone(&shared);
        let worker_path = path.clone();
        thread::spawn(move || {
            if let Err(e) = load_clip(&worker_path, &worker) {
                warn!("failed to load {}: {:#}", worker_path.display(), e);
                let mut state = worker.lock().unwrap();
                state.error = Some(format!("{e:#}"));
                state.done = true;
            }
        });

        Self { path, shared }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta(&self) -> Option<ClipMeta> {
        self.shared.lock().unwrap().meta
    }

    pub fn status(&self) -> (f32, String) {
        let state = self.shared.lock().unwrap();
        (state.progress, state.message.clone())
    }

    pub fn error(&self) -> Option<String> {
        self.shared.lock().unwrap().error.clone()
    }

    pub fn finished(&self) -> bool {
        self.shared.lock().unwrap().done
    }

    pub fn frames_ready(&self) -> bool {
        let state = self.shared.lock().unwrap();
        state.done && state.error.is_none()
    }

    /// Index of the decoded frame nearest to playback time `t`, clamped to
    /// the decoded range.
    pub fn frame_index_at(&self, t: f64) -> Option<usize> {
        let state = self.shared.lock().unwrap();
        let meta = state.meta?;
        if state.frames.is_empty() || meta.fps <= 0.0 {
            return None;
        }
        let index = (t.max(0.0) * meta.fps as f64).round() as usize;
        Some(index.min(state.frames.len() - 1))
    }

    pub fn frame(&self, index: usize) -> Option<egui::ColorImage> {
        self.shared.lock().unwrap().frames.get(index).cloned()
    }
}

fn load_clip(path: &Path, shared: &Arc<Mutex<LoadState>>) -> Result<()> {
    let meta = probe_clip(path)?;
    debug!("probed {}: {:?}", path.display(), meta);
    {
        let mut state = shared.lock().unwrap();
        state.meta = Some(meta);
        state.progress = 0.1;
        state.message = "Extracting frames...".to_string();
    }

    if Command::new("ffmpeg").arg("-version").output().is_err() {
        return Err(MediaError::FfmpegUnavailable.into());
    }

    let temp_dir = std::env::temp_dir().join(format!("swingsync_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&temp_dir).context("cannot create temporary directory")?;

    // Downscale for memory, keep the aspect ratio: overlay registration
    // depends on the intrinsic proportions surviving extraction.
    let status = Command::new("ffmpeg")
        .arg("-i")
        .arg(path)
        .args(["-vf", "scale=640:-2"])
        .arg(temp_dir.join("frame_%05d.png"))
        .status()
        .context("failed to extract frames with ffmpeg")?;

    if !status.success() {
        let _ = fs::remove_dir_all(&temp_dir);
        return Err(MediaError::ExtractionFailed(path.to_path_buf()).into());
    }

    let mut frame_paths: Vec<PathBuf> = fs::read_dir(&temp_dir)
        .context("cannot read extracted frames")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "png"))
        .collect();
    frame_paths.sort();

    let total = frame_paths.len().max(1);
    for (i, frame_path) in frame_paths.iter().enumerate() {
        match image::open(frame_path) {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image =
                    egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_flat_samples().as_slice());

                let mut state = shared.lock().unwrap();
                state.frames.push(color_image);
                state.progress = 0.1 + 0.9 * ((i + 1) as f32 / total as f32);
                state.message = format!("Loading frame {}/{}", i + 1, total);
            }
            Err(e) => {
                warn!("failed to decode frame {}: {}", frame_path.display(), e);
            }
        }
    }

    let _ = fs::remove_dir_all(&temp_dir);

    let loaded = shared.lock().unwrap().frames.len();
    if loaded == 0 {
        anyhow::bail!("no frames could be decoded from {}", path.display());
    }

    {
        let mut state = shared.lock().unwrap();
        state.done = true;
        state.progress = 1.0;
        state.message = format!("Loaded {loaded} frames");
    }
    info!("loaded {} frames from {}", loaded, path.display());
    Ok(())
}

/// The playback clock for one media clip. Position and play state live here
/// and nowhere else; the sync controller reads them instead of keeping a
/// shadow copy.
///
/// A seek issued before metadata readiness is held in a single pending slot
/// (a newer seek replaces it) and applied on the readiness transition.
#[derive(Debug, Default)]
pub struct Transport {
    duration: Option<f64>,
    current_time: f64,
    playing: bool,
    ready: bool,
    ended: bool,
    pending_seek: Option<f64>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks metadata as loaded and applies the pending seek, if any.
    pub fn set_ready(&mut self, duration: Option<f64>) {
        self.ready = true;
        self.duration = duration;
        if let Some(target) = self.pending_seek.take() {
            self.apply_seek(target);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    pub fn has_pending_seek(&self) -> bool {
        self.pending_seek.is_some()
    }

    pub fn seek(&mut self, target: f64) {
        if self.ready {
            self.apply_seek(target);
        } else {
            self.pending_seek = Some(target);
        }
    }

    fn apply_seek(&mut self, target: f64) {
        let mut t = target.max(0.0);
        if let Some(duration) = self.duration {
            t = t.min(duration);
        }
        self.current_time = t;
        self.ended = false;
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advances the clock while playing. Returns true on the tick that
    /// reaches the end of the clip.
    pub fn advance(&mut self, dt: f64) -> bool {
        if !self.playing {
            return false;
        }
        self.current_time += dt.max(0.0);
        if let Some(duration) = self.duration {
            if self.current_time >= duration {
                self.current_time = duration;
                self.playing = false;
                self.ended = true;
                return true;
            }
        }
        false
    }

    /// Normalized playback position for progress display; `None` while the
    /// duration is unknown rather than NaN or infinity.
    pub fn progress(&self) -> Option<f32> {
        let duration = self.duration.filter(|d| *d > 0.0)?;
        Some((self.current_time / duration).clamp(0.0, 1.0) as f32)
    }
}
