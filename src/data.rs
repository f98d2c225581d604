// src/data.rs - Analysis result model, JSON loading, metrics export
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::{Deserialize, Serialize};

/// The ordered checkpoints of a swing. Ordering is chronological and drives
/// the past/active/future styling on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Address,
    Top,
    Impact,
    FollowThrough,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Address, Phase::Top, Phase::Impact, Phase::FollowThrough];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Address => "Address",
            Phase::Top => "Top",
            Phase::Impact => "Impact",
            Phase::FollowThrough => "Follow Through",
        }
    }
}

/// The two camera angles being compared. Each view carries its own media
/// source, pose data and phase timestamps; one view's values are never used
/// to seek or render the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Primary,
    Secondary,
}

/// A normalized 2D landmark, origin top-left, both axes in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

/// One detected pose: joint name to landmark. Absent keys mean the joint was
/// not detected for this sample, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSample {
    pub joints: HashMap<String, LandmarkPoint>,
}

impl PoseSample {
    pub fn get(&self, joint: &str) -> Option<LandmarkPoint> {
        self.joints.get(joint).copied()
    }
}

/// One entry of a continuous frame sequence: a pose snapshot at a timestamp
/// (seconds into the owning view's media).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub timestamp: f64,
    pub pose: PoseSample,
}

/// Everything the analysis pipeline produced for a single view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewAnalysis {
    /// Path to this view's video file.
    pub video: PathBuf,
    /// Seek target per phase, seconds into this view's own media.
    #[serde(default)]
    pub phase_times: HashMap<Phase, f64>,
    /// Key-frame pose snapshot per phase, for instant display while paused.
    #[serde(default)]
    pub phase_poses: HashMap<Phase, PoseSample>,
    /// Precomputed angle measurements per phase (display only).
    #[serde(default)]
    pub phase_metrics: HashMap<Phase, HashMap<String, f64>>,
    /// Time-ordered pose samples for continuous overlay tracking during
    /// playback. May be empty; timestamps must be non-decreasing.
    #[serde(default)]
    pub frames: Vec<FrameSample>,
}

impl ViewAnalysis {
    fn validate(&self, name: &str) -> Result<()> {
        for pair in self.frames.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                anyhow::bail!(
                    "{} frame sequence is not time-ordered ({:.3}s after {:.3}s)",
                    name,
                    pair[1].timestamp,
                    pair[0].timestamp
                );
            }
        }
        Ok(())
    }
}

/// The full analysis document: the user's swing plus an optional reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwingAnalysis {
    pub primary: ViewAnalysis,
    #[serde(default)]
    pub secondary: Option<ViewAnalysis>,
}

impl SwingAnalysis {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("cannot open analysis file {}", path.display()))?;
        let analysis: SwingAnalysis = serde_json::from_reader(file)
            .with_context(|| format!("cannot parse analysis file {}", path.display()))?;
        analysis.primary.validate("primary")?;
        if let Some(secondary) = &analysis.secondary {
            secondary.validate("secondary")?;
        }
        Ok(analysis)
    }

    pub fn view(&self, view: View) -> Option<&ViewAnalysis> {
        match view {
            View::Primary => Some(&self.primary),
            View::Secondary => self.secondary.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MetricRecord {
    phase: &'static str,
    metric: String,
    primary: Option<f64>,
    reference: Option<f64>,
    delta: Option<f64>,
}

/// Writes the per-phase angle comparison to a CSV in a timestamped session
/// directory under the configured output directory.
pub struct MetricsExporter {
    output_dir: PathBuf,
    session_name: String,
}

impl MetricsExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
        }
    }

    pub fn export_csv(&self, analysis: &SwingAnalysis) -> Result<PathBuf> {
        let csv_path = self
            .output_dir
            .join(&self.session_name)
            .join("phase_metrics.csv");

        // Create directory if it doesn't exist
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);

        for phase in Phase::ALL {
            for record in self.phase_records(analysis, phase) {
                writer.serialize(record)?;
            }
        }

        writer.flush()?;
        Ok(csv_path)
    }

    fn phase_records(&self, analysis: &SwingAnalysis, phase: Phase) -> Vec<MetricRecord> {
        let primary = analysis.primary.phase_metrics.get(&phase);
        let reference = analysis
            .secondary
            .as_ref()
            .and_then(|v| v.phase_metrics.get(&phase));

        let mut names: Vec<&String> = primary
            .iter()
            .chain(reference.iter())
            .flat_map(|m| m.keys())
            .collect();
        names.sort();
        names.dedup();

        names
            .into_iter()
            .map(|name| {
                let p = primary.and_then(|m| m.get(name)).copied();
                let r = reference.and_then(|m| m.get(name)).copied();
                MetricRecord {
                    phase: phase.label(),
                    metric: name.clone(),
                    primary: p,
                    reference: r,
                    delta: match (p, r) {
                        (Some(p), Some(r)) => Some(p - r),
                        _ => None,
                    },
                }
            })
            .collect()
    }
}
