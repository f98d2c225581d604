// src/ui.rs - Theme and shared presentation helpers
use std::collections::HashMap;

use eframe::egui::Color32;
use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color32,
    pub secondary: Color32,
    pub background: Color32,
    pub surface: Color32,
    pub error: Color32,
    pub warning: Color32,
    pub success: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color32::from_rgb(70, 130, 240),
            secondary: Color32::from_rgb(255, 152, 0),
            background: Color32::from_rgb(20, 20, 25),
            surface: Color32::from_rgb(30, 30, 35),
            error: Color32::from_rgb(244, 67, 54),
            warning: Color32::from_rgb(255, 152, 0),
            success: Color32::from_rgb(76, 175, 80),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(200, 200, 200),
        }
    }
}

/// Display names for the metric keys the analysis pipeline is known to emit;
/// unknown keys fall back to their raw name.
static METRIC_LABELS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("shoulder_turn", "Shoulder Turn"),
        ("hip_turn", "Hip Turn"),
        ("spine_angle", "Spine Angle"),
        ("arm_extension", "Arm Extension"),
        ("knee_flex", "Knee Flex"),
        ("weight_shift", "Weight Shift"),
    ])
});

pub fn metric_label(key: &str) -> &str {
    METRIC_LABELS.get(key).copied().unwrap_or(key)
}

/// mm:ss.cc for transport readouts.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = seconds % 60.0;
    format!("{mins:02}:{secs:05.2}")
}
