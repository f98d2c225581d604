// src/overlay.rs - Skeleton overlay drawing
use eframe::egui::{self, Color32, Stroke};

use crate::data::{LandmarkPoint, PoseSample};

/// Fixed anatomical topology: shoulders, hips, both torso sides, upper and
/// lower arms, upper and lower legs.
pub const SKELETON_CONNECTIONS: [(&str, &str); 12] = [
    ("left_shoulder", "right_shoulder"),
    ("left_hip", "right_hip"),
    ("left_shoulder", "left_hip"),
    ("right_shoulder", "right_hip"),
    ("left_shoulder", "left_elbow"),
    ("left_elbow", "left_wrist"),
    ("right_shoulder", "right_elbow"),
    ("right_elbow", "right_wrist"),
    ("left_hip", "left_knee"),
    ("left_knee", "left_ankle"),
    ("right_hip", "right_knee"),
    ("right_knee", "right_ankle"),
];

/// Immutable overlay styling. Configuration, not state: built once and
/// passed to every draw.
#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub line_color: Color32,
    pub dot_color: Color32,
    pub line_width: f32,
    pub dot_radius: f32,
    pub connections: &'static [(&'static str, &'static str)],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            line_color: Color32::from_rgb(70, 130, 240),
            dot_color: Color32::from_rgb(255, 152, 0),
            line_width: 2.0,
            dot_radius: 4.0,
            connections: &SKELETON_CONNECTIONS,
        }
    }
}

/// Maps a normalized landmark into the on-screen area the video image
/// occupies.
fn project(area: egui::Rect, point: LandmarkPoint) -> egui::Pos2 {
    egui::pos2(
        area.left() + point.x as f32 * area.width(),
        area.top() + point.y as f32 * area.height(),
    )
}

/// Resolves one connection to its two endpoints; `None` when either joint is
/// missing from the sample, which skips that single segment.
fn segment(pose: &PoseSample, a: &str, b: &str) -> Option<(LandmarkPoint, LandmarkPoint)> {
    Some((pose.get(a)?, pose.get(b)?))
}

/// Draws the skeleton for one pose sample into `area` (the letterboxed
/// region the video covers on screen, in points). Lines first, then a filled
/// marker for every joint present so markers sit above lines. Missing joints
/// skip their segments and markers silently. egui repaints the whole panel
/// every frame, so there is no partial update to manage.
pub fn draw_pose(painter: &egui::Painter, area: egui::Rect, pose: &PoseSample, style: &OverlayStyle) {
    if area.width() <= 0.0 || area.height() <= 0.0 {
        return;
    }

    let stroke = Stroke::new(style.line_width, style.line_color);
    for (a, b) in style.connections {
        if let Some((from, to)) = segment(pose, a, b) {
            painter.line_segment([project(area, from), project(area, to)], stroke);
        }
    }

    for point in pose.joints.values() {
        painter.circle_filled(project(area, *point), style.dot_radius, style.dot_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const JOINTS: [&str; 12] = [
        "left_shoulder",
        "right_shoulder",
        "left_elbow",
        "right_elbow",
        "left_wrist",
        "right_wrist",
        "left_hip",
        "right_hip",
        "left_knee",
        "right_knee",
        "left_ankle",
        "right_ankle",
    ];

    fn full_pose() -> PoseSample {
        let joints: HashMap<String, LandmarkPoint> = JOINTS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                (name.to_string(), LandmarkPoint { x: i as f64 / 12.0, y: 0.5 })
            })
            .collect();
        PoseSample { joints }
    }

    fn drawable_segments(pose: &PoseSample) -> Vec<(&'static str, &'static str)> {
        SKELETON_CONNECTIONS
            .iter()
            .filter(|(a, b)| segment(pose, a, b).is_some())
            .copied()
            .collect()
    }

    #[test]
    fn full_pose_draws_all_twelve_connections() {
        assert_eq!(drawable_segments(&full_pose()).len(), SKELETON_CONNECTIONS.len());
    }

    #[test]
    fn missing_joint_skips_only_its_segments() {
        let mut pose = full_pose();
        pose.joints.remove("right_wrist");

        let segments = drawable_segments(&pose);
        assert_eq!(segments.len(), SKELETON_CONNECTIONS.len() - 1);
        assert!(!segments.contains(&("right_elbow", "right_wrist")));
        assert!(segments.contains(&("right_shoulder", "right_elbow")));
    }

    #[test]
    fn empty_pose_draws_nothing() {
        assert!(drawable_segments(&PoseSample::default()).is_empty());
    }

    #[test]
    fn projection_uses_render_area_not_panel() {
        let area = egui::Rect::from_min_size(egui::pos2(10.0, 175.0), egui::vec2(800.0, 450.0));
        let pos = project(area, LandmarkPoint { x: 0.5, y: 0.5 });
        assert_eq!(pos, egui::pos2(410.0, 400.0));
    }
}
