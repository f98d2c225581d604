// src/timeline.rs - Phase markers over the playback progress bar
use std::collections::HashMap;

use eframe::egui::{self, Rounding, Sense, Stroke, Vec2};

use crate::data::Phase;
use crate::ui::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerState {
    Past,
    Active,
    Future,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseMarker {
    pub phase: Phase,
    /// Position along the bar, 0..=100.
    pub percent: f32,
    pub state: MarkerState,
}

/// Computes the marker set from the primary view's phase timestamps and
/// duration. Phases lacking a timestamp are omitted; an unknown or zero
/// duration omits every marker rather than producing NaN positions. The
/// state field is presentation only and never feeds seek logic.
pub fn phase_markers(
    phase_times: &HashMap<Phase, f64>,
    duration: Option<f64>,
    current: Phase,
) -> Vec<PhaseMarker> {
    let duration = match duration {
        Some(d) if d > 0.0 => d,
        _ => return Vec::new(),
    };

    Phase::ALL
        .iter()
        .filter_map(|&phase| {
            let timestamp = *phase_times.get(&phase)?;
            let percent = ((timestamp / duration) * 100.0).clamp(0.0, 100.0) as f32;
            let state = if phase == current {
                MarkerState::Active
            } else if phase < current {
                MarkerState::Past
            } else {
                MarkerState::Future
            };
            Some(PhaseMarker { phase, percent, state })
        })
        .collect()
}

/// Paints the progress bar with its phase markers and reports the marker the
/// user clicked, if any.
pub fn timeline_bar(
    ui: &mut egui::Ui,
    progress: Option<f32>,
    markers: &[PhaseMarker],
    theme: &Theme,
) -> Option<Phase> {
    let desired = Vec2::new(ui.available_width(), 22.0);
    let (rect, response) = ui.allocate_exact_size(desired, Sense::click());
    let painter = ui.painter();

    let bar = rect.shrink2(Vec2::new(0.0, 6.0));
    painter.rect_filled(bar, Rounding::same(5.0), theme.surface);

    if let Some(progress) = progress {
        let fill = egui::Rect::from_min_size(
            bar.min,
            Vec2::new(bar.width() * progress.clamp(0.0, 1.0), bar.height()),
        );
        painter.rect_filled(fill, Rounding::same(5.0), theme.primary);
    }

    let marker_x =
        |marker: &PhaseMarker| bar.left() + bar.width() * (marker.percent / 100.0);

    for marker in markers {
        let center = egui::pos2(marker_x(marker), rect.center().y);
        let color = match marker.state {
            MarkerState::Active => theme.secondary,
            MarkerState::Past => theme.text_secondary,
            MarkerState::Future => egui::Color32::from_rgb(100, 100, 100),
        };
        painter.circle_filled(center, 5.0, color);
        if marker.state == MarkerState::Active {
            painter.circle_stroke(center, 7.0, Stroke::new(1.5, theme.text_primary));
        }
    }

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            return markers
                .iter()
                .map(|m| (m, (marker_x(m) - pos.x).abs()))
                .filter(|(_, distance)| *distance <= 10.0)
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(m, _)| m.phase);
        }
    }
    None
}
