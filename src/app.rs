// src/app.rs
use std::path::PathBuf;

use eframe::egui::{self, Align, Align2, Color32, FontId, RichText, Rounding, Vec2};
use egui_extras::{Size, StripBuilder};
use tracing::{error, info};

use crate::data::{MetricsExporter, Phase, SwingAnalysis, View};
use crate::geometry;
use crate::overlay::{self, OverlayStyle};
use crate::sync::{PlayState, VideoSyncController};
use crate::timeline;
use crate::ui::{self, Theme};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    SideBySide,
    PrimaryOnly,
    SecondaryOnly,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub show_overlay: bool,
    pub overlay_during_playback: bool,
    pub line_width: f32,
    pub dot_radius: f32,
    pub output_directory: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            show_overlay: true,
            overlay_during_playback: true,
            line_width: 2.0,
            dot_radius: 4.0,
            output_directory: directories::UserDirs::new()
                .and_then(|dirs| dirs.document_dir().map(|p| p.join("SwingSync")))
                .unwrap_or_else(|| PathBuf::from("./output")),
        }
    }
}

/// GPU texture for the frame a view currently shows; re-uploaded only when
/// the displayed frame index changes.
#[derive(Default)]
struct FrameTexture {
    index: Option<usize>,
    texture: Option<egui::TextureHandle>,
}

pub struct SwingSyncApp {
    controller: Option<VideoSyncController>,
    theme: Theme,
    view_mode: ViewMode,
    settings: AppSettings,
    show_settings: bool,
    show_about: bool,
    status: Option<String>,
    frame_textures: [FrameTexture; 2],
}

impl SwingSyncApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            controller: None,
            theme: Theme::default(),
            view_mode: ViewMode::SideBySide,
            settings: AppSettings::default(),
            show_settings: false,
            show_about: false,
            status: None,
            frame_textures: Default::default(),
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            egui::menu::bar(ui, |ui| {
                ui.heading("Swing Sync");
                ui.separator();

                if ui.button("📂 Open Analysis…").clicked() {
                    self.open_analysis();
                }

                ui.separator();

                // Phase navigation
                if let Some(controller) = &mut self.controller {
                    ui.horizontal(|ui| {
                        for phase in Phase::ALL {
                            if ui
                                .selectable_label(controller.phase() == phase, phase.label())
                                .clicked()
                            {
                                controller.set_phase(phase);
                            }
                        }
                    });
                    ui.separator();
                }

                // View layout
                ui.horizontal(|ui| {
                    let mut mode = self.view_mode;
                    ui.selectable_value(&mut mode, ViewMode::SideBySide, "Side by Side");
                    ui.selectable_value(&mut mode, ViewMode::PrimaryOnly, "Yours");
                    ui.selectable_value(&mut mode, ViewMode::SecondaryOnly, "Reference");
                    if mode != self.view_mode {
                        self.view_mode = mode;
                        if let Some(controller) = &mut self.controller {
                            controller.reseek_current_phase();
                        }
                    }
                });

                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                    if ui.button("ℹ About").clicked() {
                        self.show_about = !self.show_about;
                    }
                });
            });
            ui.add_space(8.0);
        });
    }

    fn render_control_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("controls").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if let Some(controller) = &mut self.controller {
                    let icon = if controller.is_playing() { "⏸" } else { "▶" };
                    let enabled = matches!(
                        controller.state(),
                        PlayState::Playing | PlayState::Paused | PlayState::Ended
                    );
                    let button = egui::Button::new(RichText::new(icon).size(18.0));
                    if ui.add_enabled(enabled, button).clicked() {
                        controller.toggle_play();
                    }

                    ui.add_space(8.0);
                    let t = controller.current_time(View::Primary).unwrap_or(0.0);
                    ui.label(
                        RichText::new(ui::format_time(t))
                            .monospace()
                            .color(self.theme.primary),
                    );

                    ui.add_space(8.0);
                    ui.checkbox(&mut self.settings.show_overlay, "Overlay");

                    ui.add_space(8.0);
                    let markers = controller.markers();
                    if let Some(phase) =
                        timeline::timeline_bar(ui, controller.progress(), &markers, &self.theme)
                    {
                        controller.set_phase(phase);
                    }
                } else {
                    ui.label(
                        RichText::new("No analysis loaded").color(self.theme.text_secondary),
                    );
                }
            });
            if let Some(status) = &self.status {
                ui.label(
                    RichText::new(status)
                        .size(11.0)
                        .color(self.theme.text_secondary),
                );
            }
            ui.add_space(8.0);
        });
    }

    fn render_main_content(&mut self, ctx: &egui::Context) {
        let frame = egui::Frame::central_panel(&ctx.style()).fill(self.theme.background);
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            if self.controller.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new("Open a swing analysis file to begin")
                            .size(16.0)
                            .color(self.theme.text_secondary),
                    );
                });
                return;
            }

            StripBuilder::new(ui)
                .size(Size::remainder())
                .size(Size::exact(150.0))
                .vertical(|mut strip| {
                    strip.cell(|ui| self.render_video_area(ui));
                    strip.cell(|ui| self.render_metrics_panel(ui));
                });
        });
    }

    fn render_video_area(&mut self, ui: &mut egui::Ui) {
        match self.view_mode {
            ViewMode::SideBySide => {
                StripBuilder::new(ui)
                    .size(Size::remainder())
                    .size(Size::remainder())
                    .horizontal(|mut strip| {
                        strip.cell(|ui| self.render_video_panel(ui, View::Primary));
                        strip.cell(|ui| self.render_video_panel(ui, View::Secondary));
                    });
            }
            ViewMode::PrimaryOnly => self.render_video_panel(ui, View::Primary),
            ViewMode::SecondaryOnly => self.render_video_panel(ui, View::Secondary),
        }
    }

    fn render_video_panel(&mut self, ui: &mut egui::Ui, view: View) {
        ui.group(|ui| {
            ui.vertical(|ui| {
                let title = match view {
                    View::Primary => "Your Swing",
                    View::Secondary => "Reference",
                };
                ui.label(RichText::new(title).size(13.0).strong());
                self.render_video_canvas(ui, view);
            });
        });
    }

    fn render_video_canvas(&mut self, ui: &mut egui::Ui, view: View) {
        let controller = match &self.controller {
            Some(controller) => controller,
            None => return,
        };
        let slot = match view {
            View::Primary => 0,
            View::Secondary => 1,
        };

        let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
        let painter = ui.painter().with_clip_rect(rect);
        painter.rect_filled(rect, Rounding::same(4.0), Color32::BLACK);

        if !controller.has_view(view) {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No video for this view",
                FontId::proportional(14.0),
                self.theme.text_secondary,
            );
            return;
        }

        // The on-screen area the video image actually covers; derived and
        // recomputed every draw so resizes stay registered.
        let loader = controller.loader(view);
        let meta = loader.and_then(|l| l.meta());
        let fit = geometry::fit_rect(
            meta.map_or(0.0, |m| m.width as f32),
            meta.map_or(0.0, |m| m.height as f32),
            rect.width(),
            rect.height(),
        );
        if fit.is_empty() {
            return;
        }
        let screen = fit.to_screen(rect.min);

        if let Some(loader) = loader {
            if let Some(err) = loader.error() {
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    err,
                    FontId::proportional(13.0),
                    self.theme.error,
                );
            } else if loader.frames_ready() {
                let cache = &mut self.frame_textures[slot];
                if let Some(texture_id) = update_frame_texture(cache, controller, ui.ctx(), view)
                {
                    painter.image(
                        texture_id,
                        screen,
                        egui::Rect::from_min_max(egui::Pos2::ZERO, egui::pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
                if let Some(t) = controller.current_time(view) {
                    painter.text(
                        rect.left_bottom() + Vec2::new(8.0, -8.0),
                        Align2::LEFT_BOTTOM,
                        ui::format_time(t),
                        FontId::monospace(11.0),
                        self.theme.text_secondary,
                    );
                }
            } else {
                let (progress, message) = loader.status();
                let bar = egui::Rect::from_center_size(
                    rect.center(),
                    Vec2::new(rect.width() * 0.6, 8.0),
                );
                painter.rect_filled(bar, Rounding::same(4.0), self.theme.surface);
                let fill = egui::Rect::from_min_size(
                    bar.min,
                    Vec2::new(bar.width() * progress.clamp(0.0, 1.0), bar.height()),
                );
                painter.rect_filled(fill, Rounding::same(4.0), self.theme.primary);
                painter.text(
                    bar.center() + Vec2::new(0.0, 18.0),
                    Align2::CENTER_CENTER,
                    message,
                    FontId::proportional(12.0),
                    self.theme.text_secondary,
                );
            }
        }

        // Overlay registered to the rendered video rect, not the panel
        if let Some(pose) = controller.overlay_pose(view) {
            let style = OverlayStyle {
                line_width: self.settings.line_width,
                dot_radius: self.settings.dot_radius,
                ..OverlayStyle::default()
            };
            overlay::draw_pose(&painter, screen, pose, &style);
        }
    }

    fn render_metrics_panel(&mut self, ui: &mut egui::Ui) {
        let mut export_clicked = false;

        if let Some(controller) = &self.controller {
            let phase = controller.phase();
            let analysis = controller.analysis();
            let primary = analysis.primary.phase_metrics.get(&phase);
            let reference = analysis
                .secondary
                .as_ref()
                .and_then(|v| v.phase_metrics.get(&phase));

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{} Metrics", phase.label())).strong());
                ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Export CSV").clicked() {
                        export_clicked = true;
                    }
                });
            });

            let mut names: Vec<&String> = primary
                .iter()
                .chain(reference.iter())
                .flat_map(|m| m.keys())
                .collect();
            names.sort();
            names.dedup();

            if names.is_empty() {
                ui.label(
                    RichText::new("No metrics for this phase")
                        .color(self.theme.text_secondary),
                );
            } else {
                let fmt = |v: Option<f64>| {
                    v.map(|v| format!("{v:.1}°")).unwrap_or_else(|| "-".to_string())
                };
                egui::Grid::new("phase_metrics")
                    .striped(true)
                    .min_col_width(90.0)
                    .show(ui, |ui| {
                        ui.label("");
                        ui.label(RichText::new("Yours").strong());
                        ui.label(RichText::new("Reference").strong());
                        ui.label(RichText::new("Δ").strong());
                        ui.end_row();

                        for name in names {
                            let p = primary.and_then(|m| m.get(name)).copied();
                            let r = reference.and_then(|m| m.get(name)).copied();
                            ui.label(ui::metric_label(name));
                            ui.label(fmt(p));
                            ui.label(fmt(r));
                            match (p, r) {
                                (Some(p), Some(r)) => {
                                    let delta = p - r;
                                    let color = if delta.abs() <= 5.0 {
                                        self.theme.success
                                    } else {
                                        self.theme.warning
                                    };
                                    ui.colored_label(color, format!("{delta:+.1}°"));
                                }
                                _ => {
                                    ui.label("-");
                                }
                            }
                            ui.end_row();
                        }
                    });
            }
        }

        if export_clicked {
            self.export_metrics();
        }
    }

    fn render_settings_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("Settings")
            .open(&mut self.show_settings)
            .resizable(false)
            .default_size([360.0, 320.0])
            .show(ctx, |ui| {
                ui.heading("Overlay");

                ui.checkbox(&mut self.settings.show_overlay, "Show skeleton overlay");
                ui.checkbox(
                    &mut self.settings.overlay_during_playback,
                    "Keep overlay during playback (both views)",
                );

                ui.label("Line width:");
                ui.add(egui::Slider::new(&mut self.settings.line_width, 1.0..=6.0).step_by(0.5));

                ui.label("Joint marker radius:");
                ui.add(egui::Slider::new(&mut self.settings.dot_radius, 2.0..=8.0).step_by(0.5));

                ui.separator();
                ui.heading("Output");

                ui.label("Export directory:");
                ui.label(self.settings.output_directory.display().to_string());
                if ui.button("Browse…").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.settings.output_directory = dir;
                    }
                }
            });
    }

    fn render_about_window(&mut self, ctx: &egui::Context) {
        egui::Window::new("About")
            .open(&mut self.show_about)
            .resizable(false)
            .default_size([400.0, 280.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("Swing Sync");
                    ui.label("Version 0.1.0");
                    ui.add_space(20.0);
                    ui.label("Side-by-side swing comparison with");
                    ui.label("phase-synchronized playback and pose overlay.");
                });
            });
    }

    fn open_analysis(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("swing analysis", &["json"])
            .pick_file();
        let path = match picked {
            Some(path) => path,
            None => return,
        };

        match SwingAnalysis::from_json_file(&path) {
            Ok(analysis) => {
                info!("loaded analysis from {}", path.display());
                self.controller = Some(VideoSyncController::new(analysis));
                self.frame_textures = Default::default();
                self.status = Some(format!("Loaded {}", path.display()));
            }
            Err(e) => {
                error!("failed to load analysis: {:#}", e);
                self.status = Some(format!("Failed to load analysis: {e:#}"));
            }
        }
    }

    fn export_metrics(&mut self) {
        let controller = match &self.controller {
            Some(controller) => controller,
            None => return,
        };

        let exporter = MetricsExporter::new(&self.settings.output_directory, None);
        match exporter.export_csv(controller.analysis()) {
            Ok(path) => {
                info!("exported metrics to {}", path.display());
                self.status = Some(format!("Exported {}", path.display()));
            }
            Err(e) => {
                error!("metrics export failed: {:#}", e);
                self.status = Some(format!("Export failed: {e:#}"));
            }
        }
    }
}

/// Uploads the frame a view should display this tick, reusing the existing
/// texture when the frame index has not changed.
fn update_frame_texture(
    cache: &mut FrameTexture,
    controller: &VideoSyncController,
    ctx: &egui::Context,
    view: View,
) -> Option<egui::TextureId> {
    let loader = controller.loader(view)?;
    let t = controller.current_time(view)?;
    let index = loader.frame_index_at(t)?;

    if cache.index != Some(index) || cache.texture.is_none() {
        let image = loader.frame(index)?;
        match &mut cache.texture {
            Some(texture) => texture.set(image, Default::default()),
            None => {
                let name = match view {
                    View::Primary => "video_primary",
                    View::Secondary => "video_secondary",
                };
                cache.texture = Some(ctx.load_texture(name, image, Default::default()));
            }
        }
        cache.index = Some(index);
    }

    cache.texture.as_ref().map(|t| t.id())
}

impl eframe::App for SwingSyncApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dt = ctx.input(|i| i.unstable_dt) as f64;

        if let Some(controller) = &mut self.controller {
            controller.overlay_visible = self.settings.show_overlay;
            controller.overlay_during_playback = self.settings.overlay_during_playback;
            controller.tick(dt);
        }

        self.render_header(ctx);
        self.render_control_panel(ctx);

        if self.show_settings {
            self.render_settings_window(ctx);
        }
        if self.show_about {
            self.render_about_window(ctx);
        }

        self.render_main_content(ctx);

        // The continuous render loop: re-armed each tick only while playing
        // or decoding; paused redraws come from input and resize events
        if self
            .controller
            .as_ref()
            .map_or(false, |c| c.wants_repaint())
        {
            ctx.request_repaint();
        }
    }
}
